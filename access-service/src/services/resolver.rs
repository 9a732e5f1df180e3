//! Per-repository access resolution.
//!
//! Two phases, first match wins:
//!
//! 1. Direct collaborator probe. The membership endpoint answers 204 only
//!    for direct collaborators, while the permission endpoint also answers
//!    for org-inherited access, so membership is confirmed first and the
//!    permission looked up second.
//! 2. Pending invitation scan, only when phase 1 found nothing.

use crate::models::{AccessFinding, PermissionLevel, RepositoryRef};
use crate::services::github::{GitHubApi, GitHubError};
use std::sync::Arc;

pub struct AccessResolver {
    github: Arc<dyn GitHubApi>,
    per_page: u32,
    invitation_page_cap: u32,
}

impl AccessResolver {
    pub fn new(github: Arc<dyn GitHubApi>, per_page: u32, invitation_page_cap: u32) -> Self {
        Self {
            github,
            per_page,
            invitation_page_cap,
        }
    }

    /// Resolve `login`'s access to `repo`.
    ///
    /// A failed membership probe is logged and falls through to the
    /// invitation scan. A failed invitation scan is returned to the caller,
    /// which decides whether the repository is skipped.
    pub async fn resolve(
        &self,
        repo: &RepositoryRef,
        login: &str,
    ) -> Result<Option<AccessFinding>, GitHubError> {
        if let Some(finding) = self.probe_direct(repo, login).await {
            return Ok(Some(finding));
        }
        self.scan_invitations(repo, login).await
    }

    async fn probe_direct(&self, repo: &RepositoryRef, login: &str) -> Option<AccessFinding> {
        match self
            .github
            .is_direct_collaborator(&repo.owner, &repo.name, login)
            .await
        {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(repo = %repo, error = %e, "Collaborator probe failed");
                return None;
            }
        }

        let permission = match self
            .github
            .collaborator_permission(&repo.owner, &repo.name, login)
            .await
        {
            Ok(level) => PermissionLevel::from(level),
            Err(e) => {
                tracing::debug!(repo = %repo, error = %e, "Permission lookup failed, assuming read");
                PermissionLevel::Read
            }
        };

        if !permission.grants_access() {
            tracing::debug!(repo = %repo, "Direct collaborator with permission none");
            return None;
        }

        Some(AccessFinding::active(repo, login, permission))
    }

    async fn scan_invitations(
        &self,
        repo: &RepositoryRef,
        login: &str,
    ) -> Result<Option<AccessFinding>, GitHubError> {
        for page in 1..=self.invitation_page_cap {
            let invitations = self
                .github
                .list_invitations(&repo.owner, &repo.name, page, self.per_page)
                .await?;
            if invitations.is_empty() {
                break;
            }

            // Logins are case-preserving but compare case-insensitively.
            let matched = invitations.into_iter().find(|invitation| {
                invitation
                    .invitee
                    .as_ref()
                    .is_some_and(|invitee| invitee.login.eq_ignore_ascii_case(login))
            });

            if let Some(invitation) = matched {
                let permission = invitation
                    .permissions
                    .map(PermissionLevel::from)
                    .unwrap_or_default();
                return Ok(Some(AccessFinding::invited(
                    repo,
                    login,
                    permission,
                    invitation.id,
                )));
            }
        }

        Ok(None)
    }
}
