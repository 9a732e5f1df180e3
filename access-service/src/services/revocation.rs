use crate::models::{AccessStatus, RevocationItem, RevocationOutcome};
use crate::services::github::GitHubApi;
use crate::services::metrics;
use std::sync::Arc;

/// Applies caller-approved removals one by one.
///
/// Every input item yields exactly one outcome, in input order; a failed
/// item never stops the batch.
pub struct RevocationExecutor {
    github: Arc<dyn GitHubApi>,
}

impl RevocationExecutor {
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }

    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn apply(&self, items: &[RevocationItem]) -> Vec<RevocationOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());

        for item in items {
            outcomes.push(self.apply_one(item).await);
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        tracing::info!(
            total = outcomes.len(),
            failed,
            "Revocation batch processed"
        );

        outcomes
    }

    async fn apply_one(&self, item: &RevocationItem) -> RevocationOutcome {
        let status = match item.status.parse::<AccessStatus>() {
            Ok(status) => status,
            Err(unknown) => {
                metrics::record_revocation("unknown", false);
                return RevocationOutcome::failure(item, format!("Unknown status '{}'.", unknown));
            }
        };

        let outcome = match status {
            AccessStatus::Active => self.remove_collaborator(item).await,
            AccessStatus::Invited => match item.invitation_id {
                Some(invitation_id) => self.cancel_invitation(item, invitation_id).await,
                None => RevocationOutcome::failure(
                    item,
                    "Missing invitation_id, cannot cancel invite.".to_string(),
                ),
            },
        };

        metrics::record_revocation(status.as_str(), outcome.success);
        outcome
    }

    async fn remove_collaborator(&self, item: &RevocationItem) -> RevocationOutcome {
        match self
            .github
            .remove_collaborator(&item.owner, &item.repo, &item.username)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    owner = %item.owner,
                    repo = %item.repo,
                    username = %item.username,
                    "Removed collaborator"
                );
                RevocationOutcome::success(
                    item,
                    format!("Removed @{} from {}/{}.", item.username, item.owner, item.repo),
                )
            }
            Err(e) => {
                tracing::error!(
                    owner = %item.owner,
                    repo = %item.repo,
                    username = %item.username,
                    error = %e,
                    "Failed to remove collaborator"
                );
                RevocationOutcome::failure(item, e.to_string())
            }
        }
    }

    async fn cancel_invitation(&self, item: &RevocationItem, invitation_id: u64) -> RevocationOutcome {
        match self
            .github
            .delete_invitation(&item.owner, &item.repo, invitation_id)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    owner = %item.owner,
                    repo = %item.repo,
                    invitation_id,
                    "Cancelled invitation"
                );
                RevocationOutcome::success(
                    item,
                    format!(
                        "Cancelled invitation {} for {}/{}.",
                        invitation_id, item.owner, item.repo
                    ),
                )
            }
            Err(e) => {
                tracing::error!(
                    owner = %item.owner,
                    repo = %item.repo,
                    invitation_id,
                    error = %e,
                    "Failed to cancel invitation"
                );
                RevocationOutcome::failure(item, e.to_string())
            }
        }
    }
}
