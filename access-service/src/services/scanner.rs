//! Scan orchestration: one session per stream request.
//!
//! Validating -> Fetching -> Scanning -> Done, with fatal errors only
//! possible before Scanning starts. Repositories are processed one at a
//! time; each gets its `scanning` event before any `found` event, and `done`
//! follows the last repository.

use crate::config::ScanConfig;
use crate::models::{RepositoryRef, ScanEvent};
use crate::services::github::{GitHubApi, GitHubError, UserProfile};
use crate::services::metrics;
use crate::services::{AccessResolver, RepositoryInventory};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("GitHub username '{0}' not found.")]
    UserNotFound(String),

    #[error("Failed to validate username: {0}")]
    Validation(GitHubError),

    #[error("Failed to fetch repositories: {0}")]
    InventoryFetch(GitHubError),

    #[error("Scan cancelled by caller")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Validating,
    Fetching,
    Scanning,
    Done,
}

/// State of one scan, owned by the task that runs it.
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub username: String,
    pub canonical_login: String,
    pub avatar_url: String,
    /// Advisory: the consuming surface should not offer to revoke the
    /// operator's own access.
    pub is_operator_self: bool,
    pub phase: ScanPhase,
    pub total_repos: usize,
    pub scanned_count: usize,
    pub found_count: usize,
}

impl ScanSession {
    fn new(username: &str, profile: UserProfile, is_operator_self: bool) -> Self {
        Self {
            username: username.to_string(),
            canonical_login: profile.login,
            avatar_url: profile.avatar_url,
            is_operator_self,
            phase: ScanPhase::Validating,
            total_repos: 0,
            scanned_count: 0,
            found_count: 0,
        }
    }

    fn enter(&mut self, phase: ScanPhase) {
        tracing::debug!(login = %self.canonical_login, from = ?self.phase, to = ?phase, "Scan phase");
        self.phase = phase;
    }
}

pub struct ScanOrchestrator {
    github: Arc<dyn GitHubApi>,
    inventory: RepositoryInventory,
    resolver: AccessResolver,
    event_buffer: usize,
}

impl ScanOrchestrator {
    pub fn new(github: Arc<dyn GitHubApi>, config: &ScanConfig) -> Self {
        Self {
            inventory: RepositoryInventory::new(
                github.clone(),
                config.per_page,
                config.inventory_page_cap,
            ),
            resolver: AccessResolver::new(
                github.clone(),
                config.per_page,
                config.invitation_page_cap,
            ),
            github,
            event_buffer: config.event_buffer.max(1),
        }
    }

    /// Start a scan in the background and hand back its event feed.
    ///
    /// Dropping the receiver cancels the scan before its next repository.
    pub fn stream(self: &Arc<Self>, username: String) -> mpsc::Receiver<ScanEvent> {
        let (tx, rx) = mpsc::channel(self.event_buffer);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let _ = orchestrator.run(&username, tx).await;
        });
        rx
    }

    /// Run a full scan, emitting events into `events`.
    ///
    /// Fatal failures are reported as a single `error` event as well as
    /// returned.
    #[tracing::instrument(skip(self, events))]
    pub async fn run(
        &self,
        username: &str,
        events: mpsc::Sender<ScanEvent>,
    ) -> Result<ScanSession, ScanError> {
        let result = self.scan(username, &events).await;

        match &result {
            Ok(session) => {
                metrics::record_scan("completed");
                tracing::info!(
                    login = %session.canonical_login,
                    repos = session.total_repos,
                    found = session.found_count,
                    "Scan completed"
                );
            }
            Err(ScanError::Cancelled) => {
                metrics::record_scan("cancelled");
                tracing::info!("Scan cancelled, caller disconnected");
            }
            Err(e) => {
                metrics::record_scan("failed");
                tracing::error!(error = %e, "Scan failed");
                let _ = events
                    .send(ScanEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        }

        result
    }

    async fn scan(
        &self,
        username: &str,
        events: &mpsc::Sender<ScanEvent>,
    ) -> Result<ScanSession, ScanError> {
        let mut session = self.validate(username).await?;

        session.enter(ScanPhase::Fetching);
        let repos = self
            .inventory
            .fetch_all()
            .await
            .map_err(ScanError::InventoryFetch)?;
        session.total_repos = repos.len();

        emit(
            events,
            ScanEvent::Start {
                total: session.total_repos,
                username: session.canonical_login.clone(),
                avatar_url: session.avatar_url.clone(),
                is_owner: session.is_operator_self,
            },
        )
        .await?;

        session.enter(ScanPhase::Scanning);
        for repo in &repos {
            if events.is_closed() {
                return Err(ScanError::Cancelled);
            }
            self.scan_repository(&mut session, repo, events).await?;
        }

        session.enter(ScanPhase::Done);
        emit(
            events,
            ScanEvent::Done {
                total: session.found_count,
            },
        )
        .await?;

        Ok(session)
    }

    async fn validate(&self, username: &str) -> Result<ScanSession, ScanError> {
        let username = username.trim();
        if !is_lookup_safe(username) {
            return Err(ScanError::UserNotFound(username.to_string()));
        }

        let profile = self
            .github
            .get_user(username)
            .await
            .map_err(ScanError::Validation)?
            .ok_or_else(|| ScanError::UserNotFound(username.to_string()))?;

        let is_operator_self = match self.github.get_authenticated_user().await {
            Ok(operator) => operator.login.eq_ignore_ascii_case(&profile.login),
            Err(e) => {
                tracing::warn!(error = %e, "Could not resolve operator identity");
                false
            }
        };

        Ok(ScanSession::new(username, profile, is_operator_self))
    }

    async fn scan_repository(
        &self,
        session: &mut ScanSession,
        repo: &RepositoryRef,
        events: &mpsc::Sender<ScanEvent>,
    ) -> Result<(), ScanError> {
        session.scanned_count += 1;
        emit(
            events,
            ScanEvent::Scanning {
                repo: repo.full_name.clone(),
                scanned: session.scanned_count,
                total: session.total_repos,
            },
        )
        .await?;

        match self.resolver.resolve(repo, &session.canonical_login).await {
            Ok(Some(finding)) => {
                session.found_count += 1;
                metrics::record_finding(finding.status.as_str());
                tracing::info!(
                    repo = %repo,
                    status = %finding.status,
                    permission = %finding.permission,
                    "Access found"
                );
                emit(events, ScanEvent::Found { repo: finding }).await?;
            }
            Ok(None) => {}
            Err(e) => {
                metrics::record_probe_failure();
                tracing::warn!(repo = %repo, error = %e, "Access check failed, skipping repository");
            }
        }

        Ok(())
    }
}

async fn emit(events: &mpsc::Sender<ScanEvent>, event: ScanEvent) -> Result<(), ScanError> {
    tracing::trace!(kind = event.kind(), "Emitting scan event");
    events.send(event).await.map_err(|_| ScanError::Cancelled)
}

/// Whether `login` can be sent to the profile lookup at all.
///
/// Login syntax is left to GitHub, since managed-user logins carry an
/// underscore suffix. Only values that cannot survive as a single path
/// segment are refused: empty, dot segments, whitespace or control chars.
pub fn is_lookup_safe(login: &str) -> bool {
    !login.is_empty()
        && login != "."
        && login != ".."
        && !login.chars().any(|c| c.is_whitespace() || c.is_control())
}
