//! GitHub REST API seam.
//!
//! Every upstream call the scanner and revoker make goes through
//! [`GitHubApi`], so the core logic can run against [`GitHubClient`] in
//! production and an in-memory fake in tests.

pub mod client;
pub mod credentials;
#[cfg(test)]
pub mod fake;

use crate::models::RepositoryRef;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use client::{GitHubClient, RateLimitPolicy};
pub use credentials::CredentialContext;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("GitHub rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("failed to decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GitHubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::UnexpectedStatus { status, .. } => Some(*status),
            GitHubError::RateLimited { .. } => Some(429),
            GitHubError::Transport(e) => e.status().map(|s| s.as_u16()),
            GitHubError::Decode(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invitee {
    pub login: String,
}

/// A pending repository invitation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invitation {
    pub id: u64,
    /// GitHub returns `null` once the invitee account is deleted.
    #[serde(default)]
    pub invitee: Option<Invitee>,
    #[serde(default)]
    pub permissions: Option<String>,
}

#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// One page of repositories the credential can see as owner,
    /// collaborator, or organization member. Pages start at 1.
    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryRef>, GitHubError>;

    /// `None` when the login does not exist.
    async fn get_user(&self, login: &str) -> Result<Option<UserProfile>, GitHubError>;

    async fn get_authenticated_user(&self) -> Result<UserProfile, GitHubError>;

    /// `true` only for direct collaborators; org or team inherited access
    /// answers `false`.
    async fn is_direct_collaborator(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<bool, GitHubError>;

    async fn collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<String, GitHubError>;

    async fn list_invitations(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Invitation>, GitHubError>;

    async fn remove_collaborator(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<(), GitHubError>;

    async fn delete_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
    ) -> Result<(), GitHubError>;
}
