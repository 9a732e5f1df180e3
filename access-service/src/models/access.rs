//! Access findings produced by a scan.

use crate::models::RepositoryRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission tier reported by GitHub.
///
/// Upstream values are opaque strings; anything unrecognised is carried
/// through untouched in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermissionLevel {
    None,
    #[default]
    Read,
    Write,
    Admin,
    Triage,
    Maintain,
    Other(String),
}

impl PermissionLevel {
    pub fn as_str(&self) -> &str {
        match self {
            PermissionLevel::None => "none",
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Admin => "admin",
            PermissionLevel::Triage => "triage",
            PermissionLevel::Maintain => "maintain",
            PermissionLevel::Other(value) => value,
        }
    }

    /// `none` means GitHub knows the user but grants nothing.
    pub fn grants_access(&self) -> bool {
        !matches!(self, PermissionLevel::None)
    }
}

impl From<String> for PermissionLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "none" => PermissionLevel::None,
            "read" => PermissionLevel::Read,
            "write" => PermissionLevel::Write,
            "admin" => PermissionLevel::Admin,
            "triage" => PermissionLevel::Triage,
            "maintain" => PermissionLevel::Maintain,
            _ => PermissionLevel::Other(value),
        }
    }
}

impl From<&str> for PermissionLevel {
    fn from(value: &str) -> Self {
        PermissionLevel::from(value.to_string())
    }
}

impl From<PermissionLevel> for String {
    fn from(value: PermissionLevel) -> Self {
        match value {
            PermissionLevel::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a user holds access to a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    /// Direct collaborator.
    Active,
    /// Pending invitation.
    Invited,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Active => "active",
            AccessStatus::Invited => "invited",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccessStatus::Active),
            "invited" => Ok(AccessStatus::Invited),
            other => Err(other.to_string()),
        }
    }
}

/// A point-in-time fact: `username` held access to a repository when scanned.
///
/// Build through [`AccessFinding::active`] or [`AccessFinding::invited`] so
/// that `invitation_id` is present exactly when the status is `invited`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessFinding {
    pub owner: String,
    pub repo: String,
    pub full_name: String,
    pub username: String,
    pub status: AccessStatus,
    pub permission: PermissionLevel,
    pub invitation_id: Option<u64>,
}

impl AccessFinding {
    pub fn active(repo: &RepositoryRef, username: &str, permission: PermissionLevel) -> Self {
        Self {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            full_name: repo.full_name.clone(),
            username: username.to_string(),
            status: AccessStatus::Active,
            permission,
            invitation_id: None,
        }
    }

    pub fn invited(
        repo: &RepositoryRef,
        username: &str,
        permission: PermissionLevel,
        invitation_id: u64,
    ) -> Self {
        Self {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            full_name: repo.full_name.clone(),
            username: username.to_string(),
            status: AccessStatus::Invited,
            permission,
            invitation_id: Some(invitation_id),
        }
    }
}
