//! In-memory [`GitHubApi`] for unit tests.

use super::{GitHubApi, GitHubError, Invitation, Invitee, UserProfile};
use crate::models::RepositoryRef;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Scripted answer for a collaborator probe or a delete.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok,
    Status(u16),
}

impl Reply {
    fn into_result(self) -> Result<(), GitHubError> {
        match self {
            Reply::Ok => Ok(()),
            Reply::Status(status) => Err(GitHubError::UnexpectedStatus {
                status,
                body: format!("{{\"message\":\"status {}\"}}", status),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeGitHub {
    pub repo_pages: Vec<Vec<RepositoryRef>>,
    /// Serve this page forever once `repo_pages` runs out.
    pub endless_repo_page: Option<Vec<RepositoryRef>>,
    pub repo_failure_on_page: Option<u32>,
    pub users: HashMap<String, UserProfile>,
    pub operator: Option<UserProfile>,
    pub user_lookup_fails: bool,
    /// full_name -> probe reply; missing means 404.
    pub collaborators: HashMap<String, Reply>,
    /// full_name -> permission; missing means the lookup fails.
    pub permissions: HashMap<String, String>,
    /// full_name -> invitation pages.
    pub invitation_pages: HashMap<String, Vec<Vec<Invitation>>>,
    pub endless_invitation_page: Option<Vec<Invitation>>,
    pub invitation_failures: Vec<String>,
    /// "owner/repo" -> reply for deletes; missing means 204.
    pub delete_replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, login: &str) -> Self {
        self.users.insert(
            login.to_lowercase(),
            UserProfile {
                login: login.to_string(),
                avatar_url: format!("https://avatars.example/{}", login),
            },
        );
        self
    }

    pub fn with_operator(mut self, login: &str) -> Self {
        self.operator = Some(UserProfile {
            login: login.to_string(),
            avatar_url: String::new(),
        });
        self
    }

    pub fn with_repos(mut self, repos: Vec<RepositoryRef>) -> Self {
        self.repo_pages.push(repos);
        self
    }

    pub fn with_collaborator(mut self, full_name: &str, permission: Option<&str>) -> Self {
        self.collaborators.insert(full_name.to_string(), Reply::Ok);
        if let Some(permission) = permission {
            self.permissions
                .insert(full_name.to_string(), permission.to_string());
        }
        self
    }

    pub fn with_invitation(mut self, full_name: &str, id: u64, login: &str) -> Self {
        self.invitation_pages
            .entry(full_name.to_string())
            .or_default()
            .push(vec![invitation(id, login)]);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn invitation(id: u64, login: &str) -> Invitation {
    Invitation {
        id,
        invitee: Some(Invitee {
            login: login.to_string(),
        }),
        permissions: Some("write".to_string()),
    }
}

fn page_of<T: Clone>(pages: &[Vec<T>], endless: &Option<Vec<T>>, page: u32) -> Vec<T> {
    pages
        .get(page as usize - 1)
        .cloned()
        .or_else(|| endless.clone())
        .unwrap_or_default()
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn list_repositories(
        &self,
        page: u32,
        _per_page: u32,
    ) -> Result<Vec<RepositoryRef>, GitHubError> {
        self.record(format!("list_repositories:{}", page));
        if self.repo_failure_on_page == Some(page) {
            return Err(GitHubError::UnexpectedStatus {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(page_of(&self.repo_pages, &self.endless_repo_page, page))
    }

    async fn get_user(&self, login: &str) -> Result<Option<UserProfile>, GitHubError> {
        self.record(format!("get_user:{}", login));
        if self.user_lookup_fails {
            return Err(GitHubError::UnexpectedStatus {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(self.users.get(&login.to_lowercase()).cloned())
    }

    async fn get_authenticated_user(&self) -> Result<UserProfile, GitHubError> {
        self.record("get_authenticated_user".to_string());
        self.operator.clone().ok_or(GitHubError::UnexpectedStatus {
            status: 401,
            body: "Bad credentials".to_string(),
        })
    }

    async fn is_direct_collaborator(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<bool, GitHubError> {
        let full_name = format!("{}/{}", owner, repo);
        self.record(format!("is_direct_collaborator:{}:{}", full_name, login));
        match self.collaborators.get(&full_name) {
            Some(Reply::Ok) => Ok(true),
            Some(Reply::Status(404)) | None => Ok(false),
            Some(reply) => reply.into_result().map(|_| false),
        }
    }

    async fn collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<String, GitHubError> {
        let full_name = format!("{}/{}", owner, repo);
        self.record(format!("collaborator_permission:{}:{}", full_name, login));
        self.permissions
            .get(&full_name)
            .cloned()
            .ok_or(GitHubError::UnexpectedStatus {
                status: 500,
                body: "permission lookup failed".to_string(),
            })
    }

    async fn list_invitations(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        _per_page: u32,
    ) -> Result<Vec<Invitation>, GitHubError> {
        let full_name = format!("{}/{}", owner, repo);
        self.record(format!("list_invitations:{}:{}", full_name, page));
        if self.invitation_failures.contains(&full_name) {
            return Err(GitHubError::UnexpectedStatus {
                status: 403,
                body: "Must have admin rights".to_string(),
            });
        }
        let pages = self
            .invitation_pages
            .get(&full_name)
            .cloned()
            .unwrap_or_default();
        Ok(page_of(&pages, &self.endless_invitation_page, page))
    }

    async fn remove_collaborator(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<(), GitHubError> {
        let full_name = format!("{}/{}", owner, repo);
        self.record(format!("remove_collaborator:{}:{}", full_name, login));
        self.delete_replies
            .get(&full_name)
            .copied()
            .unwrap_or(Reply::Ok)
            .into_result()
    }

    async fn delete_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
    ) -> Result<(), GitHubError> {
        let full_name = format!("{}/{}", owner, repo);
        self.record(format!("delete_invitation:{}:{}", full_name, invitation_id));
        self.delete_replies
            .get(&full_name)
            .copied()
            .unwrap_or(Reply::Ok)
            .into_result()
    }
}
