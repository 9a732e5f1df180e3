//! `reqwest` implementation of [`GitHubApi`].

use super::{CredentialContext, GitHubApi, GitHubError, Invitation, UserProfile};
use crate::config::{GitHubConfig, RateLimitConfig};
use crate::models::RepositoryRef;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use service_core::error::AppError;
use std::time::Duration;

const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";
const REPOSITORY_AFFILIATION: &str = "owner,collaborator,organization_member";

/// When to wait out a rate-limit response instead of failing the call.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub max_retries: u32,
    pub max_wait: Duration,
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            max_wait: config.max_wait,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    full_name: String,
    owner: ApiOwner,
}

impl From<ApiRepository> for RepositoryRef {
    fn from(repo: ApiRepository) -> Self {
        RepositoryRef {
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    #[serde(default)]
    permission: Option<String>,
}

#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    credentials: CredentialContext,
    rate_limit: RateLimitPolicy,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, AppError> {
        let credentials = CredentialContext::new(config.token.clone(), &config.api_base_url)?;

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("failed to build GitHub HTTP client: {}", e))
        })?;

        Ok(Self {
            http,
            credentials,
            rate_limit: RateLimitPolicy::from(&config.rate_limit),
        })
    }

    pub fn credentials(&self) -> &CredentialContext {
        &self.credentials
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Response, GitHubError> {
        let mut attempt = 0;
        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .headers(self.credentials.headers());
            if !query.is_empty() {
                request = request.query(query);
            }

            let response = request.send().await?;

            let now = chrono::Utc::now().timestamp();
            let Some(wait) = rate_limit_wait(response.status(), response.headers(), now) else {
                return Ok(response);
            };

            if attempt >= self.rate_limit.max_retries || wait > self.rate_limit.max_wait {
                tracing::warn!(
                    url = %url,
                    wait_secs = wait.as_secs(),
                    attempt,
                    "GitHub rate limit exceeded, giving up"
                );
                return Err(GitHubError::RateLimited {
                    retry_after_secs: wait.as_secs(),
                });
            }

            attempt += 1;
            tracing::warn!(
                url = %url,
                wait_secs = wait.as_secs(),
                attempt,
                "GitHub rate limit hit, waiting before retry"
            );
            tokio::time::sleep(wait).await;
        }
    }

    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Response, GitHubError> {
        self.send(Method::GET, self.credentials.endpoint(segments), query)
            .await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), GitHubError> {
        let response = self
            .send(Method::DELETE, self.credentials.endpoint(segments), &[])
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(unexpected_status(response).await)
        }
    }
}

/// How long to wait before retrying, if this response is a rate-limit rejection.
///
/// GitHub signals primary limits with `x-ratelimit-remaining: 0` and a reset
/// epoch, secondary limits with `retry-after`. Both arrive as 403 or 429.
pub(crate) fn rate_limit_wait(status: StatusCode, headers: &HeaderMap, now: i64) -> Option<Duration> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Some(secs) = header(RETRY_AFTER.as_str()).and_then(|v| v.trim().parse::<u64>().ok()) {
        return Some(Duration::from_secs(secs));
    }

    if header(RATE_LIMIT_REMAINING_HEADER).map(str::trim) == Some("0") {
        let reset = header(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(now);
        return Some(Duration::from_secs((reset - now).max(0) as u64));
    }

    None
}

async fn unexpected_status(response: Response) -> GitHubError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    GitHubError::UnexpectedStatus { status, body }
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
    if !response.status().is_success() {
        return Err(unexpected_status(response).await);
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

fn page_query(page: u32, per_page: u32) -> [(&'static str, String); 2] {
    [("per_page", per_page.to_string()), ("page", page.to_string())]
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryRef>, GitHubError> {
        let [per_page, page] = page_query(page, per_page);
        let query = [
            ("affiliation", REPOSITORY_AFFILIATION.to_string()),
            ("visibility", "all".to_string()),
            per_page,
            page,
        ];
        let response = self.get(&["user", "repos"], &query).await?;
        let repos: Vec<ApiRepository> = json_body(response).await?;
        Ok(repos.into_iter().map(RepositoryRef::from).collect())
    }

    async fn get_user(&self, login: &str) -> Result<Option<UserProfile>, GitHubError> {
        let response = self.get(&["users", login], &[]).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        json_body(response).await.map(Some)
    }

    async fn get_authenticated_user(&self) -> Result<UserProfile, GitHubError> {
        let response = self.get(&["user"], &[]).await?;
        json_body(response).await
    }

    async fn is_direct_collaborator(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<bool, GitHubError> {
        let response = self
            .get(&["repos", owner, repo, "collaborators", login], &[])
            .await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected_status(response).await),
        }
    }

    async fn collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<String, GitHubError> {
        let response = self
            .get(
                &["repos", owner, repo, "collaborators", login, "permission"],
                &[],
            )
            .await?;
        let body: PermissionResponse = json_body(response).await?;
        Ok(body.permission.unwrap_or_else(|| "read".to_string()))
    }

    async fn list_invitations(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Invitation>, GitHubError> {
        let response = self
            .get(
                &["repos", owner, repo, "invitations"],
                &page_query(page, per_page),
            )
            .await?;
        json_body(response).await
    }

    async fn remove_collaborator(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<(), GitHubError> {
        self.delete(&["repos", owner, repo, "collaborators", login])
            .await
    }

    async fn delete_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
    ) -> Result<(), GitHubError> {
        let id = invitation_id.to_string();
        self.delete(&["repos", owner, repo, "invitations", &id]).await
    }
}
