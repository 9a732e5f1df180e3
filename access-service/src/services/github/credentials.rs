use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;

pub const GITHUB_API_VERSION_HEADER: &str = "x-github-api-version";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Operator credential plus API base address.
///
/// Built once at startup and shared read-only by every scan session.
#[derive(Clone)]
pub struct CredentialContext {
    token: Option<Secret<String>>,
    api_base_url: Url,
}

impl CredentialContext {
    pub fn new(token: Option<Secret<String>>, api_base_url: &str) -> Result<Self, AppError> {
        let api_base_url = Url::parse(api_base_url).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "invalid GitHub API URL '{}': {}",
                api_base_url,
                e
            ))
        })?;

        if api_base_url.cannot_be_a_base() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GitHub API URL '{}' cannot carry path segments",
                api_base_url
            )));
        }

        if token.is_none() {
            tracing::warn!("GITHUB_TOKEN not set, all GitHub API calls will be unauthenticated");
        }

        Ok(Self {
            token,
            api_base_url,
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// Standard headers for every GitHub request.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            GITHUB_API_VERSION_HEADER,
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        if let Some(token) = &self.token {
            match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::error!("GITHUB_TOKEN contains characters not allowed in a header")
                }
            }
        }

        headers
    }

    /// Base URL extended with percent-encoded path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base_url.clone();
        // cannot_be_a_base was rejected in `new`, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl std::fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialContext")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url.as_str())
            .finish()
    }
}
