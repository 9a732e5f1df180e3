use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub github: GitHubConfig,
    pub scan: ScanConfig,
    pub revocation: RevocationConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// Operator credential. Absent means every upstream call is anonymous
    /// and will fail on anything beyond public data.
    pub token: Option<Secret<String>>,
    pub api_base_url: String,
    pub user_agent: String,
    /// Optional per-call deadline. No deadline is applied when unset.
    pub request_timeout: Option<Duration>,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// How many times a rate-limited request is retried after waiting.
    pub max_retries: u32,
    /// Longest wait the client accepts before giving up on a retry.
    pub max_wait: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub per_page: u32,
    /// Safety bound on repository pages; results beyond it are truncated.
    pub inventory_page_cap: u32,
    pub invitation_page_cap: u32,
    /// Capacity of the channel between the scan task and the event stream.
    pub event_buffer: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            inventory_page_cap: 20,
            invitation_page_cap: 10,
            event_buffer: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevocationConfig {
    pub max_batch: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl AccessConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let token = match env::var("GITHUB_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Some(Secret::new(token.trim().to_string())),
            _ if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "GITHUB_TOKEN is required in production but not set"
                )));
            }
            _ => None,
        };

        let scan_defaults = ScanConfig::default();

        Ok(AccessConfig {
            common: common_config,
            github: GitHubConfig {
                token,
                api_base_url: get_env("GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
                user_agent: get_env("GITHUB_USER_AGENT", "access-service"),
                request_timeout: env::var("GITHUB_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .map(|v| parse_env("GITHUB_REQUEST_TIMEOUT_SECS", &v))
                    .transpose()?
                    .map(Duration::from_secs),
                rate_limit: RateLimitConfig {
                    max_retries: get_parsed("GITHUB_RATE_LIMIT_MAX_RETRIES", 1)?,
                    max_wait: Duration::from_secs(get_parsed(
                        "GITHUB_RATE_LIMIT_MAX_WAIT_SECS",
                        60,
                    )?),
                },
            },
            scan: ScanConfig {
                per_page: get_parsed("SCAN_PER_PAGE", scan_defaults.per_page)?,
                inventory_page_cap: get_parsed(
                    "SCAN_INVENTORY_PAGE_CAP",
                    scan_defaults.inventory_page_cap,
                )?,
                invitation_page_cap: get_parsed(
                    "SCAN_INVITATION_PAGE_CAP",
                    scan_defaults.invitation_page_cap,
                )?,
                event_buffer: get_parsed("SCAN_EVENT_BUFFER", scan_defaults.event_buffer)?,
            },
            revocation: RevocationConfig {
                max_batch: get_parsed("REVOCATION_MAX_BATCH", 500)?,
            },
            cors: CorsConfig {
                allowed_origins: get_env("CORS_ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            },
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => parse_env(key, &val),
        Err(_) => Ok(default),
    }
}

fn parse_env<T>(key: &str, val: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    val.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, val, e))
    })
}
