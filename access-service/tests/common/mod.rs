#![allow(dead_code)]

use access_service::config::{
    AccessConfig, CorsConfig, GitHubConfig, RateLimitConfig, RevocationConfig, ScanConfig,
};
use access_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OPERATOR: &str = "octo-admin";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub github: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(true, 500).await
    }

    pub async fn spawn_with(with_token: bool, max_batch: u64) -> Self {
        let github = MockServer::start().await;

        let config = AccessConfig {
            common: Config {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
                ..Config::default()
            },
            github: GitHubConfig {
                token: with_token.then(|| Secret::new("ghp_integration".to_string())),
                api_base_url: github.uri(),
                user_agent: "access-service-test".to_string(),
                request_timeout: Some(Duration::from_secs(5)),
                rate_limit: RateLimitConfig {
                    max_retries: 0,
                    max_wait: Duration::from_secs(1),
                },
            },
            scan: ScanConfig::default(),
            revocation: RevocationConfig { max_batch },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            github,
            client,
        }
    }

    /// Open the scan stream and collect every event until the server closes it.
    pub async fn scan(&self, username: &str) -> Vec<Value> {
        let response = self
            .client
            .get(format!("{}/user-access/stream", self.address))
            .query(&[("username", username)])
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_success());

        let body = response.text().await.expect("Failed to read stream");
        parse_events(&body)
    }

    pub async fn remove_access(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/remove-access", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn mock_user(&self, login: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/users/{}", login)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": login,
                "avatar_url": format!("https://avatars.example/{}", login),
            })))
            .mount(&self.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": OPERATOR,
                "avatar_url": "",
            })))
            .mount(&self.github)
            .await;
    }

    /// Serve `names` (all owned by `owner`) as the single page of repositories.
    pub async fn mock_repositories(&self, owner: &str, names: &[&str]) {
        let repos: Vec<Value> = names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "full_name": format!("{}/{}", owner, name),
                    "owner": { "login": owner },
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repos))
            .mount(&self.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.github)
            .await;
    }

    pub async fn mock_no_invitations(&self, owner: &str, repo: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}/invitations", owner, repo)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.github)
            .await;
    }
}

/// Extract the JSON payloads from a `text/event-stream` body.
pub fn parse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).expect("event is not JSON"))
        .collect()
}
