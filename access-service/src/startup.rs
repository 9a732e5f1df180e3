//! Application startup and lifecycle management.

use crate::config::AccessConfig;
use crate::handlers::{
    health_check, metrics_endpoint, readiness_check, remove_access, stream_user_access,
};
use crate::services::{GitHubApi, GitHubClient, RevocationExecutor, ScanOrchestrator};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    cors::cors_layer,
    metrics::metrics_middleware,
    tracing::{http_trace_layer, request_id_middleware},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AccessConfig,
    pub scanner: Arc<ScanOrchestrator>,
    pub revoker: Arc<RevocationExecutor>,
    pub has_credential: bool,
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/user-access/stream", get(stream_user_access))
        .route("/remove-access", post(remove_access))
        .layer(cors)
        .layer(from_fn(metrics_middleware))
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: AccessConfig) -> Result<Self, AppError> {
        let client = GitHubClient::new(&config.github).map_err(|e| {
            tracing::error!("Failed to initialize GitHub client: {}", e);
            e
        })?;
        let has_credential = client.credentials().has_token();
        if has_credential {
            tracing::info!(
                api = %client.credentials().api_base_url(),
                "GitHub client initialized"
            );
        } else {
            tracing::warn!("GITHUB_TOKEN not configured - scans will only see public data");
        }

        let github: Arc<dyn GitHubApi> = Arc::new(client);
        let state = AppState {
            scanner: Arc::new(ScanOrchestrator::new(github.clone(), &config.scan)),
            revoker: Arc::new(RevocationExecutor::new(github)),
            has_credential,
            config: config.clone(),
        };

        // Port 0 binds a random port for testing
        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Access service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
