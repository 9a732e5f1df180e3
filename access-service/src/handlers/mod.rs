//! HTTP handlers for access-service.

pub mod health;
pub mod metrics;
pub mod revoke;
pub mod scan;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_endpoint;
pub use revoke::remove_access;
pub use scan::stream_user_access;
