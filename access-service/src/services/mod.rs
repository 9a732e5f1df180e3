pub mod github;
pub mod inventory;
pub mod metrics;
pub mod resolver;
pub mod revocation;
pub mod scanner;

pub use github::{GitHubApi, GitHubClient, GitHubError};
pub use inventory::RepositoryInventory;
pub use metrics::{get_metrics, init_metrics};
pub use resolver::AccessResolver;
pub use revocation::RevocationExecutor;
pub use scanner::{ScanError, ScanOrchestrator, ScanSession};
