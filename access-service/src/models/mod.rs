pub mod access;
pub mod events;
pub mod repository;
pub mod revocation;

pub use access::{AccessFinding, AccessStatus, PermissionLevel};
pub use events::ScanEvent;
pub use repository::RepositoryRef;
pub use revocation::{RemoveAccessRequest, RemoveAccessResponse, RevocationItem, RevocationOutcome};
