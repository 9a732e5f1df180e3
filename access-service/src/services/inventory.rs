use crate::models::RepositoryRef;
use crate::services::github::{GitHubApi, GitHubError};
use std::sync::Arc;

/// Every repository the operator credential can see.
pub struct RepositoryInventory {
    github: Arc<dyn GitHubApi>,
    per_page: u32,
    page_cap: u32,
}

impl RepositoryInventory {
    pub fn new(github: Arc<dyn GitHubApi>, per_page: u32, page_cap: u32) -> Self {
        Self {
            github,
            per_page,
            page_cap,
        }
    }

    /// Fetch pages until one comes back empty or the page cap is reached.
    ///
    /// Hitting the cap truncates silently. Any failed page discards what was
    /// already fetched.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<RepositoryRef>, GitHubError> {
        let mut repos = Vec::new();

        for page in 1..=self.page_cap {
            let batch = self.github.list_repositories(page, self.per_page).await?;
            if batch.is_empty() {
                tracing::info!(total = repos.len(), "Fetched repository inventory");
                return Ok(repos);
            }
            repos.extend(batch);
        }

        tracing::info!(
            total = repos.len(),
            page_cap = self.page_cap,
            "Reached repository page cap, inventory truncated"
        );
        Ok(repos)
    }
}
