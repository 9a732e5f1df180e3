use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

/// One caller-approved removal, usually echoed back from a `found` event.
///
/// `status` stays a plain string so unknown values can be reported per item
/// instead of rejecting the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationItem {
    pub owner: String,
    pub repo: String,
    pub username: String,
    pub status: String,
    #[serde(default)]
    pub invitation_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveAccessRequest {
    pub repos: Vec<RevocationItem>,
}

impl RemoveAccessRequest {
    pub fn validate_batch(&self, max_batch: u64) -> Result<(), ValidationErrors> {
        if self.repos.len() as u64 > max_batch {
            let mut errors = ValidationErrors::new();
            errors.add(
                "repos",
                ValidationError::new("max_batch").with_message(Cow::Owned(format!(
                    "at most {} items per request, got {}",
                    max_batch,
                    self.repos.len()
                ))),
            );
            return Err(errors);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationOutcome {
    pub owner: String,
    pub repo: String,
    pub success: bool,
    pub message: String,
}

impl RevocationOutcome {
    pub fn success(item: &RevocationItem, message: String) -> Self {
        Self {
            owner: item.owner.clone(),
            repo: item.repo.clone(),
            success: true,
            message,
        }
    }

    pub fn failure(item: &RevocationItem, message: String) -> Self {
        Self {
            owner: item.owner.clone(),
            repo: item.repo.clone(),
            success: false,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveAccessResponse {
    pub results: Vec<RevocationOutcome>,
}
