use serde::Serialize;

/// One per-asset step that failed inside a non-transactional batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// Inventory code of the asset whose step failed.
    pub inventory_code: String,
    /// Name of the failing step (e.g. `"append_custody_record"`).
    pub step: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with key {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error during {step}: {message}")]
    Store { step: &'static str, message: String },

    #[error("Partial commit of {folio}: {} succeeded, {} failed", succeeded.len(), failed.len())]
    PartialCommit {
        folio: String,
        succeeded: Vec<String>,
        failed: Vec<StepFailure>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}
