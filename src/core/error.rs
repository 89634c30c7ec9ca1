use thiserror::Error;

use super::types::DebtId;

/// Failures reported by the store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("debt {id} not found")]
    NotFound { id: DebtId },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
