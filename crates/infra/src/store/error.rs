use thiserror::Error;

use outpost_core::DomainError;

/// Failure of a store operation.
///
/// Domain rejections (validation, insufficient stock) pass through
/// unchanged so callers can map them the same way regardless of backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The stock ledger could not commit the item update together with its
    /// protocol entry; neither was applied.
    #[error("ledger commit failed: {0}")]
    CommitFailed(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub(crate) fn poisoned() -> Self {
        Self::Backend("lock poisoned".to_string())
    }
}
