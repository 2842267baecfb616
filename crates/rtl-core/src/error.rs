//! Error types for enabled-flag storage.

use thiserror::Error;

/// Errors reported by an [`crate::EnabledStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing storage cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded.
    #[error("stored preferences are malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
