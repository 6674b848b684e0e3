//! Error types for the merge engine.
//!
//! Only fatal format errors surface as `Err`; everything else the engine can
//! encounter (bad typed values, unresolvable relations, truncation, custom
//! field mismatches, unknown content) is recorded as a diagnostic and the
//! import continues.

use thiserror::Error;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors that abort an import.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Malformed ranges or main document. Raised before any mutation for the
    /// ranges document; the driver restores the store snapshot otherwise.
    #[error("malformed input: {0}")]
    Format(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] lexbank_store::StoreError),

    /// IO error (linked-file copying).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
