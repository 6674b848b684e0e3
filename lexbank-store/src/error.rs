//! Error types for the store layer.

use lexbank_model::ObjectClass;
use lexbank_types::ObjectId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Object exists but has the wrong class for the operation.
    #[error("object {id} is a {actual:?}, expected {expected:?}")]
    WrongClass {
        id: ObjectId,
        expected: ObjectClass,
        actual: ObjectClass,
    },

    /// A list with the same external key already exists.
    #[error("duplicate possibility list: {0}")]
    DuplicateList(String),
}
