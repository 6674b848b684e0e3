//! Core type definitions for LexBank.
//!
//! This crate defines the fundamental, format-agnostic types used throughout
//! the lexical database engine:
//! - Object identifiers (UUID v7)
//! - Writing-system handles
//!
//! All domain-specific types (entries, senses, possibility lists, relation
//! groups) belong in `lexbank-model`, not here.

mod ids;

pub use ids::{ObjectId, WsId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
