//! Opaque key→value storage for shares.
//!
//! A share store maps share ids to the share values the server received,
//! with create-only-if-absent semantics: storing over an existing id is an
//! error, and deletion is always explicit. The server treats share values
//! as opaque strings; it neither decodes nor inspects them.

mod durable;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use durable::SledShareStore;
pub use memory::MemoryShareStore;

/// Errors returned by share-store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareStoreError {
    #[error("invalid share_id")]
    InvalidShareId,
    #[error("invalid share_value")]
    InvalidShareValue,
    #[error("share already exists")]
    AlreadyExists,
    #[error("share not found")]
    NotFound,
    #[error("share store failure: {0}")]
    Backend(String),
}

/// The storage contract shared by all backends.
#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Stores `share_value` under `share_id`. Fails with `AlreadyExists`
    /// when the id is already taken.
    async fn store(&self, share_id: &str, share_value: &str) -> Result<(), ShareStoreError>;

    /// Returns the value stored under `share_id`.
    async fn retrieve(&self, share_id: &str) -> Result<String, ShareStoreError>;

    /// Removes the share stored under `share_id`.
    async fn delete(&self, share_id: &str) -> Result<(), ShareStoreError>;
}

fn validate_share_id(share_id: &str) -> Result<(), ShareStoreError> {
    if share_id.is_empty() {
        return Err(ShareStoreError::InvalidShareId);
    }
    Ok(())
}

fn validate_share_value(share_value: &str) -> Result<(), ShareStoreError> {
    if share_value.is_empty() {
        return Err(ShareStoreError::InvalidShareValue);
    }
    Ok(())
}
