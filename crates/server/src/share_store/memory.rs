//! In-memory share store, intended for testing only.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_share_id, validate_share_value, ShareStore, ShareStoreError};

/// A [`ShareStore`] backed by an in-memory map. Nothing survives a restart;
/// use [`super::SledShareStore`] outside of tests.
#[derive(Default)]
pub struct MemoryShareStore {
    store: RwLock<HashMap<String, String>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn store(&self, share_id: &str, share_value: &str) -> Result<(), ShareStoreError> {
        validate_share_id(share_id)?;
        validate_share_value(share_value)?;
        let mut store = self.store.write().await;
        if store.contains_key(share_id) {
            return Err(ShareStoreError::AlreadyExists);
        }
        store.insert(share_id.to_owned(), share_value.to_owned());
        Ok(())
    }

    async fn retrieve(&self, share_id: &str) -> Result<String, ShareStoreError> {
        validate_share_id(share_id)?;
        self.store
            .read()
            .await
            .get(share_id)
            .cloned()
            .ok_or(ShareStoreError::NotFound)
    }

    async fn delete(&self, share_id: &str) -> Result<(), ShareStoreError> {
        validate_share_id(share_id)?;
        self.store
            .write()
            .await
            .remove(share_id)
            .map(|_| ())
            .ok_or(ShareStoreError::NotFound)
    }
}
