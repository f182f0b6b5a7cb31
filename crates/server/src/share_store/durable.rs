//! Durable share store on top of sled.
//!
//! Each operation is a single atomic tree op; create-only-if-absent is a
//! compare-and-swap against an absent key, and mutations are flushed before
//! the result is reported so an acknowledged share survives a crash.

use std::path::Path;

use async_trait::async_trait;

use super::{validate_share_id, validate_share_value, ShareStore, ShareStoreError};

/// A [`ShareStore`] persisting shares in a sled database file.
pub struct SledShareStore {
    db: sled::Db,
}

impl SledShareStore {
    /// Opens the database at `path`, creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ShareStoreError> {
        let db = sled::open(path).map_err(backend)?;
        Ok(Self { db })
    }
}

fn backend(err: sled::Error) -> ShareStoreError {
    ShareStoreError::Backend(err.to_string())
}

#[async_trait]
impl ShareStore for SledShareStore {
    async fn store(&self, share_id: &str, share_value: &str) -> Result<(), ShareStoreError> {
        validate_share_id(share_id)?;
        validate_share_value(share_value)?;
        let swap = self
            .db
            .compare_and_swap(
                share_id,
                None as Option<&[u8]>,
                Some(share_value.as_bytes()),
            )
            .map_err(backend)?;
        if swap.is_err() {
            return Err(ShareStoreError::AlreadyExists);
        }
        self.db.flush_async().await.map_err(backend)?;
        Ok(())
    }

    async fn retrieve(&self, share_id: &str) -> Result<String, ShareStoreError> {
        validate_share_id(share_id)?;
        let value = self
            .db
            .get(share_id)
            .map_err(backend)?
            .ok_or(ShareStoreError::NotFound)?;
        String::from_utf8(value.to_vec())
            .map_err(|_| ShareStoreError::Backend("stored share is not valid UTF-8".to_string()))
    }

    async fn delete(&self, share_id: &str) -> Result<(), ShareStoreError> {
        validate_share_id(share_id)?;
        // remove returns the previous value, which doubles as the existence
        // check.
        let previous = self.db.remove(share_id).map_err(backend)?;
        if previous.is_none() {
            return Err(ShareStoreError::NotFound);
        }
        self.db.flush_async().await.map_err(backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_retrieve_delete() {
        let dir = tempdir().unwrap();
        let store = SledShareStore::open(dir.path().join("shares.db")).unwrap();

        store.store("id1", "share one").await.unwrap();
        assert_eq!(store.retrieve("id1").await.unwrap(), "share one");
        assert_eq!(
            store.store("id1", "other").await,
            Err(ShareStoreError::AlreadyExists)
        );

        store.delete("id1").await.unwrap();
        assert_eq!(store.retrieve("id1").await, Err(ShareStoreError::NotFound));
        assert_eq!(store.delete("id1").await, Err(ShareStoreError::NotFound));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let dir = tempdir().unwrap();
        let store = SledShareStore::open(dir.path().join("shares.db")).unwrap();
        assert_eq!(
            store.store("", "value").await,
            Err(ShareStoreError::InvalidShareId)
        );
        assert_eq!(
            store.store("id", "").await,
            Err(ShareStoreError::InvalidShareValue)
        );
        assert_eq!(
            store.retrieve("").await,
            Err(ShareStoreError::InvalidShareId)
        );
        assert_eq!(store.delete("").await, Err(ShareStoreError::InvalidShareId));
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shares.db");
        {
            let store = SledShareStore::open(&path).unwrap();
            store.store("id1", "share one").await.unwrap();
            store.store("id2", "share two").await.unwrap();
            store.delete("id2").await.unwrap();
        }
        let store = SledShareStore::open(&path).unwrap();
        assert_eq!(store.retrieve("id1").await.unwrap(), "share one");
        assert_eq!(store.retrieve("id2").await, Err(ShareStoreError::NotFound));
    }
}
