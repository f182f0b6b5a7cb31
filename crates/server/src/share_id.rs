//! Share-id derivation.
//!
//! A share id is the server-side key for a stored share. It is derived
//! deterministically from the owner-facing names but is not reversible, so
//! the share store never sees who owns a share or what it is called.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors returned for missing request fields; the messages double as HTTP
/// response bodies and must not quote any field values.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShareIdError {
    #[error("missing owner_id_type")]
    MissingOwnerIdType,
    #[error("missing owner_id")]
    MissingOwnerId,
    #[error("missing secret_name")]
    MissingSecretName,
}

/// Derives the share id for the given parameters, all of which must be
/// non-empty: the lowercase hex SHA-256 of the bracket-delimited
/// concatenation `[owner_id_type][owner_id][secret_name]`.
pub fn get_share_id(
    owner_id_type: &str,
    owner_id: &str,
    secret_name: &str,
) -> Result<String, ShareIdError> {
    if owner_id_type.is_empty() {
        return Err(ShareIdError::MissingOwnerIdType);
    }
    if owner_id.is_empty() {
        return Err(ShareIdError::MissingOwnerId);
    }
    if secret_name.is_empty() {
        return Err(ShareIdError::MissingSecretName);
    }
    let to_hash = format!("[{}][{}][{}]", owner_id_type, owner_id, secret_name);
    Ok(hex::encode(Sha256::digest(to_hash.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            get_share_id("a", "b", "c").unwrap(),
            "e998ba073ec38976e56156523126e98679eb916063d8cb5f1d9bd8193467dc25"
        );
        assert_eq!(
            get_share_id("abc", "xyz", "efg").unwrap(),
            "7d97f68401fb8217b4beab14598eb88af5b5ab8c4282731a67b464ad47e2793b"
        );
    }

    #[test]
    fn test_deterministic_and_distinct() {
        let id1 = get_share_id("FILE", "Tom", "Gmail key").unwrap();
        let id2 = get_share_id("FILE", "Tom", "Gmail key").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 64);

        // The bracket delimiters keep adjacent fields from bleeding into
        // each other.
        assert_ne!(
            get_share_id("FILE", "TomG", "mail key").unwrap(),
            get_share_id("FILE", "Tom", "Gmail key").unwrap()
        );
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            get_share_id("", "b", "c"),
            Err(ShareIdError::MissingOwnerIdType)
        );
        assert_eq!(get_share_id("a", "", "c"), Err(ShareIdError::MissingOwnerId));
        assert_eq!(
            get_share_id("a", "b", ""),
            Err(ShareIdError::MissingSecretName)
        );
    }
}
