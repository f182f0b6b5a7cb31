//! Share manager for printed copies.
//!
//! A printed copy is a physical artifact (QR code, OCR-friendly Base32/64
//! text, or similar) rendered from the share bytes; retrieval requires a
//! human to scan or re-enter it. This build contains no rendering or
//! capture pipeline, so every operation reports the custody type as not
//! implemented.

use async_trait::async_trait;

use svalbard_proto::{LocationType, ShareLocation};

use crate::error::ClientError;
use crate::manager::ShareManager;

pub struct PrintedShareManager;

fn check_location(location: &ShareLocation) -> Result<(), ClientError> {
    if location.location_type() != LocationType::PrintedCopy {
        return Err(ClientError::WrongLocationType(location.location_type()));
    }
    Ok(())
}

#[async_trait]
impl ShareManager for PrintedShareManager {
    async fn store_share(
        &self,
        _secret_name: &str,
        _share_value: &[u8],
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        check_location(location)?;
        Err(ClientError::NotImplemented("printed-copy"))
    }

    async fn retrieve_share(
        &self,
        _secret_name: &str,
        location: &ShareLocation,
    ) -> Result<Vec<u8>, ClientError> {
        check_location(location)?;
        Err(ClientError::NotImplemented("printed-copy"))
    }

    async fn delete_share(
        &self,
        _secret_name: &str,
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        check_location(location)?;
        Err(ClientError::NotImplemented("printed-copy"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_not_implemented() {
        let location = ShareLocation {
            location_type: LocationType::PrintedCopy as i32,
            location_name: "desk drawer".to_string(),
            owner_id_type: "FILE".to_string(),
            owner_id: "Tom".to_string(),
        };
        let manager = PrintedShareManager;
        assert!(matches!(
            manager.store_share("name", b"share", &location).await,
            Err(ClientError::NotImplemented(_))
        ));
        assert!(matches!(
            manager.retrieve_share("name", &location).await,
            Err(ClientError::NotImplemented(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_other_location_types() {
        let location = ShareLocation {
            location_type: LocationType::SvalbardServer as i32,
            location_name: "https://svalbard.example.com".to_string(),
            owner_id_type: "FILE".to_string(),
            owner_id: "Tom".to_string(),
        };
        assert!(matches!(
            PrintedShareManager.store_share("name", b"share", &location).await,
            Err(ClientError::WrongLocationType(_))
        ));
    }
}
