//! Share manager for co-present peer devices.
//!
//! A peer-device share is relayed to a nearby device over NFC or Bluetooth
//! and requires an interactive acknowledgment on the receiving side. The
//! radio plumbing lives outside this crate, so every operation reports the
//! custody type as not implemented.

use async_trait::async_trait;

use svalbard_proto::{LocationType, ShareLocation};

use crate::error::ClientError;
use crate::manager::ShareManager;

pub struct PeerDeviceShareManager;

fn check_location(location: &ShareLocation) -> Result<(), ClientError> {
    if location.location_type() != LocationType::PeerDevice {
        return Err(ClientError::WrongLocationType(location.location_type()));
    }
    Ok(())
}

#[async_trait]
impl ShareManager for PeerDeviceShareManager {
    async fn store_share(
        &self,
        _secret_name: &str,
        _share_value: &[u8],
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        check_location(location)?;
        Err(ClientError::NotImplemented("peer-device"))
    }

    async fn retrieve_share(
        &self,
        _secret_name: &str,
        location: &ShareLocation,
    ) -> Result<Vec<u8>, ClientError> {
        check_location(location)?;
        Err(ClientError::NotImplemented("peer-device"))
    }

    async fn delete_share(
        &self,
        _secret_name: &str,
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        check_location(location)?;
        Err(ClientError::NotImplemented("peer-device"))
    }
}
