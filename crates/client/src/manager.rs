//! The share-manager capability and its registry.
//!
//! A share manager knows how to keep shares in one custody type. The client
//! is polymorphic over managers through a registry keyed by location type;
//! supporting a new custody type is one `register` call.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use svalbard_proto::{LocationType, ShareLocation};

use crate::error::ClientError;

/// Manages shares of one custody type.
#[async_trait]
pub trait ShareManager: Send + Sync {
    /// Stores `share_value` at `location`, labeled with `secret_name`.
    async fn store_share(
        &self,
        secret_name: &str,
        share_value: &[u8],
        location: &ShareLocation,
    ) -> Result<(), ClientError>;

    /// Retrieves from `location` the share belonging to `secret_name`.
    async fn retrieve_share(
        &self,
        secret_name: &str,
        location: &ShareLocation,
    ) -> Result<Vec<u8>, ClientError>;

    /// Deletes at `location` the share belonging to `secret_name`.
    async fn delete_share(
        &self,
        secret_name: &str,
        location: &ShareLocation,
    ) -> Result<(), ClientError>;
}

/// Maps location types to the managers serving them.
#[derive(Clone, Default)]
pub struct ShareManagerRegistry {
    managers: HashMap<LocationType, Arc<dyn ShareManager>>,
}

impl ShareManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `manager` for `location_type`, replacing any previous
    /// entry.
    pub fn register(&mut self, location_type: LocationType, manager: Arc<dyn ShareManager>) {
        self.managers.insert(location_type, manager);
    }

    /// Resolves the manager for `location_type`.
    pub fn get(&self, location_type: LocationType) -> Result<Arc<dyn ShareManager>, ClientError> {
        self.managers
            .get(&location_type)
            .cloned()
            .ok_or(ClientError::UnsupportedLocationType(location_type))
    }
}
