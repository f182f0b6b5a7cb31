//! End-to-end tests of the sharing and recovery pipelines against a fake
//! fleet of custodians that can be taken down, restarted, and corrupted.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use svalbard_client::error::ClientError;
use svalbard_client::manager::{ShareManager, ShareManagerRegistry};
use svalbard_client::printed::PrintedShareManager;
use svalbard_client::{SvalbardClient, HASH_SALT_SIZE};
use svalbard_proto::{LocationType, ShareLocation};

/// A fleet of fake custody servers, keyed by location name. Each "server"
/// stores shares under (location name, secret name) and can be taken down
/// or have its stored bytes corrupted.
#[derive(Default)]
struct FakeFleet {
    shares: Mutex<HashMap<(String, String), Vec<u8>>>,
    down: Mutex<HashSet<String>>,
}

impl FakeFleet {
    fn take_down(&self, location_name: &str) {
        self.down.lock().unwrap().insert(location_name.to_string());
    }

    fn restart(&self, location_name: &str) {
        self.down.lock().unwrap().remove(location_name);
    }

    fn flip_bit(&self, location_name: &str, secret_name: &str, byte: usize, bit: u8) {
        let mut shares = self.shares.lock().unwrap();
        let value = shares
            .get_mut(&(location_name.to_string(), secret_name.to_string()))
            .expect("no such share");
        value[byte] ^= 1 << bit;
    }

    fn check_up(&self, location_name: &str) -> Result<(), ClientError> {
        if self.down.lock().unwrap().contains(location_name) {
            return Err(ClientError::Transport(format!(
                "{location_name}: connection refused"
            )));
        }
        Ok(())
    }
}

/// A ShareManager driving the fake fleet, standing in for the server
/// manager and its token dance.
struct FleetManager {
    fleet: Arc<FakeFleet>,
}

#[async_trait]
impl ShareManager for FleetManager {
    async fn store_share(
        &self,
        secret_name: &str,
        share_value: &[u8],
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        self.fleet.check_up(&location.location_name)?;
        let key = (location.location_name.clone(), secret_name.to_string());
        let mut shares = self.fleet.shares.lock().unwrap();
        if shares.contains_key(&key) {
            return Err(ClientError::Transport("share already exists".to_string()));
        }
        shares.insert(key, share_value.to_vec());
        Ok(())
    }

    async fn retrieve_share(
        &self,
        secret_name: &str,
        location: &ShareLocation,
    ) -> Result<Vec<u8>, ClientError> {
        self.fleet.check_up(&location.location_name)?;
        self.fleet
            .shares
            .lock()
            .unwrap()
            .get(&(location.location_name.clone(), secret_name.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::Transport("share not found".to_string()))
    }

    async fn delete_share(
        &self,
        secret_name: &str,
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        self.fleet.check_up(&location.location_name)?;
        self.fleet
            .shares
            .lock()
            .unwrap()
            .remove(&(location.location_name.clone(), secret_name.to_string()))
            .map(|_| ())
            .ok_or_else(|| ClientError::Transport("share not found".to_string()))
    }
}

fn server_location(name: &str) -> ShareLocation {
    ShareLocation {
        location_type: LocationType::SvalbardServer as i32,
        location_name: format!("https://{name}.svalbard.example.com"),
        owner_id_type: "FILE".to_string(),
        owner_id: "Tom".to_string(),
    }
}

fn fleet_client(fleet: &Arc<FakeFleet>) -> SvalbardClient {
    let mut registry = ShareManagerRegistry::new();
    registry.register(
        LocationType::SvalbardServer,
        Arc::new(FleetManager {
            fleet: Arc::clone(fleet),
        }),
    );
    registry.register(LocationType::PrintedCopy, Arc::new(PrintedShareManager));
    SvalbardClient::new(registry)
}

fn five_servers() -> Vec<ShareLocation> {
    (1..=5)
        .map(|i| server_location(&format!("server{i}")))
        .collect()
}

fn verified_count(result: &svalbard_client::RecoveryResult) -> usize {
    result
        .share_data_list
        .iter()
        .filter(|share_data| share_data.failure.is_none())
        .count()
}

#[tokio::test]
async fn share_and_recover_roundtrip() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);
    let secret = b"SomeSecretValue";
    let locations = five_servers();

    let sharing = client
        .share("Gmail key", secret, 3, 5, &locations)
        .await
        .unwrap();
    assert!(sharing.shares_to_be_stored.is_empty());
    assert_eq!(sharing.metadata.share_metadata.len(), 5);
    assert_eq!(sharing.metadata.secret_mask.len(), secret.len());
    assert_eq!(sharing.metadata.hash_salt.len(), HASH_SALT_SIZE);
    assert_eq!(sharing.metadata.secret_name, "Gmail key");
    // The metadata lists shares in the supplied location order.
    for (share_metadata, location) in sharing.metadata.share_metadata.iter().zip(&locations) {
        assert_eq!(share_metadata.location.as_ref().unwrap(), location);
        assert_eq!(share_metadata.share_hash.len(), 32);
    }
    // The mask alone tells nothing: it never equals the secret (up to
    // astronomical luck) and the metadata carries the secret only masked.
    assert_ne!(sharing.metadata.secret_mask.as_slice(), secret.as_slice());

    let recovery = client.recover(&sharing.metadata).await.unwrap();
    assert_eq!(recovery.secret, secret);
    assert_eq!(verified_count(&recovery), 5);
}

/// The full 3-of-5 scenario: custodians go down one by one, recovery keeps
/// working until fewer than k remain, and resumes when one comes back.
#[tokio::test]
async fn three_of_five_with_failing_servers() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);
    let secret = b"SomeSecretValue";

    let sharing = client
        .share("Gmail key", secret, 3, 5, &five_servers())
        .await
        .unwrap();
    let stored = 5 - sharing.shares_to_be_stored.len();
    assert_eq!(stored, 5);

    fleet.take_down("https://server2.svalbard.example.com");
    fleet.take_down("https://server4.svalbard.example.com");
    let recovery = client.recover(&sharing.metadata).await.unwrap();
    assert_eq!(recovery.secret, secret);
    assert_eq!(verified_count(&recovery), 3);

    fleet.take_down("https://server5.svalbard.example.com");
    let err = client.recover(&sharing.metadata).await.unwrap_err();
    assert!(matches!(err, ClientError::TooFewShares), "{err}");

    fleet.restart("https://server4.svalbard.example.com");
    let recovery = client.recover(&sharing.metadata).await.unwrap();
    assert_eq!(recovery.secret, secret);
    assert_eq!(verified_count(&recovery), 3);
}

#[tokio::test]
async fn failed_stores_are_reported_not_fatal() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);
    fleet.take_down("https://server1.svalbard.example.com");
    fleet.take_down("https://server3.svalbard.example.com");

    let sharing = client
        .share("Gmail key", b"SomeSecretValue", 3, 5, &five_servers())
        .await
        .unwrap();
    // The sharing succeeds; the two unstored shares are handed back with
    // their bytes so the caller can place them by other means.
    assert_eq!(sharing.shares_to_be_stored.len(), 2);
    for share_data in &sharing.shares_to_be_stored {
        assert!(share_data.failure.is_some());
        assert!(share_data.value.is_some());
    }
    assert_eq!(sharing.metadata.share_metadata.len(), 5);

    // The three stored shares are exactly enough.
    let recovery = client.recover(&sharing.metadata).await.unwrap();
    assert_eq!(recovery.secret, b"SomeSecretValue");
    assert_eq!(verified_count(&recovery), 3);
}

#[tokio::test]
async fn unstorable_custody_types_are_reported() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);
    let mut locations = five_servers();
    locations[4] = ShareLocation {
        location_type: LocationType::PrintedCopy as i32,
        location_name: "desk drawer".to_string(),
        owner_id_type: "FILE".to_string(),
        owner_id: "Tom".to_string(),
    };
    locations[3] = ShareLocation {
        location_type: LocationType::PeerDevice as i32,
        location_name: "Tom's phone".to_string(),
        owner_id_type: "FILE".to_string(),
        owner_id: "Tom".to_string(),
    };

    let sharing = client
        .share("Gmail key", b"SomeSecretValue", 3, 5, &locations)
        .await
        .unwrap();
    // The printed copy is not implemented, the peer device has no manager
    // registered; both shares come back for manual placement.
    assert_eq!(sharing.shares_to_be_stored.len(), 2);
    let failures: Vec<String> = sharing
        .shares_to_be_stored
        .iter()
        .map(|share_data| share_data.failure.as_ref().unwrap().to_string())
        .collect();
    assert!(failures.iter().any(|f| f.contains("not implemented")));
    assert!(failures.iter().any(|f| f.contains("unsupported location type")));

    let recovery = client.recover(&sharing.metadata).await.unwrap();
    assert_eq!(recovery.secret, b"SomeSecretValue");
}

#[tokio::test]
async fn corrupted_share_is_excluded_by_its_hash() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);
    let secret = b"SomeSecretValue";

    let sharing = client
        .share("Gmail key", secret, 3, 5, &five_servers())
        .await
        .unwrap();

    fleet.flip_bit("https://server1.svalbard.example.com", "Gmail key", 3, 5);
    let recovery = client.recover(&sharing.metadata).await.unwrap();
    assert_eq!(recovery.secret, secret);
    assert_eq!(verified_count(&recovery), 4);
    let corrupted = recovery
        .share_data_list
        .iter()
        .find(|share_data| share_data.failure.is_some())
        .unwrap();
    assert!(matches!(
        corrupted.failure,
        Some(ClientError::IncorrectHash)
    ));

    // With three of five shares corrupted, fewer than k survive.
    fleet.flip_bit("https://server2.svalbard.example.com", "Gmail key", 0, 0);
    fleet.flip_bit("https://server3.svalbard.example.com", "Gmail key", 9, 7);
    let err = client.recover(&sharing.metadata).await.unwrap_err();
    assert!(matches!(err, ClientError::TooFewShares));
}

#[tokio::test]
async fn corrupted_mask_fails_the_final_hash() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);

    let sharing = client
        .share("Gmail key", b"SomeSecretValue", 3, 5, &five_servers())
        .await
        .unwrap();

    let mut tampered = sharing.metadata.clone();
    tampered.secret_mask[2] ^= 0x10;
    let err = client.recover(&tampered).await.unwrap_err();
    assert!(matches!(err, ClientError::IncorrectHash), "{err}");
}

#[tokio::test]
async fn corrupted_salt_invalidates_every_share() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);

    let sharing = client
        .share("Gmail key", b"SomeSecretValue", 3, 5, &five_servers())
        .await
        .unwrap();

    // A flipped salt bit makes every per-share hash check fail, so no share
    // survives verification.
    let mut tampered = sharing.metadata.clone();
    tampered.hash_salt[0] ^= 0x01;
    let err = client.recover(&tampered).await.unwrap_err();
    assert!(matches!(err, ClientError::TooFewShares), "{err}");
}

#[tokio::test]
async fn recovery_is_deterministic() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);
    let secret = b"SomeSecretValue";

    let sharing = client
        .share("Gmail key", secret, 2, 3, &five_servers()[..3])
        .await
        .unwrap();

    let first = client.recover(&sharing.metadata).await.unwrap();
    let second = client.recover(&sharing.metadata).await.unwrap();
    assert_eq!(first.secret, second.secret);
    assert_eq!(first.secret, secret);
}

#[tokio::test]
async fn two_sharings_of_the_same_secret_differ() {
    let fleet = Arc::new(FakeFleet::default());
    let client = fleet_client(&fleet);

    let first = client
        .share("key A", b"SomeSecretValue", 2, 3, &five_servers()[..3])
        .await
        .unwrap();
    let second = client
        .share("key B", b"SomeSecretValue", 2, 3, &five_servers()[..3])
        .await
        .unwrap();
    // Fresh mask and salt per sharing.
    assert_ne!(first.metadata.secret_mask, second.metadata.secret_mask);
    assert_ne!(first.metadata.hash_salt, second.metadata.hash_salt);
}
