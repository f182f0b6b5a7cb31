//! The Svalbard client.
//!
//! Splits a secret with a two-level scheme, distributes the second-level
//! shares among heterogeneous custodians, and recovers the secret from
//! enough surviving shares.
//!
//! The first level is a one-time pad: a random mask `SH1` the same length
//! as the secret, with `SH2 = SV XOR SH1`. The second level Shamir-shares
//! `SV_hash || SH2`, where `SV_hash` is a salted hash of the secret. `SH1`,
//! the salt, and per-share salted hashes go into the sharing metadata,
//! which is meant to live with a trusted cloud provider; the second-level
//! shares go to the custodians. A cloud provider holding only the metadata
//! learns nothing about the secret, custodians holding fewer than k shares
//! learn nothing either, and flipping a bit anywhere is caught by a hash.

pub mod channel;
pub mod error;
pub mod manager;
pub mod peer;
pub mod printed;
pub mod server_manager;
pub mod sharing;

mod hash;

use futures::future::join_all;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use svalbard_proto::{ShamirSharingScheme, ShareLocation, ShareMetadata, SharedSecret,
    SharedSecretMetadata};

pub use error::ClientError;
pub use manager::{ShareManager, ShareManagerRegistry};

/// Salt drawn for every new sharing, in bytes.
pub const HASH_SALT_SIZE: usize = 10;
/// Size of the salted hashes (SHA-256), in bytes.
pub const HASH_SIZE: usize = 32;

/// Everything known about one share after a sharing or recovery pass: its
/// metadata, the share bytes when they were available, and the failure that
/// hit it, if any. Failures never short-circuit the other shares.
#[derive(Debug)]
pub struct ShareData {
    pub metadata: ShareMetadata,
    pub value: Option<Vec<u8>>,
    pub failure: Option<ClientError>,
}

impl ShareData {
    fn ok(metadata: ShareMetadata, value: Vec<u8>) -> Self {
        Self {
            metadata,
            value: Some(value),
            failure: None,
        }
    }

    fn failed(metadata: ShareMetadata, value: Option<Vec<u8>>, failure: ClientError) -> Self {
        Self {
            metadata,
            value,
            failure: Some(failure),
        }
    }
}

/// The result of a share operation.
pub struct SharingResult {
    /// The recovery record; persist it with the cloud provider. It is
    /// complete even when some stores failed.
    pub metadata: SharedSecretMetadata,
    /// Shares that could not be stored automatically. The caller must hand
    /// these to their custodians by other means.
    pub shares_to_be_stored: Vec<ShareData>,
}

/// The result of a successful recover operation.
#[derive(Debug)]
pub struct RecoveryResult {
    pub secret: Vec<u8>,
    /// One entry per location in the metadata, with the per-share outcome.
    pub share_data_list: Vec<ShareData>,
}

/// A client that computes and distributes sharings and recovers secrets
/// from them, using the share managers in its registry.
pub struct SvalbardClient {
    registry: ShareManagerRegistry,
}

impl SvalbardClient {
    pub fn new(registry: ShareManagerRegistry) -> Self {
        Self { registry }
    }

    /// Computes a k-out-of-n sharing of `secret` masked by a random
    /// byte-string, and distributes the shares to `locations`.
    ///
    /// The dispatches run concurrently; a failing store is recorded on its
    /// `ShareData` and the sharing still succeeds. The returned metadata
    /// lists the share records in the order of `locations`.
    pub async fn share(
        &self,
        secret_name: &str,
        secret: &[u8],
        k: u32,
        n: u32,
        locations: &[ShareLocation],
    ) -> Result<SharingResult, ClientError> {
        let scheme = shamir_sharing_scheme(k, n)?;
        validate_share_args(secret_name, secret, n, locations)?;

        let mut hash_salt = vec![0u8; HASH_SALT_SIZE];
        OsRng.fill_bytes(&mut hash_salt);
        let mut secret_mask = vec![0u8; secret.len()];
        OsRng.fill_bytes(&mut secret_mask);

        // SV_hash || (SV XOR SH1): what actually gets Shamir-shared.
        let masked_with_hash = {
            let mut buf = hash::salted_hash(secret, &hash_salt)?;
            buf.extend_from_slice(&hash::xor(secret, &secret_mask)?);
            Zeroizing::new(buf)
        };
        let shared = sharing::compute_shamir_sharing(&masked_with_hash, &scheme)?;

        let mut dispatches = Vec::with_capacity(locations.len());
        for (share_bytes, location) in shared.share.iter().zip(locations) {
            let metadata = ShareMetadata {
                location: Some(location.clone()),
                share_hash: hash::salted_hash(share_bytes, &hash_salt)?,
            };
            let manager = self.registry.get(location.location_type());
            let secret_name = secret_name.to_owned();
            let share_bytes = share_bytes.clone();
            let location = location.clone();
            dispatches.push(async move {
                let outcome = match manager {
                    Ok(manager) => {
                        manager
                            .store_share(&secret_name, &share_bytes, &location)
                            .await
                    }
                    Err(err) => Err(err),
                };
                match outcome {
                    Ok(()) => ShareData::ok(metadata, share_bytes),
                    Err(err) => ShareData::failed(metadata, Some(share_bytes), err),
                }
            });
        }
        let share_data_list = join_all(dispatches).await;
        let failed = share_data_list
            .iter()
            .filter(|share_data| share_data.failure.is_some())
            .count();
        tracing::debug!(
            stored = share_data_list.len() - failed,
            failed,
            "share dispatch finished"
        );

        let mut metadata = SharedSecretMetadata {
            sharing_scheme_type: shared.sharing_scheme_type.clone(),
            sharing_scheme: shared.sharing_scheme.clone(),
            secret_name: secret_name.to_owned(),
            secret_mask,
            hash_salt,
            share_metadata: Vec::with_capacity(share_data_list.len()),
        };
        let mut shares_to_be_stored = Vec::new();
        for share_data in share_data_list {
            metadata.share_metadata.push(share_data.metadata.clone());
            if share_data.failure.is_some() {
                shares_to_be_stored.push(share_data);
            }
        }
        Ok(SharingResult {
            metadata,
            shares_to_be_stored,
        })
    }

    /// Recovers the secret described by `metadata`: retrieves the shares
    /// from their custodians, drops every share whose salted hash does not
    /// match, reconstructs, unmasks, and verifies the recovered value
    /// against `SV_hash`.
    ///
    /// Per-share failures are carried in the result; the call as a whole
    /// fails when fewer than k shares verify or the final hash check does
    /// not pass, and no partial secret is ever returned.
    pub async fn recover(
        &self,
        metadata: &SharedSecretMetadata,
    ) -> Result<RecoveryResult, ClientError> {
        validate_metadata(metadata)?;

        let mut retrievals = Vec::with_capacity(metadata.share_metadata.len());
        for share_metadata in &metadata.share_metadata {
            // Validated non-empty above.
            let location = share_metadata.location.clone().unwrap_or_default();
            let manager = self.registry.get(location.location_type());
            let secret_name = metadata.secret_name.clone();
            let hash_salt = metadata.hash_salt.clone();
            let share_metadata = share_metadata.clone();
            retrievals.push(async move {
                let retrieved = match manager {
                    Ok(manager) => manager.retrieve_share(&secret_name, &location).await,
                    Err(err) => Err(err),
                };
                match retrieved {
                    Ok(bytes) => {
                        match hash::check_salted_hash(
                            &bytes,
                            &hash_salt,
                            &share_metadata.share_hash,
                        ) {
                            Ok(()) => ShareData::ok(share_metadata, bytes),
                            Err(err) => ShareData::failed(share_metadata, Some(bytes), err),
                        }
                    }
                    Err(err) => ShareData::failed(share_metadata, None, err),
                }
            });
        }
        let share_data_list = join_all(retrievals).await;
        let verified = share_data_list
            .iter()
            .filter(|share_data| share_data.failure.is_none())
            .count();
        tracing::debug!(
            verified,
            total = share_data_list.len(),
            "share retrieval finished"
        );

        let shared = SharedSecret {
            sharing_scheme_type: metadata.sharing_scheme_type.clone(),
            sharing_scheme: metadata.sharing_scheme.clone(),
            share: share_data_list
                .iter()
                .filter(|share_data| share_data.failure.is_none())
                .filter_map(|share_data| share_data.value.clone())
                .collect(),
        };
        let secret = reconstruct_secret(&shared, &metadata.secret_mask, &metadata.hash_salt)?;
        Ok(RecoveryResult {
            secret,
            share_data_list,
        })
    }
}

fn shamir_sharing_scheme(k: u32, n: u32) -> Result<ShamirSharingScheme, ClientError> {
    if n < 1 {
        return Err(ClientError::InvalidArgument(
            "n must be at least 1".to_string(),
        ));
    }
    if k < 1 || k > n {
        return Err(ClientError::InvalidArgument(
            "k must be in range 1..n".to_string(),
        ));
    }
    Ok(ShamirSharingScheme {
        k,
        n,
        gf_id: svalbard_shamir::GF_ID.to_string(),
    })
}

fn reconstruct_secret(
    shared: &SharedSecret,
    secret_mask: &[u8],
    hash_salt: &[u8],
) -> Result<Vec<u8>, ClientError> {
    let reconstructed = Zeroizing::new(sharing::reconstruct_shamir_sharing(shared)?);
    if reconstructed.len() != secret_mask.len() + HASH_SIZE {
        return Err(ClientError::MaskLengthMismatch);
    }
    let secret = hash::xor(&reconstructed[HASH_SIZE..], secret_mask)?;
    hash::check_salted_hash(&secret, hash_salt, &reconstructed[..HASH_SIZE])?;
    Ok(secret)
}

fn validate_share_args(
    secret_name: &str,
    secret: &[u8],
    n: u32,
    locations: &[ShareLocation],
) -> Result<(), ClientError> {
    if secret_name.is_empty() {
        return Err(ClientError::InvalidArgument(
            "secret name cannot be empty".to_string(),
        ));
    }
    if locations.len() != n as usize {
        return Err(ClientError::InvalidArgument(
            "there must be exactly n locations".to_string(),
        ));
    }
    if secret.is_empty() {
        return Err(ClientError::InvalidArgument(
            "secret must have at least 1 byte".to_string(),
        ));
    }
    for location in locations {
        validate_location(location)?;
    }
    Ok(())
}

fn validate_location(location: &ShareLocation) -> Result<(), ClientError> {
    if location.location_name.is_empty() {
        return Err(ClientError::InvalidArgument(
            "missing location name".to_string(),
        ));
    }
    if location.owner_id.is_empty() {
        return Err(ClientError::InvalidArgument("missing owner id".to_string()));
    }
    Ok(())
}

fn validate_metadata(metadata: &SharedSecretMetadata) -> Result<(), ClientError> {
    if metadata.sharing_scheme_type != sharing::SHAMIR_SHARING_SCHEME {
        return Err(ClientError::UnsupportedSchemeType(
            metadata.sharing_scheme_type.clone(),
        ));
    }
    if metadata.sharing_scheme.is_empty() {
        return Err(ClientError::InvalidArgument(
            "missing sharing scheme".to_string(),
        ));
    }
    if metadata.secret_name.is_empty() {
        return Err(ClientError::InvalidArgument(
            "missing secret name".to_string(),
        ));
    }
    if metadata.secret_mask.is_empty() {
        return Err(ClientError::InvalidArgument(
            "missing secret mask".to_string(),
        ));
    }
    if metadata.hash_salt.is_empty() {
        return Err(ClientError::InvalidArgument(
            "missing hash salt".to_string(),
        ));
    }
    for share_metadata in &metadata.share_metadata {
        let location = share_metadata
            .location
            .as_ref()
            .ok_or_else(|| ClientError::InvalidArgument("missing share location".to_string()))?;
        if share_metadata.share_hash.is_empty() {
            return Err(ClientError::InvalidArgument(
                "missing share hash".to_string(),
            ));
        }
        validate_location(location)?;
    }
    Ok(())
}
