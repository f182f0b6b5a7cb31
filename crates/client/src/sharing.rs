//! Generation and reconstruction of sharings in wire form.
//!
//! Bridges the Shamir codec and the serialized records: a sharing is a
//! `SharedSecret` whose entries are encoded `ShamirShare`s, tagged with the
//! scheme type and the serialized scheme parameters.

use prost::Message;

use svalbard_proto::{ShamirShare, ShamirSharingScheme, SharedSecret};
use svalbard_shamir::Share;

use crate::error::ClientError;

/// The one sharing scheme type this client understands. The value is the
/// type URL of the original scheme record and must not change, or existing
/// metadata stops validating.
pub const SHAMIR_SHARING_SCHEME: &str =
    "type.googleapis.com/google.security.svalbard.proto.ShamirSharingScheme";

/// Computes a sharing of `secret` according to `scheme`.
pub fn compute_shamir_sharing(
    secret: &[u8],
    scheme: &ShamirSharingScheme,
) -> Result<SharedSecret, ClientError> {
    if secret.is_empty() {
        return Err(ClientError::InvalidArgument(
            "secret must have at least 1 byte".to_string(),
        ));
    }
    validate_scheme(scheme)?;
    let shares = svalbard_shamir::share(secret, scheme.n, scheme.k)?;
    Ok(SharedSecret {
        sharing_scheme_type: SHAMIR_SHARING_SCHEME.to_string(),
        sharing_scheme: scheme.encode_to_vec(),
        share: shares
            .into_iter()
            .map(|s| {
                ShamirShare {
                    value: s.bytes,
                    share_point_index: s.point,
                }
                .encode_to_vec()
            })
            .collect(),
    })
}

/// Reconstructs the shared value from the sharing in `shared`.
pub fn reconstruct_shamir_sharing(shared: &SharedSecret) -> Result<Vec<u8>, ClientError> {
    if shared.sharing_scheme_type != SHAMIR_SHARING_SCHEME {
        return Err(ClientError::UnsupportedSchemeType(
            shared.sharing_scheme_type.clone(),
        ));
    }
    let scheme = ShamirSharingScheme::decode(shared.sharing_scheme.as_slice())
        .map_err(|_| ClientError::MalformedScheme)?;
    validate_scheme(&scheme)?;
    if scheme.k as usize > shared.share.len() {
        return Err(ClientError::TooFewShares);
    }

    let mut shares = Vec::with_capacity(shared.share.len());
    for raw in &shared.share {
        let share = ShamirShare::decode(raw.as_slice()).map_err(|_| ClientError::MalformedShare)?;
        shares.push(Share::new(share.share_point_index, share.value));
    }
    Ok(svalbard_shamir::reconstruct(&shares)?)
}

fn validate_scheme(scheme: &ShamirSharingScheme) -> Result<(), ClientError> {
    if scheme.gf_id != svalbard_shamir::GF_ID {
        return Err(ClientError::UnsupportedField(scheme.gf_id.clone()));
    }
    if scheme.n < 1 {
        return Err(ClientError::InvalidScheme(
            "n must be at least 1".to_string(),
        ));
    }
    if scheme.k < 1 || scheme.k > scheme.n {
        return Err(ClientError::InvalidScheme(
            "k must be in range 1..n".to_string(),
        ));
    }
    Ok(())
}
