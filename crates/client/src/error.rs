//! Client-side error taxonomy.

use svalbard_proto::LocationType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A missing, empty or out-of-range input.
    #[error("invalid parameter: {0}")]
    InvalidArgument(String),

    /// The metadata names a sharing scheme type this client does not know.
    #[error("unsupported sharing scheme type: {0}")]
    UnsupportedSchemeType(String),

    /// The serialized scheme bytes do not decode. Distinct from
    /// [`Self::UnsupportedSchemeType`]: the type was recognized, the
    /// payload is broken.
    #[error("malformed serialized sharing scheme")]
    MalformedScheme,

    /// A serialized share record does not decode.
    #[error("malformed serialized share")]
    MalformedShare,

    /// The scheme names a Galois field this client does not implement.
    #[error("unsupported Galois field: {0}")]
    UnsupportedField(String),

    /// The scheme parameters are out of range.
    #[error("invalid scheme: {0}")]
    InvalidScheme(String),

    /// Fewer shares than the scheme's threshold survived retrieval and
    /// verification.
    #[error("too few shares")]
    TooFewShares,

    /// A salted hash did not match.
    #[error("incorrect hash")]
    IncorrectHash,

    /// The reconstructed value does not fit the stored secret mask.
    #[error("secret mask has different length than the reconstructed bytes")]
    MaskLengthMismatch,

    /// The Shamir codec rejected the shares.
    #[error("reconstruction failed: {0}")]
    Reconstruction(#[from] svalbard_shamir::ShamirError),

    /// A share manager was handed a location of a type it does not serve.
    #[error("wrong location type: {0:?}")]
    WrongLocationType(LocationType),

    /// No share manager is registered for the location type.
    #[error("unsupported location type: {0:?}")]
    UnsupportedLocationType(LocationType),

    /// The custody type exists but this build cannot drive it.
    #[error("{0} custody is not implemented yet")]
    NotImplemented(&'static str),

    /// The secondary channel has no matching token message.
    #[error("token not found")]
    TokenNotFound,

    /// The recipient id type does not select a usable secondary channel.
    #[error("recipient id type '{0}' not supported")]
    UnsupportedRecipientIdType(String),

    /// An HTTP exchange failed, or the server refused the request.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
