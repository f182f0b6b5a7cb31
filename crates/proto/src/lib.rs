//! Wire records for sharings and their metadata.
//!
//! The records are length-prefixed, field-tagged (protobuf wire format) and
//! declared with `prost` derives. The field numbers are frozen: metadata
//! written by earlier builds must stay readable, so changing a tag here is a
//! breaking change to every existing backup.

/// The storage class of a second-level share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LocationType {
    UnknownLocation = 0,
    /// A dedicated Svalbard custody server, addressed by an https URL.
    SvalbardServer = 1,
    /// A physical artifact (QR code, OCR-friendly text, ...).
    PrintedCopy = 2,
    /// A co-present device reachable over NFC or Bluetooth.
    PeerDevice = 3,
}

/// Where a second-level share is kept, and who owns it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShareLocation {
    #[prost(enumeration = "LocationType", tag = "1")]
    pub location_type: i32,
    /// Server URL for `SVALBARD_SERVER`, a free-form description otherwise.
    #[prost(string, tag = "2")]
    pub location_name: ::prost::alloc::string::String,
    /// Type of the secondary channel to the owner (SMS, e-mail, FILE, ...).
    #[prost(string, tag = "3")]
    pub owner_id_type: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub owner_id: ::prost::alloc::string::String,
}

/// Per-share recovery record: where the share lives and the salted hash
/// that guards it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShareMetadata {
    #[prost(message, optional, tag = "1")]
    pub location: ::core::option::Option<ShareLocation>,
    #[prost(bytes = "vec", tag = "2")]
    pub share_hash: ::prost::alloc::vec::Vec<u8>,
}

/// Parameters of a k-out-of-n Shamir sharing.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShamirSharingScheme {
    #[prost(uint32, tag = "1")]
    pub k: u32,
    #[prost(uint32, tag = "2")]
    pub n: u32,
    /// Identifier of the Galois field the sharing was computed in.
    #[prost(string, tag = "3")]
    pub gf_id: ::prost::alloc::string::String,
}

/// One Shamir share in serialized form.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShamirShare {
    /// The wire-form share bytes (chunk evaluations plus padding byte).
    #[prost(bytes = "vec", tag = "1")]
    pub value: ::prost::alloc::vec::Vec<u8>,
    /// The evaluation point this share was computed at.
    #[prost(uint64, tag = "2")]
    pub share_point_index: u64,
}

/// A complete sharing of one secret: the scheme and the encoded shares.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SharedSecret {
    #[prost(string, tag = "1")]
    pub sharing_scheme_type: ::prost::alloc::string::String,
    /// The serialized scheme record (a `ShamirSharingScheme` for the one
    /// supported scheme type).
    #[prost(bytes = "vec", tag = "2")]
    pub sharing_scheme: ::prost::alloc::vec::Vec<u8>,
    /// Serialized `ShamirShare` records, in evaluation-point order.
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub share: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

/// The full recovery record for one secret, stored with the cloud provider.
///
/// Holds everything recovery needs besides the shares themselves: the
/// scheme, the first-level share (`secret_mask`), the hash salt, and the
/// per-share locations and salted hashes, in the location order the sharing
/// was requested with.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SharedSecretMetadata {
    #[prost(string, tag = "1")]
    pub sharing_scheme_type: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub sharing_scheme: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "3")]
    pub secret_name: ::prost::alloc::string::String,
    /// The first-level XOR share; same length as the secret.
    #[prost(bytes = "vec", tag = "4")]
    pub secret_mask: ::prost::alloc::vec::Vec<u8>,
    /// Salt for the salted hashes, 1..=255 bytes.
    #[prost(bytes = "vec", tag = "5")]
    pub hash_salt: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, repeated, tag = "6")]
    pub share_metadata: ::prost::alloc::vec::Vec<ShareMetadata>,
}
