//! The Svalbard custody server.
//!
//! A stateless HTTP dispatcher that turns six request types into operations
//! on a token store and a share store. Access to a stored share is gated by
//! short-lived tokens that are delivered over a secondary channel (SMS,
//! e-mail, or a file-based channel for testing), so possession of the HTTP
//! endpoint alone is not enough to read a share.

pub mod channel;
pub mod http;
pub mod share_id;
pub mod share_store;
pub mod token_store;

pub use http::{router, ServerState};
pub use token_store::Operation;
