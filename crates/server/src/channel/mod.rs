//! Secondary channels and the token message format.
//!
//! A secondary channel is a one-way path from the server to the owner of a
//! share, identified by an (id type, id) pair. Tokens travel over it as
//! single-line messages of the exact form `SVBD:{request_id}:{token}`, so
//! the channel itself can be as dumb as an SMS gateway.

mod file;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileChannel;

/// The prefix of every token message.
pub const MSG_PREFIX: &str = "SVBD";

/// Errors raised by channels and the message codec.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid parameters for message with token")]
    InvalidMsgData,
    #[error("invalid message with token")]
    InvalidMsg,
    #[error("unsupported owner_id_type")]
    UnsupportedOwnerIdType,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The recipient of a token message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientId {
    pub id_type: String,
    pub id: String,
}

/// The payload of a token message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMsgData {
    pub request_id: String,
    pub token: String,
}

/// Formats a token message. Both components must be non-empty and free of
/// colons, which the format reserves as separators.
pub fn format_token_msg(data: &TokenMsgData) -> Result<String, ChannelError> {
    if data.request_id.is_empty()
        || data.token.is_empty()
        || data.request_id.contains(':')
        || data.token.contains(':')
    {
        return Err(ChannelError::InvalidMsgData);
    }
    Ok(format!("{}:{}:{}", MSG_PREFIX, data.request_id, data.token))
}

/// Parses a token message: exactly three colon-separated parts, the first
/// being the `SVBD` prefix and the others non-empty.
pub fn parse_token_msg(msg: &str) -> Result<TokenMsgData, ChannelError> {
    let parts: Vec<&str> = msg.split(':').collect();
    if parts.len() != 3 || parts[0] != MSG_PREFIX || parts[1].is_empty() || parts[2].is_empty() {
        return Err(ChannelError::InvalidMsg);
    }
    Ok(TokenMsgData {
        request_id: parts[1].to_owned(),
        token: parts[2].to_owned(),
    })
}

/// A one-way sender of token messages.
#[async_trait]
pub trait SecondaryChannel: Send + Sync {
    /// Sends the token in `data`, labeled with its request id, to the
    /// recipient over the channel selected by the recipient's id type.
    async fn send(&self, recipient: &RecipientId, data: &TokenMsgData)
        -> Result<(), ChannelError>;
}
