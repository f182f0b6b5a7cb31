//! Client side of the secondary channel: reading delivered tokens.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ClientError;

/// A one-way channel from servers to this client, used to receive the
/// short-lived tokens that authorize share operations.
#[async_trait]
pub trait SecondaryChannel: Send + Sync {
    /// Returns the token from the message labeled `request_id` on the
    /// channel identified by (`recipient_id_type`, `recipient_id`).
    async fn read_token(
        &self,
        recipient_id_type: &str,
        recipient_id: &str,
        request_id: &str,
    ) -> Result<String, ClientError>;
}

/// File-based secondary channel, intended for testing only. The channel to
/// a recipient is the file `{root_dir}/{recipient_id}_secondary_channel.txt`
/// with one message per line.
pub struct FileSecondaryChannel {
    root_dir: PathBuf,
}

impl FileSecondaryChannel {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }
}

#[async_trait]
impl SecondaryChannel for FileSecondaryChannel {
    async fn read_token(
        &self,
        recipient_id_type: &str,
        recipient_id: &str,
        request_id: &str,
    ) -> Result<String, ClientError> {
        if recipient_id_type != "FILE" {
            return Err(ClientError::UnsupportedRecipientIdType(
                recipient_id_type.to_string(),
            ));
        }
        let path = self
            .root_dir
            .join(format!("{}_secondary_channel.txt", recipient_id));
        let content = tokio::fs::read_to_string(path).await?;
        let prefix = format!("SVBD:{}:", request_id);
        content
            .lines()
            .find_map(|line| line.strip_prefix(&prefix))
            .map(str::to_owned)
            .ok_or(ClientError::TokenNotFound)
    }
}
