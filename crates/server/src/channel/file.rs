//! File-based secondary channel, intended for testing only.
//!
//! The channel to a recipient is the file
//! `{root_dir}/{owner_id}_secondary_channel.txt`; every message sent is
//! appended as one line. Only the owner id type `FILE` is supported.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{format_token_msg, ChannelError, RecipientId, SecondaryChannel, TokenMsgData};

pub struct FileChannel {
    root_dir: PathBuf,
}

impl FileChannel {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn file_for(&self, owner_id: &str) -> PathBuf {
        self.root_dir
            .join(format!("{}_secondary_channel.txt", owner_id))
    }
}

#[async_trait]
impl SecondaryChannel for FileChannel {
    async fn send(
        &self,
        recipient: &RecipientId,
        data: &TokenMsgData,
    ) -> Result<(), ChannelError> {
        if !recipient.id_type.eq_ignore_ascii_case("FILE") {
            return Err(ChannelError::UnsupportedOwnerIdType);
        }
        let msg = format_token_msg(data)?;
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.file_for(&recipient.id))
            .await?;
        file.write_all(format!("{}\n", msg).as_bytes()).await?;
        Ok(())
    }
}
