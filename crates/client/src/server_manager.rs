//! Share manager for Svalbard custody servers.
//!
//! Every operation is a two-step token dance: request an operation-scoped
//! token from the server, wait for it to arrive over the secondary channel,
//! then execute the operation with the token. Share bytes travel base64 in
//! url-encoded form bodies.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::Rng;
use reqwest::StatusCode;

use svalbard_proto::{LocationType, ShareLocation};

use crate::channel::SecondaryChannel;
use crate::error::ClientError;
use crate::manager::ShareManager;

pub const USER_AGENT: &str = "Svalbard/1.0.0";

pub struct ServerShareManager {
    http: reqwest::Client,
    channel: Arc<dyn SecondaryChannel>,
}

impl ServerShareManager {
    pub fn new(channel: Arc<dyn SecondaryChannel>) -> Self {
        Self {
            http: reqwest::Client::new(),
            channel,
        }
    }

    /// Obtains from the server at `location` a short-lived token for
    /// `operation` ("storage", "retrieval" or "deletion") on the share of
    /// `secret_name`, waiting for the delivery on the secondary channel.
    async fn operation_token(
        &self,
        request_id: &str,
        operation: &str,
        location: &ShareLocation,
        secret_name: &str,
    ) -> Result<String, ClientError> {
        let url = server_url(location)?;
        let response = self
            .http
            .post(format!("{url}/get_{operation}_token"))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("request_id", request_id),
                ("owner_id_type", location.owner_id_type.as_str()),
                ("owner_id", location.owner_id.as_str()),
                ("secret_name", secret_name),
            ])
            .send()
            .await
            .map_err(transport)?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Transport(format!(
                "request for a {} token failed: {}",
                operation,
                response.text().await.unwrap_or_default()
            )));
        }
        self.channel
            .read_token(&location.owner_id_type, &location.owner_id, request_id)
            .await
    }
}

#[async_trait]
impl ShareManager for ServerShareManager {
    async fn store_share(
        &self,
        secret_name: &str,
        share_value: &[u8],
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        let request_id = new_request_id();
        let token = self
            .operation_token(&request_id, "storage", location, secret_name)
            .await?;
        let url = server_url(location)?;
        let encoded = BASE64.encode(share_value);
        let response = self
            .http
            .post(format!("{url}/store_share"))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("owner_id_type", location.owner_id_type.as_str()),
                ("owner_id", location.owner_id.as_str()),
                ("secret_name", secret_name),
                ("share_value", encoded.as_str()),
                ("token", token.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Transport(format!(
                "request to store a share failed: {}",
                response.text().await.unwrap_or_default()
            )));
        }
        Ok(())
    }

    async fn retrieve_share(
        &self,
        secret_name: &str,
        location: &ShareLocation,
    ) -> Result<Vec<u8>, ClientError> {
        let request_id = new_request_id();
        let token = self
            .operation_token(&request_id, "retrieval", location, secret_name)
            .await?;
        let url = server_url(location)?;
        let response = self
            .http
            .post(format!("{url}/retrieve_share"))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("owner_id_type", location.owner_id_type.as_str()),
                ("owner_id", location.owner_id.as_str()),
                ("secret_name", secret_name),
                ("token", token.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Transport(format!(
                "request to retrieve a share failed: {}",
                response.text().await.unwrap_or_default()
            )));
        }
        let body = response.text().await.map_err(transport)?;
        BASE64
            .decode(body.trim_end())
            .map_err(|err| ClientError::Transport(format!("invalid share encoding: {err}")))
    }

    async fn delete_share(
        &self,
        secret_name: &str,
        location: &ShareLocation,
    ) -> Result<(), ClientError> {
        let request_id = new_request_id();
        let token = self
            .operation_token(&request_id, "deletion", location, secret_name)
            .await?;
        let url = server_url(location)?;
        let response = self
            .http
            .post(format!("{url}/delete_share"))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("owner_id_type", location.owner_id_type.as_str()),
                ("owner_id", location.owner_id.as_str()),
                ("secret_name", secret_name),
                ("token", token.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Transport(format!(
                "request to delete a share failed: {}",
                response.text().await.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

/// Checks that `location` addresses a custody server and returns its URL,
/// which must be non-empty and begin with `https`.
fn server_url(location: &ShareLocation) -> Result<&str, ClientError> {
    if location.location_type() != LocationType::SvalbardServer {
        return Err(ClientError::WrongLocationType(location.location_type()));
    }
    let url = location.location_name.as_str();
    if url.is_empty() {
        return Err(ClientError::InvalidArgument(
            "missing location_name".to_string(),
        ));
    }
    if !url.starts_with("https") {
        return Err(ClientError::InvalidArgument(
            "location_name must start with 'https'".to_string(),
        ));
    }
    Ok(url)
}

fn new_request_id() -> String {
    OsRng.gen_range(0..10_000u32).to_string()
}
