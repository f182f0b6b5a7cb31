//! HTTP request dispatch for the custody server.
//!
//! Six POST endpoints over `application/x-www-form-urlencoded` bodies. The
//! handlers are stateless; all state lives in the token store and the share
//! store. Response bodies are informational and never echo a share value, a
//! token, or a salt.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::any;
use axum::{Form, Router};
use serde::Deserialize;
use thiserror::Error;

use crate::channel::{RecipientId, SecondaryChannel, TokenMsgData};
use crate::share_id::get_share_id;
use crate::share_store::{ShareStore, ShareStoreError};
use crate::token_store::{Operation, TokenStore};

/// Errors for request-level validation; the messages are the response
/// bodies.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("expected a POST request")]
    ExpectedPostRequest,
    #[error("missing request_id")]
    MissingRequestId,
    #[error("missing token")]
    MissingToken,
    #[error("missing share_value")]
    MissingShareValue,
}

/// Shared state of one server instance.
pub struct ServerState {
    pub tokens: TokenStore,
    pub shares: Arc<dyn ShareStore>,
    pub channel: Arc<dyn SecondaryChannel>,
}

impl ServerState {
    pub fn new(
        tokens: TokenStore,
        shares: Arc<dyn ShareStore>,
        channel: Arc<dyn SecondaryChannel>,
    ) -> Self {
        Self {
            tokens,
            shares,
            channel,
        }
    }
}

/// Builds the router exposing the six endpoints. Each path is registered
/// with and without a trailing slash; the method check happens inside the
/// handlers so that a non-POST request yields a 400, not a 405.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/get_storage_token", any(get_storage_token))
        .route("/get_storage_token/", any(get_storage_token))
        .route("/get_retrieval_token", any(get_retrieval_token))
        .route("/get_retrieval_token/", any(get_retrieval_token))
        .route("/get_deletion_token", any(get_deletion_token))
        .route("/get_deletion_token/", any(get_deletion_token))
        .route("/store_share", any(store_share))
        .route("/store_share/", any(store_share))
        .route("/retrieve_share", any(retrieve_share))
        .route("/retrieve_share/", any(retrieve_share))
        .route("/delete_share", any(delete_share))
        .route("/delete_share/", any(delete_share))
        .with_state(state)
}

/// Request form for the three get-*-token endpoints. Missing fields and
/// unparseable bodies deserialize as empty strings, so the emptiness checks
/// below cover both cases.
#[derive(Deserialize, Default)]
pub struct TokenRequest {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    owner_id_type: String,
    #[serde(default)]
    owner_id: String,
    #[serde(default)]
    secret_name: String,
}

/// Request form for the three execute endpoints.
#[derive(Deserialize, Default)]
pub struct ShareRequest {
    #[serde(default)]
    token: String,
    #[serde(default)]
    owner_id_type: String,
    #[serde(default)]
    owner_id: String,
    #[serde(default)]
    secret_name: String,
    #[serde(default)]
    share_value: String,
}

async fn get_storage_token(
    state: State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> (StatusCode, String) {
    handle_get_token(state, method, form, Operation::Storage).await
}

async fn get_retrieval_token(
    state: State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> (StatusCode, String) {
    handle_get_token(state, method, form, Operation::Retrieval).await
}

async fn get_deletion_token(
    state: State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> (StatusCode, String) {
    handle_get_token(state, method, form, Operation::Deletion).await
}

async fn store_share(
    state: State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<ShareRequest>, FormRejection>,
) -> (StatusCode, String) {
    handle_execute(state, method, form, Operation::Storage).await
}

async fn retrieve_share(
    state: State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<ShareRequest>, FormRejection>,
) -> (StatusCode, String) {
    handle_execute(state, method, form, Operation::Retrieval).await
}

async fn delete_share(
    state: State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<ShareRequest>, FormRejection>,
) -> (StatusCode, String) {
    handle_execute(state, method, form, Operation::Deletion).await
}

fn bad_request(err: RequestError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, format!("{}\n", err))
}

/// Issues a token: validates the request fields, requires the share to
/// exist for retrieval and deletion tokens, mints the token bound to
/// (share id, operation), and delivers it over the secondary channel before
/// acknowledging.
async fn handle_get_token(
    State(state): State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<TokenRequest>, FormRejection>,
    op: Operation,
) -> (StatusCode, String) {
    if method != Method::POST {
        return bad_request(RequestError::ExpectedPostRequest);
    }
    let req = form.map(|Form(req)| req).unwrap_or_default();
    if req.request_id.is_empty() {
        return bad_request(RequestError::MissingRequestId);
    }
    let share_id = match get_share_id(&req.owner_id_type, &req.owner_id, &req.secret_name) {
        Ok(id) => id,
        Err(err) => return (StatusCode::BAD_REQUEST, format!("{}\n", err)),
    };

    // Storage tokens may be minted for shares that do not exist yet;
    // retrieval and deletion tokens only for shares that do.
    if matches!(op, Operation::Retrieval | Operation::Deletion) {
        match state.shares.retrieve(&share_id).await {
            Ok(_) => {}
            Err(ShareStoreError::NotFound) => {
                return (
                    StatusCode::NOT_FOUND,
                    format!("Req. {}: share not found.\n", req.request_id),
                );
            }
            Err(err) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", err));
            }
        }
    }

    let token = state.tokens.new_token(&share_id, op).await;
    let recipient = RecipientId {
        id_type: req.owner_id_type.clone(),
        id: req.owner_id.clone(),
    };
    let data = TokenMsgData {
        request_id: req.request_id.clone(),
        token,
    };
    if let Err(err) = state.channel.send(&recipient, &data).await {
        tracing::warn!(%share_id, %op, "token delivery failed: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("could not send the token: {}\n", err),
        );
    }

    tracing::debug!(%share_id, %op, "token sent");
    (
        StatusCode::OK,
        format!(
            "Req. {}: {} token for share of [{}] sent to [{}:{}]",
            req.request_id, op, req.secret_name, req.owner_id_type, req.owner_id
        ),
    )
}

/// Executes a store/retrieve/delete: validates the request fields and the
/// token binding, then drives the share store.
async fn handle_execute(
    State(state): State<Arc<ServerState>>,
    method: Method,
    form: Result<Form<ShareRequest>, FormRejection>,
    op: Operation,
) -> (StatusCode, String) {
    if method != Method::POST {
        return bad_request(RequestError::ExpectedPostRequest);
    }
    let req = form.map(|Form(req)| req).unwrap_or_default();
    if req.token.is_empty() {
        return bad_request(RequestError::MissingToken);
    }
    let share_id = match get_share_id(&req.owner_id_type, &req.owner_id, &req.secret_name) {
        Ok(id) => id,
        Err(err) => return (StatusCode::BAD_REQUEST, format!("{}\n", err)),
    };
    if op == Operation::Storage && req.share_value.is_empty() {
        return bad_request(RequestError::MissingShareValue);
    }

    if let Err(err) = state.tokens.check(&req.token, &share_id, op).await {
        return (
            StatusCode::FORBIDDEN,
            format!("could not {} the share: {}\n", op.verb(), err),
        );
    }

    match op {
        Operation::Storage => match state.shares.store(&share_id, &req.share_value).await {
            Ok(()) => {
                tracing::debug!(%share_id, "share stored");
                (
                    StatusCode::OK,
                    format!(
                        "Stored a share of secret [{}] for owner [{}:{}]",
                        req.secret_name, req.owner_id_type, req.owner_id
                    ),
                )
            }
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("could not store the share: {}\n", err),
            ),
        },
        Operation::Retrieval => match state.shares.retrieve(&share_id).await {
            Ok(share_value) => (StatusCode::OK, share_value),
            Err(ShareStoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                format!(
                    "could not retrieve the share: {}\n",
                    ShareStoreError::NotFound
                ),
            ),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("could not retrieve the share: {}\n", err),
            ),
        },
        Operation::Deletion => match state.shares.delete(&share_id).await {
            Ok(()) => {
                tracing::debug!(%share_id, "share deleted");
                (
                    StatusCode::OK,
                    format!(
                        "Deleted a share of secret [{}] of owner [{}:{}]",
                        req.secret_name, req.owner_id_type, req.owner_id
                    ),
                )
            }
            // Also covers deletion of an absent share, which is reported as
            // a server error, not 404.
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("could not delete the share: {}\n", err),
            ),
        },
    }
}
