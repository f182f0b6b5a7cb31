//! In-memory registry of short-lived, operation-scoped tokens.
//!
//! Every token is bound to a (share id, operation) pair and an absolute
//! expiry. A token is single-binding rather than single-use: until it
//! expires it keeps satisfying the one pair it was minted for, which keeps
//! client retries cheap, and nothing else.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use rand::distributions::{Distribution, Uniform};
use rand::rngs::OsRng;
use thiserror::Error;
use tokio::sync::RwLock;

/// Lower bounds on the store parameters. A validity below two seconds loses
/// races against slow secondary channels.
pub const MIN_TOKEN_LENGTH: usize = 5;
pub const MIN_TOKEN_VALIDITY: Duration = Duration::from_secs(2);

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The operation a token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Storage,
    Retrieval,
    Deletion,
}

impl Operation {
    /// The verb used in `{verb}_share` URLs and response bodies.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Storage => "store",
            Self::Retrieval => "retrieve",
            Self::Deletion => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Storage => "storage",
            Self::Retrieval => "retrieval",
            Self::Deletion => "deletion",
        })
    }
}

/// Errors returned when constructing a [`TokenStore`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreConfigError {
    #[error("token_length too small")]
    TokenLengthTooSmall,
    #[error("token_validity too short")]
    TokenValidityTooShort,
}

/// Errors returned when validating a token.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token not found")]
    NotFound,
    #[error("token expired")]
    Expired,
    #[error("token not valid")]
    NotValid,
}

struct TokenData {
    valid_till: Instant,
    share_id: String,
    op: Operation,
}

/// A store for the tokens minted by a Svalbard server.
pub struct TokenStore {
    token_length: usize,
    validity: Duration,
    store: RwLock<HashMap<String, TokenData>>,
}

impl TokenStore {
    /// Creates a store minting tokens of `token_length` letters that stay
    /// valid for `validity`. Fails when either bound is violated.
    pub fn new(token_length: usize, validity: Duration) -> Result<Self, TokenStoreConfigError> {
        if token_length < MIN_TOKEN_LENGTH {
            return Err(TokenStoreConfigError::TokenLengthTooSmall);
        }
        if validity < MIN_TOKEN_VALIDITY {
            return Err(TokenStoreConfigError::TokenValidityTooShort);
        }
        Ok(Self {
            token_length,
            validity,
            store: RwLock::new(HashMap::new()),
        })
    }

    /// Mints a fresh token valid for the operation `op` on the share
    /// identified by `share_id`.
    pub async fn new_token(&self, share_id: &str, op: Operation) -> String {
        let token = random_token(self.token_length);
        let data = TokenData {
            valid_till: Instant::now() + self.validity,
            share_id: share_id.to_owned(),
            op,
        };
        self.store.write().await.insert(token.clone(), data);
        token
    }

    /// Checks that `token` is currently valid for the operation `op` on the
    /// share identified by `share_id`.
    pub async fn check(
        &self,
        token: &str,
        share_id: &str,
        op: Operation,
    ) -> Result<(), TokenError> {
        if token.len() != self.token_length {
            return Err(TokenError::NotValid);
        }
        let store = self.store.read().await;
        let data = store.get(token).ok_or(TokenError::NotFound)?;
        if data.valid_till < Instant::now() {
            return Err(TokenError::Expired);
        }
        if data.share_id != share_id || data.op != op {
            return Err(TokenError::NotValid);
        }
        Ok(())
    }
}

/// A uniformly random string of `length` letters over the 52-letter
/// alphabet, drawn from the process-wide secure RNG.
fn random_token(length: usize) -> String {
    let index = Uniform::from(0..LETTERS.len());
    (0..length)
        .map(|_| LETTERS[index.sample(&mut OsRng)] as char)
        .collect()
}
