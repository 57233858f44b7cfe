//! Client error types.

use std::time::Duration;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No terminal signal arrived before the per-call deadline.
    #[error("timeout after {after:?} waiting on relay {relay}")]
    Timeout { relay: String, after: Duration },

    /// Connection- or protocol-level failure against one relay.
    #[error("transport error on relay {relay}: {reason}")]
    Transport { relay: String, reason: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Client result type.
pub type Result<T> = std::result::Result<T, ClientError>;
