//! NIP-01 event model and canonical event-id computation.
//!
//! An event id is the SHA-256 of the canonical serialization
//! `[0, pubkey, created_at, kind, tags, content]`, rendered as compact
//! JSON (no whitespace, stable field order) and hashed over its UTF-8
//! bytes. Identical fields always hash identically; any change to any
//! field, including tag ordering, changes the digest.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::nip19::{self, DecodedId, Nip19Error};

/// Event-level error type.
#[derive(Debug, Error)]
pub enum EventError {
    /// Canonical serialization failed. This is fatal, never retried.
    #[error("canonical serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid pubkey: {0}")]
    InvalidPubkey(String),

    #[error(transparent)]
    Identifier(#[from] Nip19Error),
}

/// A signed (or unsigned) Nostr event.
///
/// Events are immutable values; identity is the `id` field, which must
/// equal [`event_hash`] over the remaining defining fields. Consumers
/// that care can check this with [`Event::verify_id`]; the transport
/// layer deliberately does not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u32,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl Event {
    /// Recompute the canonical id from this event's fields.
    pub fn compute_id(&self) -> Result<String, EventError> {
        event_hash(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    /// Check that `id` matches the canonical hash of the event fields.
    ///
    /// Relay deduplication trusts ids without content comparison; this
    /// is the opt-in hook for callers that need to detect a relay
    /// serving divergent bodies under the same id.
    pub fn verify_id(&self) -> Result<bool, EventError> {
        Ok(self.compute_id()? == self.id)
    }
}

/// Compute the canonical 32-byte event id, rendered as lowercase hex.
pub fn event_hash(
    pubkey: &str,
    created_at: u64,
    kind: u32,
    tags: &[Vec<String>],
    content: &str,
) -> Result<String, EventError> {
    let canonical = serde_json::to_string(&json!([0, pubkey, created_at, kind, tags, content]))?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(hex::encode(digest))
}

/// Parse a user-supplied pubkey: either 64-char hex or an `npub`
/// identifier. Returns lowercase hex.
pub fn parse_pubkey(input: &str) -> Result<String, EventError> {
    let trimmed = input.trim();
    if trimmed.starts_with("npub1") {
        return match nip19::decode(trimmed)? {
            DecodedId::Pubkey(bytes) => Ok(hex::encode(bytes)),
            other => Err(EventError::InvalidPubkey(format!(
                "expected npub, decoded {}",
                other.prefix()
            ))),
        };
    }

    let bytes = hex::decode(trimmed)
        .map_err(|error| EventError::InvalidPubkey(format!("invalid hex: {error}")))?;
    if bytes.len() != 32 {
        return Err(EventError::InvalidPubkey(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(hex::encode(bytes))
}
