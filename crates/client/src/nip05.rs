//! NIP-05 identity resolution.
//!
//! One GET of the well-known document, one JSON lookup. No retries, no
//! fan-out; callers wanting resilience layer it themselves.

use crate::error::{ClientError, Result};
use serde_json::Value;

/// Resolve a `name@domain` address to a hex pubkey via
/// `https://{domain}/.well-known/nostr.json?name={name}`.
///
/// Returns `Ok(None)` when the document resolves but does not list the
/// name; a malformed address or a failed fetch is a typed error, never
/// a silent empty value.
pub async fn resolve(address: &str) -> Result<Option<String>> {
    let (name, domain) = split_address(address)?;
    let url = format!("https://{domain}/.well-known/nostr.json?name={name}");

    let response = reqwest::get(&url)
        .await
        .map_err(|error| ClientError::Http(error.to_string()))?;
    if !response.status().is_success() {
        return Err(ClientError::Http(format!(
            "{url} returned {}",
            response.status()
        )));
    }

    let document: Value = response
        .json()
        .await
        .map_err(|error| ClientError::Http(format!("invalid well-known document: {error}")))?;

    Ok(document
        .get("names")
        .and_then(|names| names.get(name))
        .and_then(Value::as_str)
        .map(str::to_string))
}

fn split_address(address: &str) -> Result<(&str, &str)> {
    match address.split_once('@') {
        Some((name, domain)) if !name.is_empty() && !domain.is_empty() => Ok((name, domain)),
        _ => Err(ClientError::InvalidRequest(format!(
            "expected name@domain address, got: {address}"
        ))),
    }
}
