//! Single-relay transport.
//!
//! Every call opens one fresh WebSocket connection and discards it when
//! the exchange settles; no connection state survives between calls.
//! `query` streams events for one subscription until the relay signals
//! end of stored events, `publish` pushes a batch of events and closes.

use crate::error::{ClientError, Result};
use futures_util::{SinkExt, StreamExt};
use relaycast_core::Event;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Per-call deadline applied to a whole query or publish exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Hard deadline for one complete exchange against one relay.
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Relay message received from a relay.
#[derive(Debug, Clone)]
pub enum RelayMessage {
    Event(String, Event),
    Eose(String),
    Notice(String),
}

/// Per-call relay transport.
#[derive(Debug, Clone, Default)]
pub struct RelayTransport {
    config: TransportConfig,
}

impl RelayTransport {
    /// Create a transport with custom config.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Query one relay and stream matching events into `sink`, in the
    /// order the relay sends them.
    ///
    /// Sends a `REQ` with a fresh subscription id, forwards each
    /// matching `EVENT`, and returns `Ok` on the matching `EOSE`. The
    /// whole exchange is bounded by the configured deadline. A closed
    /// `sink` means the consumer resolved early; the call tears down
    /// its connection and returns `Ok`.
    pub async fn query(
        &self,
        endpoint: &str,
        filter: &Value,
        sink: mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let deadline = self.config.request_timeout;
        timeout(deadline, query_exchange(endpoint, filter, sink))
            .await
            .map_err(|_| ClientError::Timeout {
                relay: endpoint.to_string(),
                after: deadline,
            })?
    }

    /// Publish a batch of events to one relay: one `EVENT` frame per
    /// event in the supplied order, then close. Best effort; no
    /// acknowledgements are awaited.
    pub async fn publish(&self, endpoint: &str, events: &[Event]) -> Result<()> {
        let deadline = self.config.request_timeout;
        timeout(deadline, publish_exchange(endpoint, events))
            .await
            .map_err(|_| ClientError::Timeout {
                relay: endpoint.to_string(),
                after: deadline,
            })?
    }
}

async fn query_exchange(
    endpoint: &str,
    filter: &Value,
    sink: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let url = validate_endpoint(endpoint)?;
    let (stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|error| transport_error(endpoint, error.to_string()))?;
    let (mut writer, mut reader) = stream.split();

    let subscription_id = fresh_subscription_id();
    let request = serde_json::to_string(&json!(["REQ", subscription_id, filter]))?;
    writer
        .send(Message::Text(request))
        .await
        .map_err(|error| transport_error(endpoint, error.to_string()))?;

    while let Some(frame) = reader.next().await {
        let frame = frame.map_err(|error| transport_error(endpoint, error.to_string()))?;
        match frame {
            Message::Text(text) => {
                let message = parse_relay_message(text.as_str()).map_err(|error| {
                    transport_error(endpoint, format!("malformed relay frame: {error}"))
                })?;
                match message {
                    Some(RelayMessage::Event(id, event)) if id == subscription_id => {
                        if sink.send(event).is_err() {
                            // Consumer resolved early; tear down.
                            let _ = writer.send(Message::Close(None)).await;
                            return Ok(());
                        }
                    }
                    Some(RelayMessage::Eose(id)) if id == subscription_id => {
                        let close = serde_json::to_string(&json!(["CLOSE", subscription_id]))?;
                        let _ = writer.send(Message::Text(close)).await;
                        let _ = writer.send(Message::Close(None)).await;
                        return Ok(());
                    }
                    Some(RelayMessage::Notice(notice)) => {
                        debug!("notice from {}: {}", endpoint, notice);
                    }
                    // Foreign subscription ids and unknown kinds.
                    Some(_) | None => {}
                }
            }
            Message::Ping(payload) => {
                debug!("ping from {} ({} bytes)", endpoint, payload.len());
            }
            Message::Close(_) => break,
            Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
        }
    }

    Err(transport_error(
        endpoint,
        "connection closed before end of stored events",
    ))
}

async fn publish_exchange(endpoint: &str, events: &[Event]) -> Result<()> {
    let url = validate_endpoint(endpoint)?;
    let (stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|error| transport_error(endpoint, error.to_string()))?;
    let (mut writer, _reader) = stream.split();

    for event in events {
        let frame = serde_json::to_string(&json!(["EVENT", event]))?;
        writer
            .send(Message::Text(frame))
            .await
            .map_err(|error| transport_error(endpoint, error.to_string()))?;
    }

    writer
        .send(Message::Close(None))
        .await
        .map_err(|error| transport_error(endpoint, error.to_string()))?;
    Ok(())
}

fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)?;
    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(ClientError::InvalidUrl(format!(
            "URL must use ws:// or wss:// scheme, got: {}",
            url.scheme()
        )));
    }
    Ok(url)
}

fn fresh_subscription_id() -> String {
    // Unique per call; only needs to correlate frames within one
    // connection's lifetime.
    format!("rc-{}", Uuid::new_v4().simple())
}

fn transport_error(relay: &str, reason: impl Into<String>) -> ClientError {
    ClientError::Transport {
        relay: relay.to_string(),
        reason: reason.into(),
    }
}

/// Parse a relay protocol JSON text frame into a typed relay message.
///
/// Unknown frame kinds parse to `None`; structurally broken frames are
/// errors.
pub fn parse_relay_message(text: &str) -> Result<Option<RelayMessage>> {
    let value: Value = serde_json::from_str(text)?;
    let array = value
        .as_array()
        .ok_or_else(|| ClientError::Protocol("expected JSON array relay message".to_string()))?;
    if array.is_empty() {
        return Ok(None);
    }

    let kind = array[0]
        .as_str()
        .ok_or_else(|| ClientError::Protocol("missing relay message kind".to_string()))?;

    match kind {
        "EVENT" => {
            if array.len() < 3 {
                return Err(ClientError::Protocol("invalid EVENT message".to_string()));
            }
            let subscription_id = array[1]
                .as_str()
                .ok_or_else(|| ClientError::Protocol("invalid EVENT subscription id".to_string()))?
                .to_string();
            let event: Event = serde_json::from_value(array[2].clone()).map_err(|error| {
                ClientError::Protocol(format!("invalid EVENT payload: {}", error))
            })?;
            Ok(Some(RelayMessage::Event(subscription_id, event)))
        }
        "EOSE" => {
            if array.len() < 2 {
                return Err(ClientError::Protocol("invalid EOSE message".to_string()));
            }
            let subscription_id = array[1]
                .as_str()
                .ok_or_else(|| ClientError::Protocol("invalid EOSE subscription id".to_string()))?
                .to_string();
            Ok(Some(RelayMessage::Eose(subscription_id)))
        }
        "NOTICE" => {
            if array.len() < 2 {
                return Err(ClientError::Protocol("invalid NOTICE message".to_string()));
            }
            let message = array[1]
                .as_str()
                .ok_or_else(|| ClientError::Protocol("invalid NOTICE message text".to_string()))?
                .to_string();
            Ok(Some(RelayMessage::Notice(message)))
        }
        _ => Ok(None),
    }
}
