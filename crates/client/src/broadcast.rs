//! Multi-relay broadcast engine.
//!
//! Fire the same event batch at every relay independently and wait for
//! all attempts to settle. Best effort: per-relay failures are recorded
//! in the returned receipts, never raised.

use crate::relay::RelayTransport;
use futures_util::future::join_all;
use relaycast_core::Event;
use tracing::warn;

/// Outcome of one relay's publish attempt.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub relay: String,
    pub accepted: bool,
    pub detail: String,
}

/// Best-effort multi-relay publisher.
#[derive(Debug, Clone, Default)]
pub struct Broadcaster {
    transport: RelayTransport,
}

impl Broadcaster {
    /// Create a broadcaster using the given transport.
    pub fn new(transport: RelayTransport) -> Self {
        Self { transport }
    }

    /// Push `events` to every relay concurrently, in order per relay.
    ///
    /// Waits for every attempt to settle. The aggregate call never
    /// fails; callers that care about individual relays inspect the
    /// receipts, callers that only want best-effort completion ignore
    /// them.
    pub async fn broadcast(&self, endpoints: &[String], events: &[Event]) -> Vec<PublishReceipt> {
        let attempts = endpoints.iter().map(|endpoint| {
            let transport = self.transport.clone();
            async move {
                match transport.publish(endpoint, events).await {
                    Ok(()) => PublishReceipt {
                        relay: endpoint.clone(),
                        accepted: true,
                        detail: format!("sent {} events", events.len()),
                    },
                    Err(error) => {
                        warn!("broadcast to {} failed: {}", endpoint, error);
                        PublishReceipt {
                            relay: endpoint.clone(),
                            accepted: false,
                            detail: error.to_string(),
                        }
                    }
                }
            }
        });
        join_all(attempts).await
    }
}
