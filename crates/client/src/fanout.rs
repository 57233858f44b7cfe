//! Multi-relay fan-out query engine.
//!
//! Both operations issue the same filter against every relay in the
//! supplied set concurrently. The relay set is an explicit per-call
//! argument; nothing here holds ambient relay state. Per-relay failures
//! are absorbed (logged, never propagated): partial relay availability
//! degrades the result, it does not fail the call.

use crate::relay::RelayTransport;
use relaycast_core::Event;
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fan-out query engine over a per-call relay set.
#[derive(Debug, Clone, Default)]
pub struct FanoutEngine {
    transport: RelayTransport,
}

impl FanoutEngine {
    /// Create an engine using the given transport.
    pub fn new(transport: RelayTransport) -> Self {
        Self { transport }
    }

    /// Query every relay and aggregate all events, deduplicated by
    /// event id.
    ///
    /// Dedup is strictly first-arrival-wins: if two relays report the
    /// same id with differing bodies, the first-arriving body is kept
    /// without comparison. Ids are content-addressed, so divergence
    /// implies a misbehaving relay; callers that need to detect that
    /// use [`Event::verify_id`] on the results. Returns once every
    /// relay has reached end-of-stream, timed out, or errored, in
    /// arrival order.
    pub async fn collect_all(&self, endpoints: &[String], filter: &Value) -> Vec<Event> {
        let (sink, mut arrivals) = mpsc::unbounded_channel();
        let _handles = self.spawn_queries(endpoints, filter, &sink);
        drop(sink);

        // The channel closes once every per-relay task has settled.
        let mut seen = HashSet::new();
        let mut events = Vec::new();
        while let Some(event) = arrivals.recv().await {
            if seen.insert(event.id.clone()) {
                events.push(event);
            }
        }
        events
    }

    /// Query every relay and resolve with the first event any relay
    /// yields.
    ///
    /// Remaining in-flight queries are torn down on resolution:
    /// their tasks are aborted (dropping the task closes its
    /// connection) and any task mid-send observes the closed channel
    /// and winds down cooperatively. Resolves to `None`, not an error,
    /// when every relay settles without yielding an event.
    pub async fn first_match(&self, endpoints: &[String], filter: &Value) -> Option<Event> {
        let (sink, mut arrivals) = mpsc::unbounded_channel();
        let handles = self.spawn_queries(endpoints, filter, &sink);
        drop(sink);

        let first = arrivals.recv().await;
        drop(arrivals);
        for handle in &handles {
            handle.abort();
        }
        first
    }

    fn spawn_queries(
        &self,
        endpoints: &[String],
        filter: &Value,
        sink: &mpsc::UnboundedSender<Event>,
    ) -> Vec<JoinHandle<()>> {
        endpoints
            .iter()
            .map(|endpoint| {
                let transport = self.transport.clone();
                let endpoint = endpoint.clone();
                let filter = filter.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    if let Err(error) = transport.query(&endpoint, &filter, sink).await {
                        debug!("relay query absorbed: {}", error);
                    }
                })
            })
            .collect()
    }
}
