//! Multi-relay Nostr client transport.
//!
//! This crate intentionally exposes a small surface:
//! - per-call single-relay transport (query-until-EOSE, publish-and-close)
//! - fan-out query engine with dedup-by-id aggregation and first-match
//! - best-effort multi-relay broadcast
//! - NIP-05 well-known identity resolution
//!
//! Every operation takes its relay set as an explicit argument and
//! opens fresh connections for the duration of the call; no connection
//! state is shared between calls.

pub mod broadcast;
pub mod error;
pub mod fanout;
pub mod nip05;
pub mod relay;

pub use broadcast::{Broadcaster, PublishReceipt};
pub use error::{ClientError, Result};
pub use fanout::FanoutEngine;
pub use relay::{
    DEFAULT_REQUEST_TIMEOUT, RelayMessage, RelayTransport, TransportConfig, parse_relay_message,
};
