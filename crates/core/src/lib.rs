//! Nostr protocol primitives shared by the relay client.
//!
//! This crate intentionally exposes a small surface:
//! - event data model and canonical content-addressed event ids (NIP-01)
//! - bech32 identifier codec with the TLV composite sub-format (NIP-19)
//!
//! Everything here is pure and synchronous; network concerns live in
//! `relaycast-client`.

pub mod nip01;
pub mod nip19;

pub use nip01::{Event, EventError, event_hash, parse_pubkey};
pub use nip19::{
    DecodedId, Nip19Error, TlvEntry, TlvStream, encode_event_id, encode_pubkey,
    event_id_from_identifier, parse_tlv,
};
