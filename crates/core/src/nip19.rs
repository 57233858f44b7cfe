//! NIP-19 bech32-encoded identifiers.
//!
//! Two payload shapes are supported:
//! - simple prefixes (`npub`, `note`) wrap exactly 32 raw bytes
//! - the composite prefix (`nevent`) wraps a TLV stream; TLV type 0
//!   must carry the referenced 32-byte event id, other types (relay
//!   hints, author) are preserved but not required
//!
//! Malformed input always fails with a typed error; an unknown prefix
//! is reported as [`Nip19Error::UnsupportedPrefix`], never silently
//! accepted or mapped to an empty value.

use bech32::{Bech32, Hrp};
use thiserror::Error;

/// TLV type 0: the 32-byte referenced id ("special" field).
pub const TLV_SPECIAL: u8 = 0;
/// TLV type 1: relay hint (UTF-8 relay URL), may repeat.
pub const TLV_RELAY: u8 = 1;
/// TLV type 2: author pubkey hint.
pub const TLV_AUTHOR: u8 = 2;

const NPUB_HRP: &str = "npub";
const NOTE_HRP: &str = "note";
const NEVENT_HRP: &str = "nevent";

/// NIP-19 codec error types.
#[derive(Debug, Error)]
pub enum Nip19Error {
    /// Checksum failure, alphabet violation, or otherwise unparseable
    /// bech32 text.
    #[error("bech32 decode error: {0}")]
    Checksum(String),

    #[error("bech32 encode error: {0}")]
    Encode(String),

    #[error("invalid payload length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("malformed TLV: {0}")]
    Tlv(String),

    #[error("missing required TLV type {0}")]
    MissingField(u8),

    #[error("unsupported identifier prefix: {0}")]
    UnsupportedPrefix(String),
}

/// Codec result type.
pub type Result<T> = std::result::Result<T, Nip19Error>;

/// One decoded `type, length, value` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvEntry {
    pub kind: u8,
    pub value: Vec<u8>,
}

/// A parsed TLV stream, preserving encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvStream {
    entries: Vec<TlvEntry>,
}

impl TlvStream {
    /// All entries in encounter order.
    pub fn entries(&self) -> &[TlvEntry] {
        &self.entries
    }

    /// Values for one type, in encounter order (repeated types
    /// accumulate).
    pub fn values(&self, kind: u8) -> Vec<&[u8]> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.value.as_slice())
            .collect()
    }

    /// First value for one type, if present.
    pub fn first(&self, kind: u8) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.value.as_slice())
    }

    /// Reserialize in encounter order. For any well-formed input,
    /// `parse_tlv(bytes).to_bytes() == bytes`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for entry in &self.entries {
            bytes.push(entry.kind);
            bytes.push(entry.value.len() as u8);
            bytes.extend_from_slice(&entry.value);
        }
        bytes
    }
}

/// Parse a contiguous TLV stream.
///
/// Each entry is one type byte, one length byte, then exactly `length`
/// value bytes. An empty remaining tail at the start of an iteration is
/// the only valid termination; a shorter tail is malformed.
pub fn parse_tlv(bytes: &[u8]) -> Result<TlvStream> {
    let mut entries = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        if rest.len() < 2 {
            return Err(Nip19Error::Tlv("truncated TLV header".to_string()));
        }
        let kind = rest[0];
        let length = rest[1] as usize;
        if rest.len() < 2 + length {
            return Err(Nip19Error::Tlv(format!(
                "not enough data to read TLV type {kind}: declared {length}, remaining {}",
                rest.len() - 2
            )));
        }
        entries.push(TlvEntry {
            kind,
            value: rest[2..2 + length].to_vec(),
        });
        rest = &rest[2 + length..];
    }
    Ok(TlvStream { entries })
}

/// A decoded NIP-19 identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedId {
    /// `npub`: a 32-byte public key.
    Pubkey([u8; 32]),
    /// `note`: a bare 32-byte event id.
    EventId([u8; 32]),
    /// `nevent`: an event pointer with the referenced id plus any
    /// additional TLV hints.
    EventPointer { id: [u8; 32], tlv: TlvStream },
}

impl DecodedId {
    /// Human-readable prefix this identifier decoded from.
    pub fn prefix(&self) -> &'static str {
        match self {
            DecodedId::Pubkey(_) => NPUB_HRP,
            DecodedId::EventId(_) => NOTE_HRP,
            DecodedId::EventPointer { .. } => NEVENT_HRP,
        }
    }
}

/// Decode any supported NIP-19 identifier.
pub fn decode(identifier: &str) -> Result<DecodedId> {
    let (hrp, payload) =
        bech32::decode(identifier).map_err(|error| Nip19Error::Checksum(error.to_string()))?;

    match hrp.to_string().to_lowercase().as_str() {
        NPUB_HRP => Ok(DecodedId::Pubkey(exactly_32(&payload)?)),
        NOTE_HRP => Ok(DecodedId::EventId(exactly_32(&payload)?)),
        NEVENT_HRP => {
            let tlv = parse_tlv(&payload)?;
            let id_bytes = tlv
                .first(TLV_SPECIAL)
                .ok_or(Nip19Error::MissingField(TLV_SPECIAL))?;
            let id = exactly_32(id_bytes)?;
            Ok(DecodedId::EventPointer { id, tlv })
        }
        other => Err(Nip19Error::UnsupportedPrefix(other.to_string())),
    }
}

/// Encode a 32-byte public key as `npub`.
pub fn encode_pubkey(pubkey: &[u8; 32]) -> Result<String> {
    encode_bech32(NPUB_HRP, pubkey)
}

/// Encode a bare 32-byte event id as `note`.
pub fn encode_event_id(event_id: &[u8; 32]) -> Result<String> {
    encode_bech32(NOTE_HRP, event_id)
}

/// Extract the hex event id from a `note` or `nevent` identifier.
pub fn event_id_from_identifier(identifier: &str) -> Result<String> {
    match decode(identifier)? {
        DecodedId::EventId(id) | DecodedId::EventPointer { id, .. } => Ok(hex::encode(id)),
        other => Err(Nip19Error::UnsupportedPrefix(other.prefix().to_string())),
    }
}

fn encode_bech32(hrp: &str, data: &[u8; 32]) -> Result<String> {
    let parsed_hrp = Hrp::parse(hrp).map_err(|error| Nip19Error::Encode(error.to_string()))?;
    bech32::encode::<Bech32>(parsed_hrp, data)
        .map_err(|error| Nip19Error::Encode(error.to_string()))
}

fn exactly_32(bytes: &[u8]) -> Result<[u8; 32]> {
    <[u8; 32]>::try_from(bytes).map_err(|_| Nip19Error::Length {
        expected: 32,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY_HEX: &str = "17162c921dc4d2518f9a101db33695df1afb56ab82f5ff3e5da6eec3ca5cd917";
    const PUBKEY_NPUB: &str = "npub1zutzeysacnf9rru6zqwmxd54mud0k44tst6l70ja5mhv8jjumytsd2x7nu";

    const EVENT_ID_HEX: &str = "b9f5441e45ca39179320e0031cfb18e34078673dcf3bd60a5e0b090ea7e10ba5";
    const EVENT_NOTE: &str = "note1h865g8j9egu30yequqp3e7ccudq8seeaeuaavzj7pvysaflppwjsd5snqf";
    const NEVENT_MINIMAL: &str =
        "nevent1qqstna2yrezu5wghjvswqqculvvwxsrcvu7u7w7kpf0qkzgw5lsshfgx22c88";
    const NEVENT_WITH_RELAY: &str = "nevent1qqstna2yrezu5wghjvswqqculvvwxsrcvu7u7w7kpf0qkzgw5lsshfgpzamhxue69uhhyetvv9ujuetcv9khqmr99e3k7mg09kfmt";
    const NEVENT_NO_SPECIAL: &str = "nevent1qythwumn8ghj7un9d3shjtn90psk6urvv5hxxmmdthjfn5";
    const NEVENT_SHORT_SPECIAL: &str = "nevent1qqgtna2yrezu5wghjvswqqculvvwxclp7ce";
    const NEVENT_TRUNCATED_TLV: &str =
        "nevent1qqstna2yrezu5wghjvswqqculvvwxsrcvu7u7w7kpf0qkzgw5lsshfgpq4skyccs7nyej";
    const NSEC_LIKE: &str = "nsec1zutzeysacnf9rru6zqwmxd54mud0k44tst6l70ja5mhv8jjumytspudl4f";

    fn pubkey_bytes() -> [u8; 32] {
        let mut bytes = [0_u8; 32];
        let decoded = hex::decode(PUBKEY_HEX).unwrap_or_default();
        bytes.copy_from_slice(&decoded);
        bytes
    }

    #[test]
    fn npub_reference_vector_round_trips() -> Result<()> {
        let encoded = encode_pubkey(&pubkey_bytes())?;
        assert_eq!(encoded, PUBKEY_NPUB);

        match decode(&encoded)? {
            DecodedId::Pubkey(bytes) => assert_eq!(bytes, pubkey_bytes()),
            other => assert!(false, "expected pubkey, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn note_decodes_to_bare_event_id() -> Result<()> {
        match decode(EVENT_NOTE)? {
            DecodedId::EventId(bytes) => assert_eq!(hex::encode(bytes), EVENT_ID_HEX),
            other => assert!(false, "expected event id, got {other:?}"),
        }
        assert_eq!(event_id_from_identifier(EVENT_NOTE)?, EVENT_ID_HEX);

        let mut id = [0_u8; 32];
        id.copy_from_slice(&hex::decode(EVENT_ID_HEX).unwrap_or_default());
        assert_eq!(encode_event_id(&id)?, EVENT_NOTE);
        Ok(())
    }

    #[test]
    fn nevent_decodes_referenced_id() -> Result<()> {
        assert_eq!(event_id_from_identifier(NEVENT_MINIMAL)?, EVENT_ID_HEX);
        assert_eq!(event_id_from_identifier(NEVENT_WITH_RELAY)?, EVENT_ID_HEX);
        Ok(())
    }

    #[test]
    fn nevent_preserves_relay_hints() -> Result<()> {
        match decode(NEVENT_WITH_RELAY)? {
            DecodedId::EventPointer { id, tlv } => {
                assert_eq!(hex::encode(id), EVENT_ID_HEX);
                let relays = tlv.values(TLV_RELAY);
                assert_eq!(relays.len(), 1);
                assert_eq!(relays[0], b"wss://relay.example.com");
            }
            other => assert!(false, "expected event pointer, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn nevent_without_type_zero_is_missing_field() {
        assert!(matches!(
            decode(NEVENT_NO_SPECIAL),
            Err(Nip19Error::MissingField(TLV_SPECIAL))
        ));
    }

    #[test]
    fn nevent_with_short_id_is_length_error() {
        assert!(matches!(
            decode(NEVENT_SHORT_SPECIAL),
            Err(Nip19Error::Length {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn truncated_tlv_is_rejected() {
        assert!(matches!(
            decode(NEVENT_TRUNCATED_TLV),
            Err(Nip19Error::Tlv(_))
        ));
    }

    #[test]
    fn unsupported_prefix_is_reported() {
        assert!(matches!(
            decode(NSEC_LIKE),
            Err(Nip19Error::UnsupportedPrefix(prefix)) if prefix == "nsec"
        ));
        assert!(matches!(
            event_id_from_identifier(PUBKEY_NPUB),
            Err(Nip19Error::UnsupportedPrefix(prefix)) if prefix == "npub"
        ));
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut corrupted = PUBKEY_NPUB.to_string();
        corrupted.pop();
        corrupted.push('q');
        assert!(matches!(decode(&corrupted), Err(Nip19Error::Checksum(_))));

        // 'b' is outside the bech32 alphabet
        assert!(matches!(decode("npub1b"), Err(Nip19Error::Checksum(_))));
    }

    #[test]
    fn tlv_reserialization_is_byte_exact() -> Result<()> {
        let mut bytes = vec![TLV_SPECIAL, 32];
        bytes.extend_from_slice(&[0xAB; 32]);
        bytes.extend_from_slice(&[TLV_RELAY, 3]);
        bytes.extend_from_slice(b"abc");
        bytes.extend_from_slice(&[TLV_RELAY, 0]);
        bytes.extend_from_slice(&[TLV_AUTHOR, 2, 0x01, 0x02]);

        let stream = parse_tlv(&bytes)?;
        assert_eq!(stream.to_bytes(), bytes);
        assert_eq!(stream.entries().len(), 4);
        assert_eq!(stream.values(TLV_RELAY), vec![&b"abc"[..], &b""[..]]);
        Ok(())
    }

    #[test]
    fn tlv_repeated_types_accumulate_in_order() -> Result<()> {
        let bytes = [1, 1, 0x0A, 1, 1, 0x0B, 1, 1, 0x0C];
        let stream = parse_tlv(&bytes)?;
        assert_eq!(
            stream.values(1),
            vec![&[0x0A_u8][..], &[0x0B_u8][..], &[0x0C_u8][..]]
        );
        Ok(())
    }

    #[test]
    fn tlv_truncated_value_never_partially_succeeds() {
        // final entry declares length 5 with only 3 trailing bytes
        let bytes = [0, 1, 0xFF, 1, 5, 0x61, 0x62, 0x63];
        assert!(matches!(parse_tlv(&bytes), Err(Nip19Error::Tlv(_))));
    }

    #[test]
    fn tlv_dangling_header_byte_is_rejected() {
        assert!(matches!(parse_tlv(&[7]), Err(Nip19Error::Tlv(_))));
    }

    #[test]
    fn empty_tlv_stream_is_valid() -> Result<()> {
        let stream = parse_tlv(&[])?;
        assert!(stream.entries().is_empty());
        assert!(stream.to_bytes().is_empty());
        Ok(())
    }
}
