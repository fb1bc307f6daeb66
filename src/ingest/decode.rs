use super::event::WatchEvent;
use thiserror::Error;

/// Errors produced while decoding an ingest request body.
///
/// All variants are client errors; the message carries the parser detail.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json: empty body")]
    Empty,

    #[error("invalid json payload: expected object or array, found {0}")]
    UnexpectedToken(String),

    #[error("decode err: {0}")]
    Object(#[source] serde_json::Error),

    #[error("decode array err: {0}")]
    Array(#[source] serde_json::Error),
}

/// The two accepted body shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(WatchEvent),
    Batch(Vec<WatchEvent>),
}

impl Payload {
    /// Flatten into the list of events to persist, in submission order.
    pub fn into_events(self) -> Vec<WatchEvent> {
        match self {
            Payload::Single(event) => vec![event],
            Payload::Batch(events) => events,
        }
    }
}

/// Decode a request body that is either a single event object or an array
/// of event objects.
///
/// The first non-whitespace byte selects the decode target, so no
/// discriminator field is needed. Unknown fields, truncated input and
/// trailing data are all rejected.
pub fn decode_payload(body: &[u8]) -> Result<Payload, DecodeError> {
    let first = body
        .iter()
        .copied()
        .find(|b| !is_json_whitespace(*b))
        .ok_or(DecodeError::Empty)?;

    match first {
        b'{' => serde_json::from_slice::<WatchEvent>(body)
            .map(Payload::Single)
            .map_err(DecodeError::Object),
        b'[' => serde_json::from_slice::<Vec<WatchEvent>>(body)
            .map(Payload::Batch)
            .map_err(DecodeError::Array),
        other => Err(DecodeError::UnexpectedToken(describe_byte(other))),
    }
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn describe_byte(b: u8) -> String {
    if b.is_ascii_graphic() {
        format!("'{}'", b as char)
    } else {
        format!("byte 0x{:02x}", b)
    }
}
