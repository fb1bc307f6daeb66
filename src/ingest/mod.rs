pub mod decode;
pub mod event;

pub use decode::{decode_payload, DecodeError, Payload};
pub use event::{encode_batch, normalize, normalize_at, WatchEvent};
