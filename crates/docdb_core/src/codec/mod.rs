//! Binary encoding of field values.
//!
//! Each top-level document field is stored as one CBOR item:
//! - integers use the shortest head; floats are always 64-bit (`0xfb`)
//! - dictionaries are maps with text keys in stored order
//! - blobs are maps tagged with `"@type": "blob"`
//! - indefinite lengths, NaN, non-text keys, duplicate keys and trailing
//!   bytes are rejected
//!
//! Equal values always encode to equal bytes, so revision digests computed
//! over the encoded fields are stable.

mod decoder;
mod encoder;
mod error;

pub use decoder::{decode, ValueDecoder};
pub use encoder::{encode, ValueEncoder};
pub use error::{CodecError, CodecResult};
