use super::error::{CodecError, CodecResult};
use crate::blob::{Blob, BLOB_TYPE};
use crate::readonly::{ReadOnlyArray, ReadOnlyDictionary};
use crate::value::Value;
use std::collections::HashSet;

/// Decodes exactly one value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a single well-formed item, or use
/// a construct the encoder never produces.
pub fn decode(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = ValueDecoder::new(bytes);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CodecError::invalid_structure("trailing bytes after value"));
    }
    Ok(value)
}

/// A CBOR decoder producing [`Value`]s.
pub struct ValueDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Maximum element count for arrays and maps, against allocation bombs.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum string length.
const MAX_TEXT_LENGTH: u64 = 256 * 1024 * 1024;

impl<'a> ValueDecoder<'a> {
    /// Creates a new decoder for the given bytes.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decodes the next value.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed or unsupported input.
    pub fn decode(&mut self) -> CodecResult<Value> {
        let initial_byte = self.read_byte()?;
        let major_type = initial_byte >> 5;
        let additional_info = initial_byte & 0x1f;

        match major_type {
            0 => {
                let n = self.decode_head(additional_info)?;
                i64::try_from(n)
                    .map(Value::Integer)
                    .map_err(|_| CodecError::invalid_structure("integer exceeds i64 range"))
            }
            1 => {
                // Negative integer: value is -(n+1).
                let n = self.decode_head(additional_info)?;
                i64::try_from(n)
                    .map(|n| Value::Integer(-n - 1))
                    .map_err(|_| CodecError::invalid_structure("integer exceeds i64 range"))
            }
            2 => Err(CodecError::unsupported_type("byte string")),
            3 => self.decode_text(additional_info).map(Value::String),
            4 => self.decode_array(additional_info),
            5 => self.decode_map(additional_info),
            6 => Err(CodecError::unsupported_type("tag")),
            7 => self.decode_simple(additional_info),
            _ => Err(CodecError::invalid_structure("invalid major type")),
        }
    }

    /// Returns true if all bytes have been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(CodecError::UnexpectedEof)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn decode_head(&mut self, additional_info: u8) -> CodecResult<u64> {
        let non_canonical =
            || CodecError::invalid_structure("non-canonical: value could be encoded in fewer bytes");
        match additional_info {
            0..=23 => Ok(u64::from(additional_info)),
            24 => {
                let byte = self.read_byte()?;
                if byte < 24 {
                    return Err(non_canonical());
                }
                Ok(u64::from(byte))
            }
            25 => {
                let value = u16::from_be_bytes(self.read_array()?);
                if u8::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            26 => {
                let value = u32::from_be_bytes(self.read_array()?);
                if u16::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            27 => {
                let value = u64::from_be_bytes(self.read_array()?);
                if u32::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(value)
            }
            31 => Err(CodecError::IndefiniteLengthForbidden),
            _ => Err(CodecError::invalid_structure("reserved additional info")),
        }
    }

    fn decode_length(&mut self, additional_info: u8, max_allowed: u64) -> CodecResult<usize> {
        let claimed = self.decode_head(additional_info)?;
        if claimed > max_allowed {
            return Err(CodecError::SizeLimitExceeded {
                claimed,
                max_allowed,
            });
        }
        usize::try_from(claimed).map_err(|_| CodecError::SizeLimitExceeded {
            claimed,
            max_allowed,
        })
    }

    fn decode_text(&mut self, additional_info: u8) -> CodecResult<String> {
        let len = self.decode_length(additional_info, MAX_TEXT_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(text.to_string())
    }

    fn decode_array(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity(len.min(self.data.len() - self.pos));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::Array(ReadOnlyArray::from_values(items)))
    }

    fn decode_map(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut entries = Vec::with_capacity(len.min(self.data.len() - self.pos));
        let mut seen = HashSet::with_capacity(entries.capacity());

        for _ in 0..len {
            let head = self.read_byte()?;
            if head >> 5 != 3 {
                return Err(CodecError::invalid_structure("map keys must be text"));
            }
            let key = self.decode_text(head & 0x1f)?;
            if !seen.insert(key.clone()) {
                return Err(CodecError::invalid_structure(format!(
                    "duplicate map key {key:?}"
                )));
            }
            let value = self.decode()?;
            entries.push((key, value));
        }

        Ok(match blob_from_entries(&entries) {
            Some(blob) => Value::Blob(blob),
            None => Value::Dictionary(ReadOnlyDictionary::from_entries(entries)),
        })
    }

    fn decode_simple(&mut self, additional_info: u8) -> CodecResult<Value> {
        match additional_info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            27 => {
                let value = f64::from_be_bytes(self.read_array()?);
                if value.is_nan() {
                    return Err(CodecError::NaNForbidden);
                }
                Ok(Value::Float(value))
            }
            25 | 26 => Err(CodecError::unsupported_type("short float")),
            31 => Err(CodecError::invalid_structure("break without indefinite")),
            _ => Err(CodecError::unsupported_type(format!(
                "simple value {additional_info}"
            ))),
        }
    }
}

/// Recognizes the map shape the encoder writes for blobs.
fn blob_from_entries(entries: &[(String, Value)]) -> Option<Blob> {
    let mut kind = None;
    let mut content_type = None;
    let mut digest = None;
    let mut length = None;
    for (key, value) in entries {
        match (key.as_str(), value) {
            ("@type", Value::String(s)) => kind = Some(s.as_str()),
            ("content_type", Value::String(s)) => content_type = Some(s.clone()),
            ("digest", Value::String(s)) => digest = Some(s.clone()),
            ("length", Value::Integer(n)) => length = Some(u64::try_from(*n).ok()?),
            _ => return None,
        }
    }
    if kind? != BLOB_TYPE {
        return None;
    }
    Some(Blob::new(content_type, digest?, length?))
}
