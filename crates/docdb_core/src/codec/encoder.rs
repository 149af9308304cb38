use super::error::{CodecError, CodecResult};
use crate::blob::{Blob, BLOB_TYPE};
use crate::readonly::{ReadOnlyArray, ReadOnlyDictionary};
use crate::value::Value;

/// Encodes a value to CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::NaNForbidden`] if the value holds a NaN float.
pub fn encode(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = ValueEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// A CBOR encoder for [`Value`].
#[derive(Debug, Default)]
pub struct ValueEncoder {
    buffer: Vec<u8>,
}

impl ValueEncoder {
    /// Creates a new encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new encoder with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Appends one value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NaNForbidden`] if the value holds a NaN float.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => self.buffer.push(0xf6),
            Value::Bool(b) => self.buffer.push(if *b { 0xf5 } else { 0xf4 }),
            Value::Integer(n) => self.encode_integer(*n),
            Value::Float(f) => self.encode_float(*f)?,
            Value::String(s) => self.encode_text(s),
            Value::Blob(blob) => self.encode_blob(blob),
            Value::Array(array) => self.encode_array(array)?,
            Value::Dictionary(dict) => self.encode_map(dict)?,
        }
        Ok(())
    }

    /// Consumes the encoder and returns the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode_integer(&mut self, n: i64) {
        if n >= 0 {
            self.encode_head(0, n as u64);
        } else {
            // -1 encodes as 0, -2 as 1; for n in [-2^63, -1], -(n+1) fits u64.
            self.encode_head(1, (-(n + 1)) as u64);
        }
    }

    fn encode_float(&mut self, f: f64) -> CodecResult<()> {
        if f.is_nan() {
            return Err(CodecError::NaNForbidden);
        }
        self.buffer.push(0xfb);
        self.buffer.extend_from_slice(&f.to_be_bytes());
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_head(&mut self, major_type: u8, value: u64) {
        let mt = major_type << 5;

        if value < 24 {
            self.buffer.push(mt | (value as u8));
        } else if u8::try_from(value).is_ok() {
            self.buffer.push(mt | 24);
            self.buffer.push(value as u8);
        } else if u16::try_from(value).is_ok() {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
        } else if u32::try_from(value).is_ok() {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn encode_text(&mut self, text: &str) {
        self.encode_head(3, text.len() as u64);
        self.buffer.extend_from_slice(text.as_bytes());
    }

    fn encode_blob(&mut self, blob: &Blob) {
        let fields = if blob.content_type().is_some() { 4 } else { 3 };
        self.encode_head(5, fields);
        self.encode_text("@type");
        self.encode_text(BLOB_TYPE);
        if let Some(content_type) = blob.content_type() {
            self.encode_text("content_type");
            self.encode_text(content_type);
        }
        self.encode_text("digest");
        self.encode_text(blob.digest());
        self.encode_text("length");
        self.encode_head(0, blob.length());
    }

    fn encode_array(&mut self, array: &ReadOnlyArray) -> CodecResult<()> {
        self.encode_head(4, array.count() as u64);
        for item in array {
            self.encode(item)?;
        }
        Ok(())
    }

    fn encode_map(&mut self, dict: &ReadOnlyDictionary) -> CodecResult<()> {
        self.encode_head(5, dict.count() as u64);
        for (key, value) in dict.iter() {
            self.encode_text(key);
            self.encode(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_simple_values() {
        assert_eq!(encode(&Value::Null).unwrap(), vec![0xf6]);
        assert_eq!(encode(&Value::Bool(false)).unwrap(), vec![0xf4]);
        assert_eq!(encode(&Value::Bool(true)).unwrap(), vec![0xf5]);
    }

    #[test]
    fn encode_integers_shortest_form() {
        assert_eq!(encode(&Value::Integer(0)).unwrap(), vec![0x00]);
        assert_eq!(encode(&Value::Integer(23)).unwrap(), vec![0x17]);
        assert_eq!(encode(&Value::Integer(24)).unwrap(), vec![0x18, 24]);
        assert_eq!(encode(&Value::Integer(256)).unwrap(), vec![0x19, 0x01, 0x00]);
        assert_eq!(encode(&Value::Integer(-1)).unwrap(), vec![0x20]);
        assert_eq!(encode(&Value::Integer(-100)).unwrap(), vec![0x38, 99]);
        assert_eq!(encode(&Value::Integer(i64::MIN)).unwrap()[0], 0x3b);
    }

    #[test]
    fn encode_float_is_always_64_bit() {
        let bytes = encode(&Value::Float(1.5)).unwrap();
        assert_eq!(bytes[0], 0xfb);
        assert_eq!(bytes.len(), 9);
        assert_eq!(&bytes[1..], &1.5f64.to_be_bytes());
    }

    #[test]
    fn encode_nan_fails() {
        assert_eq!(encode(&Value::Float(f64::NAN)), Err(CodecError::NaNForbidden));
        let nested = Value::from(vec![Value::Float(f64::NAN)]);
        assert_eq!(encode(&nested), Err(CodecError::NaNForbidden));
    }

    #[test]
    fn encode_text() {
        assert_eq!(encode(&Value::from("")).unwrap(), vec![0x60]);
        assert_eq!(encode(&Value::from("a")).unwrap(), vec![0x61, b'a']);
    }

    #[test]
    fn encode_map_keeps_stored_order() {
        let dict = ReadOnlyDictionary::from_entries([("b", Value::from(1)), ("a", Value::from(2))]);
        assert_eq!(
            encode(&Value::Dictionary(dict)).unwrap(),
            vec![0xa2, 0x61, b'b', 0x01, 0x61, b'a', 0x02]
        );
    }

    #[test]
    fn encode_is_deterministic() {
        let value = Value::from_json(serde_json::json!({"x": [1, 2.5, "s", null]}));
        assert_eq!(encode(&value).unwrap(), encode(&value.clone()).unwrap());
    }
}
