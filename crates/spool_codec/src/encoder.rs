//! Canonical CBOR encoder.

use crate::document::Document;
use crate::error::CodecResult;
use crate::value::{cmp_canonical_keys, Value};

/// Half-precision quiet NaN, the only NaN encoding the encoder emits.
pub(crate) const CANONICAL_NAN: [u8; 3] = [0xf9, 0x7e, 0x00];

/// Encode a value to canonical CBOR bytes.
///
/// This function produces deterministic output following the canonical
/// CBOR rules of RFC 8949 Section 4.2.1:
/// - Map keys are sorted by their encoded form (length-first, then bytewise)
/// - Integers use the shortest possible encoding
/// - Floats are written as 64-bit doubles, except NaN which is always the
///   half-precision quiet NaN `0xf9 0x7e 0x00`
/// - No indefinite-length encoding
///
/// # Errors
///
/// Every payload value has an encoding; the `Result` is kept so that
/// encoders with limits share this signature.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Encode a document to canonical CBOR bytes.
///
/// # Errors
///
/// See [`to_canonical_cbor`].
pub fn encode_document(doc: &Document) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::with_capacity(16 * doc.len() + 1);
    encoder.encode_document(doc)?;
    Ok(encoder.into_bytes())
}

/// A canonical CBOR encoder.
pub struct CanonicalEncoder {
    buffer: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => {
                self.encode_null();
                Ok(())
            }
            Value::Bool(b) => {
                self.encode_bool(*b);
                Ok(())
            }
            Value::Integer(n) => {
                self.encode_integer(*n);
                Ok(())
            }
            Value::Float(f) => {
                self.encode_float(*f);
                Ok(())
            }
            Value::Bytes(b) => {
                self.encode_bytes(b);
                Ok(())
            }
            Value::Text(s) => {
                self.encode_text(s);
                Ok(())
            }
            Value::Array(arr) => self.encode_array(arr),
            Value::Map(doc) => self.encode_document(doc),
        }
    }

    /// Encode a document as a CBOR map with sorted text keys.
    pub fn encode_document(&mut self, doc: &Document) -> CodecResult<()> {
        let mut fields: Vec<(&String, &Value)> = doc.iter().collect();
        fields.sort_by(|a, b| cmp_canonical_keys(a.0, b.0));

        self.encode_unsigned(5, fields.len() as u64);
        for (key, value) in fields {
            self.encode_text(key);
            self.encode(value)?;
        }
        Ok(())
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn encode_null(&mut self) {
        // CBOR null is simple value 22 (0xf6)
        self.buffer.push(0xf6);
    }

    fn encode_bool(&mut self, b: bool) {
        // CBOR false is 0xf4, true is 0xf5
        self.buffer.push(if b { 0xf5 } else { 0xf4 });
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode_integer(&mut self, n: i64) {
        if n >= 0 {
            self.encode_unsigned(0, n as u64);
        } else {
            // CBOR negative integers encode -(n+1)
            let abs_minus_one = (-(n + 1)) as u64;
            self.encode_unsigned(1, abs_minus_one);
        }
    }

    fn encode_float(&mut self, f: f64) {
        // Every NaN payload and sign collapses to one canonical form
        if f.is_nan() {
            self.buffer.extend_from_slice(&CANONICAL_NAN);
            return;
        }
        self.buffer.push(0xfb);
        self.buffer.extend_from_slice(&f.to_be_bytes());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_unsigned(&mut self, major_type: u8, value: u64) {
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

    fn encode_bytes(&mut self, bytes: &[u8]) {
        self.encode_unsigned(2, bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
    }

    fn encode_text(&mut self, text: &str) {
        self.encode_unsigned(3, text.len() as u64);
        self.buffer.extend_from_slice(text.as_bytes());
    }

    fn encode_array(&mut self, arr: &[Value]) -> CodecResult<()> {
        self.encode_unsigned(4, arr.len() as u64);
        for item in arr {
            self.encode(item)?;
        }
        Ok(())
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_null() {
        let bytes = to_canonical_cbor(&Value::Null).unwrap();
        assert_eq!(bytes, vec![0xf6]);
    }

    #[test]
    fn encode_bool() {
        assert_eq!(to_canonical_cbor(&Value::Bool(false)).unwrap(), vec![0xf4]);
        assert_eq!(to_canonical_cbor(&Value::Bool(true)).unwrap(), vec![0xf5]);
    }

    #[test]
    fn encode_small_positive_integers() {
        assert_eq!(to_canonical_cbor(&Value::Integer(0)).unwrap(), vec![0x00]);
        assert_eq!(to_canonical_cbor(&Value::Integer(23)).unwrap(), vec![0x17]);
    }

    #[test]
    fn encode_multi_byte_integers() {
        assert_eq!(
            to_canonical_cbor(&Value::Integer(24)).unwrap(),
            vec![0x18, 24]
        );
        assert_eq!(
            to_canonical_cbor(&Value::Integer(256)).unwrap(),
            vec![0x19, 0x01, 0x00]
        );
        assert_eq!(
            to_canonical_cbor(&Value::Integer(65536)).unwrap(),
            vec![0x1a, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn encode_negative_integers() {
        assert_eq!(to_canonical_cbor(&Value::Integer(-1)).unwrap(), vec![0x20]);
        assert_eq!(
            to_canonical_cbor(&Value::Integer(-100)).unwrap(),
            vec![0x38, 99]
        );
    }

    #[test]
    fn encode_float_as_double() {
        let bytes = to_canonical_cbor(&Value::Float(1.5)).unwrap();
        assert_eq!(bytes, vec![0xfb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn encode_nan_canonically() {
        assert_eq!(
            to_canonical_cbor(&Value::Float(f64::NAN)).unwrap(),
            vec![0xf9, 0x7e, 0x00]
        );
        // Sign and payload bits are not preserved
        let odd_nan = f64::from_bits(0xfff8_0000_0000_0001);
        assert!(odd_nan.is_nan());
        assert_eq!(
            to_canonical_cbor(&Value::Float(odd_nan)).unwrap(),
            vec![0xf9, 0x7e, 0x00]
        );
    }

    #[test]
    fn encode_text_and_bytes() {
        assert_eq!(
            to_canonical_cbor(&Value::Text("a".to_string())).unwrap(),
            vec![0x61, b'a']
        );
        assert_eq!(
            to_canonical_cbor(&Value::Bytes(vec![1, 2, 3])).unwrap(),
            vec![0x43, 1, 2, 3]
        );
    }

    #[test]
    fn encode_document_sorted() {
        // Keys sorted length-first: "a" before "bb"
        let doc = Document::new().with("bb", 2i64).with("a", 1i64);
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(bytes, vec![0xa2, 0x61, b'a', 0x01, 0x62, b'b', b'b', 0x02]);
    }

    #[test]
    fn encode_empty_document() {
        assert_eq!(encode_document(&Document::new()).unwrap(), vec![0xa0]);
    }

    #[test]
    fn deterministic_encoding() {
        let doc1 = Document::new().with("z", 1i64).with("aa", 2i64);
        let doc2 = Document::new().with("aa", 2i64).with("z", 1i64);

        assert_eq!(
            encode_document(&doc1).unwrap(),
            encode_document(&doc2).unwrap()
        );
    }
}
