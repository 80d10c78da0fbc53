//! # Spool Codec
//!
//! Payload documents and their canonical CBOR encoding.
//!
//! Every staged entry carries a [`Document`]: a map of text keys to
//! [`Value`]s. On disk a document is stored as one canonical CBOR map, so:
//! - Identical documents produce identical bytes
//! - Any standard CBOR reader can open an entry file
//! - Round-trips are lossless
//!
//! ## Canonical CBOR Rules
//!
//! - Map keys are text and sorted length-first, then bytewise
//! - Integers use shortest encoding
//! - Floats are written as doubles; NaN is written as half-precision `0x7e00`
//! - No indefinite-length items
//!
//! ## Usage
//!
//! ```
//! use spool_codec::{decode_document, encode_document, Document, Value};
//!
//! let doc = Document::new()
//!     .with("path", "/v1/events")
//!     .with("retries", 0i64)
//!     .with("ratio", 0.5);
//!
//! let bytes = encode_document(&doc).unwrap();
//! let decoded = decode_document(&bytes).unwrap();
//! assert_eq!(doc, decoded);
//! assert_eq!(decoded.get("ratio"), Some(&Value::Float(0.5)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod document;
mod encoder;
mod error;
mod value;

pub use decoder::{decode_document, from_cbor, CanonicalDecoder};
pub use document::Document;
pub use encoder::{encode_document, to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{cmp_canonical_keys, Value};

/// Trait for types that can be encoded to canonical CBOR.
pub trait Encode {
    /// Encode this value to canonical CBOR bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from CBOR.
pub trait Decode: Sized {
    /// Decode this value from CBOR bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Value {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(self)
    }
}

impl Decode for Value {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}

impl Encode for Document {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_document(self)
    }
}

impl Decode for Document {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_document(bytes)
    }
}
