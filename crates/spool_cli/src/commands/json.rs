//! Conversion between payload documents and JSON.
//!
//! JSON has no byte strings, so `Bytes` values are written as
//! `{"$bytes": "<hex>"}` and read back from the same shape.

use serde_json::{Map, Number, Value as Json};
use spool_codec::{Document, Value};
use thiserror::Error;

/// Key marking an object that stands for a byte string.
const BYTES_TAG: &str = "$bytes";

/// JSON that has no payload equivalent.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The top-level value must be an object.
    #[error("payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// Integer outside the signed 64-bit range.
    #[error("integer {0} does not fit in i64")]
    IntegerOutOfRange(String),

    /// A `$bytes` object whose value is not even-length lowercase hex.
    #[error("invalid hex in $bytes: {0:?}")]
    InvalidHex(String),
}

/// Renders a document as a JSON object.
pub fn document_to_json(doc: &Document) -> Json {
    Json::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), value_to_json(value)))
            .collect(),
    )
}

/// Renders a value as JSON.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(n) => Json::Number(Number::from(*n)),
        // Infinities have no JSON number form
        Value::Float(f) => Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or_else(|| Json::String(f.to_string())),
        Value::Bytes(bytes) => {
            let mut tagged = Map::new();
            tagged.insert(BYTES_TAG.to_string(), Json::String(to_hex(bytes)));
            Json::Object(tagged)
        }
        Value::Text(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(doc) => document_to_json(doc),
    }
}

/// Parses a JSON object into a document.
pub fn document_from_json(json: Json) -> Result<Document, ConvertError> {
    match json {
        Json::Object(map) => object_to_document(map),
        other => Err(ConvertError::NotAnObject(json_kind(&other))),
    }
}

fn value_from_json(json: Json) -> Result<Value, ConvertError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if n.is_u64() {
                return Err(ConvertError::IntegerOutOfRange(n.to_string()));
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::Text(s),
        Json::Array(items) => Value::Array(
            items
                .into_iter()
                .map(value_from_json)
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(map) => {
            if map.len() == 1 {
                if let Some(Json::String(hex)) = map.get(BYTES_TAG) {
                    let bytes = from_hex(hex)?;
                    return Ok(Value::Bytes(bytes));
                }
            }
            Value::Map(object_to_document(map)?)
        }
    })
}

fn object_to_document(map: Map<String, Json>) -> Result<Document, ConvertError> {
    map.into_iter()
        .map(|(key, value)| Ok((key, value_from_json(value)?)))
        .collect()
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(hex: &str) -> Result<Vec<u8>, ConvertError> {
    let invalid = || ConvertError::InvalidHex(hex.to_string());
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(invalid());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_becomes_document() {
        let doc = document_from_json(json!({
            "name": "login",
            "count": 3,
            "ratio": 0.5,
            "ok": true,
            "none": null,
            "tags": ["a", 1],
            "nested": {"x": -1}
        }))
        .unwrap();

        assert_eq!(doc.get("name"), Some(&Value::from("login")));
        assert_eq!(doc.get("count"), Some(&Value::Integer(3)));
        assert_eq!(doc.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(doc.get("none"), Some(&Value::Null));
        assert_eq!(
            doc.get("tags"),
            Some(&Value::Array(vec![Value::from("a"), Value::Integer(1)]))
        );
        let nested = doc.get("nested").and_then(Value::as_document).unwrap();
        assert_eq!(nested.get("x"), Some(&Value::Integer(-1)));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = document_from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ConvertError::NotAnObject("an array")));
    }

    #[test]
    fn huge_integer_is_rejected() {
        let err = document_from_json(json!({"n": u64::MAX})).unwrap_err();
        assert!(matches!(err, ConvertError::IntegerOutOfRange(_)));
    }

    #[test]
    fn bytes_use_tagged_hex() {
        let doc = Document::new().with("blob", vec![0x00u8, 0xab, 0xff]);
        let json = document_to_json(&doc);
        assert_eq!(json, json!({"blob": {"$bytes": "00abff"}}));
        assert_eq!(document_from_json(json).unwrap(), doc);
    }

    #[test]
    fn bad_hex_is_rejected() {
        let err = document_from_json(json!({"b": {"$bytes": "abc"}})).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidHex(_)));
    }

    #[test]
    fn infinity_renders_as_string() {
        let json = value_to_json(&Value::Float(f64::INFINITY));
        assert_eq!(json, json!("inf"));
    }
}
