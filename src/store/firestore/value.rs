//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore REST documents wrap every field in a single-key object naming
//! its type (`{"stringValue": "x"}`, `{"integerValue": "3"}`, ...). Records
//! are serialized with serde into plain JSON first and then wrapped here, so
//! the store code never builds typed values by hand.

use crate::error::{ChefError, Result};
use serde_json::{json, Map, Number, Value};

/// Wrap a plain JSON value in Firestore's typed encoding
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every entry of a JSON object, producing a document `fields` map
pub fn encode_fields(map: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = map
        .iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect();
    Value::Object(fields)
}

/// Unwrap a Firestore typed value into plain JSON
pub fn decode(value: &Value) -> Result<Value> {
    let map = value
        .as_object()
        .ok_or_else(|| malformed("typed value is not an object", value))?;
    let (kind, inner) = map
        .iter()
        .next()
        .ok_or_else(|| malformed("typed value is empty", value))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed("booleanValue", inner)),
        "integerValue" => {
            // Integers travel as decimal strings
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| malformed("integerValue", inner))
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| malformed("doubleValue", inner)),
        "stringValue" | "timestampValue" | "referenceValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| malformed(kind, inner)),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode).collect::<Result<_>>()?,
                // An empty array is sent as `{}`
                None => Vec::new(),
                Some(other) => return Err(malformed("arrayValue", other)),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => decode_fields(fields),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(ChefError::MalformedResponse(format!(
            "Unsupported Firestore value type: {}",
            other
        ))),
    }
}

/// Decode a document `fields` map into a plain JSON object
pub fn decode_fields(fields: &Value) -> Result<Value> {
    let map = fields
        .as_object()
        .ok_or_else(|| malformed("fields is not an object", fields))?;
    let decoded = map
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode(value)?)))
        .collect::<Result<Map<String, Value>>>()?;
    Ok(Value::Object(decoded))
}

fn malformed(what: &str, value: &Value) -> ChefError {
    ChefError::MalformedResponse(format!("Invalid Firestore {}: {}", what, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&json!(3)), json!({"integerValue": "3"}));
        assert_eq!(encode(&json!(2.5)), json!({"doubleValue": 2.5}));
        assert_eq!(encode(&json!("hi")), json!({"stringValue": "hi"}));
        assert_eq!(encode(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode(&Value::Null), json!({"nullValue": null}));
    }

    #[test]
    fn test_encode_nested() {
        let encoded = encode_fields(
            json!({"likedBy": ["a"], "meta": {"n": 1}})
                .as_object()
                .unwrap(),
        );
        assert_eq!(
            encoded,
            json!({
                "likedBy": {"arrayValue": {"values": [{"stringValue": "a"}]}},
                "meta": {"mapValue": {"fields": {"n": {"integerValue": "1"}}}}
            })
        );
    }

    #[test]
    fn test_decode_document_fields() {
        let fields = json!({
            "name": {"stringValue": "Soup"},
            "likes": {"integerValue": "12"},
            "calories": {"doubleValue": 410.5},
            "dislikedBy": {"arrayValue": {}},
            "createdAt": {"timestampValue": "2024-05-01T10:00:00Z"}
        });
        assert_eq!(
            decode_fields(&fields).unwrap(),
            json!({
                "name": "Soup",
                "likes": 12,
                "calories": 410.5,
                "dislikedBy": [],
                "createdAt": "2024-05-01T10:00:00Z"
            })
        );
    }

    #[test]
    fn test_decode_rejects_bad_integer() {
        let err = decode(&json!({"integerValue": "twelve"})).unwrap_err();
        assert!(matches!(err, ChefError::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let err = decode(&json!({"geoPointValue": {"latitude": 1.0}})).unwrap_err();
        assert!(err.to_string().contains("geoPointValue"));
    }
}
