//! Firestore typed value codec.
//!
//! Firestore stores every field as a tagged value (`stringValue`,
//! `integerValue`, `mapValue`, ...). Reports travel through `serde_json`
//! first, so the codec translates between plain JSON and the tagged form.

use serde_json::{Map, Number, Value, json};

/// Top-level fields stored as `timestampValue` so queries can order by them.
const TIMESTAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

/// Encode a JSON object as a Firestore `fields` map.
pub(super) fn encode_fields(object: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = object
        .iter()
        .map(|(key, value)| {
            let encoded = match value {
                Value::String(raw) if TIMESTAMP_FIELDS.contains(&key.as_str()) => {
                    json!({ "timestampValue": raw })
                }
                other => encode(other),
            };
            (key.clone(), encoded)
        })
        .collect();
    Value::Object(fields)
}

fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number }),
        },
        Value::String(raw) => json!({ "stringValue": raw }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() } })
        }
        Value::Object(object) => json!({ "mapValue": { "fields": encode_fields_plain(object) } }),
    }
}

fn encode_fields_plain(object: &Map<String, Value>) -> Value {
    Value::Object(
        object
            .iter()
            .map(|(key, value)| (key.clone(), encode(value)))
            .collect(),
    )
}

/// Decode a Firestore `fields` map into a plain JSON object.
pub(super) fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, String> {
    fields
        .iter()
        .map(|(key, value)| decode(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}

fn decode(value: &Value) -> Result<Value, String> {
    let Some((tag, inner)) = value.as_object().and_then(|object| object.iter().next()) else {
        return Err(format!("expected a typed value, found {value}"));
    };
    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue"
        | "referenceValue" => Ok(inner.clone()),
        "integerValue" => decode_integer(inner),
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map_or(Ok(Vec::new()), |items| items.iter().map(decode).collect())
            .map(Value::Array),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map_or(Ok(Map::new()), decode_fields)
            .map(Value::Object),
        other => Err(format!("unsupported value type {other}")),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, String> {
    let parsed = match inner {
        Value::String(raw) => raw.parse::<i64>().map_err(|err| err.to_string())?,
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| format!("integer out of range: {number}"))?,
        other => return Err(format!("expected integer, found {other}")),
    };
    Ok(Value::Number(Number::from(parsed)))
}
