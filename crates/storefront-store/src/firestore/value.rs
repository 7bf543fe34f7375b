//! Conversion between Firestore's typed REST values and plain JSON.
//!
//! Firestore wraps every value in a single-key object naming its type, e.g.
//! `{"integerValue": "42"}`. Integers travel as strings to avoid precision
//! loss; timestamps, references, and bytes decode to plain strings.

use serde_json::{json, Map, Number, Value};

/// Decode a `fields` map from a Firestore document into a JSON object map.
pub(crate) fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, String> {
    fields
        .iter()
        .map(|(key, value)| {
            decode_value(value)
                .map(|decoded| (key.clone(), decoded))
                .map_err(|reason| format!("field '{key}': {reason}"))
        })
        .collect()
}

pub(crate) fn decode_value(value: &Value) -> Result<Value, String> {
    let Some(object) = value.as_object() else {
        return Err(format!("expected a typed value object, got {value}"));
    };
    let mut entries = object.iter();
    let (Some((kind, inner)), None) = (entries.next(), entries.next()) else {
        return Err("typed value must have exactly one key".to_string());
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("booleanValue is not a bool: {inner}")),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("{kind} is not a string: {inner}")),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => match inner.get("values") {
            None => Ok(Value::Array(Vec::new())),
            Some(Value::Array(values)) => values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Some(other) => Err(format!("arrayValue.values is not an array: {other}")),
        },
        "mapValue" => match inner.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(other) => Err(format!("mapValue.fields is not an object: {other}")),
        },
        other => Err(format!("unsupported value type '{other}'")),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, String> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|e| format!("integerValue '{s}' is not an i64: {e}")),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n.clone())),
        other => Err(format!("integerValue has unexpected form: {other}")),
    }
}

fn decode_double(inner: &Value) -> Result<Value, String> {
    match inner {
        Value::Number(n) => Ok(Value::Number(n.clone())),
        // NaN and the infinities are sent as strings and have no JSON number form.
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Err(format!("doubleValue has unexpected form: {other}")),
    }
}

/// Encode a JSON object map as a Firestore `fields` map.
pub(crate) fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(n),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

#[allow(clippy::cast_precision_loss)]
fn encode_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        json!({ "integerValue": i.to_string() })
    } else if let Some(u) = n.as_u64() {
        // Beyond i64 range; Firestore integers are signed 64-bit.
        json!({ "doubleValue": u as f64 })
    } else {
        json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
    }
}
