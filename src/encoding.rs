use crate::error::BoxError;
use crate::types::{Item, StoredAttributes};
use aws_sdk_dynamodb::types::AttributeValue;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use tracing::debug;

/// Converts a value into the storage layer's attribute map.
pub trait ItemEncoder: Send + Sync {
    fn encode_item<T: Serialize + ?Sized>(&self, value: &T) -> Result<Item, BoxError>;
}

/// Converts a value into the response body.
pub trait ResponseEncoder: Send + Sync {
    fn encode_response<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, BoxError>;
}

/// Maps serde output onto DynamoDB types via `serde_json::Value`.
/// Only values serializing into a JSON object make a valid item.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamoItemEncoder;

impl ItemEncoder for DynamoItemEncoder {
    fn encode_item<T: Serialize + ?Sized>(&self, value: &T) -> Result<Item, BoxError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, to_attribute(v))).collect()),
            other => {
                debug!("Cannot marshal {:?} into an item", other);
                Err(BoxError::from(format!("item must be a map, got {}", json_type_name(&other))))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseEncoder;

impl ResponseEncoder for JsonResponseEncoder {
    fn encode_response<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(value)?)
    }
}

fn to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(v) => AttributeValue::Bool(v),
        Value::Number(v) => AttributeValue::N(v.to_string()),
        Value::String(v) => AttributeValue::S(v),
        Value::Array(v) => AttributeValue::L(v.into_iter().map(to_attribute).collect()),
        Value::Object(v) => AttributeValue::M(v.into_iter().map(|(k, v)| (k, to_attribute(v))).collect()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Plain JSON view of a single attribute, e.g. `{"S":"abc"}` becomes `"abc"`.
struct AttributeJson<'a>(&'a AttributeValue);

impl Serialize for AttributeJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            AttributeValue::S(v) => serializer.serialize_str(v),
            AttributeValue::N(v) => serialize_number(v, serializer),
            AttributeValue::Bool(v) => serializer.serialize_bool(*v),
            AttributeValue::Null(_) => serializer.serialize_unit(),
            AttributeValue::B(v) => serializer.serialize_str(&hex::encode(v)),
            AttributeValue::M(v) => serialize_sorted_map(v, serializer),
            AttributeValue::L(v) => {
                let mut seq = serializer.serialize_seq(Some(v.len()))?;
                for item in v {
                    seq.serialize_element(&AttributeJson(item))?;
                }
                seq.end()
            }
            AttributeValue::Ss(v) => v.serialize(serializer),
            AttributeValue::Ns(v) => {
                let mut seq = serializer.serialize_seq(Some(v.len()))?;
                for n in v {
                    seq.serialize_element(&parse_number(n))?;
                }
                seq.end()
            }
            AttributeValue::Bs(v) => {
                let encoded: Vec<String> = v.iter().map(hex::encode).collect();
                encoded.serialize(serializer)
            }
            other => Err(S::Error::custom(format!("unsupported attribute type: {:?}", other))),
        }
    }
}

/// DynamoDB numbers are strings on the wire. Anything serde_json cannot hold as a number stays a string.
fn parse_number(n: &str) -> Value {
    if let Ok(v) = n.parse::<i64>() {
        return Value::Number(v.into());
    }
    if let Ok(v) = n.parse::<u64>() {
        return Value::Number(v.into());
    }
    match n.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(v) => Value::Number(v),
        None => Value::String(n.to_string()),
    }
}

fn serialize_number<S: Serializer>(n: &str, serializer: S) -> Result<S::Ok, S::Error> {
    parse_number(n).serialize(serializer)
}

/// Keys are sorted to keep the output stable regardless of HashMap ordering.
fn serialize_sorted_map<S: Serializer>(item: &Item, serializer: S) -> Result<S::Ok, S::Error> {
    let mut entries: Vec<(&String, &AttributeValue)> = item.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, &AttributeJson(value))?;
    }
    map.end()
}

impl Serialize for StoredAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_sorted_map(&self.0, serializer)
    }
}

/// Returns the stored attributes as a plain JSON object.
#[cfg(test)]
pub(crate) fn attributes_to_json(
    attributes: &StoredAttributes,
) -> Result<serde_json::Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(attributes)? {
        Value::Object(map) => Ok(map),
        _ => Err(<serde_json::Error as serde::ser::Error>::custom(
            "stored attributes must serialize into an object",
        )),
    }
}
