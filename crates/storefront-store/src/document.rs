//! The opaque record type every store backend reads and writes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document keyed by `id` within a named collection.
///
/// The payload is never interpreted by the store or the resolver; typed
/// access goes through [`Document::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a record that serializes to a JSON object with a
    /// string `id` field. The `id` is lifted out of the payload.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the record does not serialize to an
    /// object or lacks a string `id`.
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        let Value::Object(mut fields) = serde_json::to_value(record)? else {
            return Err(<serde_json::Error as serde::ser::Error>::custom(
                "record must serialize to a JSON object",
            ));
        };
        let Some(Value::String(id)) = fields.remove("id") else {
            return Err(<serde_json::Error as serde::ser::Error>::custom(
                "record must carry a string `id` field",
            ));
        };
        Ok(Self { id, fields })
    }

    /// Decode the payload into a typed record, injecting `id` so record types
    /// can carry it as a regular field. A stored `id` field is overridden.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}
