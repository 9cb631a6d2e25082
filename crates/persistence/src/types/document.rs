//! Stored document type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the internal identity field on every persisted document.
pub const ID_FIELD: &str = "_id";

/// Name of the creation timestamp field.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Name of the last-modification timestamp field.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Name of the soft-deletion timestamp field. Presence means the document
/// is soft-deleted.
pub const DELETED_AT_FIELD: &str = "deleted_at";

/// Encodes a timestamp the way this layer persists them: RFC 3339 with
/// fixed microsecond precision, so lexicographic and chronological order
/// agree.
pub(crate) fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Decodes a persisted timestamp value, if it is one.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// A document as returned by repository operations.
///
/// `Document` wraps the raw JSON object held by the store and exposes typed
/// accessors for the reserved metadata fields the schema factory maintains:
/// identity, creation/modification timestamps, and the soft-delete marker.
/// Business fields are reached through [`get`](Document::get) or the full
/// map.
///
/// The internal identity field (`_id`) and any credential-shaped fields are
/// part of this representation; use
/// [`CompiledSchema::to_public`](crate::schema::CompiledSchema::to_public)
/// before handing a document to external callers.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use silo_persistence::types::Document;
///
/// let doc = Document::from_object(json!({
///     "_id": "d4f0",
///     "email": "ada@example.com",
/// })).unwrap();
///
/// assert_eq!(doc.id(), "d4f0");
/// assert!(!doc.is_deleted());
/// assert_eq!(doc.get("email").and_then(|v| v.as_str()), Some("ada@example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Wraps a JSON value, which must be an object.
    pub fn from_object(value: Value) -> Result<Self, crate::error::StoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(crate::error::StoreError::invalid(format!(
                "expected a document object, got {other}"
            ))),
        }
    }

    /// Wraps a raw document map. Used by the repository when converting
    /// store rows.
    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the document identity, or an empty string if the store row
    /// carried none.
    pub fn id(&self) -> &str {
        self.0
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns when the document was created.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.0.get(CREATED_AT_FIELD).and_then(parse_timestamp)
    }

    /// Returns when the document was last modified.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.0.get(UPDATED_AT_FIELD).and_then(parse_timestamp)
    }

    /// Returns when the document was soft-deleted, if it was.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.0.get(DELETED_AT_FIELD).and_then(parse_timestamp)
    }

    /// Returns `true` if the document is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(
            self.0.get(DELETED_AT_FIELD),
            Some(value) if !value.is_null()
        )
    }

    /// Returns a business or reserved field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the underlying document map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes self and returns the underlying document map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
