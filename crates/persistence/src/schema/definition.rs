//! Field descriptors and schema definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// JSON number.
    Number,
    /// Boolean.
    Boolean,
    /// RFC 3339 timestamp, stored as a string.
    Timestamp,
    /// Arbitrary JSON value (object, array, anything).
    Json,
}

/// A typed description of one document field.
///
/// Descriptors carry the storage type plus validation and write-path
/// attributes. The `unique` marker is a build-time instruction consumed by
/// the extractor; it is never persisted and never reaches the store as a
/// bare single-field index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Storage type.
    pub field_type: FieldType,
    /// Reject writes that omit this field or set it to null.
    pub required: bool,
    /// Build-time marker: values must be unique among documents sharing the
    /// same soft-delete state.
    pub unique: bool,
    /// Strip surrounding whitespace on the save path (strings only).
    pub trim: bool,
    /// Lowercase on the save path (strings only).
    pub lowercase: bool,
    /// Credential-shaped: stripped from public serializations.
    pub credential: bool,
    /// Ask the store for a plain (non-unique) index on this field.
    pub index: bool,
    /// Default applied when an insert omits the field.
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// Creates a descriptor of the given type with every attribute off.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            trim: false,
            lowercase: false,
            credential: false,
            index: false,
            default: None,
        }
    }

    /// Marks the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds the build-time `unique` marker.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Enables whitespace trimming on the save path.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Enables lowercasing on the save path.
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    /// Marks the field credential-shaped.
    pub fn credential(mut self) -> Self {
        self.credential = true;
        self
    }

    /// Asks for a plain index on this field.
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Sets the insert-time default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Ready-made field descriptors for common shapes.
///
/// These mirror the descriptor constants an application layer typically
/// wants: trimmed strings for user-entered text, trimmed lowercase strings
/// for identifiers like email addresses, and a credential string for
/// password-shaped fields.
pub mod fields {
    use super::{FieldDescriptor, FieldType};

    /// Plain string.
    pub fn string() -> FieldDescriptor {
        FieldDescriptor::new(FieldType::String)
    }

    /// String with surrounding whitespace stripped on save.
    pub fn trimmed_string() -> FieldDescriptor {
        string().trim()
    }

    /// String lowercased on save.
    pub fn lowercase_string() -> FieldDescriptor {
        string().lowercase()
    }

    /// String trimmed and lowercased on save.
    pub fn trimmed_lowercase_string() -> FieldDescriptor {
        string().trim().lowercase()
    }

    /// Trimmed string stripped from public serializations.
    pub fn credential_string() -> FieldDescriptor {
        string().trim().credential()
    }

    /// JSON number.
    pub fn number() -> FieldDescriptor {
        FieldDescriptor::new(FieldType::Number)
    }

    /// Boolean.
    pub fn boolean() -> FieldDescriptor {
        FieldDescriptor::new(FieldType::Boolean)
    }

    /// RFC 3339 timestamp.
    pub fn timestamp() -> FieldDescriptor {
        FieldDescriptor::new(FieldType::Timestamp)
    }

    /// Arbitrary JSON.
    pub fn json() -> FieldDescriptor {
        FieldDescriptor::new(FieldType::Json)
    }
}

/// An ordered mapping of field names to descriptors, defining one document
/// kind.
///
/// Insertion order is preserved; it decides the relative order of the
/// extracted unique fields and therefore of the registered indexes. The
/// definition is a plain value: the factory copies it and never mutates the
/// caller's instance.
///
/// # Examples
///
/// ```
/// use silo_persistence::schema::{SchemaDefinition, fields};
///
/// let definition = SchemaDefinition::new()
///     .field("email", fields::trimmed_lowercase_string().unique().required())
///     .field("password", fields::credential_string().required());
/// assert_eq!(definition.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDefinition {
    entries: Vec<(String, FieldDescriptor)>,
}

impl SchemaDefinition {
    /// Creates an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Duplicate names are kept as-is here and rejected by
    /// the factory with a configuration error.
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.entries.push((name.into(), descriptor));
        self
    }

    /// Returns the descriptor for `name`, if defined.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, descriptor)| descriptor)
    }

    /// Returns `true` if a field with this name is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over `(name, descriptor)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.entries
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    /// Number of defined fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no fields are defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
