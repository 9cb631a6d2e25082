//! Schema compilation.
//!
//! The factory turns a caller-owned [`SchemaDefinition`] into a
//! [`CompiledSchema`]: the definition plus everything the repository needs
//! at runtime: identity generation, timestamp maintenance, save-path
//! validation and transforms, the public serialization redactions, and the
//! declarative composite unique indexes derived from the extractor output.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult, StoreError, StoreResult};
use crate::types::{
    CREATED_AT_FIELD, DELETED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD, Update,
    timestamp_value,
};

use super::definition::{FieldDescriptor, FieldType, SchemaDefinition, fields};
use super::extractor::extract_unique_fields;

/// Field name used for the identity in public serializations.
const PUBLIC_ID_FIELD: &str = "id";

/// Field name always treated as credential-shaped, marker or not.
const PASSWORD_FIELD: &str = "password";

/// Reserved field names the factory injects itself.
const RESERVED_FIELDS: [&str; 4] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD, DELETED_AT_FIELD];

/// Compilation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Maintain `created_at`/`updated_at` automatically on every write
    /// path. On by default.
    pub timestamps: bool,
    /// Run field validation (required, type conformance) on the insert and
    /// full-save paths. On by default.
    pub validate: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            timestamps: true,
            validate: true,
        }
    }
}

/// A declarative index registration handed to the store at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name; unique-violation signals reference it.
    pub name: String,
    /// Indexed fields, in order.
    pub fields: Vec<String>,
    /// Whether the index enforces uniqueness over its field tuple.
    pub unique: bool,
}

impl IndexSpec {
    fn unique_over(fields: Vec<String>) -> Self {
        Self {
            name: format!("uniq_{}", fields.join("_")),
            fields,
            unique: true,
        }
    }

    fn plain(field: &str) -> Self {
        Self {
            name: format!("idx_{field}"),
            fields: vec![field.to_string()],
            unique: false,
        }
    }
}

/// A compiled, immutable schema bound to one document kind.
///
/// Produced once per collection at bootstrap by [`compile_schema`] or
/// [`compile_tenant_schema`], then shared behind an `Arc` by every
/// repository bound to the collection.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    definition: SchemaDefinition,
    unique_fields: Vec<String>,
    indexes: Vec<IndexSpec>,
    redactions: Vec<String>,
    tenant_key: Option<String>,
    options: SchemaOptions,
}

/// Compiles a schema definition.
///
/// Runs the extractor first, then assembles the compiled schema. When
/// `auto_index` is set, one composite unique index per extracted field is
/// registered over `(deleted_at, field)`, scoping uniqueness to documents
/// sharing the same soft-delete state. Registration is declarative; the
/// store materializes the indexes when
/// [`Repository::sync_indexes`](crate::repository::Repository::sync_indexes)
/// runs at bootstrap.
///
/// Fails with [`RepositoryError::Configuration`] if the definition is
/// empty, repeats a field name, or names a reserved field.
///
/// # Examples
///
/// ```
/// use silo_persistence::schema::{SchemaDefinition, SchemaOptions, compile_schema, fields};
///
/// let definition = SchemaDefinition::new()
///     .field("email", fields::trimmed_lowercase_string().unique().required());
///
/// let schema = compile_schema(&definition, SchemaOptions::default(), true).unwrap();
/// assert_eq!(schema.unique_fields(), ["email"]);
/// assert_eq!(schema.indexes()[0].fields, ["deleted_at", "email"]);
/// ```
pub fn compile_schema(
    definition: &SchemaDefinition,
    options: SchemaOptions,
    auto_index: bool,
) -> RepositoryResult<CompiledSchema> {
    compile(None, definition, options, auto_index)
}

/// Compiles a tenant-partitioned schema definition.
///
/// Injects `key` as a required, trimmed, plain-indexed string field and
/// registers the composite unique indexes as `(key, deleted_at, field)`,
/// so uniqueness is additionally scoped per tenant. The caller's
/// definition must not already declare the key field.
pub fn compile_tenant_schema(
    key: &str,
    definition: &SchemaDefinition,
    options: SchemaOptions,
) -> RepositoryResult<CompiledSchema> {
    if key.is_empty() {
        return Err(RepositoryError::Configuration {
            message: "tenant key must not be empty".to_string(),
        });
    }
    if definition.contains(key) {
        return Err(RepositoryError::Configuration {
            message: format!("tenant key {key} collides with a defined field"),
        });
    }
    compile(Some(key), definition, options, true)
}

fn compile(
    tenant_key: Option<&str>,
    definition: &SchemaDefinition,
    options: SchemaOptions,
    auto_index: bool,
) -> RepositoryResult<CompiledSchema> {
    if definition.is_empty() {
        return Err(RepositoryError::Configuration {
            message: "schema definition must not be empty".to_string(),
        });
    }

    let mut seen = std::collections::BTreeSet::new();
    for (name, _) in definition.iter() {
        if RESERVED_FIELDS.contains(&name) {
            return Err(RepositoryError::Configuration {
                message: format!("field name {name} is reserved"),
            });
        }
        if !seen.insert(name) {
            return Err(RepositoryError::Configuration {
                message: format!("duplicate field: {name}"),
            });
        }
    }

    let (mut sanitized, unique_fields) = extract_unique_fields(definition);
    if let Some(key) = tenant_key {
        sanitized = sanitized.field(key, tenant_key_descriptor());
    }

    let mut indexes = Vec::new();
    if auto_index {
        for field in &unique_fields {
            let mut composite = Vec::new();
            if let Some(key) = tenant_key {
                composite.push(key.to_string());
            }
            composite.push(DELETED_AT_FIELD.to_string());
            composite.push(field.clone());
            indexes.push(IndexSpec::unique_over(composite));
        }
    }
    for (name, descriptor) in sanitized.iter() {
        if descriptor.index {
            indexes.push(IndexSpec::plain(name));
        }
    }

    let redactions = sanitized
        .iter()
        .filter(|(name, descriptor)| descriptor.credential || *name == PASSWORD_FIELD)
        .map(|(name, _)| name.to_string())
        .collect();

    Ok(CompiledSchema {
        definition: sanitized,
        unique_fields,
        indexes,
        redactions,
        tenant_key: tenant_key.map(String::from),
        options,
    })
}

fn tenant_key_descriptor() -> FieldDescriptor {
    fields::trimmed_string().required().index()
}

impl CompiledSchema {
    /// The sanitized definition (no `unique` markers, tenant key injected
    /// when applicable).
    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    /// Fields whose values are unique among documents sharing a
    /// soft-delete state, in definition order.
    pub fn unique_fields(&self) -> &[String] {
        &self.unique_fields
    }

    /// The declarative index registrations.
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// Fields stripped from public serializations.
    pub fn redactions(&self) -> &[String] {
        &self.redactions
    }

    /// The tenant key field name, for tenant-partitioned schemas.
    pub fn tenant_key(&self) -> Option<&str> {
        self.tenant_key.as_deref()
    }

    /// The compilation options.
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Generates a fresh document identity: random, collision-resistant,
    /// never sequential.
    pub fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Prepares caller-supplied fields for insertion: applies save-path
    /// transforms and defaults, validates, then injects identity and
    /// timestamps. Fields not named by the definition pass through
    /// untouched.
    pub(crate) fn prepare_insert(&self, fields: Value) -> StoreResult<Map<String, Value>> {
        let Value::Object(mut map) = fields else {
            return Err(StoreError::invalid("document fields must be an object"));
        };

        self.apply_transforms(&mut map);
        self.apply_defaults(&mut map);
        if self.options.validate {
            self.validate(&map)?;
        }

        if !map.contains_key(ID_FIELD) {
            map.insert(ID_FIELD.to_string(), Value::String(self.generate_id()));
        }
        if self.options.timestamps {
            let now = timestamp_value(Utc::now());
            map.insert(CREATED_AT_FIELD.to_string(), now.clone());
            map.insert(UPDATED_AT_FIELD.to_string(), now);
        }

        Ok(map)
    }

    /// Applies a plain field assignment to a loaded document and re-runs
    /// the save path: transforms, validation, timestamp bump. The identity
    /// field is immutable and skipped if present in `fields`.
    pub(crate) fn apply_save(
        &self,
        current: &mut Map<String, Value>,
        fields: &Map<String, Value>,
    ) -> StoreResult<()> {
        for (name, value) in fields {
            if name == ID_FIELD {
                continue;
            }
            current.insert(name.clone(), value.clone());
        }

        self.apply_transforms(current);
        if self.options.validate {
            self.validate(current)?;
        }
        if self.options.timestamps {
            current.insert(
                UPDATED_AT_FIELD.to_string(),
                timestamp_value(Utc::now()),
            );
        }
        Ok(())
    }

    /// Stamps an atomic update with the modification timestamp.
    pub(crate) fn stamp_update(&self, update: &mut Update) {
        if self.options.timestamps {
            update.force_set(UPDATED_AT_FIELD, timestamp_value(Utc::now()));
        }
    }

    /// Prepares an update for an upsert: modification stamp plus
    /// insert-only identity and creation timestamp.
    pub(crate) fn prepare_upsert(&self, update: &mut Update) {
        self.stamp_update(update);
        if self.options.timestamps {
            update.ensure_set_on_insert(CREATED_AT_FIELD, timestamp_value(Utc::now()));
        }
        update.ensure_set_on_insert(ID_FIELD, Value::String(self.generate_id()));
    }

    /// The public serialization of a document: the internal identity alias
    /// is replaced by `id` and credential-shaped fields are stripped.
    pub fn to_public(&self, document: &Document) -> Value {
        let mut map = document.as_map().clone();
        if let Some(id) = map.remove(ID_FIELD) {
            map.insert(PUBLIC_ID_FIELD.to_string(), id);
        }
        for field in &self.redactions {
            map.remove(field);
        }
        Value::Object(map)
    }

    fn apply_transforms(&self, map: &mut Map<String, Value>) {
        for (name, descriptor) in self.definition.iter() {
            if !descriptor.trim && !descriptor.lowercase {
                continue;
            }
            if let Some(Value::String(text)) = map.get(name) {
                let mut text = text.clone();
                if descriptor.trim {
                    text = text.trim().to_string();
                }
                if descriptor.lowercase {
                    text = text.to_lowercase();
                }
                map.insert(name.to_string(), Value::String(text));
            }
        }
    }

    fn apply_defaults(&self, map: &mut Map<String, Value>) {
        for (name, descriptor) in self.definition.iter() {
            if let Some(default) = &descriptor.default {
                if !map.contains_key(name) {
                    map.insert(name.to_string(), default.clone());
                }
            }
        }
    }

    fn validate(&self, map: &Map<String, Value>) -> StoreResult<()> {
        for (name, descriptor) in self.definition.iter() {
            let value = match map.get(name) {
                None | Some(Value::Null) => {
                    if descriptor.required {
                        return Err(StoreError::invalid(format!(
                            "missing required field: {name}"
                        )));
                    }
                    continue;
                }
                Some(value) => value,
            };
            let conforms = match descriptor.field_type {
                FieldType::String => value.is_string(),
                FieldType::Number => value.is_number(),
                FieldType::Boolean => value.is_boolean(),
                FieldType::Timestamp => crate::types::parse_timestamp(value).is_some(),
                FieldType::Json => true,
            };
            if !conforms {
                return Err(StoreError::invalid(format!(
                    "field {name} does not match its declared type"
                )));
            }
        }
        Ok(())
    }
}
