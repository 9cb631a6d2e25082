//! Extraction of composite-uniqueness candidates from a definition.

use super::definition::SchemaDefinition;

/// Splits a definition into a sanitized copy and the list of fields that
/// carried the `unique` marker.
///
/// The returned definition has every `unique` flag cleared: the underlying
/// store must never build a bare single-field unique index, because that
/// would block reusing a value after its holder is soft-deleted. The
/// returned field names keep their original relative order, and each name
/// appears at most once per occurrence in the definition.
///
/// This is a pure transform over values: the argument is only read, never
/// mutated.
///
/// # Examples
///
/// ```
/// use silo_persistence::schema::{SchemaDefinition, extract_unique_fields, fields};
///
/// let definition = SchemaDefinition::new()
///     .field("email", fields::trimmed_lowercase_string().unique())
///     .field("name", fields::trimmed_string());
///
/// let (sanitized, unique) = extract_unique_fields(&definition);
/// assert_eq!(unique, vec!["email".to_string()]);
/// assert!(!sanitized.get("email").unwrap().unique);
/// // the caller's definition is untouched
/// assert!(definition.get("email").unwrap().unique);
/// ```
pub fn extract_unique_fields(definition: &SchemaDefinition) -> (SchemaDefinition, Vec<String>) {
    let mut sanitized = SchemaDefinition::new();
    let mut unique_fields = Vec::new();

    for (name, descriptor) in definition.iter() {
        let mut descriptor = descriptor.clone();
        if descriptor.unique {
            descriptor.unique = false;
            unique_fields.push(name.to_string());
        }
        sanitized = sanitized.field(name, descriptor);
    }

    (sanitized, unique_fields)
}
