//! Schema and document fixtures.

use serde_json::{Value, json};

use silo_persistence::schema::{SchemaDefinition, fields};

/// A user document kind: unique email and username, credential-shaped
/// password, defaulted `active` flag.
pub fn user_definition() -> SchemaDefinition {
    SchemaDefinition::new()
        .field(
            "email",
            fields::trimmed_lowercase_string().unique().required(),
        )
        .field("username", fields::trimmed_string().unique())
        .field("password", fields::credential_string())
        .field("age", fields::number())
        .field("active", fields::boolean().with_default(true))
}

/// Minimal valid user fields.
pub fn user_json(email: &str) -> Value {
    json!({
        "email": email,
        "password": "hunter2",
    })
}

/// A project document kind used by the tenant tests: unique name per
/// tenant.
pub fn project_definition() -> SchemaDefinition {
    SchemaDefinition::new()
        .field("name", fields::trimmed_string().unique().required())
        .field("stars", fields::number().with_default(0))
}

/// Minimal valid project fields.
pub fn project_json(name: &str) -> Value {
    json!({ "name": name })
}
