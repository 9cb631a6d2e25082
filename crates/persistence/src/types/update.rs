//! Typed update documents for atomic writes.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// A store-native update expression.
///
/// `Update` models the operator semantics of a conditional single-document
/// write: field assignment, numeric increment, field removal, and
/// insert-only assignment for upserts. It is a typed record rather than a
/// raw operator object so the tenant wrapper can override individual fields
/// without string matching.
///
/// # Examples
///
/// ```
/// use silo_persistence::types::Update;
///
/// let update = Update::set("status", "active")
///     .with_inc("login_count", 1)
///     .with_unset("lock_reason");
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Map<String, Value>,
    inc: Map<String, Value>,
    unset: BTreeSet<String>,
    set_on_insert: Map<String, Value>,
}

impl Update {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an update with a single assignment.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with_set(field, value)
    }

    /// Adds a field assignment.
    pub fn with_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Adds a numeric increment.
    pub fn with_inc(mut self, field: impl Into<String>, by: i64) -> Self {
        self.inc.insert(field.into(), Value::from(by));
        self
    }

    /// Adds a field removal.
    pub fn with_unset(mut self, field: impl Into<String>) -> Self {
        self.unset.insert(field.into());
        self
    }

    /// Adds an assignment applied only when an upsert inserts.
    pub fn with_set_on_insert(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_on_insert.insert(field.into(), value.into());
        self
    }

    /// Unconditionally pins `field` to `value`, removing any other operator
    /// the caller had targeting that field. Used to enforce the tenant key
    /// and write-path timestamps.
    pub(crate) fn force_set(&mut self, field: &str, value: Value) {
        self.inc.remove(field);
        self.unset.remove(field);
        self.set_on_insert.remove(field);
        self.set.insert(field.to_string(), value);
    }

    /// Adds an insert-only assignment unless the caller already targets the
    /// field with `set` or `set_on_insert`.
    pub(crate) fn ensure_set_on_insert(&mut self, field: &str, value: Value) {
        if self.set.contains_key(field) || self.set_on_insert.contains_key(field) {
            return;
        }
        self.set_on_insert.insert(field.to_string(), value);
    }

    /// Assignments.
    pub fn set_ops(&self) -> &Map<String, Value> {
        &self.set
    }

    /// Increments.
    pub fn inc_ops(&self) -> &Map<String, Value> {
        &self.inc
    }

    /// Removals.
    pub fn unset_ops(&self) -> impl Iterator<Item = &str> {
        self.unset.iter().map(String::as_str)
    }

    /// Insert-only assignments.
    pub fn insert_ops(&self) -> &Map<String, Value> {
        &self.set_on_insert
    }

    /// Returns `true` if the update carries no operators at all.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.inc.is_empty()
            && self.unset.is_empty()
            && self.set_on_insert.is_empty()
    }
}
