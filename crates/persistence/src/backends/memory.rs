//! In-memory document store.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::core::{DocumentStore, UpdateOptions};
use crate::error::{StoreError, StoreResult};
use crate::schema::IndexSpec;
use crate::types::{
    DELETED_AT_FIELD, Filter, ID_FIELD, Predicate, Projection, Sort, SortDirection, Update,
};

#[derive(Default)]
struct Collection {
    documents: Vec<Map<String, Value>>,
    indexes: Vec<IndexSpec>,
}

/// An in-memory [`DocumentStore`].
///
/// Documents live in per-collection vectors behind a single `RwLock`, in
/// insertion order. Registered unique indexes are enforced on every write
/// path (insert, conditional update, replace), and every read supports the
/// full filter/projection/sort/windowing surface of the trait.
///
/// Intended for tests and reference use; each write takes the lock for the
/// duration of the match-and-mutate, which is what makes
/// `find_one_and_update` atomic here.
///
/// # Examples
///
/// ```
/// use silo_persistence::backends::memory::MemoryStore;
/// use silo_persistence::core::DocumentStore;
///
/// let store = MemoryStore::new();
/// assert_eq!(store.name(), "memory");
/// ```
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compares two JSON values for ordering purposes.
///
/// Numbers compare numerically; strings chronologically when both parse as
/// RFC 3339 timestamps, lexicographically otherwise; booleans as
/// false < true. Mismatched or unordered types yield `None`.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().and_then(|x| y.as_f64().map(|y| (x, y)))
                .and_then(|(x, y)| x.partial_cmp(&y))
        }
        (Value::String(x), Value::String(y)) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(field_value: Option<&Value>, target: &Value) -> bool {
    match field_value {
        // an absent field matches equality against null
        None => target.is_null(),
        Some(value) => match compare_values(value, target) {
            Some(ordering) => ordering == Ordering::Equal,
            None => value == target,
        },
    }
}

fn predicate_matches(predicate: &Predicate, field_value: Option<&Value>) -> bool {
    match predicate {
        Predicate::Eq(target) => values_equal(field_value, target),
        Predicate::Ne(target) => !values_equal(field_value, target),
        Predicate::In(targets) => targets
            .iter()
            .any(|target| values_equal(field_value, target)),
        Predicate::Exists(expected) => {
            let present = matches!(field_value, Some(value) if !value.is_null());
            present == *expected
        }
        Predicate::Gt(target) => ordered(field_value, target) == Some(Ordering::Greater),
        Predicate::Gte(target) => matches!(
            ordered(field_value, target),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Predicate::Lt(target) => ordered(field_value, target) == Some(Ordering::Less),
        Predicate::Lte(target) => matches!(
            ordered(field_value, target),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

fn ordered(field_value: Option<&Value>, target: &Value) -> Option<Ordering> {
    field_value.and_then(|value| compare_values(value, target))
}

fn matches_filter(filter: &Filter, document: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(field, predicate)| predicate_matches(predicate, document.get(field)))
}

fn apply_projection(
    document: &Map<String, Value>,
    projection: Option<&Projection>,
) -> Map<String, Value> {
    let Some(projection) = projection else {
        return document.clone();
    };

    let mut projected = Map::new();
    match projection {
        Projection::Include(fields) => {
            // the identity field always survives projection
            if let Some(id) = document.get(ID_FIELD) {
                projected.insert(ID_FIELD.to_string(), id.clone());
            }
            for field in fields {
                if let Some(value) = document.get(field) {
                    projected.insert(field.clone(), value.clone());
                }
            }
        }
        Projection::Exclude(fields) => {
            for (key, value) in document {
                if key == ID_FIELD || !fields.contains(key) {
                    projected.insert(key.clone(), value.clone());
                }
            }
        }
    }
    projected
}

fn sort_documents(documents: &mut [Map<String, Value>], sort: &Sort) {
    // stable: ties keep insertion order
    documents.sort_by(|a, b| {
        let ordering = match (a.get(&sort.field), b.get(&sort.field)) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// The key a document contributes to a unique index, or `None` when the
/// document does not participate.
///
/// Absent/null values opt a document out of uniqueness (sparse
/// semantics), except for the soft-delete marker, whose null is the
/// "active" state and is part of every key.
fn index_key(index: &IndexSpec, document: &Map<String, Value>) -> Option<Vec<Value>> {
    let mut key = Vec::with_capacity(index.fields.len());
    for field in &index.fields {
        let value = document.get(field).cloned().unwrap_or(Value::Null);
        if value.is_null() && field != DELETED_AT_FIELD {
            return None;
        }
        key.push(value);
    }
    Some(key)
}

/// Checks `candidate` against every unique index of the collection,
/// ignoring the document at `exclude` (the candidate's own slot on update
/// paths).
fn check_unique(
    collection: &Collection,
    candidate: &Map<String, Value>,
    exclude: Option<usize>,
) -> StoreResult<()> {
    for index in collection.indexes.iter().filter(|index| index.unique) {
        let Some(key) = index_key(index, candidate) else {
            continue;
        };
        for (position, existing) in collection.documents.iter().enumerate() {
            if Some(position) == exclude {
                continue;
            }
            if index_key(index, existing) == Some(key.clone()) {
                return Err(StoreError::UniqueViolation {
                    index: index.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn apply_update(document: &mut Map<String, Value>, update: &Update) -> StoreResult<()> {
    for (field, value) in update.set_ops() {
        document.insert(field.clone(), value.clone());
    }
    for (field, by) in update.inc_ops() {
        let current = match document.get(field) {
            None | Some(Value::Null) => 0i64,
            Some(Value::Number(n)) if n.as_i64().is_some() => {
                n.as_i64().unwrap_or_default()
            }
            Some(other) => {
                return Err(StoreError::invalid(format!(
                    "cannot increment non-numeric field {field}: {other}"
                )));
            }
        };
        let by = by.as_i64().unwrap_or_default();
        document.insert(field.clone(), Value::from(current + by));
    }
    for field in update.unset_ops() {
        document.remove(field);
    }
    Ok(())
}

/// Builds the base document for an upsert insert: the filter's equality
/// clauses plus the update's insert-only assignments.
fn upsert_seed(filter: &Filter, update: &Update) -> Map<String, Value> {
    let mut seed = Map::new();
    for (field, predicate) in filter.iter() {
        if let Predicate::Eq(value) = predicate {
            seed.insert(field.to_string(), value.clone());
        }
    }
    for (field, value) in update.insert_ops() {
        seed.insert(field.clone(), value.clone());
    }
    seed
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();
        for index in indexes {
            if !entry.indexes.iter().any(|existing| existing.name == index.name) {
                entry.indexes.push(index.clone());
            }
        }
        Ok(())
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Map<String, Value>>,
    ) -> StoreResult<Vec<Map<String, Value>>> {
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();

        // validate the whole batch before committing any of it
        for (offset, candidate) in documents.iter().enumerate() {
            check_unique(entry, candidate, None)?;
            for earlier in &documents[..offset] {
                for index in entry.indexes.iter().filter(|index| index.unique) {
                    let collided = match (index_key(index, earlier), index_key(index, candidate)) {
                        (Some(a), Some(b)) => a == b,
                        _ => false,
                    };
                    if collided {
                        return Err(StoreError::UniqueViolation {
                            index: index.name.clone(),
                        });
                    }
                }
            }
        }

        entry.documents.extend(documents.iter().cloned());
        Ok(documents)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Map<String, Value>>> {
        let collections = self.collections.read();
        let Some(entry) = collections.get(collection) else {
            return Ok(None);
        };
        Ok(entry
            .documents
            .iter()
            .find(|document| matches_filter(filter, document))
            .map(|document| apply_projection(document, projection)))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
        sort: &Sort,
        skip: u64,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Map<String, Value>>> {
        let collections = self.collections.read();
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<_> = entry
            .documents
            .iter()
            .filter(|document| matches_filter(filter, document))
            .cloned()
            .collect();
        sort_documents(&mut matched, sort);

        let windowed = matched
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX));
        let windowed: Vec<_> = match limit {
            Some(limit) => windowed
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => windowed.collect(),
        };

        Ok(windowed
            .iter()
            .map(|document| apply_projection(document, projection))
            .collect())
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> StoreResult<Option<Map<String, Value>>> {
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();

        let position = entry
            .documents
            .iter()
            .position(|document| matches_filter(filter, document));

        match position {
            Some(position) => {
                let mut updated = entry.documents[position].clone();
                apply_update(&mut updated, update)?;
                check_unique(entry, &updated, Some(position))?;
                entry.documents[position] = updated.clone();
                Ok(Some(updated))
            }
            None if options.upsert => {
                let mut inserted = upsert_seed(filter, update);
                apply_update(&mut inserted, update)?;
                check_unique(entry, &inserted, None)?;
                entry.documents.push(inserted.clone());
                Ok(Some(inserted))
            }
            None => Ok(None),
        }
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Map<String, Value>,
    ) -> StoreResult<Option<Map<String, Value>>> {
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(None);
        };

        let Some(position) = entry
            .documents
            .iter()
            .position(|existing| matches_filter(filter, existing))
        else {
            return Ok(None);
        };

        check_unique(entry, &document, Some(position))?;
        entry.documents[position] = document.clone();
        Ok(Some(document))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64> {
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let positions: Vec<_> = entry
            .documents
            .iter()
            .enumerate()
            .filter(|(_, document)| matches_filter(filter, document))
            .map(|(position, _)| position)
            .collect();

        for &position in &positions {
            let mut updated = entry.documents[position].clone();
            apply_update(&mut updated, update)?;
            check_unique(entry, &updated, Some(position))?;
            entry.documents[position] = updated;
        }

        Ok(positions.len() as u64)
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Option<Map<String, Value>>> {
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(None);
        };

        let Some(position) = entry
            .documents
            .iter()
            .position(|document| matches_filter(filter, document))
        else {
            return Ok(None);
        };

        Ok(Some(entry.documents.remove(position)))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = entry.documents.len();
        entry
            .documents
            .retain(|document| !matches_filter(filter, document));
        Ok((before - entry.documents.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read();
        let Some(entry) = collections.get(collection) else {
            return Ok(0);
        };
        Ok(entry
            .documents
            .iter()
            .filter(|document| matches_filter(filter, document))
            .count() as u64)
    }
}
