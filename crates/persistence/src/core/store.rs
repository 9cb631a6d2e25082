//! The abstract document-store interface.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreResult;
use crate::schema::IndexSpec;
use crate::types::{Filter, Projection, Sort, Update};

/// Options for [`DocumentStore::find_one_and_update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a new document when nothing matches the filter.
    pub upsert: bool,
}

impl UpdateOptions {
    /// Options with upsert enabled.
    pub fn upsert() -> Self {
        Self { upsert: true }
    }
}

/// The abstract store the repository core is written against.
///
/// Implementations wrap a remote document database (or, for tests, an
/// in-memory structure). Documents cross this boundary as raw JSON object
/// maps; the repository layers schema preparation on top and wraps rows in
/// [`Document`](crate::types::Document) before returning them.
///
/// # Contract
///
/// - All operations are asynchronous request/response calls; the trait
///   defines no cancellation or timeout semantics (those belong to the
///   client underneath).
/// - `find_one_and_update` must be atomic per document: the match and the
///   write may not interleave with a concurrent write to the same
///   document.
/// - Uniqueness violations must surface as
///   [`StoreError::UniqueViolation`](crate::error::StoreError::UniqueViolation),
///   never folded into a generic failure; the repository's duplicate
///   detection depends on the distinction.
/// - Index creation is a bootstrap concern: [`ensure_indexes`] receives
///   the schema's declarative registrations once per collection and must
///   be idempotent.
///
/// [`ensure_indexes`]: DocumentStore::ensure_indexes
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// A human-readable name for this store backend.
    fn name(&self) -> &'static str;

    /// Materializes the given index registrations for a collection.
    /// Idempotent; called at bootstrap.
    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> StoreResult<()>;

    /// Inserts the given documents, returning them as stored.
    ///
    /// Must fail with a unique-violation if any document collides with an
    /// existing one (or another document in the batch) on a unique index.
    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Map<String, Value>>,
    ) -> StoreResult<Vec<Map<String, Value>>>;

    /// Finds the first document matching the filter.
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Map<String, Value>>>;

    /// Finds all documents matching the filter, sorted, with optional
    /// skip/limit windowing.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
        sort: &Sort,
        skip: u64,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Map<String, Value>>>;

    /// Atomically applies `update` to the first document matching the
    /// filter and returns the resulting document. With
    /// [`UpdateOptions::upsert`] a new document is created from the
    /// filter's equality clauses and the update when nothing matches.
    ///
    /// Returns `None` when nothing matched and upsert is off.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> StoreResult<Option<Map<String, Value>>>;

    /// Replaces the first document matching the filter with `document`,
    /// returning the stored result, or `None` when nothing matched.
    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Map<String, Value>,
    ) -> StoreResult<Option<Map<String, Value>>>;

    /// Applies `update` to every document matching the filter, returning
    /// the matched count.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<u64>;

    /// Deletes the first document matching the filter, returning it, or
    /// `None` when nothing matched.
    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Option<Map<String, Value>>>;

    /// Deletes every document matching the filter, returning the deleted
    /// count.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Counts the documents matching the filter.
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;
}
