//! Generic repository engine.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::core::{DocumentStore, UpdateOptions};
use crate::error::{RepositoryError, RepositoryResult, StoreError};
use crate::schema::CompiledSchema;
use crate::types::{
    DELETED_AT_FIELD, Document, FindOptions, Filter, ID_FIELD, PageRequest, PageResult, Predicate,
    Query, Selector, Update, Visibility, timestamp_value,
};

/// A generic CRUD engine bound to one collection and one compiled schema.
///
/// All application-facing read/write operations go through a `Repository`.
/// Reads default to seeing only active documents; soft-deleted documents
/// require explicitly widened [`Visibility`]. Writes never filter by delete
/// state, so a soft-deleted document can still be hard-deleted or have its
/// marker rewritten.
///
/// Where the underlying flow can legitimately find nothing, each operation
/// comes in two flavors: the plain method fails with
/// [`RepositoryError::NotFound`], the `try_` variant resolves to
/// `Ok(None)`.
///
/// # Update duality
///
/// Two distinct operations cover the two update strategies, so callers make
/// an explicit, auditable choice:
///
/// - [`update`](Repository::update) is read-modify-write: it loads the
///   document, applies a plain field assignment, and persists a full save
///   through the schema's validation/transform hooks. Two concurrent
///   `update` calls to the same document can lose one writer's change.
/// - [`atomic_update`](Repository::atomic_update) issues one conditional,
///   store-native update expression without loading the document and
///   without hooks; it is safe under concurrent writers.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use serde_json::json;
/// use silo_persistence::backends::memory::MemoryStore;
/// use silo_persistence::repository::Repository;
/// use silo_persistence::schema::{SchemaDefinition, SchemaOptions, compile_schema, fields};
///
/// # async fn example() -> silo_persistence::error::RepositoryResult<()> {
/// let definition = SchemaDefinition::new()
///     .field("email", fields::trimmed_lowercase_string().unique().required());
/// let schema = compile_schema(&definition, SchemaOptions::default(), true)?;
///
/// let repo = Repository::new(Arc::new(MemoryStore::new()), "users", schema);
/// repo.sync_indexes().await?;
///
/// let user = repo.create(json!({"email": "ada@example.com"})).await?;
/// let again = repo.by_id(user.id(), Default::default()).await?;
/// assert_eq!(user.id(), again.id());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Repository {
    collection: String,
    schema: Arc<CompiledSchema>,
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    /// Binds a repository to a collection on the given store.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        schema: CompiledSchema,
    ) -> Self {
        Self {
            collection: collection.into(),
            schema: Arc::new(schema),
            store,
        }
    }

    /// The bound collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The bound compiled schema.
    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Materializes the schema's declarative indexes on the store. Called
    /// once per collection at bootstrap.
    pub async fn sync_indexes(&self) -> RepositoryResult<()> {
        debug!(
            collection = %self.collection,
            indexes = self.schema.indexes().len(),
            "syncing indexes"
        );
        self.store
            .ensure_indexes(&self.collection, self.schema.indexes())
            .await
            .map_err(|err| self.storage_error(err))
    }

    /// Creates one document from the given business fields.
    ///
    /// Fails with [`RepositoryError::Duplicate`] if any uniqueness
    /// constraint is violated; any other storage fault passes through as
    /// [`RepositoryError::Storage`].
    pub async fn create(&self, fields: Value) -> RepositoryResult<Document> {
        let mut created = self.create_many(vec![fields]).await?;
        created.pop().ok_or_else(|| self.not_found())
    }

    /// Creates several documents at once. The batch is checked before any
    /// of it lands; a duplicate anywhere fails the whole call.
    pub async fn create_many(&self, fields: Vec<Value>) -> RepositoryResult<Vec<Document>> {
        let mut prepared = Vec::with_capacity(fields.len());
        for entry in fields {
            prepared.push(
                self.schema
                    .prepare_insert(entry)
                    .map_err(|err| self.storage_error(err))?,
            );
        }

        debug!(collection = %self.collection, count = prepared.len(), "creating documents");
        let rows = self
            .store
            .insert(&self.collection, prepared)
            .await
            .map_err(|err| self.storage_error(err))?;

        Ok(rows.into_iter().map(Document::from_map).collect())
    }

    /// Atomically applies `update` to the document matching `selector`,
    /// creating it if absent, and returns the resulting document.
    ///
    /// Inserted documents receive a fresh identity and creation timestamp
    /// through insert-only assignments. Fails with
    /// [`RepositoryError::Duplicate`] on constraint violation.
    pub async fn upsert(
        &self,
        selector: impl Into<Selector>,
        update: Update,
    ) -> RepositoryResult<Document> {
        let filter = selector.into().into_filter();
        let mut update = update;
        self.schema.prepare_upsert(&mut update);

        let row = self
            .store
            .find_one_and_update(&self.collection, &filter, &update, UpdateOptions::upsert())
            .await
            .map_err(|err| self.storage_error(err))?;

        row.map(Document::from_map).ok_or_else(|| self.not_found())
    }

    /// Finds a document by its identity. Fails with
    /// [`RepositoryError::NotFound`] when nothing matches.
    pub async fn by_id(&self, id: &str, options: FindOptions) -> RepositoryResult<Document> {
        self.try_by_id(id, options)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Finds a document by its identity, resolving to `None` when nothing
    /// matches.
    pub async fn try_by_id(
        &self,
        id: &str,
        options: FindOptions,
    ) -> RepositoryResult<Option<Document>> {
        self.try_by_query(Selector::from(id).into_filter(), options)
            .await
    }

    /// Finds a document by filter. Fails with
    /// [`RepositoryError::NotFound`] when nothing matches.
    pub async fn by_query(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> RepositoryResult<Document> {
        self.try_by_query(filter, options)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Finds a document by filter, resolving to `None` when nothing
    /// matches. Visibility defaults to active-only.
    pub async fn try_by_query(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> RepositoryResult<Option<Document>> {
        let filter = scope_visibility(filter, options.visibility);
        let row = self
            .store
            .find_one(&self.collection, &filter, options.projection.as_ref())
            .await
            .map_err(|err| self.storage_error(err))?;
        Ok(row.map(Document::from_map))
    }

    /// Finds every document matching the query, without pagination.
    /// Default sort is `created_at` ascending; default visibility is
    /// active-only.
    pub async fn all(&self, query: Query) -> RepositoryResult<Vec<Document>> {
        let filter = scope_visibility(query.conditions, query.visibility);
        let sort = query.sort.unwrap_or_default();

        let rows = self
            .store
            .find(
                &self.collection,
                &filter,
                query.projection.as_ref(),
                &sort,
                0,
                None,
            )
            .await
            .map_err(|err| self.storage_error(err))?;

        Ok(rows.into_iter().map(Document::from_map).collect())
    }

    /// Finds one page of documents.
    ///
    /// The effective page is the requested page when ≥ 1 and 1 otherwise;
    /// the offset is `(effective page − 1) × page size`; the result is
    /// capped at the page size and echoes page, page size and sort.
    pub async fn list(&self, request: PageRequest) -> RepositoryResult<PageResult<Document>> {
        let page = request.effective_page();
        let per_page = request.effective_per_page();
        let skip = request.offset();
        let sort = request.sort.clone().unwrap_or_default();
        let filter = scope_visibility(request.conditions, request.visibility);

        let rows = self
            .store
            .find(
                &self.collection,
                &filter,
                request.projection.as_ref(),
                &sort,
                skip,
                Some(u64::from(per_page)),
            )
            .await
            .map_err(|err| self.storage_error(err))?;

        Ok(PageResult {
            page,
            per_page,
            sort,
            items: rows.into_iter().map(Document::from_map).collect(),
        })
    }

    /// Read-modify-write update: loads the target document, applies a
    /// plain field assignment (no operator semantics), and persists a full
    /// save through the schema's validation/transform hooks.
    ///
    /// Not safe against concurrent writers to the same document (a
    /// classic lost-update race), accepted for flows that need hook
    /// execution. Fails with [`RepositoryError::NotFound`] when nothing
    /// matches.
    pub async fn update(
        &self,
        selector: impl Into<Selector>,
        fields: Value,
    ) -> RepositoryResult<Document> {
        self.try_update(selector, fields)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Read-modify-write update resolving to `None` when nothing matches.
    pub async fn try_update(
        &self,
        selector: impl Into<Selector>,
        fields: Value,
    ) -> RepositoryResult<Option<Document>> {
        let Value::Object(fields) = fields else {
            return Err(self.storage_error(StoreError::invalid(
                "update fields must be an object",
            )));
        };

        let filter = selector.into().into_filter();
        let Some(mut current) = self
            .store
            .find_one(&self.collection, &filter, None)
            .await
            .map_err(|err| self.storage_error(err))?
        else {
            return Ok(None);
        };

        self.schema
            .apply_save(&mut current, &fields)
            .map_err(|err| self.storage_error(err))?;

        // save back by identity, not by the original (possibly broader) filter
        let identity = match current.get(ID_FIELD) {
            Some(id) => Filter::new().field(ID_FIELD, Predicate::Eq(id.clone())),
            None => filter,
        };
        let saved = self
            .store
            .replace_one(&self.collection, &identity, current)
            .await
            .map_err(|err| self.storage_error(err))?;

        Ok(saved.map(Document::from_map))
    }

    /// Atomically applies a store-native update expression to the document
    /// matching `selector`, without loading it and without save hooks.
    ///
    /// Safe under concurrent writers; supports operator semantics
    /// (set/increment/unset). Fails with [`RepositoryError::Duplicate`] on
    /// constraint violation and [`RepositoryError::NotFound`] when nothing
    /// matches.
    pub async fn atomic_update(
        &self,
        selector: impl Into<Selector>,
        update: Update,
    ) -> RepositoryResult<Document> {
        self.try_atomic_update(selector, update)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Atomic update resolving to `None` when nothing matches.
    pub async fn try_atomic_update(
        &self,
        selector: impl Into<Selector>,
        update: Update,
    ) -> RepositoryResult<Option<Document>> {
        let filter = selector.into().into_filter();
        let mut update = update;
        self.schema.stamp_update(&mut update);

        let row = self
            .store
            .find_one_and_update(
                &self.collection,
                &filter,
                &update,
                UpdateOptions::default(),
            )
            .await
            .map_err(|err| self.storage_error(err))?;

        Ok(row.map(Document::from_map))
    }

    /// Bulk atomic update across all matches. Returns the matched count;
    /// no per-document hooks run.
    pub async fn update_all(&self, filter: Filter, update: Update) -> RepositoryResult<u64> {
        let mut update = update;
        self.schema.stamp_update(&mut update);
        self.store
            .update_many(&self.collection, &filter, &update)
            .await
            .map_err(|err| self.storage_error(err))
    }

    /// Soft delete: atomically sets `deleted_at` to the current time.
    ///
    /// Implemented via [`atomic_update`](Repository::atomic_update) and
    /// inherits its concurrency safety and not-found semantics. The
    /// document's data is retained and its unique values become reusable
    /// by active documents.
    pub async fn remove(&self, selector: impl Into<Selector>) -> RepositoryResult<Document> {
        self.try_remove(selector)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Soft delete resolving to `None` when nothing matches.
    pub async fn try_remove(
        &self,
        selector: impl Into<Selector>,
    ) -> RepositoryResult<Option<Document>> {
        debug!(collection = %self.collection, "soft deleting");
        let update = Update::set(DELETED_AT_FIELD, timestamp_value(Utc::now()));
        self.try_atomic_update(selector, update).await
    }

    /// Irreversible hard delete of a single document. Returns the purged
    /// document; fails with [`RepositoryError::NotFound`] when nothing
    /// matches.
    pub async fn destroy(&self, selector: impl Into<Selector>) -> RepositoryResult<Document> {
        self.try_destroy(selector)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Hard delete resolving to `None` when nothing matches.
    pub async fn try_destroy(
        &self,
        selector: impl Into<Selector>,
    ) -> RepositoryResult<Option<Document>> {
        let filter = selector.into().into_filter();
        debug!(collection = %self.collection, "hard deleting");
        let row = self
            .store
            .find_one_and_delete(&self.collection, &filter)
            .await
            .map_err(|err| self.storage_error(err))?;
        Ok(row.map(Document::from_map))
    }

    /// Irreversible bulk hard delete. Bypasses visibility filtering
    /// entirely; soft-deleted documents matching the filter are purged
    /// too. Administrative/test-teardown use only.
    pub async fn truncate(&self, filter: Filter) -> RepositoryResult<u64> {
        debug!(collection = %self.collection, "truncating");
        self.store
            .delete_many(&self.collection, &filter)
            .await
            .map_err(|err| self.storage_error(err))
    }

    /// Counts documents matching the filter under the given visibility.
    pub async fn count(&self, filter: Filter, visibility: Visibility) -> RepositoryResult<u64> {
        let filter = scope_visibility(filter, visibility);
        self.store
            .count(&self.collection, &filter)
            .await
            .map_err(|err| self.storage_error(err))
    }

    /// Returns `true` if an active document matches the selector.
    pub async fn exists(&self, selector: impl Into<Selector>) -> RepositoryResult<bool> {
        Ok(self
            .try_by_query(selector.into().into_filter(), FindOptions::default())
            .await?
            .is_some())
    }

    /// The public serialization of a document under the bound schema.
    pub fn to_public(&self, document: &Document) -> Value {
        self.schema.to_public(document)
    }

    fn not_found(&self) -> RepositoryError {
        RepositoryError::NotFound {
            collection: self.collection.clone(),
        }
    }

    fn storage_error(&self, source: StoreError) -> RepositoryError {
        match source {
            StoreError::UniqueViolation { .. } => RepositoryError::Duplicate {
                collection: self.collection.clone(),
            },
            other => RepositoryError::Storage {
                collection: self.collection.clone(),
                source: other,
            },
        }
    }
}

/// Adds the soft-delete clause a visibility setting implies. The
/// visibility always wins over a caller-supplied `deleted_at` clause for
/// the narrowing settings; `IncludeDeleted` leaves the filter untouched.
fn scope_visibility(filter: Filter, visibility: Visibility) -> Filter {
    match visibility {
        Visibility::ActiveOnly => filter.field(DELETED_AT_FIELD, Predicate::Exists(false)),
        Visibility::DeletedOnly => filter.field(DELETED_AT_FIELD, Predicate::Exists(true)),
        Visibility::IncludeDeleted => filter,
    }
}
