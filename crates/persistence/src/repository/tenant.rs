//! Tenant-scoped repository wrapper.

use serde_json::Value;

use crate::error::RepositoryResult;
use crate::tenant::TenantId;
use crate::types::{
    Document, FindOptions, Filter, ID_FIELD, PageRequest, PageResult, Predicate, Query, Selector,
    Update, Visibility,
};

use super::base::Repository;

/// A repository wrapper that forces every read and write through a tenant
/// key.
///
/// `TenantRepository` composes over a [`Repository`] through its public
/// contract, never reaching into internals, so isolation enforcement
/// lives at this single seam. It holds the wrapped repository plus the
/// fixed tenant key field name; every call additionally takes the caller's
/// [`TenantId`].
///
/// Two invariants sit on top of the core contract:
///
/// - **Write isolation**: the tenant key value is force-written into
///   every payload, overriding anything the caller supplied for that
///   field. A caller cannot write into another tenant's partition even by
///   forging the field, including through update operators.
/// - **Read isolation**: the tenant key is merged into every query's
///   conditions before delegating. A document owned by another tenant is
///   indistinguishable from a document that does not exist: same
///   not-found behavior, no leakage of existence or field values.
///
/// Several `TenantRepository` values may wrap clones of the same
/// [`Repository`]; the wrapper holds no mutable state beyond its fixed key
/// name.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use serde_json::json;
/// use silo_persistence::backends::memory::MemoryStore;
/// use silo_persistence::repository::{Repository, TenantRepository};
/// use silo_persistence::schema::{SchemaDefinition, SchemaOptions, compile_tenant_schema, fields};
/// use silo_persistence::tenant::TenantId;
///
/// # async fn example() -> silo_persistence::error::RepositoryResult<()> {
/// let definition = SchemaDefinition::new()
///     .field("name", fields::trimmed_string().unique().required());
/// let schema = compile_tenant_schema("workspace_id", &definition, SchemaOptions::default())?;
///
/// let repo = Repository::new(Arc::new(MemoryStore::new()), "projects", schema);
/// let projects = TenantRepository::new(repo, "workspace_id");
///
/// let acme = TenantId::new("acme");
/// let project = projects.create(&acme, json!({"name": "apollo"})).await?;
/// assert_eq!(project.get("workspace_id"), Some(&json!("acme")));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TenantRepository {
    repo: Repository,
    key: String,
}

impl TenantRepository {
    /// Wraps a repository, scoping every operation by the given key field.
    pub fn new(repo: Repository, key: impl Into<String>) -> Self {
        Self {
            repo,
            key: key.into(),
        }
    }

    /// The wrapped repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// The tenant key field name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Lowers a selector to a filter with the tenant key merged in.
    ///
    /// A bare identity becomes `{_id, key}`; a filter gets the key clause
    /// added, with the tenant key winning over any caller-supplied clause
    /// for that field.
    pub fn attach_key(&self, tenant: &TenantId, selector: impl Into<Selector>) -> Filter {
        let filter = match selector.into() {
            Selector::Id(id) => Filter::by(ID_FIELD, id),
            Selector::Where(filter) => filter,
        };
        filter.field(&self.key, Predicate::eq(tenant.as_str()))
    }

    /// Force-writes the tenant key into a plain fields object.
    fn brand_fields(&self, tenant: &TenantId, fields: Value) -> Value {
        match fields {
            Value::Object(mut map) => {
                map.insert(self.key.clone(), Value::String(tenant.to_string()));
                Value::Object(map)
            }
            // non-objects pass through; the schema rejects them downstream
            other => other,
        }
    }

    /// Force-writes the tenant key into an update, overriding any operator
    /// the caller aimed at the key field.
    fn brand_update(&self, tenant: &TenantId, mut update: Update) -> Update {
        update.force_set(&self.key, Value::String(tenant.to_string()));
        update
    }

    /// Creates one document owned by `tenant`.
    pub async fn create(&self, tenant: &TenantId, fields: Value) -> RepositoryResult<Document> {
        self.repo.create(self.brand_fields(tenant, fields)).await
    }

    /// Creates several documents, all owned by `tenant`.
    pub async fn create_many(
        &self,
        tenant: &TenantId,
        fields: Vec<Value>,
    ) -> RepositoryResult<Vec<Document>> {
        let branded = fields
            .into_iter()
            .map(|entry| self.brand_fields(tenant, entry))
            .collect();
        self.repo.create_many(branded).await
    }

    /// Upserts within the tenant's partition.
    pub async fn upsert(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
        update: Update,
    ) -> RepositoryResult<Document> {
        self.repo
            .upsert(
                self.attach_key(tenant, selector),
                self.brand_update(tenant, update),
            )
            .await
    }

    /// Finds one of the tenant's documents by identity.
    pub async fn by_id(
        &self,
        tenant: &TenantId,
        id: &str,
        options: FindOptions,
    ) -> RepositoryResult<Document> {
        self.repo
            .by_query(self.attach_key(tenant, id), options)
            .await
    }

    /// Finds one of the tenant's documents by identity, resolving to
    /// `None` when nothing matches (including documents owned by other
    /// tenants).
    pub async fn try_by_id(
        &self,
        tenant: &TenantId,
        id: &str,
        options: FindOptions,
    ) -> RepositoryResult<Option<Document>> {
        self.repo
            .try_by_query(self.attach_key(tenant, id), options)
            .await
    }

    /// Finds one of the tenant's documents by filter.
    pub async fn by_query(
        &self,
        tenant: &TenantId,
        filter: Filter,
        options: FindOptions,
    ) -> RepositoryResult<Document> {
        self.repo
            .by_query(self.attach_key(tenant, filter), options)
            .await
    }

    /// Finds one of the tenant's documents by filter, resolving to `None`
    /// when nothing matches.
    pub async fn try_by_query(
        &self,
        tenant: &TenantId,
        filter: Filter,
        options: FindOptions,
    ) -> RepositoryResult<Option<Document>> {
        self.repo
            .try_by_query(self.attach_key(tenant, filter), options)
            .await
    }

    /// Finds every document of the tenant matching the query.
    pub async fn all(&self, tenant: &TenantId, query: Query) -> RepositoryResult<Vec<Document>> {
        let mut query = query;
        query.conditions = self.attach_key(tenant, query.conditions);
        self.repo.all(query).await
    }

    /// Finds one page of the tenant's documents.
    pub async fn list(
        &self,
        tenant: &TenantId,
        request: PageRequest,
    ) -> RepositoryResult<PageResult<Document>> {
        let mut request = request;
        request.conditions = self.attach_key(tenant, request.conditions);
        self.repo.list(request).await
    }

    /// Read-modify-write update within the tenant's partition.
    pub async fn update(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
        fields: Value,
    ) -> RepositoryResult<Document> {
        self.repo
            .update(
                self.attach_key(tenant, selector),
                self.brand_fields(tenant, fields),
            )
            .await
    }

    /// Read-modify-write update resolving to `None` when nothing matches.
    pub async fn try_update(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
        fields: Value,
    ) -> RepositoryResult<Option<Document>> {
        self.repo
            .try_update(
                self.attach_key(tenant, selector),
                self.brand_fields(tenant, fields),
            )
            .await
    }

    /// Atomic update within the tenant's partition.
    pub async fn atomic_update(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
        update: Update,
    ) -> RepositoryResult<Document> {
        self.repo
            .atomic_update(
                self.attach_key(tenant, selector),
                self.brand_update(tenant, update),
            )
            .await
    }

    /// Atomic update resolving to `None` when nothing matches.
    pub async fn try_atomic_update(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
        update: Update,
    ) -> RepositoryResult<Option<Document>> {
        self.repo
            .try_atomic_update(
                self.attach_key(tenant, selector),
                self.brand_update(tenant, update),
            )
            .await
    }

    /// Bulk atomic update across the tenant's matches.
    pub async fn update_all(
        &self,
        tenant: &TenantId,
        filter: Filter,
        update: Update,
    ) -> RepositoryResult<u64> {
        self.repo
            .update_all(
                self.attach_key(tenant, filter),
                self.brand_update(tenant, update),
            )
            .await
    }

    /// Soft delete within the tenant's partition.
    pub async fn remove(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
    ) -> RepositoryResult<Document> {
        self.repo.remove(self.attach_key(tenant, selector)).await
    }

    /// Soft delete resolving to `None` when nothing matches.
    pub async fn try_remove(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
    ) -> RepositoryResult<Option<Document>> {
        self.repo
            .try_remove(self.attach_key(tenant, selector))
            .await
    }

    /// Hard delete within the tenant's partition.
    pub async fn destroy(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
    ) -> RepositoryResult<Document> {
        self.repo.destroy(self.attach_key(tenant, selector)).await
    }

    /// Hard delete resolving to `None` when nothing matches.
    pub async fn try_destroy(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
    ) -> RepositoryResult<Option<Document>> {
        self.repo
            .try_destroy(self.attach_key(tenant, selector))
            .await
    }

    /// Counts the tenant's documents matching the filter.
    pub async fn count(
        &self,
        tenant: &TenantId,
        filter: Filter,
        visibility: Visibility,
    ) -> RepositoryResult<u64> {
        self.repo
            .count(self.attach_key(tenant, filter), visibility)
            .await
    }

    /// Returns `true` if one of the tenant's active documents matches the
    /// selector.
    pub async fn exists(
        &self,
        tenant: &TenantId,
        selector: impl Into<Selector>,
    ) -> RepositoryResult<bool> {
        self.repo.exists(self.attach_key(tenant, selector)).await
    }
}
