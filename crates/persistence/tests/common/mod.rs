//! Test infrastructure for the repository layer.
//!
//! Reusable schema fixtures and repository harness builders shared by the
//! test modules.

pub mod fixtures;

pub use fixtures::*;

use std::sync::Arc;

use silo_persistence::backends::memory::MemoryStore;
use silo_persistence::repository::{Repository, TenantRepository};
use silo_persistence::schema::{SchemaOptions, compile_schema, compile_tenant_schema};
use silo_persistence::tenant::TenantId;

/// Builds a `users` repository over a fresh in-memory store with indexes
/// synced.
pub async fn user_repo() -> Repository {
    let schema = compile_schema(&user_definition(), SchemaOptions::default(), true)
        .expect("user schema should compile");
    let repo = Repository::new(Arc::new(MemoryStore::new()), "users", schema);
    repo.sync_indexes().await.expect("index sync should succeed");
    repo
}

/// Builds a tenant-scoped `projects` repository keyed by `workspace_id`.
pub async fn project_repo() -> TenantRepository {
    let schema =
        compile_tenant_schema("workspace_id", &project_definition(), SchemaOptions::default())
            .expect("project schema should compile");
    let repo = Repository::new(Arc::new(MemoryStore::new()), "projects", schema);
    repo.sync_indexes().await.expect("index sync should succeed");
    TenantRepository::new(repo, "workspace_id")
}

/// Shorthand tenant constructor.
pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}
