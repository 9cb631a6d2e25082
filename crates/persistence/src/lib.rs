//! Silo Persistence
//!
//! This crate is a generic access layer over document-oriented stores. It
//! gives every collection the same CRUD semantics: soft deletion,
//! duplicate-value detection independent of delete state, cursor-free
//! pagination, and multi-tenant key isolation.
//!
//! # Architecture
//!
//! The layer is organized into a handful of modules:
//!
//! - [`schema`] - Typed field descriptors, the unique-marker extractor, and
//!   the schema factory that compiles definitions into bound schemas
//! - [`types`] - Documents, structured queries, updates, and pagination
//! - [`error`] - Error types for all operations
//! - [`core`] - The abstract [`DocumentStore`] trait the engine is written
//!   against
//! - [`backends`] - Store implementations (in-memory)
//! - [`repository`] - The CRUD engine and the tenant-scoped wrapper
//! - [`tenant`] - Tenant identity
//!
//! # Soft deletion and uniqueness
//!
//! Documents are never physically removed by [`Repository::remove`]; a
//! `deleted_at` timestamp marks them soft-deleted and every read excludes
//! them unless visibility is explicitly widened. Uniqueness is therefore
//! enforced by composite indexes over `(deleted_at, field)`: a value is
//! freed the moment its holder is soft-deleted, while two active documents
//! can never share it. The schema factory derives these indexes from plain
//! `unique` markers on the definition:
//!
//! ```
//! use silo_persistence::schema::{SchemaDefinition, SchemaOptions, compile_schema, fields};
//!
//! let definition = SchemaDefinition::new()
//!     .field("email", fields::trimmed_lowercase_string().unique().required())
//!     .field("password", fields::credential_string().required());
//!
//! let schema = compile_schema(&definition, SchemaOptions::default(), true).unwrap();
//! assert_eq!(schema.unique_fields(), ["email"]);
//! assert_eq!(schema.indexes()[0].fields, ["deleted_at", "email"]);
//! ```
//!
//! # Repositories
//!
//! A [`Repository`] binds one collection and one compiled schema to a
//! store:
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use silo_persistence::backends::memory::MemoryStore;
//! use silo_persistence::repository::Repository;
//! use silo_persistence::schema::{SchemaDefinition, SchemaOptions, compile_schema, fields};
//! use silo_persistence::types::{FindOptions, PageRequest};
//!
//! # async fn example() -> silo_persistence::error::RepositoryResult<()> {
//! let definition = SchemaDefinition::new()
//!     .field("email", fields::trimmed_lowercase_string().unique().required());
//! let schema = compile_schema(&definition, SchemaOptions::default(), true)?;
//!
//! let repo = Repository::new(Arc::new(MemoryStore::new()), "users", schema);
//! repo.sync_indexes().await?;
//!
//! let user = repo.create(json!({"email": "ada@example.com"})).await?;
//! let page = repo.list(PageRequest::new().with_page(1)).await?;
//! assert_eq!(page.items.len(), 1);
//!
//! repo.remove(user.id()).await?;
//! assert!(repo.try_by_id(user.id(), FindOptions::default()).await?.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! # Multitenancy
//!
//! [`TenantRepository`] wraps a repository and forces every call through a
//! tenant key: the key value is force-written into every payload and
//! merged into every query, so a document owned by another tenant is
//! indistinguishable from one that does not exist.
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use silo_persistence::backends::memory::MemoryStore;
//! use silo_persistence::repository::{Repository, TenantRepository};
//! use silo_persistence::schema::{SchemaDefinition, SchemaOptions, compile_tenant_schema, fields};
//! use silo_persistence::tenant::TenantId;
//!
//! # async fn example() -> silo_persistence::error::RepositoryResult<()> {
//! let definition = SchemaDefinition::new()
//!     .field("name", fields::trimmed_string().unique().required());
//! let schema = compile_tenant_schema("workspace_id", &definition, SchemaOptions::default())?;
//!
//! let repo = Repository::new(Arc::new(MemoryStore::new()), "projects", schema);
//! let projects = TenantRepository::new(repo, "workspace_id");
//!
//! let acme = TenantId::new("acme");
//! projects.create(&acme, json!({"name": "apollo"})).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`DocumentStore`]: crate::core::DocumentStore
//! [`Repository`]: crate::repository::Repository
//! [`Repository::remove`]: crate::repository::Repository::remove
//! [`TenantRepository`]: crate::repository::TenantRepository

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod repository;
pub mod schema;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{RepositoryError, RepositoryResult, StoreError, StoreResult};
pub use repository::{Repository, TenantRepository};
pub use tenant::TenantId;

// Re-export the schema compilation surface
pub use schema::{
    CompiledSchema, FieldDescriptor, FieldType, IndexSpec, SchemaDefinition, SchemaOptions,
    compile_schema, compile_tenant_schema, extract_unique_fields,
};

// Re-export core query and result types
pub use types::{
    Document, FindOptions, Filter, PageRequest, PageResult, Predicate, Projection, Query,
    Selector, Sort, SortDirection, Update, Visibility,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
