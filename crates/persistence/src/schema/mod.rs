//! Schema definition and compilation.
//!
//! A [`SchemaDefinition`] describes one document kind as an ordered mapping
//! of typed [`FieldDescriptor`]s. Compilation goes through two steps:
//!
//! 1. the extractor ([`extract_unique_fields`]) strips `unique` markers and
//!    collects the marked field names, so the store never builds a bare
//!    single-field unique index;
//! 2. the factory ([`compile_schema`] / [`compile_tenant_schema`]) adds the
//!    reserved identity / timestamp / soft-delete fields, the serialization
//!    redactions, and the soft-delete-aware composite unique indexes.
//!
//! Index registration is declarative: the [`CompiledSchema`] carries
//! [`IndexSpec`]s and the bound store materializes them at bootstrap.

mod definition;
mod extractor;
mod factory;

pub use definition::{FieldDescriptor, FieldType, SchemaDefinition, fields};
pub use extractor::extract_unique_fields;
pub use factory::{
    CompiledSchema, IndexSpec, SchemaOptions, compile_schema, compile_tenant_schema,
};
