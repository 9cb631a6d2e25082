//! Repository engine and tenant wrapper.
//!
//! [`Repository`] is the generic CRUD engine bound to one collection and
//! one compiled schema; [`TenantRepository`] composes over it to force
//! every read and write through a caller-supplied tenant key.

mod base;
mod tenant;

pub use base::Repository;
pub use tenant::TenantRepository;
