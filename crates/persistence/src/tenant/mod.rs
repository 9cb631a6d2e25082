//! Tenant identity.
//!
//! The repository layer partitions documents by an opaque tenant key. This
//! module defines [`TenantId`], the value side of that key; the field name
//! side is fixed on the
//! [`TenantRepository`](crate::repository::TenantRepository) at
//! construction.

mod id;

pub use id::TenantId;
