//! Core types for stored documents and queries.
//!
//! - [`Document`] wraps a persisted JSON object with typed accessors for the
//!   reserved metadata fields.
//! - [`Filter`], [`Selector`], [`Projection`], [`Sort`] and [`Visibility`]
//!   form the structured query model.
//! - [`Update`] is the typed operator document used by atomic writes.
//! - [`PageRequest`] / [`PageResult`] cover cursor-free pagination.

mod document;
mod pagination;
mod query;
mod update;

pub use document::{
    CREATED_AT_FIELD, DELETED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD,
};
pub use pagination::{DEFAULT_PER_PAGE, PageRequest, PageResult};
pub use query::{
    FindOptions, Filter, Predicate, Projection, Query, Selector, Sort, SortDirection, Visibility,
};
pub use update::Update;

pub(crate) use document::{parse_timestamp, timestamp_value};
