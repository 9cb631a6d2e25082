//! Storage traits and abstractions.
//!
//! The repository core never talks to a database driver directly; it is
//! written against the [`DocumentStore`] trait defined here. Anything that
//! can perform atomic single-document conditional updates and report
//! uniqueness violations distinguishably can sit behind it.

mod store;

pub use store::{DocumentStore, UpdateOptions};
