//! Store backend implementations.
//!
//! The only backend shipped with this crate is the in-memory
//! [`MemoryStore`](memory::MemoryStore), which backs the test suites and
//! doubles as the reference implementation of the
//! [`DocumentStore`](crate::core::DocumentStore) contract. Production
//! stores live in their own crates and implement the same trait.

pub mod memory;
