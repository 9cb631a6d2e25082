//! Error types for the repository layer.
//!
//! Two enums cover the whole layer: [`RepositoryError`] is what callers see
//! from repository operations, [`StoreError`] is what a [`DocumentStore`]
//! implementation reports. The repository maps store-level conflict signals
//! onto [`RepositoryError::Duplicate`] so callers never have to inspect
//! store-specific codes.
//!
//! [`DocumentStore`]: crate::core::DocumentStore

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The schema definition handed to the factory was unusable.
    ///
    /// Raised at build time and fatal to that schema; nothing bound to it
    /// can be constructed.
    #[error("invalid schema definition: {message}")]
    Configuration { message: String },

    /// A write violated a uniqueness constraint.
    ///
    /// Recoverable: the caller may retry with different data.
    #[error("{collection} exists already")]
    Duplicate { collection: String },

    /// No document matched and the non-`try_` variant of the operation
    /// was used.
    ///
    /// Recoverable and part of normal control flow.
    #[error("{collection} not found")]
    NotFound { collection: String },

    /// Any other failure from the underlying store, passed through.
    #[error("storage failure on {collection}")]
    Storage {
        collection: String,
        #[source]
        source: StoreError,
    },
}

impl RepositoryError {
    /// Returns the collection the failing operation was bound to, when the
    /// error carries one.
    pub fn collection(&self) -> Option<&str> {
        match self {
            RepositoryError::Configuration { .. } => None,
            RepositoryError::Duplicate { collection }
            | RepositoryError::NotFound { collection }
            | RepositoryError::Storage { collection, .. } => Some(collection),
        }
    }

    /// Returns `true` for [`RepositoryError::Duplicate`].
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RepositoryError::Duplicate { .. })
    }

    /// Returns `true` for [`RepositoryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Errors reported by a [`DocumentStore`](crate::core::DocumentStore)
/// implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A write collided with a unique index.
    ///
    /// This is the distinguishable conflict signal the repository relies
    /// on; implementations must never fold it into [`StoreError::Backend`].
    #[error("unique index violation on {index}")]
    UniqueViolation { index: String },

    /// A document was structurally unusable (not an object, failed schema
    /// validation, malformed field value).
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// Any other backend fault: connectivity, I/O, driver errors.
    #[error("backend failure: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Shorthand for an [`StoreError::InvalidDocument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        StoreError::InvalidDocument {
            message: message.into(),
        }
    }

    /// Shorthand for a sourceless [`StoreError::Backend`].
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidDocument {
            message: err.to_string(),
        }
    }
}

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
