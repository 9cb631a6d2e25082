//! Structured query model.
//!
//! Queries are built from typed parts rather than raw store syntax: a
//! [`Filter`] of per-field [`Predicate`]s, an optional [`Projection`], a
//! [`Sort`], and a [`Visibility`] that decides how soft-deleted documents
//! participate. The repository translates these for the bound store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::ID_FIELD;

/// How soft-deleted documents participate in a read.
///
/// Modeled as an explicit three-way enumeration rather than a boolean so
/// "widen to include deleted" and "deleted only" are distinct, auditable
/// choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only documents without a soft-delete marker. The default everywhere.
    #[default]
    ActiveOnly,
    /// Both active and soft-deleted documents.
    IncludeDeleted,
    /// Only soft-deleted documents.
    DeletedOnly,
}

/// A single-field predicate inside a [`Filter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Field equals the value. A `null` value also matches an absent field.
    Eq(Value),
    /// Field differs from the value (absent fields match).
    Ne(Value),
    /// Field is strictly greater than the value.
    Gt(Value),
    /// Field is greater than or equal to the value.
    Gte(Value),
    /// Field is strictly less than the value.
    Lt(Value),
    /// Field is less than or equal to the value.
    Lte(Value),
    /// Field equals one of the values.
    In(Vec<Value>),
    /// Field is present and non-null (`true`) or absent/null (`false`).
    Exists(bool),
}

impl Predicate {
    /// Equality predicate from anything JSON-convertible.
    pub fn eq(value: impl Into<Value>) -> Self {
        Predicate::Eq(value.into())
    }

    /// Inequality predicate from anything JSON-convertible.
    pub fn ne(value: impl Into<Value>) -> Self {
        Predicate::Ne(value.into())
    }
}

/// A structured conjunction of per-field predicates.
///
/// Fields are kept in a sorted map, so a filter has one predicate per field
/// and a deterministic iteration order. Later inserts for the same field
/// replace earlier ones, which is what tenant-key merging relies on.
///
/// # Examples
///
/// ```
/// use silo_persistence::types::{Filter, Predicate};
///
/// let filter = Filter::by("email", "ada@example.com")
///     .field("age", Predicate::Gte(30.into()));
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    clauses: BTreeMap<String, Predicate>,
}

impl Filter {
    /// Creates an empty filter, which matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter with a single equality clause.
    pub fn by(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().field(field, Predicate::eq(value))
    }

    /// Adds (or replaces) a clause for `field`.
    pub fn field(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.clauses.insert(field.into(), predicate);
        self
    }

    /// Inserts a clause in place, replacing any existing clause for the
    /// field.
    pub fn insert(&mut self, field: impl Into<String>, predicate: Predicate) {
        self.clauses.insert(field.into(), predicate);
    }

    /// Merges `other` into self; on conflict, `other` wins.
    pub fn merge(mut self, other: Filter) -> Self {
        for (field, predicate) in other.clauses {
            self.clauses.insert(field, predicate);
        }
        self
    }

    /// Returns the clause for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Predicate> {
        self.clauses.get(field)
    }

    /// Returns `true` if a clause exists for `field`.
    pub fn contains_field(&self, field: &str) -> bool {
        self.clauses.contains_key(field)
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns `true` if the filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterates over `(field, predicate)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Either a bare document identity or a structured filter.
///
/// Most single-document operations accept `impl Into<Selector>` so callers
/// can pass an id string or a [`Filter`] interchangeably.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Select by document identity.
    Id(String),
    /// Select by filter.
    Where(Filter),
}

impl Selector {
    /// Lowers the selector to a plain filter; `Id(s)` becomes an equality
    /// clause on the identity field.
    pub fn into_filter(self) -> Filter {
        match self {
            Selector::Id(id) => Filter::by(ID_FIELD, id),
            Selector::Where(filter) => filter,
        }
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Selector::Id(id.to_string())
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Selector::Id(id)
    }
}

impl From<&String> for Selector {
    fn from(id: &String) -> Self {
        Selector::Id(id.clone())
    }
}

impl From<Filter> for Selector {
    fn from(filter: Filter) -> Self {
        Selector::Where(filter)
    }
}

/// A field allow/deny list applied to returned documents.
///
/// The identity field is always retained regardless of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Keep only the listed fields.
    Include(Vec<String>),
    /// Keep everything except the listed fields.
    Exclude(Vec<String>),
}

impl Projection {
    /// Allow-list projection.
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include(fields.into_iter().map(Into::into).collect())
    }

    /// Deny-list projection.
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// A single-field sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Field to sort on.
    pub field: String,
    /// Direction to sort in.
    pub direction: SortDirection,
}

impl Sort {
    /// Ascending sort on `field`.
    pub fn by(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `field`.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parses a sort expression: `"created_at"` ascending, `"-created_at"`
    /// descending.
    pub fn parse(expr: &str) -> Self {
        match expr.strip_prefix('-') {
            Some(field) => Self::descending(field),
            None => Self::by(expr),
        }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::by(super::document::CREATED_AT_FIELD)
    }
}

/// A full read query: conditions, projection, sort, visibility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Structured conditions; empty matches everything.
    pub conditions: Filter,
    /// Optional field allow/deny list.
    pub projection: Option<Projection>,
    /// Sort key; `created_at` ascending when unset.
    pub sort: Option<Sort>,
    /// Soft-delete visibility; active-only when unset.
    pub visibility: Visibility,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the conditions.
    pub fn with_conditions(mut self, conditions: Filter) -> Self {
        self.conditions = conditions;
        self
    }

    /// Sets the projection.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Sets the sort key.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Options for single-document reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Optional field allow/deny list.
    pub projection: Option<Projection>,
    /// Soft-delete visibility; active-only by default.
    pub visibility: Visibility,
}

impl FindOptions {
    /// Default options: no projection, active-only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the projection.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Shorthand for widening visibility to include soft-deleted documents.
    pub fn include_deleted(self) -> Self {
        self.with_visibility(Visibility::IncludeDeleted)
    }
}
