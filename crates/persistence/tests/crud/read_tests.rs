//! Tests for document reads and visibility.

use serde_json::json;

use silo_persistence::types::{
    FindOptions, Filter, Projection, Query, Sort, Visibility,
};

use crate::common::{user_json, user_repo};

// ============================================================================
// Single-document reads
// ============================================================================

/// `by_id` returns the created document.
#[tokio::test]
async fn test_by_id_roundtrip() {
    let repo = user_repo().await;

    let created = repo.create(user_json("ada@example.com")).await.unwrap();
    let read = repo.by_id(created.id(), FindOptions::default()).await.unwrap();

    assert_eq!(read.id(), created.id());
    assert_eq!(read.get("email"), Some(&json!("ada@example.com")));
}

/// The non-`try` variant fails with not-found; the `try_` variant
/// resolves to `None`.
#[tokio::test]
async fn test_missing_document_semantics() {
    let repo = user_repo().await;

    let err = repo.by_id("ghost", FindOptions::default()).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "users not found");

    let none = repo
        .try_by_id("ghost", FindOptions::default())
        .await
        .unwrap();
    assert!(none.is_none());
}

/// `by_query` matches on business fields.
#[tokio::test]
async fn test_by_query() {
    let repo = user_repo().await;
    repo.create(user_json("ada@example.com")).await.unwrap();

    let found = repo
        .by_query(Filter::by("email", "ada@example.com"), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(found.get("email"), Some(&json!("ada@example.com")));
}

// ============================================================================
// Visibility
// ============================================================================

/// Default visibility hides soft-deleted documents; widening to
/// include-deleted returns them along with their deletion timestamp.
#[tokio::test]
async fn test_soft_deleted_visibility() {
    let repo = user_repo().await;

    let user = repo.create(user_json("ada@example.com")).await.unwrap();
    repo.remove(user.id()).await.unwrap();

    // default: indistinguishable from missing
    let err = repo
        .by_query(Filter::by("email", "ada@example.com"), FindOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // widened: returned with its deleted_at
    let found = repo
        .by_query(
            Filter::by("email", "ada@example.com"),
            FindOptions::default().include_deleted(),
        )
        .await
        .unwrap();
    assert!(found.is_deleted());
    assert!(found.deleted_at().is_some());
}

/// Deleted-only visibility excludes active documents.
#[tokio::test]
async fn test_deleted_only_visibility() {
    let repo = user_repo().await;

    let gone = repo.create(user_json("gone@example.com")).await.unwrap();
    repo.create(user_json("kept@example.com")).await.unwrap();
    repo.remove(gone.id()).await.unwrap();

    let deleted = repo
        .all(Query::new().with_visibility(Visibility::DeletedOnly))
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].get("email"), Some(&json!("gone@example.com")));
}

// ============================================================================
// Projections
// ============================================================================

/// Include projections keep only the listed fields (plus identity).
#[tokio::test]
async fn test_projection_include() {
    let repo = user_repo().await;
    let created = repo.create(user_json("ada@example.com")).await.unwrap();

    let read = repo
        .by_id(
            created.id(),
            FindOptions::default().with_projection(Projection::include(["email"])),
        )
        .await
        .unwrap();

    assert_eq!(read.get("email"), Some(&json!("ada@example.com")));
    assert_eq!(read.id(), created.id());
    assert!(read.get("password").is_none());
}

/// Exclude projections drop the listed fields.
#[tokio::test]
async fn test_projection_exclude() {
    let repo = user_repo().await;
    let created = repo.create(user_json("ada@example.com")).await.unwrap();

    let read = repo
        .by_id(
            created.id(),
            FindOptions::default().with_projection(Projection::exclude(["password"])),
        )
        .await
        .unwrap();

    assert!(read.get("password").is_none());
    assert_eq!(read.get("email"), Some(&json!("ada@example.com")));
}

// ============================================================================
// all()
// ============================================================================

/// `all` returns every active match, sorted by creation time by default.
#[tokio::test]
async fn test_all_default_sort_and_visibility() {
    let repo = user_repo().await;

    let first = repo.create(user_json("first@example.com")).await.unwrap();
    let second = repo.create(user_json("second@example.com")).await.unwrap();
    let third = repo.create(user_json("third@example.com")).await.unwrap();
    repo.remove(second.id()).await.unwrap();

    let users = repo.all(Query::new()).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id(), first.id());
    assert_eq!(users[1].id(), third.id());
}

/// `all` honors an explicit sort.
#[tokio::test]
async fn test_all_explicit_sort() {
    let repo = user_repo().await;
    repo.create(json!({"email": "a@example.com", "age": 30})).await.unwrap();
    repo.create(json!({"email": "b@example.com", "age": 20})).await.unwrap();
    repo.create(json!({"email": "c@example.com", "age": 40})).await.unwrap();

    let users = repo
        .all(Query::new().with_sort(Sort::descending("age")))
        .await
        .unwrap();
    let ages: Vec<_> = users.iter().map(|u| u.get("age").cloned().unwrap()).collect();
    assert_eq!(ages, vec![json!(40), json!(30), json!(20)]);
}

/// `all` filters by conditions.
#[tokio::test]
async fn test_all_with_conditions() {
    let repo = user_repo().await;
    repo.create(json!({"email": "a@example.com", "age": 30})).await.unwrap();
    repo.create(json!({"email": "b@example.com", "age": 20})).await.unwrap();

    let thirty = repo
        .all(Query::new().with_conditions(Filter::by("age", 30)))
        .await
        .unwrap();
    assert_eq!(thirty.len(), 1);
    assert_eq!(thirty[0].get("email"), Some(&json!("a@example.com")));
}

// ============================================================================
// count / exists
// ============================================================================

/// `count` respects visibility; `exists` sees only active documents.
#[tokio::test]
async fn test_count_and_exists() {
    let repo = user_repo().await;

    let user = repo.create(user_json("ada@example.com")).await.unwrap();
    assert!(repo.exists(user.id()).await.unwrap());
    assert_eq!(
        repo.count(Filter::new(), Visibility::ActiveOnly).await.unwrap(),
        1
    );

    repo.remove(user.id()).await.unwrap();
    assert!(!repo.exists(user.id()).await.unwrap());
    assert_eq!(
        repo.count(Filter::new(), Visibility::ActiveOnly).await.unwrap(),
        0
    );
    assert_eq!(
        repo.count(Filter::new(), Visibility::IncludeDeleted)
            .await
            .unwrap(),
        1
    );
}
