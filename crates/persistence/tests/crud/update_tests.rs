//! Tests for the two update strategies and upsert.

use serde_json::json;

use silo_persistence::types::{FindOptions, Filter, Update};

use crate::common::{user_json, user_repo};

// ============================================================================
// Read-modify-write update (hook-triggering)
// ============================================================================

/// `update` assigns plain fields and runs the save-path hooks: transforms
/// apply and `updated_at` moves.
#[tokio::test]
async fn test_update_runs_save_hooks() {
    let repo = user_repo().await;
    let user = repo.create(user_json("ada@example.com")).await.unwrap();
    let stamped = user.updated_at().unwrap();

    let updated = repo
        .update(user.id(), json!({"email": "  NEW@Example.com "}))
        .await
        .unwrap();

    assert_eq!(updated.get("email"), Some(&json!("new@example.com")));
    assert!(updated.updated_at().unwrap() >= stamped);
    assert_eq!(updated.id(), user.id(), "identity is immutable");
}

/// `update` on a missing document fails with not-found; `try_update`
/// resolves to `None`.
#[tokio::test]
async fn test_update_missing_document() {
    let repo = user_repo().await;

    let err = repo.update("ghost", json!({"age": 1})).await.unwrap_err();
    assert!(err.is_not_found());

    let none = repo.try_update("ghost", json!({"age": 1})).await.unwrap();
    assert!(none.is_none());
}

/// A save that would violate validation surfaces as a storage fault.
#[tokio::test]
async fn test_update_validation_failure() {
    let repo = user_repo().await;
    let user = repo.create(user_json("ada@example.com")).await.unwrap();

    let err = repo
        .update(user.id(), json!({"age": "not a number"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        silo_persistence::error::RepositoryError::Storage { .. }
    ));
}

// ============================================================================
// Atomic update
// ============================================================================

/// `atomic_update` supports operator semantics without loading the
/// document.
#[tokio::test]
async fn test_atomic_update_operators() {
    let repo = user_repo().await;
    let user = repo
        .create(json!({"email": "ada@example.com", "age": 30}))
        .await
        .unwrap();

    let updated = repo
        .atomic_update(
            user.id(),
            Update::set("username", "ada").with_inc("age", 2),
        )
        .await
        .unwrap();

    assert_eq!(updated.get("username"), Some(&json!("ada")));
    assert_eq!(updated.get("age"), Some(&json!(32)));
}

/// Atomic updates bump the modification timestamp.
#[tokio::test]
async fn test_atomic_update_stamps_updated_at() {
    let repo = user_repo().await;
    let user = repo.create(user_json("ada@example.com")).await.unwrap();
    let stamped = user.updated_at().unwrap();

    let updated = repo
        .atomic_update(user.id(), Update::set("age", 1))
        .await
        .unwrap();
    assert!(updated.updated_at().unwrap() >= stamped);
}

/// No match with the `try_` variant resolves to an empty result rather
/// than rejecting.
#[tokio::test]
async fn test_try_atomic_update_no_match() {
    let repo = user_repo().await;

    let result = repo
        .try_atomic_update("ghost", Update::set("age", 1))
        .await
        .unwrap();
    assert!(result.is_none());
}

/// An atomic update that collides with a unique index fails with a
/// duplicate error.
#[tokio::test]
async fn test_atomic_update_duplicate() {
    let repo = user_repo().await;
    repo.create(user_json("taken@example.com")).await.unwrap();
    let other = repo.create(user_json("free@example.com")).await.unwrap();

    let err = repo
        .atomic_update(other.id(), Update::set("email", "taken@example.com"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
}

// ============================================================================
// Bulk update
// ============================================================================

/// `update_all` applies one atomic expression across all matches and
/// returns the matched count.
#[tokio::test]
async fn test_update_all() {
    let repo = user_repo().await;
    repo.create(json!({"email": "a@example.com", "age": 10})).await.unwrap();
    repo.create(json!({"email": "b@example.com", "age": 10})).await.unwrap();
    repo.create(json!({"email": "c@example.com", "age": 99})).await.unwrap();

    let matched = repo
        .update_all(Filter::by("age", 10), Update::set("active", false))
        .await
        .unwrap();
    assert_eq!(matched, 2);

    let flagged = repo
        .all(silo_persistence::types::Query::new()
            .with_conditions(Filter::by("active", false)))
        .await
        .unwrap();
    assert_eq!(flagged.len(), 2);
}

// ============================================================================
// Upsert
// ============================================================================

/// An upsert with no match inserts a document carrying identity and
/// creation timestamp.
#[tokio::test]
async fn test_upsert_inserts_when_absent() {
    let repo = user_repo().await;

    let inserted = repo
        .upsert(
            Filter::by("email", "ada@example.com"),
            Update::set("age", 1),
        )
        .await
        .unwrap();

    assert!(!inserted.id().is_empty());
    assert!(inserted.created_at().is_some());
    assert_eq!(inserted.get("email"), Some(&json!("ada@example.com")));
    assert_eq!(inserted.get("age"), Some(&json!(1)));
}

/// An upsert with a match updates in place, keeping identity and creation
/// timestamp.
#[tokio::test]
async fn test_upsert_updates_when_present() {
    let repo = user_repo().await;
    let user = repo.create(user_json("ada@example.com")).await.unwrap();

    let updated = repo
        .upsert(
            Filter::by("email", "ada@example.com"),
            Update::set("age", 7),
        )
        .await
        .unwrap();

    assert_eq!(updated.id(), user.id());
    assert_eq!(updated.get("age"), Some(&json!(7)));
    assert_eq!(
        repo.count(Filter::new(), silo_persistence::types::Visibility::ActiveOnly)
            .await
            .unwrap(),
        1
    );

    let read = repo.by_id(user.id(), FindOptions::default()).await.unwrap();
    assert_eq!(read.get("age"), Some(&json!(7)));
}

/// An upsert that would collide with a unique index fails with a
/// duplicate error.
#[tokio::test]
async fn test_upsert_duplicate() {
    let repo = user_repo().await;
    repo.create(user_json("taken@example.com")).await.unwrap();
    let other = repo.create(user_json("free@example.com")).await.unwrap();

    let err = repo
        .upsert(other.id(), Update::set("email", "taken@example.com"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
}
