//! Tests for document creation.

use serde_json::json;

use silo_persistence::error::RepositoryError;

use crate::common::{user_json, user_repo};

// ============================================================================
// Create Tests - Basic
// ============================================================================

/// Creating a document assigns identity and timestamps.
#[tokio::test]
async fn test_create_assigns_identity_and_timestamps() {
    let repo = user_repo().await;

    let user = repo.create(user_json("ada@example.com")).await.unwrap();

    assert!(!user.id().is_empty(), "identity should be assigned");
    assert!(user.created_at().is_some(), "created_at should be set");
    assert!(user.updated_at().is_some(), "updated_at should be set");
    assert!(!user.is_deleted(), "new documents are active");
}

/// Identities are random strings, not sequential.
#[tokio::test]
async fn test_create_identities_are_distinct() {
    let repo = user_repo().await;

    let first = repo.create(user_json("a@example.com")).await.unwrap();
    let second = repo.create(user_json("b@example.com")).await.unwrap();

    assert_ne!(first.id(), second.id());
}

/// Save-path transforms run on create: the email is trimmed and
/// lowercased.
#[tokio::test]
async fn test_create_applies_field_transforms() {
    let repo = user_repo().await;

    let user = repo
        .create(json!({"email": "  Ada@Example.COM ", "password": "pw"}))
        .await
        .unwrap();

    assert_eq!(
        user.get("email").and_then(|v| v.as_str()),
        Some("ada@example.com")
    );
}

/// Declared defaults fill absent fields.
#[tokio::test]
async fn test_create_applies_defaults() {
    let repo = user_repo().await;

    let user = repo.create(user_json("ada@example.com")).await.unwrap();
    assert_eq!(user.get("active"), Some(&json!(true)));
}

/// A missing required field is a storage fault, not a duplicate or
/// not-found.
#[tokio::test]
async fn test_create_missing_required_field() {
    let repo = user_repo().await;

    let err = repo.create(json!({"age": 3})).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Storage { .. }));
}

/// `create_many` returns every created document.
#[tokio::test]
async fn test_create_many() {
    let repo = user_repo().await;

    let users = repo
        .create_many(vec![
            user_json("a@example.com"),
            user_json("b@example.com"),
            user_json("c@example.com"),
        ])
        .await
        .unwrap();

    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|user| !user.id().is_empty()));
}

// ============================================================================
// Create Tests - Uniqueness
// ============================================================================

/// A second active document with an equal unique value fails with a
/// duplicate error.
#[tokio::test]
async fn test_duplicate_unique_value_rejected() {
    let repo = user_repo().await;

    repo.create(user_json("ada@example.com")).await.unwrap();
    let err = repo.create(user_json("ada@example.com")).await.unwrap_err();

    assert!(err.is_duplicate());
    assert_eq!(err.to_string(), "users exists already");
}

/// Soft-deleting the holder frees the value for a new active document.
#[tokio::test]
async fn test_unique_value_reusable_after_soft_delete() {
    let repo = user_repo().await;

    let first = repo.create(user_json("ada@example.com")).await.unwrap();
    assert!(
        repo.create(user_json("ada@example.com")).await.is_err(),
        "value is taken while the holder is active"
    );

    repo.remove(first.id()).await.unwrap();

    let third = repo.create(user_json("ada@example.com")).await.unwrap();
    assert!(!third.is_deleted());
}

/// Transforms run before uniqueness is checked: a differently-cased email
/// still collides.
#[tokio::test]
async fn test_duplicate_detected_after_normalization() {
    let repo = user_repo().await;

    repo.create(user_json("ada@example.com")).await.unwrap();
    let err = repo
        .create(user_json("  ADA@EXAMPLE.COM "))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
}

/// A batch containing an internal duplicate fails as a whole.
#[tokio::test]
async fn test_create_many_internal_duplicate() {
    let repo = user_repo().await;

    let err = repo
        .create_many(vec![
            user_json("same@example.com"),
            user_json("same@example.com"),
        ])
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
}

// ============================================================================
// Create Tests - Public serialization
// ============================================================================

/// The public serialization renames the identity alias and strips
/// credential-shaped fields.
#[tokio::test]
async fn test_public_serialization() {
    let repo = user_repo().await;

    let user = repo.create(user_json("ada@example.com")).await.unwrap();
    let public = repo.to_public(&user);

    assert!(public.get("_id").is_none());
    assert_eq!(
        public.get("id").and_then(|v| v.as_str()),
        Some(user.id())
    );
    assert!(public.get("password").is_none());
    assert_eq!(public.get("email"), Some(&json!("ada@example.com")));
}
