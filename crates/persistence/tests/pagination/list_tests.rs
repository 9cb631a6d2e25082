//! Tests for cursor-free pagination.

use serde_json::json;

use silo_persistence::types::{PageRequest, Sort, SortDirection, Visibility};

use crate::common::user_repo;

async fn seed_users(repo: &silo_persistence::repository::Repository, count: usize) {
    for n in 0..count {
        repo.create(json!({
            "email": format!("user{n:02}@example.com"),
            "age": n,
        }))
        .await
        .unwrap();
    }
}

/// 45 active documents, page 2 of 20: 20 results, echoing page and page
/// size.
#[tokio::test]
async fn test_second_page_of_45() {
    let repo = user_repo().await;
    seed_users(&repo, 45).await;

    let page = repo
        .list(PageRequest::new().with_page(2).with_per_page(20))
        .await
        .unwrap();

    assert_eq!(page.len(), 20);
    assert_eq!(page.page, 2);
    assert_eq!(page.per_page, 20);
    // skip 20: the first item of page 2 is the 21st created
    assert_eq!(
        page.items[0].get("email"),
        Some(&json!("user20@example.com"))
    );
}

/// The last page is short.
#[tokio::test]
async fn test_last_page_is_capped() {
    let repo = user_repo().await;
    seed_users(&repo, 45).await;

    let page = repo
        .list(PageRequest::new().with_page(3).with_per_page(20))
        .await
        .unwrap();
    assert_eq!(page.len(), 5);
}

/// A page past the end is empty but still echoes its metadata.
#[tokio::test]
async fn test_page_past_end_is_empty() {
    let repo = user_repo().await;
    seed_users(&repo, 3).await;

    let page = repo
        .list(PageRequest::new().with_page(5).with_per_page(20))
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.page, 5);
}

/// Page values below 1 serve page 1.
#[tokio::test]
async fn test_page_zero_serves_first_page() {
    let repo = user_repo().await;
    seed_users(&repo, 5).await;

    let page = repo
        .list(PageRequest::new().with_page(0).with_per_page(2))
        .await
        .unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(
        page.items[0].get("email"),
        Some(&json!("user00@example.com"))
    );
}

/// Defaults: page 1, 20 per page, sorted by creation time ascending.
#[tokio::test]
async fn test_defaults() {
    let repo = user_repo().await;
    seed_users(&repo, 25).await;

    let page = repo.list(PageRequest::new()).await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 20);
    assert_eq!(page.len(), 20);
    assert_eq!(page.sort, Sort::by("created_at"));
}

/// An explicit sort is applied and echoed.
#[tokio::test]
async fn test_explicit_sort_is_echoed() {
    let repo = user_repo().await;
    seed_users(&repo, 5).await;

    let page = repo
        .list(PageRequest::new().with_sort(Sort::descending("age")))
        .await
        .unwrap();

    assert_eq!(page.sort.field, "age");
    assert_eq!(page.sort.direction, SortDirection::Descending);
    assert_eq!(page.items[0].get("age"), Some(&json!(4)));
}

/// Soft-deleted documents are excluded from pages by default and included
/// under widened visibility.
#[tokio::test]
async fn test_list_visibility() {
    let repo = user_repo().await;
    seed_users(&repo, 5).await;

    let victim = repo
        .by_query(
            silo_persistence::types::Filter::by("email", "user02@example.com"),
            Default::default(),
        )
        .await
        .unwrap();
    repo.remove(victim.id()).await.unwrap();

    let active = repo.list(PageRequest::new()).await.unwrap();
    assert_eq!(active.len(), 4);

    let widened = repo
        .list(PageRequest::new().with_visibility(Visibility::IncludeDeleted))
        .await
        .unwrap();
    assert_eq!(widened.len(), 5);
}
