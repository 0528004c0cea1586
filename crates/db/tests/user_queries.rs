//! Integration tests for the user query functions.

mod common;

use assert_matches::assert_matches;
use common::{create_user, new_user, store};
use sqlx::PgPool;
use studies_core::states::{UserRole, UserState};
use studies_db::models::user::{UpdateUser, User};
use studies_db::repositories::{RefreshTokenRepo, UserRepo};
use studies_db::{DbError, Store};

async fn get_user(store: &Store, id: i64) -> Result<User, DbError> {
    store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { UserRepo::find_by_id(tx, ctx, id).await })
        })
        .await
}

async fn delete_user(store: &Store, id: i64) -> Result<(), DbError> {
    store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { UserRepo::delete(tx, ctx, id).await })
        })
        .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_sets_both_timestamps(pool: PgPool) {
    let store = store(pool);
    let id = create_user(&store, "ann", "ann@example.com").await.unwrap();

    let user = get_user(&store, id).await.unwrap();
    assert_eq!(user.login, "ann");
    assert_eq!(user.email, "ann@example.com");
    assert_eq!(user.role, UserRole::Resident);
    assert_eq!(user.state, UserState::New);
    assert_eq!(user.create_date, user.last_update_date);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_email_is_reported(pool: PgPool) {
    let store = store(pool);
    create_user(&store, "ann", "ann@example.com").await.unwrap();
    let result = create_user(&store, "other", "ann@example.com").await;
    assert_matches!(result, Err(DbError::UserDuplicateKey));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_refreshes_last_update_date(pool: PgPool) {
    let store = store(pool);
    let id = create_user(&store, "bob", "bob@example.com").await.unwrap();
    let before = get_user(&store, id).await.unwrap();

    let update = UpdateUser {
        login: "bobby".to_string(),
        email: "bob@example.com".to_string(),
        password_hash: before.password_hash.clone(),
        role: UserRole::Owner,
        state: UserState::Confirmed,
    };
    store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { UserRepo::update(tx, ctx, id, &update).await })
        })
        .await
        .unwrap();

    let after = get_user(&store, id).await.unwrap();
    assert_eq!(after.login, "bobby");
    assert_eq!(after.role, UserRole::Owner);
    assert_eq!(after.state, UserState::Confirmed);
    assert_eq!(after.create_date, before.create_date);
    assert!(after.last_update_date > before.last_update_date);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleted_email_can_register_again(pool: PgPool) {
    let store = store(pool);
    let first = create_user(&store, "carl", "carl@example.com").await.unwrap();
    delete_user(&store, first).await.unwrap();
    delete_user(&store, first).await.unwrap();

    let second = create_user(&store, "carl", "carl@example.com").await.unwrap();
    assert_ne!(first, second);
    assert_matches!(get_user(&store, first).await, Err(DbError::NotFound));
}

async fn users_by_email(store: &Store, email: &'static str) -> Vec<User> {
    store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { UserRepo::list_active_by_email(tx, ctx, email).await })
        })
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_active_by_email_ignores_deleted(pool: PgPool) {
    let store = store(pool);
    let id = create_user(&store, "dana", "dana@example.com").await.unwrap();

    let found = users_by_email(&store, "dana@example.com").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);

    delete_user(&store, id).await.unwrap();
    assert!(users_by_email(&store, "dana@example.com").await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_active_by_email_returns_every_state(pool: PgPool) {
    let store = store(pool);
    let mut fresh = new_user("eve", "same@example.com");
    fresh.password_hash = "hash-a".to_string();
    let mut confirmed = new_user("eve2", "same@example.com");
    confirmed.password_hash = "hash-b".to_string();
    confirmed.state = UserState::Confirmed;

    for input in [fresh, confirmed] {
        store
            .run_in_transaction(move |tx, ctx| {
                Box::pin(async move { UserRepo::create(tx, ctx, &input).await })
            })
            .await
            .unwrap();
    }

    let found = users_by_email(&store, "same@example.com").await;
    let hashes: Vec<&str> = found.iter().map(|u| u.password_hash.as_str()).collect();
    assert_eq!(hashes, vec!["hash-a", "hash-b"]);
    assert_eq!(found[1].state, UserState::Confirmed);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_after_delete_is_not_found(pool: PgPool) {
    let store = store(pool);
    let id = create_user(&store, "fay", "fay@example.com").await.unwrap();
    delete_user(&store, id).await.unwrap();

    let update = UpdateUser {
        login: "fay".to_string(),
        email: "fay@example.com".to_string(),
        password_hash: "$argon2id$test-hash".to_string(),
        role: UserRole::Resident,
        state: UserState::Confirmed,
    };
    let result = store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { UserRepo::update(tx, ctx, id, &update).await })
        })
        .await;
    assert_matches!(result, Err(DbError::NotFound));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_excludes_deleted_users(pool: PgPool) {
    let store = store(pool);
    for i in 0..3 {
        let input = new_user(&format!("u{i}"), &format!("u{i}@example.com"));
        store
            .run_in_transaction(move |tx, ctx| {
                Box::pin(async move { UserRepo::create(tx, ctx, &input).await })
            })
            .await
            .unwrap();
    }
    delete_user(&store, 1).await.unwrap();

    let users = store
        .run_in_transaction(|tx, ctx| Box::pin(async move { UserRepo::list(tx, ctx, 50, 0).await }))
        .await
        .unwrap();
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

// ---------------------------------------------------------------------------
// Refresh tokens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_tokens_count_only_unexpired(pool: PgPool) {
    let store = store(pool);
    let user_id = create_user(&store, "gus", "gus@example.com").await.unwrap();

    let now = chrono::Utc::now();
    for (hash, expire_at) in [
        ("hash-live-1", now + chrono::Duration::hours(1)),
        ("hash-live-2", now + chrono::Duration::hours(2)),
        ("hash-expired", now - chrono::Duration::hours(1)),
    ] {
        store
            .run_in_transaction(move |tx, ctx| {
                Box::pin(async move {
                    RefreshTokenRepo::create(tx, ctx, user_id, hash, expire_at).await
                })
            })
            .await
            .unwrap();
    }

    let active = store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { RefreshTokenRepo::count_active_for_user(tx, ctx, user_id).await })
        })
        .await
        .unwrap();
    assert_eq!(active, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_token_hash_is_unique(pool: PgPool) {
    let store = store(pool);
    let user_id = create_user(&store, "hal", "hal@example.com").await.unwrap();
    let expire_at = chrono::Utc::now() + chrono::Duration::hours(1);

    let insert = |store: Store| async move {
        store
            .run_in_transaction(move |tx, ctx| {
                Box::pin(async move {
                    RefreshTokenRepo::create(tx, ctx, user_id, "same-hash", expire_at).await
                })
            })
            .await
    };
    insert(store.clone()).await.unwrap();
    assert_matches!(insert(store).await, Err(DbError::Query { .. }));
}
