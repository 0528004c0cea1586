#![allow(dead_code)]

use std::time::Duration;

use sqlx::PgPool;
use studies_core::states::{TagState, UserRole, UserState};
use studies_core::types::DbId;
use studies_db::models::tag::CreateTag;
use studies_db::models::user::CreateUser;
use studies_db::repositories::{TagRepo, UserRepo};
use studies_db::{DbError, Store};

/// Store with a timeout generous enough for any single test transaction.
pub fn store(pool: PgPool) -> Store {
    Store::new(pool, Duration::from_secs(10))
}

pub async fn create_tag(store: &Store, name: &str, state: TagState) -> Result<DbId, DbError> {
    let input = CreateTag {
        name: name.to_string(),
        state,
    };
    store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { TagRepo::create(tx, ctx, &input).await })
        })
        .await
}

pub fn new_user(login: &str, email: &str) -> CreateUser {
    CreateUser {
        login: login.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$test-hash".to_string(),
        role: UserRole::Resident,
        state: UserState::New,
    }
}

pub async fn create_user(store: &Store, login: &str, email: &str) -> Result<DbId, DbError> {
    let input = new_user(login, email);
    store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { UserRepo::create(tx, ctx, &input).await })
        })
        .await
}
