//! Handlers for the `/users` resource.
//!
//! Passwords arrive in plaintext and are hashed with Argon2id before they
//! reach the store. Responses use [`UserResponse`], which has no hash field.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use studies_core::error::CoreError;
use studies_core::states::{parse_active_state, UserRole, UserState};
use studies_core::types::DbId;
use studies_db::models::user::{CreateUser, UpdateUser, UserResponse};
use studies_db::repositories::UserRepo;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::{ListResponse, DONE};
use crate::state::AppState;

/// Request body for `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, message = "login must not be empty"))]
    pub login: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
    pub role: String,
    pub state: String,
}

/// Validated and hashed fields shared by create and update.
struct UserFields {
    login: String,
    email: String,
    password_hash: String,
    role: UserRole,
    state: UserState,
}

fn prepare(input: UserInput, operation: &'static str) -> AppResult<UserFields> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    let role = UserRole::from_str(&input.role)?;
    let state = parse_active_state::<UserState>(&input.state, operation)?;
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    Ok(UserFields {
        login: input.login,
        email: input.email,
        password_hash,
        role,
        state,
    })
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = (params.limit(), params.offset());
    let users = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { UserRepo::list(tx, ctx, limit, offset).await })
        })
        .await?;

    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(ListResponse::new(data, offset, limit)))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { UserRepo::find_by_id(tx, ctx, id).await })
        })
        .await
        .map_err(AppError::lookup("User", id))?;

    Ok(Json(UserResponse::from(user)))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<UserInput>,
) -> AppResult<impl IntoResponse> {
    let fields = prepare(input, "create")?;
    let create = CreateUser {
        login: fields.login,
        email: fields.email,
        password_hash: fields.password_hash,
        role: fields.role,
        state: fields.state,
    };

    let id = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { UserRepo::create(tx, ctx, &create).await })
        })
        .await?;

    tracing::info!(user_id = id, "User created");

    Ok((StatusCode::CREATED, Json(id)))
}

/// PUT /api/v1/users/{id}
///
/// Full replacement, including the password.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UserInput>,
) -> AppResult<impl IntoResponse> {
    let fields = prepare(input, "update")?;
    let update = UpdateUser {
        login: fields.login,
        email: fields.email,
        password_hash: fields.password_hash,
        role: fields.role,
        state: fields.state,
    };

    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { UserRepo::update(tx, ctx, id, &update).await })
        })
        .await
        .map_err(AppError::lookup("User", id))?;

    tracing::info!(user_id = id, "User updated");

    Ok(Json(DONE))
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { UserRepo::delete(tx, ctx, id).await })
        })
        .await?;

    tracing::info!(user_id = id, "User deleted");

    Ok(Json(DONE))
}
