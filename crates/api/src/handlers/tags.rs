//! Handlers for the `/tags` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use studies_core::states::{parse_active_state, TagState};
use studies_core::types::DbId;
use studies_db::models::tag::{CreateTag, UpdateTag};
use studies_db::repositories::TagRepo;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::{ListResponse, DONE};
use crate::state::AppState;

/// Request body for `POST /tags` and `PUT /tags/{id}`.
#[derive(Debug, Deserialize)]
pub struct TagInput {
    pub name: String,
    pub state: String,
}

/// GET /api/v1/tags
pub async fn list_tags(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = (params.limit(), params.offset());
    let tags = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { TagRepo::list(tx, ctx, limit, offset).await })
        })
        .await?;

    Ok(Json(ListResponse::new(tags, offset, limit)))
}

/// GET /api/v1/tags/{id}
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tag = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { TagRepo::find_by_id(tx, ctx, id).await })
        })
        .await
        .map_err(AppError::lookup("Tag", id))?;

    Ok(Json(tag))
}

/// POST /api/v1/tags
///
/// Responds 201 with the new tag id.
pub async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<TagInput>,
) -> AppResult<impl IntoResponse> {
    let create = CreateTag {
        state: parse_active_state::<TagState>(&input.state, "create")?,
        name: input.name,
    };

    let id = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { TagRepo::create(tx, ctx, &create).await })
        })
        .await?;

    tracing::info!(tag_id = id, "Tag created");

    Ok((StatusCode::CREATED, Json(id)))
}

/// PUT /api/v1/tags/{id}
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TagInput>,
) -> AppResult<impl IntoResponse> {
    let update = UpdateTag {
        state: parse_active_state::<TagState>(&input.state, "update")?,
        name: input.name,
    };

    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { TagRepo::update(tx, ctx, id, &update).await })
        })
        .await
        .map_err(AppError::lookup("Tag", id))?;

    tracing::info!(tag_id = id, "Tag updated");

    Ok(Json(DONE))
}

/// DELETE /api/v1/tags/{id}
///
/// Soft delete; succeeds for unknown or already-deleted ids too.
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { TagRepo::delete(tx, ctx, id).await })
        })
        .await?;

    tracing::info!(tag_id = id, "Tag deleted");

    Ok(Json(DONE))
}
