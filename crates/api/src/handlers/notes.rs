//! Handlers for the `/notes` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use studies_core::states::{parse_active_state, NoteState};
use studies_core::types::DbId;
use studies_db::models::note::{CreateNote, UpdateNote};
use studies_db::repositories::NoteRepo;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::{ListResponse, DONE};
use crate::state::AppState;

/// Request body for `POST /notes` and `PUT /notes/{id}`.
#[derive(Debug, Deserialize)]
pub struct NoteInput {
    pub text: String,
    pub topic: String,
    pub tag_id: DbId,
    pub user_id: DbId,
    pub state: String,
}

/// GET /api/v1/notes
pub async fn list_notes(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = (params.limit(), params.offset());
    let notes = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { NoteRepo::list(tx, ctx, limit, offset).await })
        })
        .await?;

    Ok(Json(ListResponse::new(notes, offset, limit)))
}

/// GET /api/v1/notes/{id}
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let note = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { NoteRepo::find_by_id(tx, ctx, id).await })
        })
        .await
        .map_err(AppError::lookup("Note", id))?;

    Ok(Json(note))
}

/// POST /api/v1/notes
///
/// The referenced tag and user must exist; a dangling reference is a store
/// error, not a validation error.
pub async fn create_note(
    State(state): State<AppState>,
    Json(input): Json<NoteInput>,
) -> AppResult<impl IntoResponse> {
    let create = CreateNote {
        state: parse_active_state::<NoteState>(&input.state, "create")?,
        text: input.text,
        topic: input.topic,
        tag_id: input.tag_id,
        user_id: input.user_id,
    };

    let id = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { NoteRepo::create(tx, ctx, &create).await })
        })
        .await?;

    tracing::info!(note_id = id, "Note created");

    Ok((StatusCode::CREATED, Json(id)))
}

/// PUT /api/v1/notes/{id}
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<NoteInput>,
) -> AppResult<impl IntoResponse> {
    let update = UpdateNote {
        state: parse_active_state::<NoteState>(&input.state, "update")?,
        text: input.text,
        topic: input.topic,
        tag_id: input.tag_id,
        user_id: input.user_id,
    };

    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { NoteRepo::update(tx, ctx, id, &update).await })
        })
        .await
        .map_err(AppError::lookup("Note", id))?;

    tracing::info!(note_id = id, "Note updated");

    Ok(Json(DONE))
}

/// DELETE /api/v1/notes/{id}
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { NoteRepo::delete(tx, ctx, id).await })
        })
        .await?;

    tracing::info!(note_id = id, "Note deleted");

    Ok(Json(DONE))
}
