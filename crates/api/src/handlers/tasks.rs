//! Handlers for the `/tasks` resource. A task is a named item that is either
//! open (`NEW`) or finished (`DONE`).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use studies_core::states::{parse_active_state, TaskState};
use studies_core::types::DbId;
use studies_db::models::task::{CreateTask, UpdateTask};
use studies_db::repositories::TaskRepo;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::{ListResponse, DONE};
use crate::state::AppState;

/// Request body for `POST /tasks` and `PUT /tasks/{id}`.
#[derive(Debug, Deserialize)]
pub struct TaskInput {
    pub name: String,
    pub state: String,
}

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = (params.limit(), params.offset());
    let tasks = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { TaskRepo::list(tx, ctx, limit, offset).await })
        })
        .await?;

    Ok(Json(ListResponse::new(tasks, offset, limit)))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { TaskRepo::find_by_id(tx, ctx, id).await })
        })
        .await
        .map_err(AppError::lookup("Task", id))?;

    Ok(Json(task))
}

/// POST /api/v1/tasks
///
/// Responds 201 with the new task id.
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<TaskInput>,
) -> AppResult<impl IntoResponse> {
    let create = CreateTask {
        state: parse_active_state::<TaskState>(&input.state, "create")?,
        name: input.name,
    };

    let id = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { TaskRepo::create(tx, ctx, &create).await })
        })
        .await?;

    tracing::info!(task_id = id, "Task created");

    Ok((StatusCode::CREATED, Json(id)))
}

/// PUT /api/v1/tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TaskInput>,
) -> AppResult<impl IntoResponse> {
    let update = UpdateTask {
        state: parse_active_state::<TaskState>(&input.state, "update")?,
        name: input.name,
    };

    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { TaskRepo::update(tx, ctx, id, &update).await })
        })
        .await
        .map_err(AppError::lookup("Task", id))?;

    tracing::info!(task_id = id, "Task updated");

    Ok(Json(DONE))
}

/// DELETE /api/v1/tasks/{id}
///
/// Soft delete; succeeds for unknown or already-deleted ids too.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .store
        .run_in_transaction_void(move |tx, ctx| {
            Box::pin(async move { TaskRepo::delete(tx, ctx, id).await })
        })
        .await?;

    tracing::info!(task_id = id, "Task deleted");

    Ok(Json(DONE))
}
