//! Repository for the `tasks` table.

use sqlx::PgConnection;
use studies_core::states::TaskState;
use studies_core::types::DbId;

use crate::error::{translate_write, DbError, UniqueKey};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::transaction::QueryContext;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, state";

/// Provides soft-delete aware CRUD operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Find an active task by ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<Task, DbError> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND state != $2");
        ctx.run(
            sqlx::query_as::<_, Task>(&query)
                .bind(id)
                .bind(TaskState::Deleted.as_str())
                .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("loading task by id '{id}'"), e))?
        .ok_or(DbError::NotFound)
    }

    /// List active tasks in ascending id order.
    pub async fn list(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE state != $3 ORDER BY id LIMIT $1 OFFSET $2"
        );
        ctx.run(
            sqlx::query_as::<_, Task>(&query)
                .bind(limit)
                .bind(offset)
                .bind(TaskState::Deleted.as_str())
                .fetch_all(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query("loading tasks", e))
    }

    /// Insert a new task, returning its id.
    ///
    /// Returns [`DbError::TaskDuplicateKey`] if an active task with the same
    /// name and state exists.
    pub async fn create(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        input: &CreateTask,
    ) -> Result<DbId, DbError> {
        let id = ctx.run(
            sqlx::query_scalar::<_, DbId>(
                "INSERT INTO tasks (name, state)
                 SELECT $1, $2
                 WHERE NOT EXISTS (SELECT 1 FROM tasks WHERE name = $1 AND state = $2)
                 RETURNING id",
            )
            .bind(&input.name)
            .bind(input.state.as_str())
            .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| {
            translate_write(e, UniqueKey::TaskName, || {
                format!(
                    "inserting task (name: '{}', state: '{}')",
                    input.name, input.state
                )
            })
        })?;
        id.ok_or_else(|| UniqueKey::TaskName.duplicate_error())
    }

    /// Replace the name and state of an active task.
    ///
    /// Returns [`DbError::NotFound`] if no active task has this id.
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<(), DbError> {
        let result = ctx
            .run(
                sqlx::query("UPDATE tasks SET name = $2, state = $3 WHERE id = $1 AND state != $4")
                    .bind(id)
                    .bind(&input.name)
                    .bind(input.state.as_str())
                    .bind(TaskState::Deleted.as_str())
                    .execute(&mut *conn),
            )
            .await
            .map_err(|e| {
                translate_write(e, UniqueKey::TaskName, || {
                    format!(
                        "updating task (id: {id}, name: '{}', state: '{}')",
                        input.name, input.state
                    )
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Soft-delete a task.
    ///
    /// The name gets a `_deleted_<id>` suffix so the original name can be
    /// reused by a future task. Deleting a missing or already-deleted task
    /// is a no-op.
    pub async fn delete(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<(), DbError> {
        ctx.run(
            sqlx::query(
                "UPDATE tasks SET name = name || '_deleted_' || $1::text, state = $2
                 WHERE id = $1 AND state != $2",
            )
            .bind(id)
            .bind(TaskState::Deleted.as_str())
            .execute(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("deleting task by id '{id}'"), e))?;
        Ok(())
    }
}
