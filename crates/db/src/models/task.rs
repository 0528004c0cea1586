//! Task entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use studies_core::states::TaskState;
use studies_core::types::DbId;

/// A row from the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub state: TaskState,
}

/// Fields for inserting a task.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub name: String,
    pub state: TaskState,
}

/// Fields for a full replacement update of a task.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub name: String,
    pub state: TaskState,
}
