//! Repository for the `notes` table. Notes carry no uniqueness constraint
//! beyond identity, so writes never report duplicate keys.

use sqlx::PgConnection;
use studies_core::states::NoteState;
use studies_core::types::DbId;

use crate::error::DbError;
use crate::models::note::{CreateNote, Note, UpdateNote};
use crate::transaction::QueryContext;

const COLUMNS: &str = "id, text, topic, tag_id, user_id, state, create_date, last_update_date";

pub struct NoteRepo;

impl NoteRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<Note, DbError> {
        let query = format!("SELECT {COLUMNS} FROM notes WHERE id = $1 AND state != $2");
        ctx.run(
            sqlx::query_as::<_, Note>(&query)
                .bind(id)
                .bind(NoteState::Deleted.as_str())
                .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("loading note by id '{id}'"), e))?
        .ok_or(DbError::NotFound)
    }

    pub async fn list(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Note>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes WHERE state != $3 ORDER BY id LIMIT $1 OFFSET $2"
        );
        ctx.run(
            sqlx::query_as::<_, Note>(&query)
                .bind(limit)
                .bind(offset)
                .bind(NoteState::Deleted.as_str())
                .fetch_all(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query("loading notes", e))
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        input: &CreateNote,
    ) -> Result<DbId, DbError> {
        ctx.run(
            sqlx::query_scalar::<_, DbId>(
                "INSERT INTO notes (text, topic, tag_id, user_id, state, create_date, last_update_date)
                 VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
                 RETURNING id",
            )
            .bind(&input.text)
            .bind(&input.topic)
            .bind(input.tag_id)
            .bind(input.user_id)
            .bind(input.state.as_str())
            .fetch_one(&mut *conn),
        )
        .await
        .map_err(|e| {
            DbError::query(
                format!(
                    "inserting note (topic: '{}', user_id: {})",
                    input.topic, input.user_id
                ),
                e,
            )
        })
    }

    /// Returns [`DbError::NotFound`] if no active note has this id.
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
        input: &UpdateNote,
    ) -> Result<(), DbError> {
        let result = ctx
            .run(
                sqlx::query(
                    "UPDATE notes SET
                        text = $2,
                        topic = $3,
                        tag_id = $4,
                        user_id = $5,
                        state = $6,
                        last_update_date = NOW()
                     WHERE id = $1 AND state != $7",
                )
                .bind(id)
                .bind(&input.text)
                .bind(&input.topic)
                .bind(input.tag_id)
                .bind(input.user_id)
                .bind(input.state.as_str())
                .bind(NoteState::Deleted.as_str())
                .execute(&mut *conn),
            )
            .await
            .map_err(|e| {
                DbError::query(
                    format!(
                        "updating note (id: {id}, topic: '{}', user_id: {}, state: '{}')",
                        input.topic, input.user_id, input.state
                    ),
                    e,
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Soft-delete a note. Idempotent.
    pub async fn delete(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<(), DbError> {
        ctx.run(
            sqlx::query(
                "UPDATE notes SET state = $2, last_update_date = NOW()
                 WHERE id = $1 AND state != $2",
            )
            .bind(id)
            .bind(NoteState::Deleted.as_str())
            .execute(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("deleting note by id '{id}'"), e))?;
        Ok(())
    }
}
