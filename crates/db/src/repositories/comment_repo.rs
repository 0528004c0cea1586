//! Repository for the `comments` table.

use sqlx::PgConnection;
use studies_core::states::CommentState;
use studies_core::types::DbId;

use crate::error::DbError;
use crate::models::comment::{Comment, CreateComment, UpdateComment};
use crate::transaction::QueryContext;

const COLUMNS: &str =
    "id, text, user_id, note_id, linked_comment_id, state, create_date, last_update_date";

/// Provides soft-delete aware CRUD operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<Comment, DbError> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1 AND state != $2");
        ctx.run(
            sqlx::query_as::<_, Comment>(&query)
                .bind(id)
                .bind(CommentState::Deleted.as_str())
                .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("loading comment by id '{id}'"), e))?
        .ok_or(DbError::NotFound)
    }

    pub async fn list(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments WHERE state != $3 ORDER BY id LIMIT $1 OFFSET $2"
        );
        ctx.run(
            sqlx::query_as::<_, Comment>(&query)
                .bind(limit)
                .bind(offset)
                .bind(CommentState::Deleted.as_str())
                .fetch_all(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query("loading comments", e))
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        input: &CreateComment,
    ) -> Result<DbId, DbError> {
        ctx.run(
            sqlx::query_scalar::<_, DbId>(
                "INSERT INTO comments
                    (text, user_id, note_id, linked_comment_id, state, create_date, last_update_date)
                 VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
                 RETURNING id",
            )
            .bind(&input.text)
            .bind(input.user_id)
            .bind(input.note_id)
            .bind(input.linked_comment_id)
            .bind(input.state.as_str())
            .fetch_one(&mut *conn),
        )
        .await
        .map_err(|e| {
            DbError::query(
                format!(
                    "inserting comment (note_id: {}, user_id: {})",
                    input.note_id, input.user_id
                ),
                e,
            )
        })
    }

    /// Author and parent note are fixed at creation; only the text, reply
    /// link and state change.
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
        input: &UpdateComment,
    ) -> Result<(), DbError> {
        let result = ctx
            .run(
                sqlx::query(
                    "UPDATE comments SET
                        text = $2,
                        linked_comment_id = $3,
                        state = $4,
                        last_update_date = NOW()
                     WHERE id = $1 AND state != $5",
                )
                .bind(id)
                .bind(&input.text)
                .bind(input.linked_comment_id)
                .bind(input.state.as_str())
                .bind(CommentState::Deleted.as_str())
                .execute(&mut *conn),
            )
            .await
            .map_err(|e| {
                DbError::query(
                    format!("updating comment (id: {id}, state: '{}')", input.state),
                    e,
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<(), DbError> {
        ctx.run(
            sqlx::query(
                "UPDATE comments SET state = $2, last_update_date = NOW()
                 WHERE id = $1 AND state != $2",
            )
            .bind(id)
            .bind(CommentState::Deleted.as_str())
            .execute(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("deleting comment by id '{id}'"), e))?;
        Ok(())
    }
}
