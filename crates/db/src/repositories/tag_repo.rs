//! Repository for the `tags` table.

use sqlx::PgConnection;
use studies_core::states::TagState;
use studies_core::types::DbId;

use crate::error::{translate_write, DbError, UniqueKey};
use crate::models::tag::{CreateTag, Tag, UpdateTag};
use crate::transaction::QueryContext;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, state";

/// Provides soft-delete aware CRUD operations for tags.
pub struct TagRepo;

impl TagRepo {
    /// Find an active tag by ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<Tag, DbError> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1 AND state != $2");
        ctx.run(
            sqlx::query_as::<_, Tag>(&query)
                .bind(id)
                .bind(TagState::Deleted.as_str())
                .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("loading tag by id '{id}'"), e))?
        .ok_or(DbError::NotFound)
    }

    /// List active tags in ascending id order.
    pub async fn list(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Tag>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM tags WHERE state != $3 ORDER BY id LIMIT $1 OFFSET $2"
        );
        ctx.run(
            sqlx::query_as::<_, Tag>(&query)
                .bind(limit)
                .bind(offset)
                .bind(TagState::Deleted.as_str())
                .fetch_all(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query("loading tags", e))
    }

    /// Insert a new tag, returning its id.
    ///
    /// Returns [`DbError::TagDuplicateKey`] if an active tag with the same
    /// name and state exists.
    pub async fn create(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        input: &CreateTag,
    ) -> Result<DbId, DbError> {
        let id = ctx.run(
            sqlx::query_scalar::<_, DbId>(
                "INSERT INTO tags (name, state)
                 SELECT $1, $2
                 WHERE NOT EXISTS (SELECT 1 FROM tags WHERE name = $1 AND state = $2)
                 RETURNING id",
            )
            .bind(&input.name)
            .bind(input.state.as_str())
            .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| {
            translate_write(e, UniqueKey::TagName, || {
                format!(
                    "inserting tag (name: '{}', state: '{}')",
                    input.name, input.state
                )
            })
        })?;
        id.ok_or_else(|| UniqueKey::TagName.duplicate_error())
    }

    /// Replace the name and state of an active tag.
    ///
    /// Returns [`DbError::NotFound`] if no active tag has this id.
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
        input: &UpdateTag,
    ) -> Result<(), DbError> {
        let result = ctx
            .run(
                sqlx::query("UPDATE tags SET name = $2, state = $3 WHERE id = $1 AND state != $4")
                    .bind(id)
                    .bind(&input.name)
                    .bind(input.state.as_str())
                    .bind(TagState::Deleted.as_str())
                    .execute(&mut *conn),
            )
            .await
            .map_err(|e| {
                translate_write(e, UniqueKey::TagName, || {
                    format!(
                        "updating tag (id: {id}, name: '{}', state: '{}')",
                        input.name, input.state
                    )
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Soft-delete a tag.
    ///
    /// The name gets a `_deleted_<id>` suffix so the original name can be
    /// reused by a future tag. Deleting a missing or already-deleted tag
    /// is a no-op.
    pub async fn delete(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<(), DbError> {
        ctx.run(
            sqlx::query(
                "UPDATE tags SET name = name || '_deleted_' || $1::text, state = $2
                 WHERE id = $1 AND state != $2",
            )
            .bind(id)
            .bind(TagState::Deleted.as_str())
            .execute(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("deleting tag by id '{id}'"), e))?;
        Ok(())
    }
}
