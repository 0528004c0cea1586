//! Repository for the `users` table.

use sqlx::PgConnection;
use studies_core::states::UserState;
use studies_core::types::DbId;

use crate::error::{translate_write, DbError, UniqueKey};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::transaction::QueryContext;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, login, email, password_hash, role, state, create_date, last_update_date";

/// Provides soft-delete aware CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Find an active user by internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<User, DbError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND state != $2");
        ctx.run(
            sqlx::query_as::<_, User>(&query)
                .bind(id)
                .bind(UserState::Deleted.as_str())
                .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("loading user by id '{id}'"), e))?
        .ok_or(DbError::NotFound)
    }

    /// Every active user with this email (case-sensitive), in ascending id
    /// order. One email may be active once per state, so login has to
    /// consider each of them.
    pub async fn list_active_by_email(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        email: &str,
    ) -> Result<Vec<User>, DbError> {
        let query =
            format!("SELECT {COLUMNS} FROM users WHERE email = $1 AND state != $2 ORDER BY id");
        ctx.run(
            sqlx::query_as::<_, User>(&query)
                .bind(email)
                .bind(UserState::Deleted.as_str())
                .fetch_all(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("loading users by email '{email}'"), e))
    }

    /// List active users in ascending id order.
    pub async fn list(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE state != $3 ORDER BY id LIMIT $1 OFFSET $2"
        );
        ctx.run(
            sqlx::query_as::<_, User>(&query)
                .bind(limit)
                .bind(offset)
                .bind(UserState::Deleted.as_str())
                .fetch_all(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query("loading users", e))
    }

    /// Insert a new user, returning its id. Both timestamps take the store's `NOW()`.
    ///
    /// Returns [`DbError::UserDuplicateKey`] if an active user with the same
    /// email and state exists.
    pub async fn create(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        input: &CreateUser,
    ) -> Result<DbId, DbError> {
        let id = ctx.run(
            sqlx::query_scalar::<_, DbId>(
                "INSERT INTO users (login, email, password_hash, role, state, create_date, last_update_date)
                 SELECT $1, $2, $3, $4, $5, NOW(), NOW()
                 WHERE NOT EXISTS (SELECT 1 FROM users WHERE email = $2 AND state = $5)
                 RETURNING id",
            )
            .bind(&input.login)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .bind(input.state.as_str())
            .fetch_optional(&mut *conn),
        )
        .await
        .map_err(|e| {
            translate_write(e, UniqueKey::UserEmail, || {
                format!(
                    "inserting user (login: '{}', email: '{}')",
                    input.login, input.email
                )
            })
        })?;
        id.ok_or_else(|| UniqueKey::UserEmail.duplicate_error())
    }

    /// Replace every mutable field of an active user and refresh `last_update_date`.
    ///
    /// Returns [`DbError::NotFound`] if no active user has this id.
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<(), DbError> {
        let result = ctx
            .run(
                sqlx::query(
                    "UPDATE users SET
                        login = $2,
                        email = $3,
                        password_hash = $4,
                        role = $5,
                        state = $6,
                        last_update_date = NOW()
                     WHERE id = $1 AND state != $7",
                )
                .bind(id)
                .bind(&input.login)
                .bind(&input.email)
                .bind(&input.password_hash)
                .bind(input.role.as_str())
                .bind(input.state.as_str())
                .bind(UserState::Deleted.as_str())
                .execute(&mut *conn),
            )
            .await
            .map_err(|e| {
                translate_write(e, UniqueKey::UserEmail, || {
                    format!(
                        "updating user (id: {id}, login: '{}', email: '{}', state: '{}')",
                        input.login, input.email, input.state
                    )
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Soft-delete a user, suffixing the email with `_deleted_<id>` so the
    /// address can register again. Missing or already-deleted ids are a no-op.
    pub async fn delete(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        id: DbId,
    ) -> Result<(), DbError> {
        ctx.run(
            sqlx::query(
                "UPDATE users SET email = email || '_deleted_' || $1::text, state = $2, last_update_date = NOW()
                 WHERE id = $1 AND state != $2",
            )
            .bind(id)
            .bind(UserState::Deleted.as_str())
            .execute(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("deleting user by id '{id}'"), e))?;
        Ok(())
    }
}
