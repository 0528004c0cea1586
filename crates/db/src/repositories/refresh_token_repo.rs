//! Repository for the `refresh_tokens` table.

use sqlx::PgConnection;
use studies_core::types::{DbId, Timestamp};

use crate::error::DbError;
use crate::transaction::QueryContext;

/// Persists issued refresh tokens. Only the token hash is stored.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Record an issued refresh token, returning the row id.
    pub async fn create(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        user_id: DbId,
        token_hash: &str,
        expire_at: Timestamp,
    ) -> Result<DbId, DbError> {
        ctx.run(
            sqlx::query_scalar::<_, DbId>(
                "INSERT INTO refresh_tokens (user_id, token_hash, expire_at)
                 VALUES ($1, $2, $3)
                 RETURNING id",
            )
            .bind(user_id)
            .bind(token_hash)
            .bind(expire_at)
            .fetch_one(&mut *conn),
        )
        .await
        .map_err(|e| DbError::query(format!("inserting refresh token (user_id: {user_id})"), e))
    }

    /// Count unexpired tokens issued to a user.
    pub async fn count_active_for_user(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        user_id: DbId,
    ) -> Result<i64, DbError> {
        ctx.run(
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1 AND expire_at > NOW()",
            )
            .bind(user_id)
            .fetch_one(&mut *conn),
        )
        .await
        .map_err(|e| {
            DbError::query(format!("counting refresh tokens (user_id: {user_id})"), e)
        })
    }
}
