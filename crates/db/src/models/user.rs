//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use studies_core::states::{UserRole, UserState};
use studies_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    #[sqlx(try_from = "String")]
    pub state: UserState,
    pub create_date: Timestamp,
    pub last_update_date: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub login: String,
    pub email: String,
    pub role: UserRole,
    pub state: UserState,
    pub create_date: Timestamp,
    pub last_update_date: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            email: user.email,
            role: user.role,
            state: user.state,
            create_date: user.create_date,
            last_update_date: user.last_update_date,
        }
    }
}

/// Fields for inserting a user. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub state: UserState,
}

/// Fields for a full replacement update of a user.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub state: UserState,
}
