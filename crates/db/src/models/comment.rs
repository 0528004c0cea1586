//! Comment entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use studies_core::states::CommentState;
use studies_core::types::{DbId, Timestamp};

/// A row from the `comments` table. `linked_comment_id` points at the
/// comment being replied to, if any.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub text: String,
    pub user_id: DbId,
    pub note_id: DbId,
    pub linked_comment_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub state: CommentState,
    pub create_date: Timestamp,
    pub last_update_date: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub text: String,
    pub user_id: DbId,
    pub note_id: DbId,
    pub linked_comment_id: Option<DbId>,
    pub state: CommentState,
}

#[derive(Debug, Clone)]
pub struct UpdateComment {
    pub text: String,
    pub linked_comment_id: Option<DbId>,
    pub state: CommentState,
}
