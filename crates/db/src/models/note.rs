//! Note entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use studies_core::states::NoteState;
use studies_core::types::{DbId, Timestamp};

/// A row from the `notes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Note {
    pub id: DbId,
    pub text: String,
    pub topic: String,
    pub tag_id: DbId,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub state: NoteState,
    pub create_date: Timestamp,
    pub last_update_date: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateNote {
    pub text: String,
    pub topic: String,
    pub tag_id: DbId,
    pub user_id: DbId,
    pub state: NoteState,
}

#[derive(Debug, Clone)]
pub struct UpdateNote {
    pub text: String,
    pub topic: String,
    pub tag_id: DbId,
    pub user_id: DbId,
    pub state: NoteState,
}
