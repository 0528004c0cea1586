//! Tag entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use studies_core::states::TagState;
use studies_core::types::DbId;

/// A row from the `tags` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub state: TagState,
}

#[derive(Debug, Clone)]
pub struct CreateTag {
    pub name: String,
    pub state: TagState,
}

#[derive(Debug, Clone)]
pub struct UpdateTag {
    pub name: String,
    pub state: TagState,
}
