//! Per-entity query functions.
//!
//! Every function takes the transaction's connection and the unit of work's
//! [`QueryContext`](crate::transaction::QueryContext), issues a single
//! statement, and translates driver errors into [`DbError`](crate::DbError).

pub mod comment_repo;
pub mod note_repo;
pub mod refresh_token_repo;
pub mod tag_repo;
pub mod task_repo;
pub mod user_repo;

pub use comment_repo::CommentRepo;
pub use note_repo::NoteRepo;
pub use refresh_token_repo::RefreshTokenRepo;
pub use tag_repo::TagRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
