pub mod comment;
pub mod note;
pub mod tag;
pub mod task;
pub mod user;
