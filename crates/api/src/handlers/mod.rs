pub mod auth;
pub mod notes;
pub mod tags;
pub mod tasks;
pub mod users;
