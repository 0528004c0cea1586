use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A create or update tried to set the terminal `DELETED` state directly.
    #[error("State 'DELETED' cannot be set via {operation}; use delete instead")]
    DeletedStateInput { operation: &'static str },

    #[error("Wrong password or email")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),
}
