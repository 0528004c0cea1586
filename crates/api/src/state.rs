use std::sync::Arc;

use studies_db::Store;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Transactional store handle (pool plus per-transaction timeout).
    pub store: Store,
    /// Server configuration, including the JWT settings used by the auth handlers.
    pub config: Arc<ServerConfig>,
}
