pub mod auth;
pub mod health;
pub mod notes;
pub mod tags;
pub mod tasks;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ping                     liveness probe
///
/// /auth/login               login
/// /auth/verify              access-token check
///
/// /tasks                    list, create
/// /tasks/{id}               get, update, delete
///
/// /tags                     list, create
/// /tags/{id}                get, update, delete
///
/// /notes                    list, create
/// /notes/{id}               get, update, delete
///
/// /users                    list, create
/// /users/{id}               get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::ping_router())
        .nest("/auth", auth::router())
        .nest("/tasks", tasks::router())
        .nest("/tags", tags::router())
        .nest("/notes", notes::router())
        .nest("/users", users::router())
}
