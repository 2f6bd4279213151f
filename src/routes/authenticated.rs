use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Read endpoints that need a valid bearer token. The three `{email}` routes also
/// require the path email to be the caller's own (`OwnEmail` in the handler).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/users", get(handlers::get_users))
        // GET /users/admin/{email}
        // The parameter is named `key` because PATCH on the same path (admin router)
        // takes a user id.
        .route("/users/admin/{key}", get(handlers::get_admin_status))
        .route("/users/premium/{email}", get(handlers::get_premium_status))
        .route("/publishers", get(handlers::get_publishers))
        .route("/payments/{email}", get(handlers::get_payments))
}
