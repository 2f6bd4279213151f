use crate::{AppState, handlers};
use axum::{Router, routing::patch};

/// Admin Router Module
///
/// Endpoints that need a token whose email belongs to a user with `role: "admin"`.
/// The role is looked up on each request.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // PATCH /users/admin/{id}
        // Promotes a user to admin. There is no endpoint that demotes.
        .route("/users/admin/{key}", patch(handlers::promote_admin))
}
