use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Public Router Module
///
/// Endpoints that need no token: liveness, token issue, registration, the article
/// catalogue and its moderation actions, and the payment flow.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness probe for load balancers.
        .route("/", get(handlers::root))
        // POST /jwt
        // Exchanges identity claims for a one-hour bearer token.
        .route("/jwt", post(handlers::issue_jwt))
        // --- Users ---
        // POST /users
        // Registration. Returns the duplicate sentinel instead of inserting a known email.
        .route("/users", post(handlers::create_user))
        .route("/users/subscribe/{email}", patch(handlers::subscribe_user))
        .route("/users/null/{email}", patch(handlers::clear_premium))
        .route("/users/{email}", patch(handlers::take_premium))
        // --- Publishers ---
        .route("/publishers", post(handlers::create_publisher))
        // --- News ---
        .route(
            "/newses",
            get(handlers::get_newses).post(handlers::create_news),
        )
        // GET /articles?search=...&limit=...&offset=...
        // Paged title search; `total` counts all matches.
        .route("/articles", get(handlers::search_articles))
        // GET/DELETE/PATCH/PUT /newses/{id}
        // PATCH stores a decline reason; PUT upserts the content fields.
        .route(
            "/newses/{id}",
            get(handlers::get_news)
                .delete(handlers::delete_news)
                .patch(handlers::set_decline_reason)
                .put(handlers::replace_news),
        )
        .route("/newses/approve/{id}", patch(handlers::approve_news))
        .route("/newses/decline/{id}", patch(handlers::decline_news))
        .route("/newses/premium/{id}", patch(handlers::make_premium))
        .route(
            "/newses/viewCount/{id}",
            patch(handlers::increment_view_count),
        )
        // --- Payments ---
        // POST /create-payment-intent
        // Returns a client secret; nothing is stored until POST /payments.
        .route(
            "/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .route("/payments", post(handlers::create_payment))
}
