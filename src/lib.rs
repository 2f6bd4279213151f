use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payment;
pub mod repository;
pub mod validation;

// Public, token-protected and admin route groups.
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use payment::{MockPaymentService, PaymentState, StripePaymentClient};
pub use repository::{InMemoryRepository, MongoRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and browsable
/// through Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root, handlers::issue_jwt,
        handlers::get_users, handlers::create_user, handlers::get_admin_status,
        handlers::promote_admin, handlers::subscribe_user, handlers::take_premium,
        handlers::clear_premium, handlers::get_premium_status,
        handlers::create_publisher, handlers::get_publishers,
        handlers::create_news, handlers::get_newses, handlers::search_articles,
        handlers::get_news, handlers::delete_news, handlers::approve_news,
        handlers::decline_news, handlers::make_premium, handlers::set_decline_reason,
        handlers::increment_view_count, handlers::replace_news,
        handlers::create_payment_intent, handlers::get_payments, handlers::create_payment
    ),
    components(
        schemas(
            models::Role, models::YesNo, models::NewsStatus,
            models::User, models::Publisher, models::News, models::NewsContent, models::Payment,
            models::InsertAck, models::UpdateAck, models::DeleteAck,
            models::DuplicateUser, models::CreateUserResponse,
            models::SubscribeRequest, models::DeclineReasonRequest, models::PaymentIntentRequest,
            models::TokenResponse, models::AdminStatus, models::PremiumStatus,
            models::PaymentIntentResponse, models::ArticlePage,
        )
    ),
    tags(
        (name = "anolipi", description = "Anolipi news publishing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request: the document store, the payment processor and the loaded
/// configuration. Handlers and extractors pull the part they need through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Document store (MongoDB, or in-memory for tests and local runs).
    pub repo: RepositoryState,
    /// Payment intent creation.
    pub payments: PaymentState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for PaymentState {
    fn from_ref(app_state: &AppState) -> PaymentState {
        app_state.payments.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the route groups, their guards, and the global request-id, tracing and
/// CORS layers.
pub fn create_router(state: AppState) -> Router {
    // Any origin, method and header: the API is consumed by browser clients on other hosts.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_token,
            )),
        )
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, URI and the `x-request-id` set by the layer above, so
/// every log line of one request shares an id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
