use anolipi_server::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    payment::{PaymentState, StripePaymentClient},
    repository::{InMemoryRepository, MongoRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects the store and the payment processor,
/// and serves the API.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    // Panics on missing production secrets.
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "anolipi_server=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // Document store. Without a connection string (local only) the data lives in memory
    // and is lost on restart.
    let repo = match &config.mongo_uri {
        Some(uri) => {
            let mongo = MongoRepository::connect(uri, &config.db_name)
                .await
                .expect("FATAL: Failed to connect to MongoDB. Check MONGODB_URI or DB_USER/DB_PASS.");
            Arc::new(mongo) as RepositoryState
        }
        None => {
            tracing::warn!("No MongoDB connection configured, using the in-memory store");
            Arc::new(InMemoryRepository::new()) as RepositoryState
        }
    };

    let payments = Arc::new(StripePaymentClient::new(
        &config.stripe_api_base,
        &config.stripe_secret_key,
        &config.payment_currency,
    )) as PaymentState;

    let port = config.port;
    let app_state = AppState {
        repo,
        payments,
        config,
    };

    let app = create_router(app_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check PORT.");

    tracing::info!("Listening on {}", addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
