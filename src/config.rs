use std::env;

/// Default Atlas host used when the connection string is assembled from
/// `DB_USER`/`DB_PASS` instead of being given whole.
const DEFAULT_DB_HOST: &str = "cluster0.c6bvskv.mongodb.net";
const LOCAL_TOKEN_SECRET: &str = "local-development-access-token-secret";
const LOCAL_STRIPE_KEY: &str = "sk_test_local_development_key";

/// AppConfig
///
/// Immutable configuration resolved once at startup and shared through `AppState`.
/// Handlers and extractors pull it out with `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Runtime environment. Selects the log format and whether missing secrets are fatal.
    pub env: Env,
    /// Document store connection string. `None` only in `Env::Local`, where the
    /// in-memory store is used instead.
    pub mongo_uri: Option<String>,
    pub db_name: String,
    /// HMAC secret used to sign and verify access tokens.
    pub jwt_secret: String,
    /// Lifetime of issued access tokens, in seconds.
    pub token_ttl_secs: u64,
    // Card processor credentials and endpoint.
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub payment_currency: String,
    pub port: u16,
}

/// Env
///
/// Runtime context: `Local` tolerates missing secrets, `Production` does not.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests. No database is configured, so
    /// anything built from it runs against the in-memory store.
    fn default() -> Self {
        Self {
            env: Env::Local,
            mongo_uri: None,
            db_name: "anolipiDB".to_string(),
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            token_ttl_secs: 3600,
            stripe_secret_key: LOCAL_STRIPE_KEY.to_string(),
            stripe_api_base: "https://api.stripe.com".to_string(),
            payment_currency: "usd".to_string(),
            port: 5000,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every setting from the environment.
    ///
    /// # Panics
    /// In `production`, panics when `ACCESS_TOKEN_SECRET`, `STRIPE_SECRET_KEY` or the
    /// database settings are missing. In any environment, panics when `PORT` or
    /// `TOKEN_TTL_SECS` is set but not a number.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("ACCESS_TOKEN_SECRET")
                .expect("FATAL: ACCESS_TOKEN_SECRET must be set in production."),
            Env::Local => {
                env::var("ACCESS_TOKEN_SECRET").unwrap_or_else(|_| LOCAL_TOKEN_SECRET.to_string())
            }
        };

        let stripe_secret_key = match env {
            Env::Production => env::var("STRIPE_SECRET_KEY")
                .expect("FATAL: STRIPE_SECRET_KEY must be set in production."),
            Env::Local => {
                env::var("STRIPE_SECRET_KEY").unwrap_or_else(|_| LOCAL_STRIPE_KEY.to_string())
            }
        };

        let mongo_uri = resolve_mongo_uri();
        if env == Env::Production && mongo_uri.is_none() {
            panic!("FATAL: MONGODB_URI or DB_USER/DB_PASS required in production.");
        }

        let port = env::var("PORT")
            .map(|p| p.parse().expect("FATAL: PORT must be a valid port number"))
            .unwrap_or(5000);

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .map(|t| t.parse().expect("FATAL: TOKEN_TTL_SECS must be a number of seconds"))
            .unwrap_or(3600);

        Self {
            env,
            mongo_uri,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "anolipiDB".to_string()),
            jwt_secret,
            token_ttl_secs,
            stripe_secret_key,
            stripe_api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            payment_currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            port,
        }
    }
}

/// `MONGODB_URI` wins; otherwise an SRV string is built from the user/password pair.
fn resolve_mongo_uri() -> Option<String> {
    if let Ok(uri) = env::var("MONGODB_URI") {
        return Some(uri);
    }
    let user = env::var("DB_USER").ok()?;
    let pass = env::var("DB_PASS").ok()?;
    let host = env::var("DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string());
    Some(format!(
        "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
        user, pass, host
    ))
}
