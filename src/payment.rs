use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

/// to_minor_units
///
/// Decimal price to integer minor units: multiply by 100 and truncate toward zero.
/// `19.99` becomes `1998` because `19.99 * 100.0` is `1998.9999…` in binary floating point.
pub fn to_minor_units(price: f64) -> i64 {
    (price * 100.0).trunc() as i64
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment processor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment processor rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("simulated payment failure")]
    Simulated,
}

/// PaymentService
///
/// Creates single-use, card-only payment intents. Implementations persist nothing;
/// the client confirms the charge and then records it with `POST /payments`.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Returns the intent's client secret.
    async fn create_intent(&self, amount_minor: i64) -> Result<String, PaymentError>;
}

/// StripePaymentClient
///
/// Calls `POST /v1/payment_intents` on the configured API base with the secret key as
/// bearer credentials.
#[derive(Clone)]
pub struct StripePaymentClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    currency: String,
}

#[derive(Deserialize)]
struct PaymentIntent {
    client_secret: String,
}

impl StripePaymentClient {
    pub fn new(api_base: &str, secret_key: &str, currency: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            currency: currency.to_string(),
        }
    }
}

#[async_trait]
impl PaymentService for StripePaymentClient {
    async fn create_intent(&self, amount_minor: i64) -> Result<String, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        let amount = amount_minor.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", self.currency.as_str()),
            ("payment_method_types[]", "card"),
        ];

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected { status, body });
        }

        let intent = response.json::<PaymentIntent>().await?;
        tracing::info!(amount = amount_minor, currency = %self.currency, "created payment intent");
        Ok(intent.client_secret)
    }
}

/// MockPaymentService
///
/// Test double. Records every requested amount and returns a deterministic secret.
#[derive(Default)]
pub struct MockPaymentService {
    /// When true, every call fails with `PaymentError::Simulated`.
    pub should_fail: bool,
    pub requested_amounts: Mutex<Vec<i64>>,
}

impl MockPaymentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn amounts(&self) -> Vec<i64> {
        self.requested_amounts
            .lock()
            .map(|amounts| amounts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentService for MockPaymentService {
    async fn create_intent(&self, amount_minor: i64) -> Result<String, PaymentError> {
        if let Ok(mut amounts) = self.requested_amounts.lock() {
            amounts.push(amount_minor);
        }
        if self.should_fail {
            return Err(PaymentError::Simulated);
        }
        Ok(format!("pi_mock_{}_secret_test", amount_minor))
    }
}

/// PaymentState
///
/// The processor handle shared through `AppState`.
pub type PaymentState = Arc<dyn PaymentService>;
