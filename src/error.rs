use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{auth::TokenError, payment::PaymentError, repository::RepoError};

/// ApiError
///
/// The HTTP boundary error. Every handler returns `Result<_, ApiError>`, so store and
/// processor failures are converted here (and logged) instead of escaping the request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed body, id or query parameter.
    #[error("{0}")]
    BadRequest(String),
    /// Missing, malformed or expired bearer token.
    #[error("unauthorized access")]
    Unauthorized,
    /// Valid token, but the caller lacks the role or identity the route requires.
    #[error("forbidden access")]
    Forbidden,
    /// Store or processor failure. The cause is logged, the client sees a static message.
    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Internal => json!({ "error": self.to_string() }),
            _ => json!({ "message": self.to_string() }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::InvalidId(id) => ApiError::BadRequest(format!("invalid id: {}", id)),
            other => {
                tracing::error!("store operation failed: {:?}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        tracing::error!("payment processor call failed: {:?}", err);
        ApiError::Internal
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(e) => {
                tracing::error!("token signing failed: {:?}", e);
                ApiError::Internal
            }
            _ => ApiError::Unauthorized,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}
