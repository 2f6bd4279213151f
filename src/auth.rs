use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::{
    config::AppConfig, error::ApiError, repository::RepositoryState, validation::ValidPath,
};

// --- Token Service ---

/// Claims a caller may not choose; they are always set by `issue_token`.
const RESERVED_CLAIMS: [&str; 2] = ["exp", "iat"];

/// IdentityClaims
///
/// Whatever the client presented to `POST /jwt`. `email` is mandatory and is the only
/// claim the server relies on; every other field is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct IdentityClaims {
    #[validate(email)]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentityClaims {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            extra: Map::new(),
        }
    }

    /// Looks up a string claim by name.
    pub fn claim(&self, field: &str) -> Option<&str> {
        match field {
            "email" => Some(self.email.as_str()),
            other => self.extra.get(other).and_then(Value::as_str),
        }
    }
}

/// Claims
///
/// The signed payload: the identity claims plus issue and expiry timestamps (seconds).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub identity: IdentityClaims,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// issue_token
///
/// Signs `identity` with HS256, valid for `ttl_secs` from now.
pub fn issue_token(
    identity: &IdentityClaims,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, TokenError> {
    let mut identity = identity.clone();
    for reserved in RESERVED_CLAIMS {
        identity.extra.remove(reserved);
    }

    let now = chrono::Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        identity,
        iat: now,
        exp: now + ttl_secs as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(TokenError::Signing)
}

/// verify_token
///
/// Checks signature and expiry (no leeway) and returns the identity claims.
/// `aud` is a pass-through claim like any other: tokens are never issued for a
/// specific audience.
pub fn verify_token(token: &str, secret: &str) -> Result<IdentityClaims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_aud = false;
    validation.leeway = 0;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims.identity),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid(e)),
        },
    }
}

// --- Authorization Guard ---

/// AuthUser
///
/// A request carrying a valid bearer token. The first extraction verifies the token and
/// stores the result in the request extensions; later extractions on the same request
/// (middleware, then handler) reuse it.
///
/// Rejection: 401 when the header is missing, not `Bearer`, or the token fails verification.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: IdentityClaims,
}

impl AuthUser {
    pub fn email(&self) -> &str {
        &self.claims.email
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                tracing::debug!("rejected request without bearer token");
                ApiError::Unauthorized
            })?;

        let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
            tracing::debug!("rejected bearer token: {}", e);
            ApiError::Unauthorized
        })?;

        let user = AuthUser { claims };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// AdminUser
///
/// An `AuthUser` whose user document has `role: "admin"`. The role is read from the
/// store on every request, so a promotion takes effect without a new token.
///
/// Rejection: 401 as for `AuthUser`, then 403 if the user is unknown or not an admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(admin) = parts.extensions.get::<AdminUser>() {
            return Ok(admin.clone());
        }

        let auth = AuthUser::from_request_parts(parts, state).await?;
        let repo = RepositoryState::from_ref(state);

        match repo.find_user_by_email(auth.email()).await? {
            Some(user) if user.is_admin() => {
                let admin = AdminUser(auth);
                parts.extensions.insert(admin.clone());
                Ok(admin)
            }
            _ => {
                tracing::warn!(email = %auth.email(), "admin access denied");
                Err(ApiError::Forbidden)
            }
        }
    }
}

/// require_token
///
/// Route layer for token-protected routers. Rejects before the handler runs.
pub async fn require_token(_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// require_admin
///
/// Route layer for admin routers. Implies `require_token`.
pub async fn require_admin(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

// --- Identity Match Policy ---

/// ClaimField
///
/// Names the token claim a path parameter must equal.
pub trait ClaimField: Send + Sync + 'static {
    const CLAIM: &'static str;
}

/// The `email` claim.
pub struct EmailClaim;

impl ClaimField for EmailClaim {
    const CLAIM: &'static str = "email";
}

/// require_matching_claim
///
/// 403 unless the caller's `claim` equals `path_value`.
pub fn require_matching_claim(
    user: &AuthUser,
    claim: &str,
    path_value: &str,
) -> Result<(), ApiError> {
    match user.claims.claim(claim) {
        Some(value) if value == path_value => Ok(()),
        _ => {
            tracing::warn!(claim, path_value, "identity mismatch");
            Err(ApiError::Forbidden)
        }
    }
}

/// MatchesClaim
///
/// Extracts the route's single path parameter and requires it to equal the caller's
/// `F::CLAIM` claim. Declaring it in a handler signature is the whole policy.
pub struct MatchesClaim<F: ClaimField> {
    pub value: String,
    pub user: AuthUser,
    _field: PhantomData<F>,
}

/// A path `{email}` that must be the caller's own email.
pub type OwnEmail = MatchesClaim<EmailClaim>;

impl<F: ClaimField> MatchesClaim<F> {
    /// 403 unless `user` carries `value` in its `F::CLAIM` claim.
    pub fn new(value: String, user: AuthUser) -> Result<Self, ApiError> {
        require_matching_claim(&user, F::CLAIM, &value)?;
        Ok(MatchesClaim {
            value,
            user,
            _field: PhantomData,
        })
    }
}

impl<S, F> FromRequestParts<S> for MatchesClaim<F>
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    F: ClaimField,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let ValidPath(value) = ValidPath::<String>::from_request_parts(parts, state).await?;

        MatchesClaim::new(value, user)
    }
}
