use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use anolipi_server::{
    AppState, ApiError, InMemoryRepository, MockPaymentService,
    auth::{
        AdminUser, AuthUser, Claims, IdentityClaims, OwnEmail, TokenError, issue_token,
        require_matching_claim, verify_token,
    },
    config::AppConfig,
    models::{Role, User},
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::sync::Arc;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const READER_EMAIL: &str = "reader@anolipi.com";
const ADMIN_EMAIL: &str = "editor@anolipi.com";

fn now() -> usize {
    chrono::Utc::now().timestamp() as usize
}

fn create_app_state(repo: InMemoryRepository) -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        repo: Arc::new(repo),
        payments: Arc::new(MockPaymentService::new()),
        config,
    }
}

async fn repo_with_users() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.insert_user(User {
        email: READER_EMAIL.to_string(),
        role: Some(Role::User),
        ..User::default()
    })
    .await
    .unwrap();
    repo.insert_user(User {
        email: ADMIN_EMAIL.to_string(),
        role: Some(Role::Admin),
        ..User::default()
    })
    .await
    .unwrap();
    repo
}

fn bearer_token(email: &str) -> String {
    issue_token(&IdentityClaims::new(email), TEST_JWT_SECRET, 3600).unwrap()
}

/// Parts of a request to `uri` with an optional `Authorization` header value.
fn get_request_parts(method: Method, uri: Uri, authorization: Option<String>) -> Parts {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = builder.body(axum::body::Body::empty()).unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- Token Service ---

#[test]
fn test_issued_token_round_trips_identity_claims() {
    let mut claims = IdentityClaims::new(READER_EMAIL);
    claims.extra.insert("name".to_string(), json!("Rahim"));

    let token = issue_token(&claims, TEST_JWT_SECRET, 3600).unwrap();
    let decoded = verify_token(&token, TEST_JWT_SECRET).unwrap();

    assert_eq!(decoded.email, READER_EMAIL);
    assert_eq!(decoded.claim("name"), Some("Rahim"));
}

#[test]
fn test_audience_claim_round_trips() {
    let mut claims = IdentityClaims::new(READER_EMAIL);
    claims.extra.insert("aud".to_string(), json!("web-client"));

    let token = issue_token(&claims, TEST_JWT_SECRET, 3600).unwrap();
    let decoded = verify_token(&token, TEST_JWT_SECRET).unwrap();

    assert_eq!(decoded.email, READER_EMAIL);
    assert_eq!(decoded.claim("aud"), Some("web-client"));
}

#[test]
fn test_issue_token_overrides_client_supplied_expiry() {
    let mut claims = IdentityClaims::new(READER_EMAIL);
    // An expiry in the past must not survive into the signed token.
    claims.extra.insert("exp".to_string(), json!(1));

    let token = issue_token(&claims, TEST_JWT_SECRET, 3600).unwrap();

    assert!(verify_token(&token, TEST_JWT_SECRET).is_ok());
}

#[test]
fn test_expired_token_is_rejected() {
    let issued = now() - 7200;
    let claims = Claims {
        identity: IdentityClaims::new(READER_EMAIL),
        iat: issued,
        exp: issued + 3600,
    };
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    let token = encode(&Header::default(), &claims, &key).unwrap();

    let result = verify_token(&token, TEST_JWT_SECRET);

    assert!(matches!(result, Err(TokenError::Expired)));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let token = issue_token(&IdentityClaims::new(READER_EMAIL), "another-secret", 3600).unwrap();

    let result = verify_token(&token, TEST_JWT_SECRET);

    assert!(matches!(result, Err(TokenError::Invalid(_))));
}

#[test]
fn test_garbage_token_is_rejected() {
    assert!(verify_token("not.a.token", TEST_JWT_SECRET).is_err());
}

// --- Authorization Guard ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let app_state = create_app_state(InMemoryRepository::new());
    let mut parts = get_request_parts(
        Method::GET,
        "/users".parse().unwrap(),
        Some(format!("Bearer {}", bearer_token(READER_EMAIL))),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    let user = auth_user.unwrap();
    assert_eq!(user.email(), READER_EMAIL);
    // The verified identity is cached for later extractors on the same request.
    assert!(parts.extensions.get::<AuthUser>().is_some());
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(InMemoryRepository::new());
    let mut parts = get_request_parts(Method::GET, "/users".parse().unwrap(), None);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_without_bearer_scheme() {
    let app_state = create_app_state(InMemoryRepository::new());
    let mut parts = get_request_parts(
        Method::GET,
        "/users".parse().unwrap(),
        Some(bearer_token(READER_EMAIL)),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_admin_guard_accepts_admin() {
    let app_state = create_app_state(repo_with_users().await);
    let mut parts = get_request_parts(
        Method::PATCH,
        "/users/admin/0123456789abcdef01234567".parse().unwrap(),
        Some(format!("Bearer {}", bearer_token(ADMIN_EMAIL))),
    );

    let admin = AdminUser::from_request_parts(&mut parts, &app_state).await;

    let AdminUser(user) = admin.unwrap();
    assert_eq!(user.email(), ADMIN_EMAIL);
}

#[tokio::test]
async fn test_admin_guard_rejects_regular_user() {
    let app_state = create_app_state(repo_with_users().await);
    let mut parts = get_request_parts(
        Method::PATCH,
        "/users/admin/0123456789abcdef01234567".parse().unwrap(),
        Some(format!("Bearer {}", bearer_token(READER_EMAIL))),
    );

    let admin = AdminUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(admin, Err(ApiError::Forbidden)));
}

#[tokio::test]
async fn test_admin_guard_rejects_unknown_email() {
    let app_state = create_app_state(repo_with_users().await);
    let mut parts = get_request_parts(
        Method::PATCH,
        "/users/admin/0123456789abcdef01234567".parse().unwrap(),
        Some(format!("Bearer {}", bearer_token("stranger@anolipi.com"))),
    );

    let admin = AdminUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(admin, Err(ApiError::Forbidden)));
}

#[tokio::test]
async fn test_admin_guard_requires_token_first() {
    let app_state = create_app_state(repo_with_users().await);
    let mut parts = get_request_parts(Method::PATCH, "/users/admin/x".parse().unwrap(), None);

    let admin = AdminUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(admin, Err(ApiError::Unauthorized)));
}

// --- Identity Match Policy ---

#[test]
fn test_matching_claim_policy() {
    let user = AuthUser {
        claims: IdentityClaims::new(READER_EMAIL),
    };

    assert!(require_matching_claim(&user, "email", READER_EMAIL).is_ok());
    assert!(matches!(
        require_matching_claim(&user, "email", ADMIN_EMAIL),
        Err(ApiError::Forbidden)
    ));
    assert!(matches!(
        require_matching_claim(&user, "uid", READER_EMAIL),
        Err(ApiError::Forbidden)
    ));
}

#[tokio::test]
async fn test_own_email_rejects_mismatch() {
    // Path parameters are only available once the router has matched, so the extractor
    // is exercised through a one-route router.
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use tower::ServiceExt;

    async fn handler(own: OwnEmail) -> String {
        own.value
    }

    let app = Router::new()
        .route("/payments/{email}", get(handler))
        .with_state(create_app_state(InMemoryRepository::new()));

    let request = |email: &str| {
        Request::builder()
            .uri(format!("/payments/{}", email))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", bearer_token(READER_EMAIL)),
            )
            .body(Body::empty())
            .unwrap()
    };

    let own = app.clone().oneshot(request(READER_EMAIL)).await.unwrap();
    assert_eq!(own.status(), StatusCode::OK);

    let other = app.oneshot(request(ADMIN_EMAIL)).await.unwrap();
    assert_eq!(other.status(), StatusCode::FORBIDDEN);
}
