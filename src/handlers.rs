use crate::{
    AppState,
    auth::{AdminUser, IdentityClaims, OwnEmail, issue_token},
    error::ApiError,
    models::{
        AdminStatus, ArticlePage, CreateUserResponse, DeclineReasonRequest, DeleteAck, InsertAck,
        ModerationAction, News, NewsContent, NewsPatch, Payment, PaymentIntentRequest,
        PaymentIntentResponse, PremiumStatus, Publisher, SubscribeRequest, TokenResponse,
        UpdateAck, User, UserPatch,
    },
    payment::to_minor_units,
    validation::{ValidJson, ValidPath, ValidQuery},
};
use axum::{Json, extract::State};
use serde::Deserialize;
use validator::Validate;

// --- Filter Structs ---

/// ArticleQuery
///
/// Query parameters for `GET /articles`.
#[derive(Debug, Default, Deserialize, Validate, utoipa::IntoParams)]
pub struct ArticleQuery {
    /// Case-insensitive substring of the title. Absent matches every article.
    pub search: Option<String>,
    /// Page size. Absent returns every match after `offset`.
    #[validate(range(min = 0))]
    pub limit: Option<i64>,
    /// Number of matches to skip. Defaults to 0.
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

// --- Liveness & Tokens ---

/// root
///
/// [Public Route] Liveness probe.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Server is running")))]
pub async fn root() -> &'static str {
    "Server is running"
}

/// issue_jwt
///
/// [Public Route] Signs the submitted identity claims into a one-hour access token.
/// The caller is trusted to have authenticated with the identity provider already.
#[utoipa::path(
    post,
    path = "/jwt",
    responses(
        (status = 200, description = "Signed token", body = TokenResponse),
        (status = 400, description = "Claims without an email")
    )
)]
pub async fn issue_jwt(
    State(state): State<AppState>,
    ValidJson(claims): ValidJson<IdentityClaims>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = issue_token(&claims, &state.config.jwt_secret, state.config.token_ttl_secs)?;
    Ok(Json(TokenResponse { token }))
}

// --- Users ---

/// get_users
///
/// [Authenticated Route] Lists every user document.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.repo.list_users().await?))
}

/// create_user
///
/// [Public Route] Registers a user unless the email is already known.
///
/// *Race*: the lookup and the insert are separate store calls, so two concurrent
/// requests with the same email can both insert.
#[utoipa::path(
    post,
    path = "/users",
    request_body = User,
    responses((status = 200, description = "Insert acknowledgement or duplicate sentinel", body = CreateUserResponse))
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(mut user): ValidJson<User>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    if state.repo.find_user_by_email(&user.email).await?.is_some() {
        tracing::debug!(email = %user.email, "user already exists");
        return Ok(Json(CreateUserResponse::already_exists()));
    }

    // Roles are only granted through `PATCH /users/admin/{id}`.
    user.id = None;
    user.role = None;
    let ack = state.repo.insert_user(user).await?;
    Ok(Json(CreateUserResponse::Inserted(ack)))
}

/// get_admin_status
///
/// [Authenticated Route] Whether the caller is an admin. The path email must be the
/// caller's own.
#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    params(("email" = String, Path, description = "Caller's email")),
    responses(
        (status = 200, description = "Admin flag", body = AdminStatus),
        (status = 403, description = "Email is not the caller's")
    )
)]
pub async fn get_admin_status(
    OwnEmail { value: email, .. }: OwnEmail,
    State(state): State<AppState>,
) -> Result<Json<AdminStatus>, ApiError> {
    let user = state.repo.find_user_by_email(&email).await?;
    Ok(Json(AdminStatus {
        admin: user.is_some_and(|u| u.is_admin()),
    }))
}

/// promote_admin
///
/// [Admin Route] Grants the admin role to the user with the given id.
#[utoipa::path(
    patch,
    path = "/users/admin/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Update acknowledgement", body = UpdateAck),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn promote_admin(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    tracing::info!(by = %admin.email(), user_id = %id, "promoting user to admin");
    Ok(Json(
        state
            .repo
            .update_user_by_id(&id, UserPatch::promote_admin())
            .await?,
    ))
}

/// subscribe_user
///
/// [Public Route] Records the subscription price and time on the user with this email.
#[utoipa::path(
    patch,
    path = "/users/subscribe/{email}",
    params(("email" = String, Path, description = "User email")),
    request_body = SubscribeRequest,
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn subscribe_user(
    State(state): State<AppState>,
    ValidPath(email): ValidPath<String>,
    ValidJson(req): ValidJson<SubscribeRequest>,
) -> Result<Json<UpdateAck>, ApiError> {
    let patch = UserPatch::subscribe(&email, req.price, req.subscribe_time);
    Ok(Json(state.repo.update_user_by_email(&email, patch).await?))
}

/// take_premium
///
/// [Public Route] Sets `premiumTaken = "Yes"`.
#[utoipa::path(
    patch,
    path = "/users/{email}",
    params(("email" = String, Path, description = "User email")),
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn take_premium(
    State(state): State<AppState>,
    ValidPath(email): ValidPath<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    Ok(Json(
        state
            .repo
            .update_user_by_email(&email, UserPatch::take_premium())
            .await?,
    ))
}

/// clear_premium
///
/// [Public Route] Sets `premiumTaken` back to null once a subscription lapses.
#[utoipa::path(
    patch,
    path = "/users/null/{email}",
    params(("email" = String, Path, description = "User email")),
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn clear_premium(
    State(state): State<AppState>,
    ValidPath(email): ValidPath<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    Ok(Json(
        state
            .repo
            .update_user_by_email(&email, UserPatch::clear_premium())
            .await?,
    ))
}

/// get_premium_status
///
/// [Authenticated Route] Whether the caller holds a premium subscription.
#[utoipa::path(
    get,
    path = "/users/premium/{email}",
    params(("email" = String, Path, description = "Caller's email")),
    responses(
        (status = 200, description = "Premium flag", body = PremiumStatus),
        (status = 403, description = "Email is not the caller's")
    )
)]
pub async fn get_premium_status(
    OwnEmail { value: email, .. }: OwnEmail,
    State(state): State<AppState>,
) -> Result<Json<PremiumStatus>, ApiError> {
    let user = state.repo.find_user_by_email(&email).await?;
    Ok(Json(PremiumStatus {
        premium: user.is_some_and(|u| u.has_premium()),
    }))
}

// --- Publishers ---

/// create_publisher
#[utoipa::path(
    post,
    path = "/publishers",
    request_body = Publisher,
    responses((status = 200, description = "Insert acknowledgement", body = InsertAck))
)]
pub async fn create_publisher(
    State(state): State<AppState>,
    ValidJson(publisher): ValidJson<Publisher>,
) -> Result<Json<InsertAck>, ApiError> {
    let mut publisher = publisher.normalized();
    publisher.id = None;
    Ok(Json(state.repo.insert_publisher(publisher).await?))
}

/// get_publishers
///
/// [Authenticated Route] Lists every publisher.
#[utoipa::path(
    get,
    path = "/publishers",
    responses((status = 200, description = "All publishers", body = [Publisher]))
)]
pub async fn get_publishers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Publisher>>, ApiError> {
    Ok(Json(state.repo.list_publishers().await?))
}

// --- News ---

/// create_news
///
/// [Public Route] Submits an article. It enters moderation as `pending` unless the
/// body says otherwise.
#[utoipa::path(
    post,
    path = "/newses",
    request_body = News,
    responses((status = 200, description = "Insert acknowledgement", body = InsertAck))
)]
pub async fn create_news(
    State(state): State<AppState>,
    ValidJson(mut news): ValidJson<News>,
) -> Result<Json<InsertAck>, ApiError> {
    news.id = None;
    Ok(Json(state.repo.insert_news(news).await?))
}

/// get_newses
#[utoipa::path(
    get,
    path = "/newses",
    responses((status = 200, description = "All articles", body = [News]))
)]
pub async fn get_newses(State(state): State<AppState>) -> Result<Json<Vec<News>>, ApiError> {
    Ok(Json(state.repo.list_news().await?))
}

/// search_articles
///
/// [Public Route] Paged title search.
///
/// `total` is counted over the whole match set first. When `offset` is at or past it
/// the page query is skipped: the result is empty and `total` still reports the matches.
#[utoipa::path(
    get,
    path = "/articles",
    params(ArticleQuery),
    responses(
        (status = 200, description = "One page of matches", body = ArticlePage),
        (status = 400, description = "Negative limit or offset")
    )
)]
pub async fn search_articles(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ArticleQuery>,
) -> Result<Json<ArticlePage>, ApiError> {
    let search = query.search.unwrap_or_default();
    // Negative paging is rejected by `ArticleQuery::validate`.
    let offset = query.offset.map_or(0, |o| o.max(0) as u64);

    let total = state.repo.count_news_by_title(&search).await?;
    if offset >= total {
        return Ok(Json(ArticlePage {
            result: vec![],
            total,
        }));
    }

    let result = state
        .repo
        .find_news_by_title(&search, offset, query.limit)
        .await?;
    Ok(Json(ArticlePage { result, total }))
}

/// get_news
///
/// [Public Route] A single article, or `null` when the id matches nothing.
#[utoipa::path(
    get,
    path = "/newses/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "The article or null", body = News),
        (status = 400, description = "Malformed id")
    )
)]
pub async fn get_news(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<Option<News>>, ApiError> {
    Ok(Json(state.repo.find_news(&id).await?))
}

/// delete_news
#[utoipa::path(
    delete,
    path = "/newses/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses((status = 200, description = "Delete acknowledgement", body = DeleteAck))
)]
pub async fn delete_news(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    Ok(Json(state.repo.delete_news(&id).await?))
}

async fn moderate(
    state: &AppState,
    id: &str,
    action: ModerationAction,
) -> Result<Json<UpdateAck>, ApiError> {
    tracing::info!(news_id = %id, ?action, "moderating article");
    let ack = state
        .repo
        .update_news(id, NewsPatch::for_action(action))
        .await?;
    Ok(Json(ack))
}

/// approve_news
#[utoipa::path(
    patch,
    path = "/newses/approve/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn approve_news(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    moderate(&state, &id, ModerationAction::Approve).await
}

/// decline_news
///
/// Also forces `isPremium = "No"`.
#[utoipa::path(
    patch,
    path = "/newses/decline/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn decline_news(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    moderate(&state, &id, ModerationAction::Decline).await
}

/// make_premium
#[utoipa::path(
    patch,
    path = "/newses/premium/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn make_premium(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    moderate(&state, &id, ModerationAction::Premium).await
}

/// set_decline_reason
///
/// [Public Route] Stores the moderator's explanation for a decline.
#[utoipa::path(
    patch,
    path = "/newses/{id}",
    params(("id" = String, Path, description = "Article id")),
    request_body = DeclineReasonRequest,
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn set_decline_reason(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
    ValidJson(req): ValidJson<DeclineReasonRequest>,
) -> Result<Json<UpdateAck>, ApiError> {
    let patch = NewsPatch::decline_reason(req.textarea_value);
    Ok(Json(state.repo.update_news(&id, patch).await?))
}

/// increment_view_count
///
/// [Public Route] One view event: `viewCount` goes up by exactly one.
#[utoipa::path(
    patch,
    path = "/newses/viewCount/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn increment_view_count(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<UpdateAck>, ApiError> {
    Ok(Json(state.repo.increment_view_count(&id).await?))
}

/// replace_news
///
/// [Public Route] Overwrites an article's content fields.
///
/// *Upsert*: an id that matches nothing creates a new article under that id instead
/// of failing. Moderation state and view count are never written here.
#[utoipa::path(
    put,
    path = "/newses/{id}",
    params(("id" = String, Path, description = "Article id")),
    request_body = NewsContent,
    responses((status = 200, description = "Update acknowledgement", body = UpdateAck))
)]
pub async fn replace_news(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
    ValidJson(content): ValidJson<NewsContent>,
) -> Result<Json<UpdateAck>, ApiError> {
    Ok(Json(state.repo.upsert_news(&id, content).await?))
}

// --- Payments ---

/// create_payment_intent
///
/// [Public Route] Opens a card payment intent for `price` and returns its client secret.
/// Nothing is stored; the client records the payment after confirming the charge.
#[utoipa::path(
    post,
    path = "/create-payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret", body = PaymentIntentResponse),
        (status = 400, description = "Price missing, zero or negative")
    )
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let amount = to_minor_units(req.price);
    tracing::debug!(amount, "amount inside the intent");
    let client_secret = state.payments.create_intent(amount).await?;
    Ok(Json(PaymentIntentResponse { client_secret }))
}

/// get_payments
///
/// [Authenticated Route] The caller's own payment history.
#[utoipa::path(
    get,
    path = "/payments/{email}",
    params(("email" = String, Path, description = "Caller's email")),
    responses(
        (status = 200, description = "Payments", body = [Payment]),
        (status = 403, description = "Email is not the caller's")
    )
)]
pub async fn get_payments(
    OwnEmail { value: email, .. }: OwnEmail,
    State(state): State<AppState>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.repo.list_payments_by_email(&email).await?))
}

/// create_payment
///
/// [Public Route] Records a confirmed payment. The user is not looked up.
#[utoipa::path(
    post,
    path = "/payments",
    request_body = Payment,
    responses((status = 200, description = "Insert acknowledgement", body = InsertAck))
)]
pub async fn create_payment(
    State(state): State<AppState>,
    ValidJson(mut payment): ValidJson<Payment>,
) -> Result<Json<InsertAck>, ApiError> {
    payment.id = None;
    Ok(Json(state.repo.insert_payment(payment).await?))
}
