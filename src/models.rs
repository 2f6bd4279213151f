use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use validator::Validate;

// --- Stored Documents ---
//
// Document ids travel as 24-char hex strings. The store layer converts them to and
// from native object ids, so these structs serialize the same way to JSON and BSON.

/// Role
///
/// Stored as the lowercase `role` string on a user document. Absent means no role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// YesNo
///
/// The platform's two-valued flag, stored as the literal strings `"Yes"` / `"No"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

/// User
///
/// One document per email in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(email)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// `null` after the subscription is cleared, so it is serialized even when unset.
    #[serde(default)]
    pub premium_taken: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    /// Subscription timestamp in epoch milliseconds, as sent by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe_time: Option<i64>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn has_premium(&self) -> bool {
        self.premium_taken == Some(YesNo::Yes)
    }
}

/// Publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct Publisher {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub logo: String,
    /// The admin form submits the logo as `photo`. Folded into `logo` by `normalized`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(skip)]
    pub photo: Option<String>,
}

impl Publisher {
    /// Moves a `photo` URL into `logo` unless `logo` is already set.
    pub fn normalized(mut self) -> Self {
        if let Some(photo) = self.photo.take() {
            if self.logo.is_empty() {
                self.logo = photo;
            }
        }
        self
    }
}

/// NewsStatus
///
/// Moderation state. New articles start `pending`; an admin moves them to
/// `Approve` or `Decline`. Nothing moves them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum NewsStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    Approve,
    Decline,
}

impl NewsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsStatus::Pending => "pending",
            NewsStatus::Approve => "Approve",
            NewsStatus::Decline => "Decline",
        }
    }
}

/// News
///
/// An article in the `newses` collection. Missing fields fall back to their defaults,
/// which covers documents created by an upsert that only carried the content fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct News {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub publisher_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_photo: Option<String>,
    pub author_name: String,
    pub author_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_photo: Option<String>,
    pub status: NewsStatus,
    pub is_premium: YesNo,
    #[validate(range(min = 0))]
    pub view_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_text: Option<String>,
}

/// NewsContent
///
/// The editable part of an article, submitted by `PUT /newses/{id}`. Only these fields
/// are written; moderation state, premium flag and view count are left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewsContent {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub publisher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_photo: Option<String>,
    pub author_name: String,
    pub author_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_photo: Option<String>,
}

impl NewsContent {
    /// Overwrites the listed fields of `news`. Fields left `None` here are not touched.
    pub fn apply_to(&self, news: &mut News) {
        news.title = self.title.clone();
        news.description = self.description.clone();
        news.tags = self.tags.clone();
        if self.news_image.is_some() {
            news.news_image = self.news_image.clone();
        }
        if self.date.is_some() {
            news.date = self.date.clone();
        }
        news.publisher_name = self.publisher_name.clone();
        if self.publisher_photo.is_some() {
            news.publisher_photo = self.publisher_photo.clone();
        }
        news.author_name = self.author_name.clone();
        news.author_email = self.author_email.clone();
        if self.author_photo.is_some() {
            news.author_photo = self.author_photo.clone();
        }
    }
}

/// Payment
///
/// Recorded after the client confirms a charge. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1))]
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub date: Option<DateTime<Utc>>,
}

// --- Update Descriptions ---

/// UserPatch
///
/// The `$set` part of a user update. `None` leaves a field alone; for `premium_taken`,
/// `Some(None)` writes an explicit null.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub premium_taken: Option<Option<YesNo>>,
    pub price: Option<f64>,
    pub subscribe_time: Option<i64>,
}

impl UserPatch {
    pub fn promote_admin() -> Self {
        Self {
            role: Some(Role::Admin),
            ..Self::default()
        }
    }

    pub fn subscribe(email: &str, price: f64, subscribe_time: i64) -> Self {
        Self {
            email: Some(email.to_string()),
            price: Some(price),
            subscribe_time: Some(subscribe_time),
            ..Self::default()
        }
    }

    pub fn take_premium() -> Self {
        Self {
            premium_taken: Some(Some(YesNo::Yes)),
            ..Self::default()
        }
    }

    pub fn clear_premium() -> Self {
        Self {
            premium_taken: Some(None),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = self.role {
            user.role = Some(role);
        }
        if let Some(premium) = self.premium_taken {
            user.premium_taken = premium;
        }
        if let Some(price) = self.price {
            user.price = Some(price);
        }
        if let Some(time) = self.subscribe_time {
            user.subscribe_time = Some(time);
        }
    }
}

/// ModerationAction
///
/// Admin moderation verbs exposed as `PATCH /newses/{action}/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Decline,
    Premium,
}

/// NewsPatch
///
/// The `$set` part of an article update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewsPatch {
    pub status: Option<NewsStatus>,
    pub is_premium: Option<YesNo>,
    pub decline_text: Option<String>,
}

impl NewsPatch {
    /// Declining always drops the premium flag, whatever it was before.
    pub fn for_action(action: ModerationAction) -> Self {
        match action {
            ModerationAction::Approve => Self {
                status: Some(NewsStatus::Approve),
                ..Self::default()
            },
            ModerationAction::Decline => Self {
                status: Some(NewsStatus::Decline),
                is_premium: Some(YesNo::No),
                ..Self::default()
            },
            ModerationAction::Premium => Self {
                is_premium: Some(YesNo::Yes),
                ..Self::default()
            },
        }
    }

    pub fn decline_reason(text: impl Into<String>) -> Self {
        Self {
            decline_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, news: &mut News) {
        if let Some(status) = self.status {
            news.status = status;
        }
        if let Some(flag) = self.is_premium {
            news.is_premium = flag;
        }
        if let Some(text) = &self.decline_text {
            news.decline_text = Some(text.clone());
        }
    }
}

// --- Store Acknowledgements (Output) ---

/// InsertAck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: Option<String>,
}

/// UpdateAck
///
/// `matched_count == 0` is how a missing document shows up; it is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

/// DeleteAck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// DuplicateUser
///
/// Returned instead of inserting when the email is already registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DuplicateUser {
    pub message: String,
    pub inserted_id: Option<String>,
}

/// CreateUserResponse
///
/// Either the insert acknowledgement or `{ "message": "user already exists", "insertedId": null }`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CreateUserResponse {
    Inserted(InsertAck),
    AlreadyExists(DuplicateUser),
}

impl CreateUserResponse {
    pub fn already_exists() -> Self {
        CreateUserResponse::AlreadyExists(DuplicateUser {
            message: "user already exists".to_string(),
            inserted_id: None,
        })
    }
}

// --- Request Payloads (Input) ---

/// SubscribeRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubscribeRequest {
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub subscribe_time: i64,
}

/// DeclineReasonRequest
///
/// Body of `PATCH /newses/{id}`; the field name matches the admin form's textarea.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeclineReasonRequest {
    pub textarea_value: String,
}

/// PaymentIntentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct PaymentIntentRequest {
    /// Decimal amount in the configured currency, e.g. `9.99`.
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
}

// --- Responses (Output) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PremiumStatus {
    pub premium: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// ArticlePage
///
/// One page of a title search. `total` counts every match, not just this page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticlePage {
    pub result: Vec<News>,
    pub total: u64,
}
