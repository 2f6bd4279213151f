use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::models::{
    DeleteAck, InsertAck, News, NewsContent, NewsPatch, Payment, Publisher, UpdateAck, User,
    UserPatch,
};

pub mod memory;
pub mod mongo;

pub use memory::InMemoryRepository;
pub use mongo::MongoRepository;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The id is not a 24-character hex object id. Checked before any store call.
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
    #[error("failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// parse_object_id
///
/// Both implementations address documents by object id, so both reject the same inputs.
pub fn parse_object_id(id: &str) -> RepoResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| RepoError::InvalidId(id.to_string()))
}

/// Repository Trait
///
/// One method per store operation the API performs. Every method is a single
/// find/insert/update/delete; none of them reads and writes in one call, so the
/// duplicate-email check and the admin lookup are not atomic with what follows.
///
/// Updates report what the store did (`UpdateAck`) rather than failing when nothing
/// matched.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn insert_user(&self, user: User) -> RepoResult<InsertAck>;
    async fn update_user_by_id(&self, id: &str, patch: UserPatch) -> RepoResult<UpdateAck>;
    async fn update_user_by_email(&self, email: &str, patch: UserPatch) -> RepoResult<UpdateAck>;

    // --- Publishers ---
    async fn insert_publisher(&self, publisher: Publisher) -> RepoResult<InsertAck>;
    async fn list_publishers(&self) -> RepoResult<Vec<Publisher>>;

    // --- News ---
    async fn insert_news(&self, news: News) -> RepoResult<InsertAck>;
    async fn list_news(&self) -> RepoResult<Vec<News>>;
    async fn find_news(&self, id: &str) -> RepoResult<Option<News>>;
    /// Counts articles whose title contains `search`, ignoring case.
    async fn count_news_by_title(&self, search: &str) -> RepoResult<u64>;
    /// Same match as `count_news_by_title`, in store order, after skipping `offset`
    /// and keeping at most `limit` (all when `None`).
    async fn find_news_by_title(
        &self,
        search: &str,
        offset: u64,
        limit: Option<i64>,
    ) -> RepoResult<Vec<News>>;
    async fn update_news(&self, id: &str, patch: NewsPatch) -> RepoResult<UpdateAck>;
    async fn increment_view_count(&self, id: &str) -> RepoResult<UpdateAck>;
    /// Writes the content fields of article `id`, creating it under that id if absent.
    async fn upsert_news(&self, id: &str, content: NewsContent) -> RepoResult<UpdateAck>;
    async fn delete_news(&self, id: &str) -> RepoResult<DeleteAck>;

    // --- Payments ---
    async fn insert_payment(&self, payment: Payment) -> RepoResult<InsertAck>;
    async fn list_payments_by_email(&self, email: &str) -> RepoResult<Vec<Payment>>;
}

/// RepositoryState
///
/// The store handle shared through `AppState`. Built once in `main`.
pub type RepositoryState = Arc<dyn Repository>;
