use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database,
    bson::{self, Bson, Document, doc},
    results::{DeleteResult, InsertOneResult, UpdateResult},
};
use serde::{Serialize, de::DeserializeOwned};

use super::{RepoResult, Repository, parse_object_id};
use crate::models::{
    DeleteAck, InsertAck, News, NewsContent, NewsPatch, Payment, Publisher, UpdateAck, User,
    UserPatch,
};

/// MongoRepository
///
/// `Repository` backed by the platform's MongoDB database. Collections are untyped
/// (`Document`) so that object ids can be rewritten to hex strings on the way out.
#[derive(Clone)]
pub struct MongoRepository {
    users: Collection<Document>,
    publishers: Collection<Document>,
    newses: Collection<Document>,
    payments: Collection<Document>,
}

impl MongoRepository {
    /// Connects, pings the deployment, and binds the four collections. The client keeps
    /// its own pool and lives for the rest of the process.
    pub async fn connect(uri: &str, db_name: &str) -> RepoResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!(db = db_name, "pinged MongoDB deployment");
        Ok(Self::new(&db))
    }

    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
            publishers: db.collection("publishers"),
            newses: db.collection("newses"),
            payments: db.collection("payments"),
        }
    }
}

// --- Document Builders ---

/// Literal, case-insensitive substring match on `title`.
pub fn title_filter(search: &str) -> Document {
    doc! { "title": { "$regex": regex::escape(search), "$options": "i" } }
}

pub fn user_update_document(patch: &UserPatch) -> Document {
    let mut set = Document::new();
    if let Some(email) = &patch.email {
        set.insert("email", email.as_str());
    }
    if let Some(role) = patch.role {
        set.insert("role", role.as_str());
    }
    if let Some(premium) = patch.premium_taken {
        match premium {
            Some(flag) => set.insert("premiumTaken", flag.as_str()),
            None => set.insert("premiumTaken", Bson::Null),
        };
    }
    if let Some(price) = patch.price {
        set.insert("price", price);
    }
    if let Some(time) = patch.subscribe_time {
        set.insert("subscribeTime", time);
    }
    doc! { "$set": set }
}

pub fn news_update_document(patch: &NewsPatch) -> Document {
    let mut set = Document::new();
    if let Some(status) = patch.status {
        set.insert("status", status.as_str());
    }
    if let Some(flag) = patch.is_premium {
        set.insert("isPremium", flag.as_str());
    }
    if let Some(text) = &patch.decline_text {
        set.insert("declineText", text.as_str());
    }
    doc! { "$set": set }
}

pub fn news_content_document(content: &NewsContent) -> RepoResult<Document> {
    Ok(doc! { "$set": bson::to_document(content)? })
}

/// Serializes a model for insertion. The store assigns `_id`.
fn encode<T: Serialize>(value: &T) -> RepoResult<Document> {
    let mut document = bson::to_document(value)?;
    document.remove("_id");
    Ok(document)
}

/// Deserializes a stored document, exposing its object id as a hex string.
fn decode<T: DeserializeOwned>(mut document: Document) -> RepoResult<T> {
    if let Ok(oid) = document.get_object_id("_id") {
        document.insert("_id", oid.to_hex());
    }
    Ok(bson::from_document(document)?)
}

fn decode_all<T: DeserializeOwned>(documents: Vec<Document>) -> RepoResult<Vec<T>> {
    documents.into_iter().map(decode).collect()
}

fn id_string(id: &Bson) -> Option<String> {
    match id {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn insert_ack(result: InsertOneResult) -> InsertAck {
    InsertAck {
        acknowledged: true,
        inserted_id: id_string(&result.inserted_id),
    }
}

fn update_ack(result: UpdateResult) -> UpdateAck {
    let upserted_id = result.upserted_id.as_ref().and_then(id_string);
    UpdateAck {
        acknowledged: true,
        matched_count: result.matched_count,
        modified_count: result.modified_count,
        upserted_count: u64::from(upserted_id.is_some()),
        upserted_id,
    }
}

fn delete_ack(result: DeleteResult) -> DeleteAck {
    DeleteAck {
        acknowledged: true,
        deleted_count: result.deleted_count,
    }
}

#[async_trait]
impl Repository for MongoRepository {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let documents: Vec<Document> = self.users.find(doc! {}).await?.try_collect().await?;
        decode_all(documents)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.users
            .find_one(doc! { "email": email })
            .await?
            .map(decode)
            .transpose()
    }

    async fn insert_user(&self, user: User) -> RepoResult<InsertAck> {
        let result = self.users.insert_one(encode(&user)?).await?;
        Ok(insert_ack(result))
    }

    async fn update_user_by_id(&self, id: &str, patch: UserPatch) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?;
        let result = self
            .users
            .update_one(doc! { "_id": oid }, user_update_document(&patch))
            .await?;
        Ok(update_ack(result))
    }

    async fn update_user_by_email(&self, email: &str, patch: UserPatch) -> RepoResult<UpdateAck> {
        let result = self
            .users
            .update_one(doc! { "email": email }, user_update_document(&patch))
            .await?;
        Ok(update_ack(result))
    }

    async fn insert_publisher(&self, publisher: Publisher) -> RepoResult<InsertAck> {
        let result = self.publishers.insert_one(encode(&publisher)?).await?;
        Ok(insert_ack(result))
    }

    async fn list_publishers(&self) -> RepoResult<Vec<Publisher>> {
        let documents: Vec<Document> = self.publishers.find(doc! {}).await?.try_collect().await?;
        decode_all(documents)
    }

    async fn insert_news(&self, news: News) -> RepoResult<InsertAck> {
        let result = self.newses.insert_one(encode(&news)?).await?;
        Ok(insert_ack(result))
    }

    async fn list_news(&self) -> RepoResult<Vec<News>> {
        let documents: Vec<Document> = self.newses.find(doc! {}).await?.try_collect().await?;
        decode_all(documents)
    }

    async fn find_news(&self, id: &str) -> RepoResult<Option<News>> {
        let oid = parse_object_id(id)?;
        self.newses
            .find_one(doc! { "_id": oid })
            .await?
            .map(decode)
            .transpose()
    }

    async fn count_news_by_title(&self, search: &str) -> RepoResult<u64> {
        Ok(self.newses.count_documents(title_filter(search)).await?)
    }

    async fn find_news_by_title(
        &self,
        search: &str,
        offset: u64,
        limit: Option<i64>,
    ) -> RepoResult<Vec<News>> {
        let mut find = self.newses.find(title_filter(search)).skip(offset);
        if let Some(limit) = limit {
            find = find.limit(limit);
        }
        let documents: Vec<Document> = find.await?.try_collect().await?;
        decode_all(documents)
    }

    async fn update_news(&self, id: &str, patch: NewsPatch) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?;
        let result = self
            .newses
            .update_one(doc! { "_id": oid }, news_update_document(&patch))
            .await?;
        Ok(update_ack(result))
    }

    async fn increment_view_count(&self, id: &str) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?;
        let result = self
            .newses
            .update_one(doc! { "_id": oid }, doc! { "$inc": { "viewCount": 1 } })
            .await?;
        Ok(update_ack(result))
    }

    async fn upsert_news(&self, id: &str, content: NewsContent) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?;
        let result = self
            .newses
            .update_one(doc! { "_id": oid }, news_content_document(&content)?)
            .upsert(true)
            .await?;
        Ok(update_ack(result))
    }

    async fn delete_news(&self, id: &str) -> RepoResult<DeleteAck> {
        let oid = parse_object_id(id)?;
        let result = self.newses.delete_one(doc! { "_id": oid }).await?;
        Ok(delete_ack(result))
    }

    async fn insert_payment(&self, payment: Payment) -> RepoResult<InsertAck> {
        let result = self.payments.insert_one(encode(&payment)?).await?;
        Ok(insert_ack(result))
    }

    async fn list_payments_by_email(&self, email: &str) -> RepoResult<Vec<Payment>> {
        let documents: Vec<Document> = self
            .payments
            .find(doc! { "email": email })
            .await?
            .try_collect()
            .await?;
        decode_all(documents)
    }
}
