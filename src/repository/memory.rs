use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{RepoResult, Repository, parse_object_id};
use crate::models::{
    DeleteAck, InsertAck, News, NewsContent, NewsPatch, Payment, Publisher, UpdateAck, User,
    UserPatch,
};

/// InMemoryRepository
///
/// Process-local `Repository` with the same observable behavior as `MongoRepository`:
/// generated object ids, first-match updates, acknowledgement counts and upserts.
/// Used when no database is configured in `Env::Local`, and by the tests.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<Vec<User>>,
    publishers: RwLock<Vec<Publisher>>,
    newses: RwLock<Vec<News>>,
    payments: RwLock<Vec<Payment>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts articles directly, keeping any ids they already carry.
    pub async fn seed_news(&self, items: impl IntoIterator<Item = News>) -> Vec<String> {
        let mut newses = self.newses.write().await;
        let mut ids = Vec::new();
        for mut news in items {
            let id = news.id.clone().unwrap_or_else(new_id);
            news.id = Some(id.clone());
            newses.push(news);
            ids.push(id);
        }
        ids
    }
}

fn new_id() -> String {
    ObjectId::new().to_hex()
}

fn inserted(id: String) -> InsertAck {
    InsertAck {
        acknowledged: true,
        inserted_id: Some(id),
    }
}

fn title_matches(news: &News, needle: &str) -> bool {
    news.title.to_lowercase().contains(needle)
}

/// Applies `apply` to the first item selected by `matches`, reporting like an `updateOne`.
fn update_first<T, M, A>(items: &mut [T], matches: M, apply: A) -> UpdateAck
where
    T: Clone + PartialEq,
    M: Fn(&T) -> bool,
    A: FnOnce(&mut T),
{
    match items.iter_mut().find(|item| matches(item)) {
        Some(item) => {
            let before = item.clone();
            apply(item);
            UpdateAck {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(*item != before),
                ..UpdateAck::default()
            }
        }
        None => UpdateAck {
            acknowledged: true,
            ..UpdateAck::default()
        },
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, mut user: User) -> RepoResult<InsertAck> {
        let id = new_id();
        user.id = Some(id.clone());
        self.users.write().await.push(user);
        Ok(inserted(id))
    }

    async fn update_user_by_id(&self, id: &str, patch: UserPatch) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?.to_hex();
        let mut users = self.users.write().await;
        Ok(update_first(
            users.as_mut_slice(),
            |u| u.id.as_deref() == Some(oid.as_str()),
            |u| patch.apply_to(u),
        ))
    }

    async fn update_user_by_email(&self, email: &str, patch: UserPatch) -> RepoResult<UpdateAck> {
        let mut users = self.users.write().await;
        Ok(update_first(users.as_mut_slice(), |u| u.email == email, |u| patch.apply_to(u)))
    }

    async fn insert_publisher(&self, mut publisher: Publisher) -> RepoResult<InsertAck> {
        let id = new_id();
        publisher.id = Some(id.clone());
        self.publishers.write().await.push(publisher);
        Ok(inserted(id))
    }

    async fn list_publishers(&self) -> RepoResult<Vec<Publisher>> {
        Ok(self.publishers.read().await.clone())
    }

    async fn insert_news(&self, mut news: News) -> RepoResult<InsertAck> {
        let id = new_id();
        news.id = Some(id.clone());
        self.newses.write().await.push(news);
        Ok(inserted(id))
    }

    async fn list_news(&self) -> RepoResult<Vec<News>> {
        Ok(self.newses.read().await.clone())
    }

    async fn find_news(&self, id: &str) -> RepoResult<Option<News>> {
        let oid = parse_object_id(id)?.to_hex();
        let newses = self.newses.read().await;
        Ok(newses
            .iter()
            .find(|n| n.id.as_deref() == Some(oid.as_str()))
            .cloned())
    }

    async fn count_news_by_title(&self, search: &str) -> RepoResult<u64> {
        let needle = search.to_lowercase();
        let newses = self.newses.read().await;
        Ok(newses.iter().filter(|n| title_matches(n, &needle)).count() as u64)
    }

    async fn find_news_by_title(
        &self,
        search: &str,
        offset: u64,
        limit: Option<i64>,
    ) -> RepoResult<Vec<News>> {
        let needle = search.to_lowercase();
        // A zero limit means "no limit", as in the driver.
        let take = match limit {
            Some(l) if l != 0 => l.unsigned_abs() as usize,
            _ => usize::MAX,
        };
        let newses = self.newses.read().await;
        Ok(newses
            .iter()
            .filter(|n| title_matches(n, &needle))
            .skip(offset as usize)
            .take(take)
            .cloned()
            .collect())
    }

    async fn update_news(&self, id: &str, patch: NewsPatch) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?.to_hex();
        let mut newses = self.newses.write().await;
        Ok(update_first(
            newses.as_mut_slice(),
            |n| n.id.as_deref() == Some(oid.as_str()),
            |n| patch.apply_to(n),
        ))
    }

    async fn increment_view_count(&self, id: &str) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?.to_hex();
        let mut newses = self.newses.write().await;
        Ok(update_first(
            newses.as_mut_slice(),
            |n| n.id.as_deref() == Some(oid.as_str()),
            |n| n.view_count += 1,
        ))
    }

    async fn upsert_news(&self, id: &str, content: NewsContent) -> RepoResult<UpdateAck> {
        let oid = parse_object_id(id)?.to_hex();
        let mut newses = self.newses.write().await;

        if newses.iter().any(|n| n.id.as_deref() == Some(oid.as_str())) {
            return Ok(update_first(
                newses.as_mut_slice(),
                |n| n.id.as_deref() == Some(oid.as_str()),
                |n| content.apply_to(n),
            ));
        }

        let mut news = News {
            id: Some(oid.clone()),
            ..News::default()
        };
        content.apply_to(&mut news);
        newses.push(news);
        Ok(UpdateAck {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(oid),
        })
    }

    async fn delete_news(&self, id: &str) -> RepoResult<DeleteAck> {
        let oid = parse_object_id(id)?.to_hex();
        let mut newses = self.newses.write().await;
        let deleted_count = match newses
            .iter()
            .position(|n| n.id.as_deref() == Some(oid.as_str()))
        {
            Some(index) => {
                newses.remove(index);
                1
            }
            None => 0,
        };
        Ok(DeleteAck {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn insert_payment(&self, mut payment: Payment) -> RepoResult<InsertAck> {
        let id = new_id();
        payment.id = Some(id.clone());
        self.payments.write().await.push(payment);
        Ok(inserted(id))
    }

    async fn list_payments_by_email(&self, email: &str) -> RepoResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.iter().filter(|p| p.email == email).cloned().collect())
    }
}
