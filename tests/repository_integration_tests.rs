use anolipi_server::{
    InMemoryRepository,
    models::{
        ModerationAction, News, NewsContent, NewsPatch, NewsStatus, Payment, Publisher, Role, User,
        UserPatch, YesNo,
    },
    repository::{
        RepoError, Repository, parse_object_id,
        mongo::{news_content_document, news_update_document, title_filter, user_update_document},
    },
};
use mongodb::bson::{Bson, doc};

fn titled(title: &str) -> News {
    News {
        title: title.to_string(),
        description: "body".to_string(),
        ..News::default()
    }
}

// --- Object Ids ---

#[test]
fn test_parse_object_id_accepts_hex() {
    let oid = parse_object_id("65f0c0ffee0000000000beef").unwrap();
    assert_eq!(oid.to_hex(), "65f0c0ffee0000000000beef");
}

#[test]
fn test_parse_object_id_rejects_malformed() {
    for id in ["", "abc", "65f0c0ffee0000000000beefX", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
        assert!(matches!(parse_object_id(id), Err(RepoError::InvalidId(_))), "{}", id);
    }
}

// --- Document Builders ---

#[test]
fn test_title_filter_escapes_and_ignores_case() {
    let filter = title_filter("C++ (2025)");

    assert_eq!(
        filter,
        doc! { "title": { "$regex": r"C\+\+ \(2025\)", "$options": "i" } }
    );
}

#[test]
fn test_user_update_document_sets_only_given_fields() {
    assert_eq!(
        user_update_document(&UserPatch::promote_admin()),
        doc! { "$set": { "role": "admin" } }
    );
    assert_eq!(
        user_update_document(&UserPatch::take_premium()),
        doc! { "$set": { "premiumTaken": "Yes" } }
    );
    assert_eq!(
        user_update_document(&UserPatch::clear_premium()),
        doc! { "$set": { "premiumTaken": Bson::Null } }
    );
}

#[test]
fn test_user_update_document_for_subscription() {
    let update = user_update_document(&UserPatch::subscribe("a@b.com", 9.5, 1_700_000_000_000));
    let set = update.get_document("$set").unwrap();

    assert_eq!(set.get_str("email").unwrap(), "a@b.com");
    assert_eq!(set.get_f64("price").unwrap(), 9.5);
    assert_eq!(set.get_i64("subscribeTime").unwrap(), 1_700_000_000_000);
    assert!(!set.contains_key("premiumTaken"));
}

#[test]
fn test_news_update_document_for_moderation() {
    assert_eq!(
        news_update_document(&NewsPatch::for_action(ModerationAction::Approve)),
        doc! { "$set": { "status": "Approve" } }
    );
    assert_eq!(
        news_update_document(&NewsPatch::for_action(ModerationAction::Decline)),
        doc! { "$set": { "status": "Decline", "isPremium": "No" } }
    );
    assert_eq!(
        news_update_document(&NewsPatch::for_action(ModerationAction::Premium)),
        doc! { "$set": { "isPremium": "Yes" } }
    );
    assert_eq!(
        news_update_document(&NewsPatch::decline_reason("Off topic")),
        doc! { "$set": { "declineText": "Off topic" } }
    );
}

#[test]
fn test_news_content_document_leaves_moderation_fields_alone() {
    let content = NewsContent {
        title: "T".to_string(),
        description: "D".to_string(),
        publisher_name: "P".to_string(),
        author_name: "A".to_string(),
        author_email: "a@b.com".to_string(),
        ..NewsContent::default()
    };

    let update = news_content_document(&content).unwrap();
    let set = update.get_document("$set").unwrap();

    assert_eq!(set.get_str("title").unwrap(), "T");
    assert_eq!(set.get_str("publisherName").unwrap(), "P");
    for field in ["status", "isPremium", "viewCount", "_id"] {
        assert!(!set.contains_key(field), "{}", field);
    }
}

// --- In-Memory Store ---

#[tokio::test]
async fn test_memory_insert_assigns_object_ids() {
    let repo = InMemoryRepository::new();

    let ack = repo
        .insert_publisher(Publisher {
            name: "Daily Star".to_string(),
            logo: "https://img/star.png".to_string(),
            ..Publisher::default()
        })
        .await
        .unwrap();

    assert!(ack.acknowledged);
    let id = ack.inserted_id.unwrap();
    assert!(parse_object_id(&id).is_ok());
    let publishers = repo.list_publishers().await.unwrap();
    assert_eq!(publishers[0].id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn test_memory_update_by_email_reports_counts() {
    let repo = InMemoryRepository::new();
    repo.insert_user(User {
        email: "a@b.com".to_string(),
        role: Some(Role::User),
        ..User::default()
    })
    .await
    .unwrap();

    let first = repo
        .update_user_by_email("a@b.com", UserPatch::take_premium())
        .await
        .unwrap();
    let again = repo
        .update_user_by_email("a@b.com", UserPatch::take_premium())
        .await
        .unwrap();
    let missing = repo
        .update_user_by_email("x@b.com", UserPatch::take_premium())
        .await
        .unwrap();

    assert_eq!((first.matched_count, first.modified_count), (1, 1));
    assert_eq!((again.matched_count, again.modified_count), (1, 0));
    assert_eq!((missing.matched_count, missing.modified_count), (0, 0));
    let user = repo.find_user_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(user.premium_taken, Some(YesNo::Yes));
}

#[tokio::test]
async fn test_memory_rejects_malformed_ids() {
    let repo = InMemoryRepository::new();

    assert!(matches!(
        repo.find_news("nope").await,
        Err(RepoError::InvalidId(_))
    ));
    assert!(matches!(
        repo.delete_news("nope").await,
        Err(RepoError::InvalidId(_))
    ));
    assert!(matches!(
        repo.update_user_by_id("nope", UserPatch::promote_admin()).await,
        Err(RepoError::InvalidId(_))
    ));
}

#[tokio::test]
async fn test_memory_title_search_with_paging() {
    let repo = InMemoryRepository::new();
    repo.seed_news(vec![
        titled("Rain in Dhaka"),
        titled("Dhaka traffic"),
        titled("Sylhet tea"),
        titled("dhaka metro"),
    ])
    .await;

    assert_eq!(repo.count_news_by_title("DHAKA").await.unwrap(), 3);

    let page = repo.find_news_by_title("dhaka", 1, Some(1)).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "Dhaka traffic");

    let rest = repo.find_news_by_title("dhaka", 1, None).await.unwrap();
    assert_eq!(rest.len(), 2);

    // A zero limit is no limit.
    let all = repo.find_news_by_title("dhaka", 0, Some(0)).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_memory_moderation_is_idempotent() {
    let repo = InMemoryRepository::new();
    let id = repo.seed_news(vec![titled("Story")]).await.remove(0);

    let approve = NewsPatch::for_action(ModerationAction::Approve);
    let first = repo.update_news(&id, approve.clone()).await.unwrap();
    let second = repo.update_news(&id, approve).await.unwrap();

    assert_eq!(first.modified_count, 1);
    assert_eq!(second.modified_count, 0);
    let news = repo.find_news(&id).await.unwrap().unwrap();
    assert_eq!(news.status, NewsStatus::Approve);
}

#[tokio::test]
async fn test_memory_payments_filter_by_email() {
    let repo = InMemoryRepository::new();
    for email in ["a@b.com", "c@d.com", "a@b.com"] {
        repo.insert_payment(Payment {
            email: email.to_string(),
            price: 1.0,
            transaction_id: "pi".to_string(),
            ..Payment::default()
        })
        .await
        .unwrap();
    }

    assert_eq!(repo.list_payments_by_email("a@b.com").await.unwrap().len(), 2);
    assert!(repo.list_payments_by_email("z@z.com").await.unwrap().is_empty());
}
