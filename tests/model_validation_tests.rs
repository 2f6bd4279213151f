use anolipi_server::{
    auth::IdentityClaims,
    handlers::ArticleQuery,
    models::{
        ArticlePage, CreateUserResponse, InsertAck, News, NewsContent, NewsStatus, Payment,
        PaymentIntentRequest, Publisher, Role, User, UserPatch, YesNo,
    },
    validation::Validate,
};
use serde_json::json;

// --- Serde Shapes ---

#[test]
fn test_news_deserializes_client_payload_with_defaults() {
    let news: News = serde_json::from_value(json!({
        "title": "Budget",
        "description": "Numbers",
        "tags": ["economy"],
        "newsImage": "https://img/budget.png",
        "publisherName": "Daily Star",
        "authorName": "Rahim",
        "authorEmail": "rahim@anolipi.com"
    }))
    .unwrap();

    assert_eq!(news.status, NewsStatus::Pending);
    assert_eq!(news.is_premium, YesNo::No);
    assert_eq!(news.view_count, 0);
    assert_eq!(news.news_image.as_deref(), Some("https://img/budget.png"));
}

#[test]
fn test_news_serializes_stored_vocabulary() {
    let news = News {
        id: Some("65f0c0ffee0000000000beef".to_string()),
        title: "T".to_string(),
        status: NewsStatus::Decline,
        is_premium: YesNo::Yes,
        view_count: 4,
        ..News::default()
    };

    let value = serde_json::to_value(&news).unwrap();

    assert_eq!(value["_id"], "65f0c0ffee0000000000beef");
    assert_eq!(value["status"], "Decline");
    assert_eq!(value["isPremium"], "Yes");
    assert_eq!(value["viewCount"], 4);
    assert_eq!(
        serde_json::to_value(NewsStatus::Pending).unwrap(),
        json!("pending")
    );
}

#[test]
fn test_user_premium_flag_serializes_null_after_clear() {
    let mut user = User {
        email: "a@b.com".to_string(),
        role: Some(Role::Admin),
        premium_taken: Some(YesNo::Yes),
        ..User::default()
    };
    UserPatch::clear_premium().apply_to(&mut user);

    let value = serde_json::to_value(&user).unwrap();

    assert_eq!(value["premiumTaken"], serde_json::Value::Null);
    assert!(value.as_object().unwrap().contains_key("premiumTaken"));
    assert_eq!(value["role"], "admin");
    assert!(!user.has_premium());
    assert!(user.is_admin());
}

#[test]
fn test_publisher_folds_photo_into_logo() {
    let publisher: Publisher =
        serde_json::from_value(json!({ "name": "Star", "photo": "https://img/star.png" }))
            .unwrap();

    let publisher = publisher.normalized();
    assert_eq!(publisher.logo, "https://img/star.png");
    assert_eq!(publisher.photo, None);
    assert_eq!(
        serde_json::to_value(&publisher).unwrap(),
        json!({ "name": "Star", "logo": "https://img/star.png" })
    );
}

#[test]
fn test_publisher_logo_wins_over_photo() {
    let publisher: Publisher = serde_json::from_value(json!({
        "name": "Star",
        "logo": "https://img/logo.png",
        "photo": "https://img/photo.png"
    }))
    .unwrap();

    assert_eq!(publisher.normalized().logo, "https://img/logo.png");
}

#[test]
fn test_create_user_response_shapes() {
    let inserted = CreateUserResponse::Inserted(InsertAck {
        acknowledged: true,
        inserted_id: Some("65f0c0ffee0000000000beef".to_string()),
    });

    assert_eq!(
        serde_json::to_value(inserted).unwrap(),
        json!({ "acknowledged": true, "insertedId": "65f0c0ffee0000000000beef" })
    );
    assert_eq!(
        serde_json::to_value(CreateUserResponse::already_exists()).unwrap(),
        json!({ "message": "user already exists", "insertedId": null })
    );
}

#[test]
fn test_article_page_shape() {
    let page = ArticlePage {
        result: vec![],
        total: 3,
    };

    assert_eq!(
        serde_json::to_value(page).unwrap(),
        json!({ "result": [], "total": 3 })
    );
}

#[test]
fn test_news_content_overwrites_only_content() {
    let mut news = News {
        title: "Old".to_string(),
        news_image: Some("https://img/old.png".to_string()),
        status: NewsStatus::Approve,
        view_count: 9,
        ..News::default()
    };
    let content = NewsContent {
        title: "New".to_string(),
        description: "D".to_string(),
        ..NewsContent::default()
    };

    content.apply_to(&mut news);

    assert_eq!(news.title, "New");
    assert_eq!(news.news_image.as_deref(), Some("https://img/old.png"));
    assert_eq!(news.status, NewsStatus::Approve);
    assert_eq!(news.view_count, 9);
}

#[test]
fn test_identity_claims_keep_extra_fields() {
    let claims: IdentityClaims =
        serde_json::from_value(json!({ "email": "a@b.com", "uid": "firebase-uid" })).unwrap();

    assert_eq!(claims.claim("email"), Some("a@b.com"));
    assert_eq!(claims.claim("uid"), Some("firebase-uid"));
    assert_eq!(
        serde_json::to_value(&claims).unwrap(),
        json!({ "email": "a@b.com", "uid": "firebase-uid" })
    );
}

// --- Validation ---

#[test]
fn test_user_requires_email() {
    let valid = User {
        email: "a@b.com".to_string(),
        ..User::default()
    };
    let missing = User::default();
    let malformed = User {
        email: "not-an-email".to_string(),
        ..User::default()
    };

    assert!(valid.validate().is_ok());
    assert!(missing.validate().is_err());
    assert!(malformed.validate().is_err());
}

#[test]
fn test_news_requires_title_and_description() {
    let valid = News {
        title: "T".to_string(),
        description: "D".to_string(),
        ..News::default()
    };
    let empty_title = News {
        title: String::new(),
        ..valid.clone()
    };
    let negative_views = News {
        view_count: -1,
        ..valid.clone()
    };

    assert!(valid.validate().is_ok());
    assert!(empty_title.validate().is_err());
    assert!(negative_views.validate().is_err());
}

#[test]
fn test_payment_validation() {
    let valid = Payment {
        email: "a@b.com".to_string(),
        price: 9.99,
        transaction_id: "pi_123".to_string(),
        ..Payment::default()
    };

    assert!(valid.validate().is_ok());
    assert!(
        Payment {
            price: -1.0,
            ..valid.clone()
        }
        .validate()
        .is_err()
    );
    assert!(
        Payment {
            transaction_id: String::new(),
            ..valid
        }
        .validate()
        .is_err()
    );
}

#[test]
fn test_payment_intent_requires_positive_price() {
    assert!(PaymentIntentRequest { price: 0.5 }.validate().is_ok());
    assert!(PaymentIntentRequest { price: 0.0 }.validate().is_err());
    assert!(PaymentIntentRequest { price: -2.0 }.validate().is_err());
}

#[test]
fn test_article_query_rejects_negative_paging() {
    let query = |limit, offset| ArticleQuery {
        search: Some("dhaka".to_string()),
        limit,
        offset,
    };

    assert!(query(None, None).validate().is_ok());
    assert!(query(Some(0), Some(10)).validate().is_ok());
    assert!(query(Some(-5), None).validate().is_err());
    assert!(query(None, Some(-1)).validate().is_err());
}

#[test]
fn test_identity_claims_require_valid_email() {
    assert!(IdentityClaims::new("a@b.com").validate().is_ok());
    assert!(IdentityClaims::new("").validate().is_err());
    assert!(IdentityClaims::new("no-at-sign").validate().is_err());
}
