use partslink::db;
use partslink::domain::Viewer;
use partslink::domain::errors::ServiceError;
use partslink::models::profile;
use partslink::notify::Notifier;
use partslink::realtime::{Event, Hub};
use partslink::services::message_service::{self, NewMessage, NewRequestMessage};
use partslink::services::request_service::{self, NewRequest};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

async fn setup() -> (DatabaseConnection, Hub, Notifier) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let hub = Hub::new();
    let notifier = Notifier::new(db.clone(), hub.clone());
    (db, hub, notifier)
}

async fn create_profile(db: &DatabaseConnection, email: &str, role: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let user = profile::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$dummy".to_string()),
        role: Set(role.to_string()),
        full_name: Set(format!("Test {}", role)),
        suspended: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    user.insert(db).await.expect("Failed to create profile").id
}

async fn create_request(db: &DatabaseConnection, user_id: i32) -> i32 {
    request_service::create_request(
        db,
        user_id,
        NewRequest {
            part_name: "Oil filter".to_string(),
            vin: None,
            vehicle_info: None,
            notes: None,
            images: vec![],
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_thread_event_echoes_client_ref() {
    let (db, hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let request_id = create_request(&db, customer).await;

    // Client B subscribed to the thread
    let mut rx = hub.subscribe(&format!("request:{}", request_id));

    let saved = message_service::send_request_message(
        &db,
        &hub,
        &notifier,
        Viewer::Customer(customer),
        request_id,
        NewRequestMessage {
            message: "Any news on the filter?".to_string(),
            client_ref: Some("tmp-a1b2c3".to_string()),
        },
    )
    .await
    .expect("send");

    assert_eq!(saved.client_ref, "tmp-a1b2c3");

    // The realtime insert carries the exact reconciliation key, so an
    // optimistic copy matches by key instead of guessing on content.
    let text = rx.try_recv().expect("insert event delivered");
    let event: Event = serde_json::from_str(&text).unwrap();
    assert_eq!(event.kind, "insert");
    assert_eq!(event.payload["client_ref"], "tmp-a1b2c3");
    assert_eq!(event.payload["id"], saved.id);
}

#[tokio::test]
async fn test_duplicate_client_ref_is_rejected() {
    let (db, hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let request_id = create_request(&db, customer).await;

    let send = |msg: &str| NewRequestMessage {
        message: msg.to_string(),
        client_ref: Some("tmp-same".to_string()),
    };

    message_service::send_request_message(
        &db,
        &hub,
        &notifier,
        Viewer::Customer(customer),
        request_id,
        send("first"),
    )
    .await
    .unwrap();

    // A retry with the same key must not produce a second row
    let err = message_service::send_request_message(
        &db,
        &hub,
        &notifier,
        Viewer::Customer(customer),
        request_id,
        send("first again"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let rows = message_service::list_request_messages(
        &db,
        Viewer::Customer(customer),
        request_id,
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_thread_is_participants_only() {
    let (db, hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let stranger = create_profile(&db, "stranger@test", "customer").await;
    let admin = create_profile(&db, "admin@test", "admin").await;
    let request_id = create_request(&db, customer).await;

    let err = message_service::send_request_message(
        &db,
        &hub,
        &notifier,
        Viewer::Customer(stranger),
        request_id,
        NewRequestMessage {
            message: "let me in".to_string(),
            client_ref: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    // Admin posts fine
    message_service::send_request_message(
        &db,
        &hub,
        &notifier,
        Viewer::Admin(admin),
        request_id,
        NewRequestMessage {
            message: "We are on it".to_string(),
            client_ref: None,
        },
    )
    .await
    .expect("admin can post");

    let err =
        message_service::list_request_messages(&db, Viewer::Customer(stranger), request_id)
            .await
            .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}

#[tokio::test]
async fn test_support_inbox_for_admins() {
    let (db, hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let admin = create_profile(&db, "admin@test", "admin").await;

    let mut support_rx = hub.subscribe("support");

    // No recipient: lands in the support inbox
    message_service::send_message(
        &db,
        &hub,
        &notifier,
        Viewer::Customer(customer),
        NewMessage {
            recipient_id: None,
            content: "My VIN lookup keeps failing".to_string(),
            client_ref: None,
        },
    )
    .await
    .unwrap();

    assert!(support_rx.try_recv().is_ok());

    let inbox = message_service::list_messages(&db, Viewer::Admin(admin), None)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].recipient_id.is_none());

    // Admin replies directly; the customer sees both directions
    message_service::send_message(
        &db,
        &hub,
        &notifier,
        Viewer::Admin(admin),
        NewMessage {
            recipient_id: Some(customer),
            content: "Looking into it".to_string(),
            client_ref: None,
        },
    )
    .await
    .unwrap();

    let conversation =
        message_service::list_messages(&db, Viewer::Customer(customer), Some(admin))
            .await
            .unwrap();
    assert_eq!(conversation.len(), 1);

    let mine = message_service::list_messages(&db, Viewer::Customer(customer), None)
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let (db, hub, notifier) = setup().await;
    let customer = create_profile(&db, "customer@test", "customer").await;

    let err = message_service::send_message(
        &db,
        &hub,
        &notifier,
        Viewer::Customer(customer),
        NewMessage {
            recipient_id: None,
            content: "   ".to_string(),
            client_ref: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
