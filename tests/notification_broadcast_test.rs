use partslink::db;
use partslink::domain::status::NotificationKind;
use partslink::models::{broadcast_history, notification, profile};
use partslink::realtime::Hub;
use partslink::services::notification_service;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

async fn setup() -> (DatabaseConnection, Hub) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    (db, Hub::new())
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

#[tokio::test]
async fn test_broadcast_recipient_count_matches_rows() {
    let (db, hub) = setup().await;

    let admin = create_profile(&db, "admin@test", "admin").await;
    for i in 0..4 {
        create_profile(&db, &format!("user{}@test", i), "customer").await;
    }

    let recipients =
        notification_service::broadcast(&db, &hub, admin, "Maintenance", "Back at 02:00 UTC")
            .await
            .expect("broadcast");

    // admin + 4 customers
    assert_eq!(recipients, 5);

    let rows = notification::Entity::find().count(&db).await.unwrap();
    assert_eq!(rows, 5);

    let history = broadcast_history::Entity::find()
        .all(&db)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].recipient_count, 5);
    assert_eq!(history[0].admin_id, Some(admin));

    // Every row is an unread system notification with identical content
    let all = notification::Entity::find().all(&db).await.unwrap();
    assert!(all.iter().all(|n| n.kind == "system" && !n.read));
    assert!(all.iter().all(|n| n.title == "Maintenance"));
}

#[tokio::test]
async fn test_push_publishes_on_the_user_channel() {
    let (db, hub) = setup().await;
    let user = create_profile(&db, "user@test", "customer").await;

    let mut rx = hub.subscribe(&format!("user:{}", user));

    let saved = notification_service::push(
        &db,
        &hub,
        user,
        NotificationKind::Order,
        "Order update",
        "Your order is on its way",
        None,
    )
    .await
    .expect("push");
    assert!(!saved.read);

    let text = rx.try_recv().expect("insert event delivered");
    let event: partslink::realtime::Event = serde_json::from_str(&text).unwrap();
    assert_eq!(event.kind, "insert");
    assert_eq!(event.table.as_deref(), Some("notifications"));
    assert_eq!(event.payload["title"], "Order update");
}

#[tokio::test]
async fn test_unread_count_and_read_flags() {
    let (db, hub) = setup().await;
    let user = create_profile(&db, "user@test", "customer").await;
    let other = create_profile(&db, "other@test", "customer").await;

    for i in 0..3 {
        notification_service::push(
            &db,
            &hub,
            user,
            NotificationKind::System,
            &format!("n{}", i),
            "body",
            None,
        )
        .await
        .unwrap();
    }
    notification_service::push(&db, &hub, other, NotificationKind::System, "x", "y", None)
        .await
        .unwrap();

    assert_eq!(notification_service::unread_count(&db, user).await.unwrap(), 3);

    let first = notification_service::list(&db, user).await.unwrap()[0].clone();
    let updated = notification_service::mark_read(&db, &hub, user, first.id)
        .await
        .unwrap();
    assert!(updated.read);
    assert_eq!(notification_service::unread_count(&db, user).await.unwrap(), 2);

    // Cannot mark someone else's notification
    let foreign = notification_service::list(&db, other).await.unwrap()[0].clone();
    assert!(
        notification_service::mark_read(&db, &hub, user, foreign.id)
            .await
            .is_err()
    );

    let flipped = notification_service::mark_all_read(&db, &hub, user)
        .await
        .unwrap();
    assert_eq!(flipped, 2);
    assert_eq!(notification_service::unread_count(&db, user).await.unwrap(), 0);

    // The other user's unread notification is untouched
    assert_eq!(
        notification_service::unread_count(&db, other).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_broadcast_with_no_profiles_fans_out_nothing() {
    let (db, hub) = setup().await;

    // admin_id 1 does not exist; the history row is best-effort and the
    // broadcast itself must still succeed with zero recipients
    let recipients = notification_service::broadcast(&db, &hub, 1, "Hello", "anyone?")
        .await
        .expect("broadcast on empty profile table");
    assert_eq!(recipients, 0);

    let rows = notification::Entity::find()
        .filter(notification::Column::Kind.eq("system"))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}
