use partslink::db;
use partslink::domain::Viewer;
use partslink::domain::errors::ServiceError;
use partslink::domain::status::ShipmentStatus;
use partslink::models::{profile, shipment_event};
use partslink::notify::Notifier;
use partslink::realtime::Hub;
use partslink::services::order_service::{self, ProxyOrder};
use partslink::services::quote_service::{self, NewQuote};
use partslink::services::request_service::{self, NewRequest};
use partslink::services::shipment_service::{self, NewShipment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

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

// Full path to a paid order: request -> quote -> proxy order
async fn paid_order(db: &DatabaseConnection, notifier: &Notifier) -> (i32, i32) {
    let customer = create_profile(db, "customer@test", "customer").await;
    let admin = create_profile(db, "admin@test", "admin").await;

    let request = request_service::create_request(
        db,
        customer,
        NewRequest {
            part_name: "Gearbox".to_string(),
            vin: None,
            vehicle_info: None,
            notes: None,
            images: vec![],
        },
    )
    .await
    .unwrap();

    let q = quote_service::create_quote(
        db,
        notifier,
        Viewer::Admin(admin),
        request.id,
        NewQuote {
            item_price: 100.0,
            shipping_cost: 20.0,
            service_fee: 5.0,
            total_amount: 125.0,
            currency: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    let order = order_service::create_proxy_order(
        db,
        notifier,
        ProxyOrder {
            request_id: request.id,
            quote_id: q.id,
            user_id: customer,
            agent_id: None,
        },
    )
    .await
    .unwrap();

    (order.id, customer)
}

fn new_shipment(order_id: i32) -> NewShipment {
    NewShipment {
        order_id,
        tracking_number: "PL-2024-0001".to_string(),
        freight_type: "sea".to_string(),
        origin_hub: None,
        destination_hub: None,
    }
}

async fn event_count(db: &DatabaseConnection, shipment_id: i32) -> u64 {
    shipment_event::Entity::find()
        .filter(shipment_event::Column::ShipmentId.eq(shipment_id))
        .count(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_every_status_change_appends_one_event() {
    let (db, _hub, notifier) = setup().await;
    let (order_id, _customer) = paid_order(&db, &notifier).await;

    let shipment = shipment_service::create_shipment(&db, &notifier, new_shipment(order_id))
        .await
        .expect("create shipment");
    assert_eq!(shipment.status, "received_at_hub");
    assert_eq!(shipment.origin_hub, "Origin Hub");
    assert_eq!(event_count(&db, shipment.id).await, 1);

    let steps = [
        (ShipmentStatus::InTransitSea, "Port of Jebel Ali"),
        (ShipmentStatus::ClearingCustoms, "Destination port"),
        (ShipmentStatus::ReadyForPickup, "Destination Hub"),
        (ShipmentStatus::Delivered, "Destination Hub"),
    ];

    for (i, (status, location)) in steps.iter().enumerate() {
        let updated = shipment_service::update_status(
            &db,
            &notifier,
            shipment.id,
            *status,
            location.to_string(),
            Some(format!("Step {}", i + 1)),
        )
        .await
        .expect("status update");
        assert_eq!(updated.status, status.as_str());

        // updates + 1 for creation
        assert_eq!(event_count(&db, shipment.id).await, i as u64 + 2);
    }

    // The log records each status in order, oldest first
    let (_, events) = shipment_service::get_by_order(&db, Viewer::Admin(0), order_id)
        .await
        .unwrap()
        .unwrap();
    let statuses: Vec<&str> = events.iter().map(|e| e.status.as_str()).collect();
    assert_eq!(
        statuses,
        [
            "received_at_hub",
            "in_transit_sea",
            "clearing_customs",
            "ready_for_pickup",
            "delivered"
        ]
    );
}

#[tokio::test]
async fn test_illegal_transitions_are_rejected() {
    let (db, _hub, notifier) = setup().await;
    let (order_id, _customer) = paid_order(&db, &notifier).await;

    let shipment = shipment_service::create_shipment(&db, &notifier, new_shipment(order_id))
        .await
        .unwrap();

    // Skipping straight to delivered is not a thing
    let err = shipment_service::update_status(
        &db,
        &notifier,
        shipment.id,
        ShipmentStatus::Delivered,
        "Somewhere".to_string(),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    // And no event was appended for the rejected update
    assert_eq!(event_count(&db, shipment.id).await, 1);

    // Going backwards is rejected too
    shipment_service::update_status(
        &db,
        &notifier,
        shipment.id,
        ShipmentStatus::InTransitSea,
        "Port".to_string(),
        None,
    )
    .await
    .unwrap();

    let err = shipment_service::update_status(
        &db,
        &notifier,
        shipment.id,
        ShipmentStatus::ReceivedAtHub,
        "Origin Hub".to_string(),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_missing_shipment_is_success_with_none() {
    let (db, _hub, notifier) = setup().await;
    let (order_id, customer) = paid_order(&db, &notifier).await;

    // No shipment yet: Ok(None), never an error
    let found = shipment_service::get_by_order(&db, Viewer::Customer(customer), order_id)
        .await
        .expect("not-found-is-normal");
    assert!(found.is_none());

    shipment_service::create_shipment(&db, &notifier, new_shipment(order_id))
        .await
        .unwrap();

    let found = shipment_service::get_by_order(&db, Viewer::Customer(customer), order_id)
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_shipment_requires_paid_order() {
    let (db, _hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer2@test", "customer").await;
    let admin = create_profile(&db, "admin2@test", "admin").await;

    let request = request_service::create_request(
        &db,
        customer,
        NewRequest {
            part_name: "Suspension kit".to_string(),
            vin: None,
            vehicle_info: None,
            notes: None,
            images: vec![],
        },
    )
    .await
    .unwrap();

    let q = quote_service::create_quote(
        &db,
        &notifier,
        Viewer::Admin(admin),
        request.id,
        NewQuote {
            item_price: 300.0,
            shipping_cost: 50.0,
            service_fee: 10.0,
            total_amount: 360.0,
            currency: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    // Customer-accepted order is still pending_payment
    let order = order_service::accept_quote(&db, &notifier, customer, q.id)
        .await
        .unwrap();

    let err = shipment_service::create_shipment(&db, &notifier, new_shipment(order.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_shipment_moves_order_and_request_forward() {
    let (db, _hub, notifier) = setup().await;
    let (order_id, _customer) = paid_order(&db, &notifier).await;

    shipment_service::create_shipment(&db, &notifier, new_shipment(order_id))
        .await
        .unwrap();

    let order = order_service::get_order(&db, Viewer::Admin(0), order_id)
        .await
        .unwrap();
    assert_eq!(order.status, "processing");

    let requests =
        request_service::list_requests(&db, Viewer::Admin(0), Default::default())
            .await
            .unwrap();
    assert_eq!(requests[0].status, "shipped");
}

#[tokio::test]
async fn test_second_shipment_for_order_is_a_conflict() {
    let (db, _hub, notifier) = setup().await;
    let (order_id, _customer) = paid_order(&db, &notifier).await;

    shipment_service::create_shipment(&db, &notifier, new_shipment(order_id))
        .await
        .unwrap();

    let err = shipment_service::create_shipment(&db, &notifier, new_shipment(order_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}
