use partslink::db;
use partslink::domain::Viewer;
use partslink::domain::errors::ServiceError;
use partslink::models::profile;
use partslink::notify::Notifier;
use partslink::realtime::Hub;
use partslink::services::order_service::{self, ProxyOrder};
use partslink::services::quote_service::{self, NewQuote};
use partslink::services::request_service::{self, NewRequest, RequestFilter};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

// Helper to create a test database with hub and notifier
async fn setup() -> (DatabaseConnection, Hub, Notifier) {
    // In-memory SQLite for testing
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let hub = Hub::new();
    let notifier = Notifier::new(db.clone(), hub.clone());
    (db, hub, notifier)
}

// Helper to create a test profile
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

fn new_request(part_name: &str, vin: Option<&str>) -> NewRequest {
    NewRequest {
        part_name: part_name.to_string(),
        vin: vin.map(String::from),
        vehicle_info: Some("Honda Accord 2018".to_string()),
        notes: None,
        images: vec![],
    }
}

fn quote(total: f64) -> NewQuote {
    NewQuote {
        item_price: 100.0,
        shipping_cost: 20.0,
        service_fee: 5.0,
        total_amount: total,
        currency: Some("USD".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn test_request_lifecycle_to_order() {
    let (db, _hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let agent = create_profile(&db, "agent@test", "agent").await;

    // 1. Customer creates a request
    let request = request_service::create_request(&db, customer, new_request("Brake pads", None))
        .await
        .expect("create request");
    assert_eq!(request.status, "pending");
    assert!(request.agent_id.is_none());

    // 2. Admin assigns the agent; status is untouched
    let request = request_service::assign_agent(&db, &notifier, request.id, agent)
        .await
        .expect("assign agent");
    assert_eq!(request.agent_id, Some(agent));
    assert_eq!(request.status, "pending");

    // 3. Agent quotes; request moves to quoted
    let q = quote_service::create_quote(&db, &notifier, Viewer::Agent(agent), request.id, quote(125.0))
        .await
        .expect("create quote");
    assert_eq!(q.total_amount, 125.0);

    let request = request_service::get_request(&db, Viewer::Admin(0), request.id)
        .await
        .unwrap();
    assert_eq!(request.status, "quoted");

    // 4. Customer accepts; order starts at pending_payment, request at processing
    let order = order_service::accept_quote(&db, &notifier, customer, q.id)
        .await
        .expect("accept quote");
    assert_eq!(order.status, "pending_payment");
    assert_eq!(order.user_id, customer);
    assert_eq!(order.agent_id, Some(agent));

    let request = request_service::get_request(&db, Viewer::Admin(0), request.id)
        .await
        .unwrap();
    assert_eq!(request.status, "processing");
}

#[tokio::test]
async fn test_proxy_order_marks_paid_and_request_processing() {
    let (db, _hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let admin = create_profile(&db, "admin@test", "admin").await;

    let request = request_service::create_request(&db, customer, new_request("Turbocharger", None))
        .await
        .unwrap();

    let q = quote_service::create_quote(
        &db,
        &notifier,
        Viewer::Admin(admin),
        request.id,
        quote(125.0),
    )
    .await
    .unwrap();

    let order = order_service::create_proxy_order(
        &db,
        &notifier,
        ProxyOrder {
            request_id: request.id,
            quote_id: q.id,
            user_id: customer,
            agent_id: None,
        },
    )
    .await
    .expect("proxy order");

    assert_eq!(order.status, "paid");

    let request = request_service::get_request(&db, Viewer::Admin(admin), request.id)
        .await
        .unwrap();
    assert_eq!(request.status, "processing");
}

#[tokio::test]
async fn test_duplicate_order_for_quote_is_a_conflict() {
    let (db, _hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let admin = create_profile(&db, "admin@test", "admin").await;

    let request = request_service::create_request(&db, customer, new_request("Radiator", None))
        .await
        .unwrap();
    let q = quote_service::create_quote(
        &db,
        &notifier,
        Viewer::Admin(admin),
        request.id,
        quote(125.0),
    )
    .await
    .unwrap();

    order_service::accept_quote(&db, &notifier, customer, q.id)
        .await
        .unwrap();

    let err = order_service::create_proxy_order(
        &db,
        &notifier,
        ProxyOrder {
            request_id: request.id,
            quote_id: q.id,
            user_id: customer,
            agent_id: None,
        },
    )
    .await
    .unwrap_err();

    match err {
        ServiceError::Conflict(msg) => {
            assert_eq!(msg, "An order already exists for this quote")
        }
        other => panic!("expected Conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_quote_total_must_sum() {
    let (db, _hub, notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let admin = create_profile(&db, "admin@test", "admin").await;

    let request = request_service::create_request(&db, customer, new_request("Alternator", None))
        .await
        .unwrap();

    let err = quote_service::create_quote(
        &db,
        &notifier,
        Viewer::Admin(admin),
        request.id,
        quote(130.0),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_vin_is_checked_server_side() {
    let (db, _hub, _notifier) = setup().await;
    let customer = create_profile(&db, "customer@test", "customer").await;

    // Too short
    let err = request_service::create_request(&db, customer, new_request("Bumper", Some("ABC")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    // Contains 'O'
    let err = request_service::create_request(
        &db,
        customer,
        new_request("Bumper", Some("1HGBH41JXMN10918O")),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    // Syntax-valid VIN passes even though nobody checks the checksum
    let request = request_service::create_request(
        &db,
        customer,
        new_request("Bumper", Some("1HGBH41JXMN109186")),
    )
    .await
    .expect("valid VIN accepted");
    assert_eq!(request.vin.as_deref(), Some("1HGBH41JXMN109186"));
}

#[tokio::test]
async fn test_visibility_is_role_scoped() {
    let (db, _hub, notifier) = setup().await;

    let customer_a = create_profile(&db, "a@test", "customer").await;
    let customer_b = create_profile(&db, "b@test", "customer").await;
    let agent = create_profile(&db, "agent@test", "agent").await;

    let request = request_service::create_request(&db, customer_a, new_request("Headlight", None))
        .await
        .unwrap();

    // Another customer sees nothing
    let err = request_service::get_request(&db, Viewer::Customer(customer_b), request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    // An unassigned agent sees nothing
    let listed = request_service::list_requests(&db, Viewer::Agent(agent), RequestFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    // After assignment the agent sees it
    request_service::assign_agent(&db, &notifier, request.id, agent)
        .await
        .unwrap();
    let listed = request_service::list_requests(&db, Viewer::Agent(agent), RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    // The owner always sees it
    let got = request_service::get_request(&db, Viewer::Customer(customer_a), request.id)
        .await
        .unwrap();
    assert_eq!(got.id, request.id);
}

#[tokio::test]
async fn test_customer_may_only_cancel() {
    let (db, _hub, _notifier) = setup().await;

    let customer = create_profile(&db, "customer@test", "customer").await;
    let request = request_service::create_request(&db, customer, new_request("Wing mirror", None))
        .await
        .unwrap();

    use partslink::domain::status::RequestStatus;

    let err = request_service::update_status(
        &db,
        Viewer::Customer(customer),
        request.id,
        RequestStatus::Completed,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    let updated = request_service::update_status(
        &db,
        Viewer::Customer(customer),
        request.id,
        RequestStatus::Cancelled,
    )
    .await
    .expect("owner can cancel");
    assert_eq!(updated.status, "cancelled");
}
