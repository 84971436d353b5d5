use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

use crate::config::Config;
use crate::notify::Notifier;
use crate::realtime::Hub;

/// Shared application context, created once at startup and torn down with
/// the server. Handlers receive it via axum state.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub hub: Hub,
    pub notifier: Notifier,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let hub = Hub::new();
        let notifier = Notifier::new(db.clone(), hub.clone());
        Self {
            db,
            hub,
            notifier,
            config,
        }
    }
}

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Create profiles table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'customer',
            full_name TEXT NOT NULL,
            phone TEXT,
            country TEXT,
            suspended BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create sourcing_requests table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS sourcing_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            agent_id INTEGER,
            part_name TEXT NOT NULL,
            vin TEXT,
            vehicle_info TEXT,
            notes TEXT,
            images TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES profiles(id),
            FOREIGN KEY (agent_id) REFERENCES profiles(id) ON DELETE SET NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sourcing_requests_user_id ON sourcing_requests(user_id);
        CREATE INDEX IF NOT EXISTS idx_sourcing_requests_agent_id ON sourcing_requests(agent_id);
        CREATE INDEX IF NOT EXISTS idx_sourcing_requests_status ON sourcing_requests(status);
        "#
        .to_owned(),
    ))
    .await?;

    // Create quotes table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS quotes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            request_id INTEGER NOT NULL,
            item_price REAL NOT NULL,
            shipping_cost REAL NOT NULL,
            service_fee REAL NOT NULL,
            total_amount REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (request_id) REFERENCES sourcing_requests(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_quotes_request_id ON quotes(request_id);
        "#
        .to_owned(),
    ))
    .await?;

    // Create orders table. One order per quote, enforced by the unique
    // constraint; user_id is deliberately not cascading so deleting a
    // profile with orders fails loudly.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            quote_id INTEGER NOT NULL UNIQUE,
            agent_id INTEGER,
            status TEXT NOT NULL DEFAULT 'pending_payment',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES profiles(id),
            FOREIGN KEY (quote_id) REFERENCES quotes(id),
            FOREIGN KEY (agent_id) REFERENCES profiles(id) ON DELETE SET NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id);
        CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
        "#
        .to_owned(),
    ))
    .await?;

    // Create shipments table (0..1 per order)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS shipments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL UNIQUE,
            tracking_number TEXT NOT NULL,
            freight_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'received_at_hub',
            origin_hub TEXT NOT NULL,
            destination_hub TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (order_id) REFERENCES orders(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_shipments_status ON shipments(status);
        "#
        .to_owned(),
    ))
    .await?;

    // Create shipment_events table. Append-only: no update or delete path
    // exists anywhere in the code.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS shipment_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shipment_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            location TEXT NOT NULL,
            description TEXT,
            occurred_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (shipment_id) REFERENCES shipments(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_shipment_events_shipment_id ON shipment_events(shipment_id);
        "#
        .to_owned(),
    ))
    .await?;

    // Create notifications table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'system',
            read BOOLEAN NOT NULL DEFAULT 0,
            link TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_notifications_user_id ON notifications(user_id);
        CREATE INDEX IF NOT EXISTS idx_notifications_read ON notifications(read);
        "#
        .to_owned(),
    ))
    .await?;

    // Create messages table. NULL recipient means the general support
    // inbox, claimable by any admin. client_ref is the idempotency key
    // echoed back in realtime events so optimistic clients reconcile by
    // exact match instead of guessing on sender+content.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL,
            recipient_id INTEGER,
            content TEXT NOT NULL,
            client_ref TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (sender_id, client_ref),
            FOREIGN KEY (sender_id) REFERENCES profiles(id) ON DELETE CASCADE,
            FOREIGN KEY (recipient_id) REFERENCES profiles(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_messages_sender_id ON messages(sender_id);
        CREATE INDEX IF NOT EXISTS idx_messages_recipient_id ON messages(recipient_id);
        "#
        .to_owned(),
    ))
    .await?;

    // Create request_messages table (per-request thread)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS request_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            request_id INTEGER NOT NULL,
            sender_id INTEGER NOT NULL,
            message TEXT NOT NULL,
            client_ref TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (sender_id, client_ref),
            FOREIGN KEY (request_id) REFERENCES sourcing_requests(id) ON DELETE CASCADE,
            FOREIGN KEY (sender_id) REFERENCES profiles(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_request_messages_request_id ON request_messages(request_id);
        "#
        .to_owned(),
    ))
    .await?;

    // Create broadcast_history table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS broadcast_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            admin_id INTEGER,
            recipient_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY (admin_id) REFERENCES profiles(id) ON DELETE SET NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create audit_logs table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            actor_id INTEGER,
            action TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id INTEGER,
            detail TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (actor_id) REFERENCES profiles(id) ON DELETE SET NULL
        );
        CREATE INDEX IF NOT EXISTS idx_audit_logs_actor_id ON audit_logs(actor_id);
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}
