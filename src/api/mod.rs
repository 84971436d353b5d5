pub mod admin;
pub mod auth;
pub mod contact;
pub mod health;
pub mod message;
pub mod notification;
pub mod order;
pub mod profile;
pub mod realtime;
pub mod request;
pub mod shipment;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::db::AppState;
use crate::domain::errors::ServiceError;

pub(crate) fn error_response(e: ServiceError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Forbidden => StatusCode::FORBIDDEN,
        ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/profile", put(profile::update_profile))
        // Sourcing requests
        .route(
            "/requests",
            get(request::list_requests).post(request::create_request),
        )
        .route("/requests/:id", get(request::get_request))
        .route("/requests/:id/status", put(request::update_status))
        .route("/requests/:id/assign", put(request::assign_agent))
        .route(
            "/requests/:id/quotes",
            get(request::list_quotes).post(request::create_quote),
        )
        .route(
            "/requests/:id/messages",
            get(message::list_request_messages).post(message::send_request_message),
        )
        // Quotes & orders
        .route("/quotes/:id/accept", post(order::accept_quote))
        .route("/orders", get(order::list_orders))
        .route("/orders/proxy", post(order::create_proxy_order))
        .route("/orders/:id", get(order::get_order))
        .route("/orders/:id/status", put(order::update_status))
        .route("/orders/:id/shipment", get(shipment::get_by_order))
        // Shipments
        .route(
            "/shipments",
            get(shipment::list_shipments).post(shipment::create_shipment),
        )
        .route("/shipments/:id/status", put(shipment::update_status))
        // Messaging
        .route(
            "/messages",
            get(message::list_messages).post(message::send_message),
        )
        // Notifications
        .route("/notifications", get(notification::list_notifications))
        .route(
            "/notifications/unread_count",
            get(notification::unread_count),
        )
        .route("/notifications/read_all", put(notification::mark_all_read))
        .route("/notifications/:id/read", put(notification::mark_read))
        // Admin management
        .route(
            "/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route("/admin/users/:id", delete(admin::delete_user))
        .route("/admin/users/:id/role", put(admin::change_role))
        .route("/admin/users/:id/suspend", put(admin::suspend_user))
        .route("/admin/users/:id/reinstate", put(admin::reinstate_user))
        .route(
            "/admin/users/:id/reset_password",
            post(admin::reset_password),
        )
        .route("/admin/broadcast", post(admin::broadcast))
        .route("/admin/broadcasts", get(admin::list_broadcasts))
        // Contact
        .route("/contact/whatsapp", post(contact::whatsapp_link))
        // Realtime
        .route("/realtime/ws", get(realtime::ws_handler))
        .with_state(state)
}
