//! Business logic without the HTTP layer.

pub mod admin_service;
pub mod message_service;
pub mod notification_service;
pub mod order_service;
pub mod quote_service;
pub mod request_service;
pub mod shipment_service;
