use sea_orm::*;
use serde::Deserialize;

use crate::domain::errors::ServiceError;
use crate::domain::status::{FreightType, NotificationKind, OrderStatus, RequestStatus, ShipmentStatus};
use crate::domain::Viewer;
use crate::models::{order, quote, shipment, shipment_event, sourcing_request};
use crate::notify::Notifier;
use crate::services::order_service;

const DEFAULT_ORIGIN_HUB: &str = "Origin Hub";
const DEFAULT_DESTINATION_HUB: &str = "Destination Hub";

#[derive(Debug, Deserialize)]
pub struct NewShipment {
    pub order_id: i32,
    pub tracking_number: String,
    pub freight_type: String,
    pub origin_hub: Option<String>,
    pub destination_hub: Option<String>,
}

async fn append_event(
    db: &DatabaseConnection,
    shipment_id: i32,
    status: ShipmentStatus,
    location: &str,
    description: Option<String>,
    occurred_at: &str,
) -> Result<shipment_event::Model, ServiceError> {
    let saved = shipment_event::ActiveModel {
        shipment_id: Set(shipment_id),
        status: Set(status.as_str().to_owned()),
        location: Set(location.to_owned()),
        description: Set(description),
        occurred_at: Set(occurred_at.to_owned()),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(saved)
}

/// Admin action: open tracking for a paid order. The shipment starts at
/// the hub with its first event appended; the customer notification is
/// best-effort.
pub async fn create_shipment(
    db: &DatabaseConnection,
    notifier: &Notifier,
    new: NewShipment,
) -> Result<shipment::Model, ServiceError> {
    if new.tracking_number.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Tracking number is required".to_string(),
        ));
    }

    let freight = FreightType::parse(&new.freight_type).ok_or_else(|| {
        ServiceError::Validation(format!("Unknown freight type '{}'", new.freight_type))
    })?;

    let o = order::Entity::find_by_id(new.order_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Validation("Order not found".to_string()))?;

    let order_status = OrderStatus::parse(&o.status)
        .ok_or_else(|| ServiceError::Database(format!("unknown stored status '{}'", o.status)))?;
    if !matches!(order_status, OrderStatus::Paid | OrderStatus::Processing) {
        return Err(ServiceError::Validation(
            "Order must be paid before a shipment can be created".to_string(),
        ));
    }

    if shipment::Entity::find()
        .filter(shipment::Column::OrderId.eq(new.order_id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(
            "A shipment already exists for this order".to_string(),
        ));
    }

    let origin = new
        .origin_hub
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ORIGIN_HUB.to_string());
    let destination = new
        .destination_hub
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DESTINATION_HUB.to_string());

    let now = chrono::Utc::now().to_rfc3339();
    let saved = shipment::ActiveModel {
        order_id: Set(new.order_id),
        tracking_number: Set(new.tracking_number.trim().to_owned()),
        freight_type: Set(freight.as_str().to_owned()),
        status: Set(ShipmentStatus::ReceivedAtHub.as_str().to_owned()),
        origin_hub: Set(origin.clone()),
        destination_hub: Set(destination),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    append_event(
        db,
        saved.id,
        ShipmentStatus::ReceivedAtHub,
        &origin,
        Some(format!("Shipment received at {}", origin)),
        &now,
    )
    .await?;

    // Paid orders move to processing once fulfillment starts.
    if order_status == OrderStatus::Paid {
        let mut active: order::ActiveModel = o.clone().into();
        active.status = Set(OrderStatus::Processing.as_str().to_owned());
        active.updated_at = Set(now.clone());
        active.update(db).await?;
    }

    // The originating request moves to 'shipped'; failure here must not
    // undo the shipment, so it is logged and dropped.
    if let Err(e) = request_to_shipped(db, o.quote_id).await {
        tracing::warn!(
            "request status update after shipment {} failed: {}",
            saved.id,
            e
        );
    }

    notifier.dispatch(
        o.user_id,
        NotificationKind::Order,
        "Shipment created",
        format!(
            "Your order #{} is now trackable under {}",
            o.id, saved.tracking_number
        ),
        Some(format!("/orders/{}", o.id)),
    );

    Ok(saved)
}

async fn request_to_shipped(db: &DatabaseConnection, quote_id: i32) -> Result<(), ServiceError> {
    let q = quote::Entity::find_by_id(quote_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let request = sourcing_request::Entity::find_by_id(q.request_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if let Ok(next) = RequestStatus::step_from(&request.status, RequestStatus::Shipped) {
        let mut active: sourcing_request::ActiveModel = request.into();
        active.status = Set(next.as_str().to_owned());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(db).await?;
    }

    Ok(())
}

/// Admin action: advance a shipment. The transition table is the
/// authority; every accepted change appends one event to the permanent
/// log and then notifies the order's owner. Tracking is authoritative,
/// the notification is best-effort.
pub async fn update_status(
    db: &DatabaseConnection,
    notifier: &Notifier,
    shipment_id: i32,
    next: ShipmentStatus,
    location: String,
    description: Option<String>,
) -> Result<shipment::Model, ServiceError> {
    if location.trim().is_empty() {
        return Err(ServiceError::Validation("Location is required".to_string()));
    }

    let s = shipment::Entity::find_by_id(shipment_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let next = ShipmentStatus::step_from(&s.status, next)?;

    let order_id = s.order_id;
    let now = chrono::Utc::now().to_rfc3339();
    let mut active: shipment::ActiveModel = s.into();
    active.status = Set(next.as_str().to_owned());
    active.updated_at = Set(now.clone());
    let updated = active.update(db).await?;

    let body = description
        .clone()
        .unwrap_or_else(|| format!("Shipment status updated to {}", next.as_str()));

    append_event(db, shipment_id, next, location.trim(), description, &now).await?;

    if let Ok(Some(o)) = order::Entity::find_by_id(order_id).one(db).await {
        notifier.dispatch(
            o.user_id,
            NotificationKind::Order,
            "Shipment update",
            body,
            Some(format!("/orders/{}", o.id)),
        );
    } else {
        tracing::warn!(
            "owner lookup for shipment {} notification failed; tracking update stands",
            shipment_id
        );
    }

    Ok(updated)
}

/// Fetch the shipment for an order. Orders without a shipment are
/// normal; callers get Ok(None), not an error.
pub async fn get_by_order(
    db: &DatabaseConnection,
    viewer: Viewer,
    order_id: i32,
) -> Result<Option<(shipment::Model, Vec<shipment_event::Model>)>, ServiceError> {
    // Visibility follows the order
    order_service::get_order(db, viewer, order_id).await?;

    let s = shipment::Entity::find()
        .filter(shipment::Column::OrderId.eq(order_id))
        .one(db)
        .await?;

    let Some(s) = s else {
        return Ok(None);
    };

    let events = shipment_event::Entity::find()
        .filter(shipment_event::Column::ShipmentId.eq(s.id))
        .order_by_asc(shipment_event::Column::Id)
        .all(db)
        .await?;

    Ok(Some((s, events)))
}

pub async fn list_shipments(
    db: &DatabaseConnection,
) -> Result<Vec<shipment::Model>, ServiceError> {
    let rows = shipment::Entity::find()
        .order_by_desc(shipment::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}
