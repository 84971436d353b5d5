use sea_orm::*;
use serde::Deserialize;

use crate::domain::errors::ServiceError;
use crate::domain::status::{NotificationKind, OrderStatus, RequestStatus};
use crate::domain::Viewer;
use crate::models::{order, quote, sourcing_request};
use crate::notify::Notifier;

#[derive(Debug, Deserialize)]
pub struct ProxyOrder {
    pub request_id: i32,
    pub quote_id: i32,
    pub user_id: i32,
    pub agent_id: Option<i32>,
}

fn is_duplicate_order(e: &DbErr) -> bool {
    e.to_string()
        .contains("UNIQUE constraint failed: orders.quote_id")
}

fn scope_condition(viewer: Viewer) -> Condition {
    match viewer {
        Viewer::Customer(id) => Condition::all().add(order::Column::UserId.eq(id)),
        Viewer::Agent(id) => Condition::all().add(order::Column::AgentId.eq(id)),
        Viewer::Admin(_) => Condition::all(),
    }
}

pub fn visible_to(o: &order::Model, viewer: Viewer) -> bool {
    match viewer {
        Viewer::Customer(id) => o.user_id == id,
        Viewer::Agent(id) => o.agent_id == Some(id),
        Viewer::Admin(_) => true,
    }
}

async fn insert_order(
    db: &DatabaseConnection,
    user_id: i32,
    quote_id: i32,
    agent_id: Option<i32>,
    status: OrderStatus,
) -> Result<order::Model, ServiceError> {
    let now = chrono::Utc::now().to_rfc3339();
    let result = order::ActiveModel {
        user_id: Set(user_id),
        quote_id: Set(quote_id),
        agent_id: Set(agent_id),
        status: Set(status.as_str().to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match result {
        Ok(saved) => Ok(saved),
        Err(e) if is_duplicate_order(&e) => Err(ServiceError::Conflict(
            "An order already exists for this quote".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Move the originating request to 'processing' after order creation.
async fn request_to_processing(
    db: &DatabaseConnection,
    request: sourcing_request::Model,
) -> Result<(), ServiceError> {
    if let Ok(next) = RequestStatus::step_from(&request.status, RequestStatus::Processing) {
        let mut active: sourcing_request::ActiveModel = request.into();
        active.status = Set(next.as_str().to_owned());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(db).await?;
    }
    Ok(())
}

/// Customer accepts a quote on their own request: the order starts at
/// 'pending_payment'.
pub async fn accept_quote(
    db: &DatabaseConnection,
    notifier: &Notifier,
    customer_id: i32,
    quote_id: i32,
) -> Result<order::Model, ServiceError> {
    let (quote, request) = quote::Entity::find_by_id(quote_id)
        .find_also_related(sourcing_request::Entity)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let request = request.ok_or(ServiceError::NotFound)?;

    if request.user_id != customer_id {
        return Err(ServiceError::NotFound);
    }

    let saved = insert_order(
        db,
        customer_id,
        quote.id,
        request.agent_id,
        OrderStatus::PendingPayment,
    )
    .await?;

    let agent_id = request.agent_id;
    let part_name = request.part_name.clone();
    request_to_processing(db, request).await?;

    if let Some(agent_id) = agent_id {
        notifier.dispatch(
            agent_id,
            NotificationKind::Order,
            "Quote accepted",
            format!("The customer accepted your quote for '{}'", part_name),
            Some(format!("/orders/{}", saved.id)),
        );
    }

    Ok(saved)
}

/// Admin creates an order on the customer's behalf, e.g. after a manual
/// bank transfer. The order starts at 'paid' straight away.
pub async fn create_proxy_order(
    db: &DatabaseConnection,
    notifier: &Notifier,
    proxy: ProxyOrder,
) -> Result<order::Model, ServiceError> {
    let quote = quote::Entity::find_by_id(proxy.quote_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Validation("Quote not found".to_string()))?;

    if quote.request_id != proxy.request_id {
        return Err(ServiceError::Validation(
            "Quote does not belong to this request".to_string(),
        ));
    }

    let request = sourcing_request::Entity::find_by_id(proxy.request_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Validation("Request not found".to_string()))?;

    if request.user_id != proxy.user_id {
        return Err(ServiceError::Validation(
            "Request does not belong to this customer".to_string(),
        ));
    }

    let saved = insert_order(
        db,
        proxy.user_id,
        proxy.quote_id,
        proxy.agent_id.or(request.agent_id),
        OrderStatus::Paid,
    )
    .await?;

    let part_name = request.part_name.clone();
    request_to_processing(db, request).await?;

    notifier.dispatch(
        proxy.user_id,
        NotificationKind::Order,
        "Order created",
        format!(
            "Your order for '{}' has been created and marked as paid",
            part_name
        ),
        Some(format!("/orders/{}", saved.id)),
    );

    Ok(saved)
}

pub async fn list_orders(
    db: &DatabaseConnection,
    viewer: Viewer,
) -> Result<Vec<order::Model>, ServiceError> {
    let rows = order::Entity::find()
        .filter(scope_condition(viewer))
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get_order(
    db: &DatabaseConnection,
    viewer: Viewer,
    id: i32,
) -> Result<order::Model, ServiceError> {
    let o = order::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if !visible_to(&o, viewer) {
        return Err(ServiceError::NotFound);
    }

    Ok(o)
}

/// Admin-only status change, checked against the transition table.
pub async fn update_status(
    db: &DatabaseConnection,
    notifier: &Notifier,
    order_id: i32,
    next: OrderStatus,
) -> Result<order::Model, ServiceError> {
    let o = order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let next = OrderStatus::step_from(&o.status, next)?;

    let customer_id = o.user_id;
    let mut active: order::ActiveModel = o.into();
    active.status = Set(next.as_str().to_owned());
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    let updated = active.update(db).await?;

    notifier.dispatch(
        customer_id,
        NotificationKind::Order,
        "Order update",
        format!("Your order #{} is now {}", updated.id, next.as_str()),
        Some(format!("/orders/{}", updated.id)),
    );

    Ok(updated)
}
