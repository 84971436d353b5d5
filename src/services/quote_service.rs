use sea_orm::*;
use serde::Deserialize;

use crate::domain::errors::ServiceError;
use crate::domain::status::{NotificationKind, RequestStatus};
use crate::domain::Viewer;
use crate::models::{quote, sourcing_request};
use crate::notify::Notifier;
use crate::services::request_service;

#[derive(Debug, Deserialize)]
pub struct NewQuote {
    pub item_price: f64,
    pub shipping_cost: f64,
    pub service_fee: f64,
    pub total_amount: f64,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

// REAL columns carry sub-cent noise after arithmetic; anything beyond
// half a cent is a caller error.
const TOTAL_TOLERANCE: f64 = 0.005;

/// Attach a quote to a request. Only the assigned agent or an admin may
/// quote; the stated total must equal the sum of its components.
pub async fn create_quote(
    db: &DatabaseConnection,
    notifier: &Notifier,
    viewer: Viewer,
    request_id: i32,
    new: NewQuote,
) -> Result<quote::Model, ServiceError> {
    let request = sourcing_request::Entity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    match viewer {
        Viewer::Admin(_) => {}
        Viewer::Agent(id) => {
            if request.agent_id != Some(id) {
                return Err(ServiceError::Forbidden);
            }
        }
        Viewer::Customer(_) => return Err(ServiceError::Forbidden),
    }

    if new.item_price < 0.0 || new.shipping_cost < 0.0 || new.service_fee < 0.0 {
        return Err(ServiceError::Validation(
            "Quote amounts cannot be negative".to_string(),
        ));
    }

    let sum = new.item_price + new.shipping_cost + new.service_fee;
    if (new.total_amount - sum).abs() > TOTAL_TOLERANCE {
        return Err(ServiceError::Validation(format!(
            "Total amount {} does not match item + shipping + fee = {}",
            new.total_amount, sum
        )));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let saved = quote::ActiveModel {
        request_id: Set(request_id),
        item_price: Set(new.item_price),
        shipping_cost: Set(new.shipping_cost),
        service_fee: Set(new.service_fee),
        total_amount: Set(new.total_amount),
        currency: Set(new.currency.unwrap_or_else(|| "USD".to_string())),
        notes: Set(new.notes),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let customer_id = request.user_id;
    let part_name = request.part_name.clone();

    // Move the request to 'quoted' when the transition is legal; a
    // re-quote on an already quoted request leaves it as is.
    if let Ok(next) = RequestStatus::step_from(&request.status, RequestStatus::Quoted) {
        let mut active: sourcing_request::ActiveModel = request.into();
        active.status = Set(next.as_str().to_owned());
        active.updated_at = Set(now);
        active.update(db).await?;
    }

    notifier.dispatch(
        customer_id,
        NotificationKind::Request,
        "Quote received",
        format!(
            "A quote of {} {} is ready for your '{}' request",
            saved.total_amount, saved.currency, part_name
        ),
        Some(format!("/requests/{}", request_id)),
    );

    Ok(saved)
}

pub async fn list_quotes(
    db: &DatabaseConnection,
    viewer: Viewer,
    request_id: i32,
) -> Result<Vec<quote::Model>, ServiceError> {
    // Visibility follows the request
    request_service::get_request(db, viewer, request_id).await?;

    let rows = quote::Entity::find()
        .filter(quote::Column::RequestId.eq(request_id))
        .order_by_desc(quote::Column::Id)
        .all(db)
        .await?;

    Ok(rows)
}
