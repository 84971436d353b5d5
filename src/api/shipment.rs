use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error_response;
use crate::audit;
use crate::auth::{AdminClaims, Claims};
use crate::db::AppState;
use crate::domain::status::ShipmentStatus;
use crate::services::shipment_service::{self, NewShipment};

#[utoipa::path(
    post,
    path = "/api/shipments",
    responses(
        (status = 201, description = "Shipment created at received_at_hub"),
        (status = 400, description = "Order not paid yet or bad freight type")
    )
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Json(payload): Json<NewShipment>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let shipment = shipment_service::create_shipment(&state.db, &state.notifier, payload)
        .await
        .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "create_shipment",
        "shipment",
        Some(shipment.id),
        Some(json!({ "order_id": shipment.order_id, "tracking_number": shipment.tracking_number })),
    );

    Ok((StatusCode::CREATED, Json(json!({ "shipment": shipment }))))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ShipmentStatus,
    pub location: String,
    pub description: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = shipment_service::update_status(
        &state.db,
        &state.notifier,
        id,
        payload.status,
        payload.location,
        payload.description,
    )
    .await
    .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "update_shipment_status",
        "shipment",
        Some(id),
        Some(json!({ "status": updated.status })),
    );

    Ok(Json(json!({ "shipment": updated })))
}

/// Shipment lookup for an order. An order that has not shipped yet is
/// normal: the response is a success with a null shipment.
#[utoipa::path(
    get,
    path = "/api/orders/{id}/shipment",
    responses(
        (status = 200, description = "Shipment with its event log, or null when not shipped yet")
    )
)]
pub async fn get_by_order(
    State(state): State<AppState>,
    claims: Claims,
    Path(order_id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let found = shipment_service::get_by_order(&state.db, claims.viewer(), order_id)
        .await
        .map_err(error_response)?;

    match found {
        Some((shipment, events)) => Ok(Json(json!({
            "shipment": shipment,
            "events": events,
        }))),
        None => Ok(Json(json!({ "shipment": null, "events": [] }))),
    }
}

pub async fn list_shipments(
    State(state): State<AppState>,
    AdminClaims(_claims): AdminClaims,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = shipment_service::list_shipments(&state.db)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "shipments": rows })))
}
