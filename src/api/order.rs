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
use crate::domain::status::OrderStatus;
use crate::services::order_service::{self, ProxyOrder};

pub async fn accept_quote(
    State(state): State<AppState>,
    claims: Claims,
    Path(quote_id): Path<i32>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let order = order_service::accept_quote(&state.db, &state.notifier, claims.uid, quote_id)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(json!({ "order": order }))))
}

#[utoipa::path(
    post,
    path = "/api/orders/proxy",
    responses(
        (status = 201, description = "Order created as paid on the customer's behalf"),
        (status = 409, description = "An order already exists for this quote")
    )
)]
pub async fn create_proxy_order(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Json(payload): Json<ProxyOrder>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let user_id = payload.user_id;
    let order = order_service::create_proxy_order(&state.db, &state.notifier, payload)
        .await
        .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "create_proxy_order",
        "order",
        Some(order.id),
        Some(json!({ "user_id": user_id, "quote_id": order.quote_id })),
    );

    Ok((StatusCode::CREATED, Json(json!({ "order": order }))))
}

pub async fn list_orders(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = order_service::list_orders(&state.db, claims.viewer())
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "orders": rows })))
}

pub async fn get_order(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let order = order_service::get_order(&state.db, claims.viewer(), id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "order": order })))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = order_service::update_status(&state.db, &state.notifier, id, payload.status)
        .await
        .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "update_order_status",
        "order",
        Some(id),
        Some(json!({ "status": updated.status })),
    );

    Ok(Json(json!({ "order": updated })))
}
