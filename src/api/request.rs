use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error_response;
use crate::audit;
use crate::auth::{AdminClaims, Claims};
use crate::db::AppState;
use crate::domain::status::RequestStatus;
use crate::models::sourcing_request;
use crate::services::quote_service::{self, NewQuote};
use crate::services::request_service::{self, NewRequest, RequestFilter};

fn request_json(r: &sourcing_request::Model) -> Value {
    json!({
        "id": r.id,
        "user_id": r.user_id,
        "agent_id": r.agent_id,
        "part_name": r.part_name,
        "vin": r.vin,
        "vehicle_info": r.vehicle_info,
        "notes": r.notes,
        "images": request_service::decode_images(r),
        "status": r.status,
        "created_at": r.created_at,
        "updated_at": r.updated_at,
    })
}

#[utoipa::path(
    post,
    path = "/api/requests",
    responses(
        (status = 201, description = "Sourcing request created"),
        (status = 400, description = "Missing part name or malformed VIN")
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<NewRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let saved = request_service::create_request(&state.db, claims.uid, payload)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "request": request_json(&saved) })),
    ))
}

pub async fn list_requests(
    State(state): State<AppState>,
    claims: Claims,
    Query(filter): Query<RequestFilter>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = request_service::list_requests(&state.db, claims.viewer(), filter)
        .await
        .map_err(error_response)?;

    let requests: Vec<Value> = rows.iter().map(request_json).collect();
    Ok(Json(json!({ "requests": requests })))
}

pub async fn get_request(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let request = request_service::get_request(&state.db, claims.viewer(), id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "request": request_json(&request) })))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = request_service::update_status(&state.db, claims.viewer(), id, payload.status)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "request": request_json(&updated) })))
}

#[derive(Deserialize)]
pub struct AssignAgentRequest {
    pub agent_id: i32,
}

pub async fn assign_agent(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<AssignAgentRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated =
        request_service::assign_agent(&state.db, &state.notifier, id, payload.agent_id)
            .await
            .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "assign_agent",
        "sourcing_request",
        Some(id),
        Some(json!({ "agent_id": payload.agent_id })),
    );

    Ok(Json(json!({ "request": request_json(&updated) })))
}

pub async fn create_quote(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<NewQuote>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let saved = quote_service::create_quote(&state.db, &state.notifier, claims.viewer(), id, payload)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(json!({ "quote": saved }))))
}

pub async fn list_quotes(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = quote_service::list_quotes(&state.db, claims.viewer(), id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "quotes": rows })))
}
