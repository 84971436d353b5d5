use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::api::error_response;
use crate::auth::Claims;
use crate::db::AppState;
use crate::services::notification_service;

pub async fn list_notifications(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = notification_service::list(&state.db, claims.uid)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "notifications": rows })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let count = notification_service::unread_count(&state.db, claims.uid)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "unread": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = notification_service::mark_read(&state.db, &state.hub, claims.uid, id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "notification": updated })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = notification_service::mark_all_read(&state.db, &state.hub, claims.uid)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "updated": updated })))
}
