use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error_response;
use crate::auth::Claims;
use crate::db::AppState;
use crate::services::message_service::{self, NewMessage, NewRequestMessage};

pub async fn send_message(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<NewMessage>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let saved = message_service::send_message(
        &state.db,
        &state.hub,
        &state.notifier,
        claims.viewer(),
        payload,
    )
    .await
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(json!({ "message": saved }))))
}

#[derive(Deserialize)]
pub struct ListMessagesQuery {
    pub with: Option<i32>,
}

pub async fn list_messages(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = message_service::list_messages(&state.db, claims.viewer(), query.with)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "messages": rows })))
}

pub async fn send_request_message(
    State(state): State<AppState>,
    claims: Claims,
    Path(request_id): Path<i32>,
    Json(payload): Json<NewRequestMessage>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let saved = message_service::send_request_message(
        &state.db,
        &state.hub,
        &state.notifier,
        claims.viewer(),
        request_id,
        payload,
    )
    .await
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(json!({ "message": saved }))))
}

pub async fn list_request_messages(
    State(state): State<AppState>,
    claims: Claims,
    Path(request_id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows =
        message_service::list_request_messages(&state.db, claims.viewer(), request_id)
            .await
            .map_err(error_response)?;

    Ok(Json(json!({ "messages": rows })))
}
