use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error_response;
use crate::audit;
use crate::auth::AdminClaims;
use crate::db::AppState;
use crate::services::admin_service::{self, NewUser};
use crate::services::notification_service;

pub async fn list_users(
    State(state): State<AppState>,
    AdminClaims(_claims): AdminClaims,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = admin_service::list_users(&state.db)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "users": rows })))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    responses(
        (status = 201, description = "Profile created"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let saved = admin_service::create_user(&state.db, payload)
        .await
        .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "create_user",
        "profile",
        Some(saved.id),
        Some(json!({ "role": saved.role })),
    );

    Ok((StatusCode::CREATED, Json(json!({ "user": saved }))))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    admin_service::delete_user(&state.db, id)
        .await
        .map_err(error_response)?;

    audit::record(&state.db, claims.uid, "delete_user", "profile", Some(id), None);

    Ok(Json(json!({ "message": "User deleted" })))
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

pub async fn change_role(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = admin_service::change_role(&state.db, id, &payload.role)
        .await
        .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "change_role",
        "profile",
        Some(id),
        Some(json!({ "role": updated.role })),
    );

    Ok(Json(json!({ "user": updated })))
}

pub async fn suspend_user(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = admin_service::set_suspended(&state.db, id, true)
        .await
        .map_err(error_response)?;

    audit::record(&state.db, claims.uid, "suspend_user", "profile", Some(id), None);

    Ok(Json(json!({ "user": updated })))
}

pub async fn reinstate_user(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let updated = admin_service::set_suspended(&state.db, id, false)
        .await
        .map_err(error_response)?;

    audit::record(&state.db, claims.uid, "reinstate_user", "profile", Some(id), None);

    Ok(Json(json!({ "user": updated })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let temp_password = admin_service::reset_password(&state.db, id)
        .await
        .map_err(error_response)?;

    audit::record(&state.db, claims.uid, "reset_password", "profile", Some(id), None);

    // Returned exactly once; only the hash is stored.
    Ok(Json(json!({ "temp_password": temp_password })))
}

#[derive(Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/admin/broadcast",
    responses(
        (status = 200, description = "System notification fanned out to every profile")
    )
)]
pub async fn broadcast(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Json(payload): Json<BroadcastRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let recipients = notification_service::broadcast(
        &state.db,
        &state.hub,
        claims.uid,
        &payload.title,
        &payload.message,
    )
    .await
    .map_err(error_response)?;

    audit::record(
        &state.db,
        claims.uid,
        "broadcast",
        "notification",
        None,
        Some(json!({ "recipients": recipients })),
    );

    Ok(Json(json!({ "recipients": recipients })))
}

pub async fn list_broadcasts(
    State(state): State<AppState>,
    AdminClaims(_claims): AdminClaims,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = notification_service::broadcast_log(&state.db)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "broadcasts": rows })))
}
