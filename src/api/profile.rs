use axum::{Json, extract::State, http::StatusCode};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::Claims;
use crate::db::AppState;
use crate::models::profile;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
}

/// Update one's own contact details. Role and suspension state are
/// admin-only and cannot be touched here.
pub async fn update_profile(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let user = profile::Entity::find_by_id(claims.uid)
        .one(&state.db)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Profile not found" })),
        ))?;

    let mut active: profile::ActiveModel = user.into();
    if let Some(full_name) = payload.full_name {
        if full_name.trim().is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Full name cannot be empty" })),
            ));
        }
        active.full_name = Set(full_name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(country) = payload.country {
        active.country = Set(Some(country));
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let updated = active.update(&state.db).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(json!({ "profile": updated })))
}
