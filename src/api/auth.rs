use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{Claims, create_jwt, hash_password, verify_password};
use crate::db::AppState;
use crate::models::profile;

#[derive(Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    full_name: String,
    phone: Option<String>,
    country: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Self-signup. Always creates a customer; agent and admin accounts come
/// from the admin management actions.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    responses(
        (status = 201, description = "Profile created, token returned"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "A valid email is required" })),
        )
            .into_response();
    }
    if payload.password.len() < 8 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Password must be at least 8 characters" })),
        )
            .into_response();
    }
    if payload.full_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Full name is required" })),
        )
            .into_response();
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e })),
            )
                .into_response();
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let result = profile::ActiveModel {
        email: Set(payload.email.trim().to_lowercase()),
        password_hash: Set(password_hash),
        role: Set("customer".to_string()),
        full_name: Set(payload.full_name.trim().to_string()),
        phone: Set(payload.phone),
        country: Set(payload.country),
        suspended: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await;

    match result {
        Ok(saved) => {
            let token = match create_jwt(&saved.email, saved.id, &saved.role) {
                Ok(t) => t,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": e })),
                    )
                        .into_response();
                }
            };
            (
                StatusCode::CREATED,
                Json(json!({ "token": token, "profile": saved })),
            )
                .into_response()
        }
        Err(e) if e.to_string().contains("UNIQUE constraint failed") => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "A profile with this email already exists" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    responses(
        (status = 200, description = "Token returned"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account suspended")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    tracing::info!("Login attempt for {}", payload.email);

    let user = match profile::Entity::find()
        .filter(profile::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.db)
        .await
    {
        Ok(Some(u)) => u,
        _ => {
            tracing::warn!("Profile not found: {}", payload.email);
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response();
        }
    };

    if user.suspended {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Account suspended" })),
        )
            .into_response();
    }

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {
            let token = match create_jwt(&user.email, user.id, &user.role) {
                Ok(t) => t,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": e })),
                    )
                        .into_response();
                }
            };
            (
                StatusCode::OK,
                Json(json!({ "token": token, "role": user.role })),
            )
                .into_response()
        }
        _ => {
            tracing::warn!("Password verification failed for {}", user.email);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response()
        }
    }
}

pub async fn me(State(state): State<AppState>, claims: Claims) -> impl IntoResponse {
    let user = profile::Entity::find_by_id(claims.uid)
        .one(&state.db)
        .await
        .unwrap_or(None);

    match user {
        Some(user) => (StatusCode::OK, Json(json!({ "profile": user }))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Profile not found" })),
        )
            .into_response(),
    }
}
