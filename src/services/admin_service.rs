use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::*;
use serde::Deserialize;

use crate::auth::hash_password;
use crate::domain::errors::ServiceError;
use crate::domain::Role;
use crate::models::profile;

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub country: Option<String>,
}

fn is_duplicate_email(e: &DbErr) -> bool {
    e.to_string()
        .contains("UNIQUE constraint failed: profiles.email")
}

fn is_fk_violation(e: &DbErr) -> bool {
    e.to_string().contains("FOREIGN KEY constraint failed")
}

/// Create a profile with credentials. A single insert: either the whole
/// account exists afterwards or the caller gets the error.
pub async fn create_user(
    db: &DatabaseConnection,
    new: NewUser,
) -> Result<profile::Model, ServiceError> {
    let role = Role::parse(&new.role)
        .ok_or_else(|| ServiceError::Validation(format!("Unknown role '{}'", new.role)))?;

    if new.email.trim().is_empty() || !new.email.contains('@') {
        return Err(ServiceError::Validation("A valid email is required".to_string()));
    }
    if new.password.len() < 8 {
        return Err(ServiceError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if new.full_name.trim().is_empty() {
        return Err(ServiceError::Validation("Full name is required".to_string()));
    }

    let password_hash = hash_password(&new.password).map_err(ServiceError::Database)?;

    let now = chrono::Utc::now().to_rfc3339();
    let result = profile::ActiveModel {
        email: Set(new.email.trim().to_lowercase()),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_owned()),
        full_name: Set(new.full_name.trim().to_owned()),
        phone: Set(new.phone),
        country: Set(new.country),
        suspended: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match result {
        Ok(saved) => Ok(saved),
        Err(e) if is_duplicate_email(&e) => Err(ServiceError::Conflict(
            "A profile with this email already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<profile::Model>, ServiceError> {
    let rows = profile::Entity::find()
        .order_by_desc(profile::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn delete_user(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let user = profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    match user.delete(db).await {
        Ok(_) => Ok(()),
        Err(e) if is_fk_violation(&e) => Err(ServiceError::Conflict(
            "User has active orders or requests".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn set_suspended(
    db: &DatabaseConnection,
    id: i32,
    suspended: bool,
) -> Result<profile::Model, ServiceError> {
    let user = profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let mut active: profile::ActiveModel = user.into();
    active.suspended = Set(suspended);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    let updated = active.update(db).await?;
    Ok(updated)
}

/// The only path that ever changes a profile's role.
pub async fn change_role(
    db: &DatabaseConnection,
    id: i32,
    role: &str,
) -> Result<profile::Model, ServiceError> {
    let role = Role::parse(role)
        .ok_or_else(|| ServiceError::Validation(format!("Unknown role '{}'", role)))?;

    let user = profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let mut active: profile::ActiveModel = user.into();
    active.role = Set(role.as_str().to_owned());
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    let updated = active.update(db).await?;
    Ok(updated)
}

/// Generate and store a temporary password, returning it in plain text
/// exactly once for the admin to hand over.
pub async fn reset_password(db: &DatabaseConnection, id: i32) -> Result<String, ServiceError> {
    let user = profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let temp_password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();

    let password_hash = hash_password(&temp_password).map_err(ServiceError::Database)?;

    let mut active: profile::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    active.update(db).await?;

    Ok(temp_password)
}
