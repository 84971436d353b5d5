use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde_json::json;

use crate::domain::errors::ServiceError;
use crate::domain::status::NotificationKind;
use crate::models::{broadcast_history, notification, profile};
use crate::realtime::{Event, Hub, user_channel};

/// Insert a notification and publish it on the owner's channel.
pub async fn push(
    db: &DatabaseConnection,
    hub: &Hub,
    user_id: i32,
    kind: NotificationKind,
    title: &str,
    message: &str,
    link: Option<String>,
) -> Result<notification::Model, ServiceError> {
    let entry = notification::ActiveModel {
        user_id: Set(user_id),
        title: Set(title.to_owned()),
        message: Set(message.to_owned()),
        kind: Set(kind.as_str().to_owned()),
        read: Set(false),
        link: Set(link),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    let saved = entry.insert(db).await?;

    hub.publish(
        &user_channel(user_id),
        &Event::insert("notifications", serde_json::to_value(&saved).unwrap_or_default()),
    );

    Ok(saved)
}

pub async fn list(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<notification::Model>, ServiceError> {
    let rows = notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn unread_count(db: &DatabaseConnection, user_id: i32) -> Result<u64, ServiceError> {
    let count = notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::Read.eq(false))
        .count(db)
        .await?;
    Ok(count)
}

/// Flip the read flag on one notification. The only mutation a
/// notification ever sees.
pub async fn mark_read(
    db: &DatabaseConnection,
    hub: &Hub,
    user_id: i32,
    id: i32,
) -> Result<notification::Model, ServiceError> {
    let row = notification::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if row.user_id != user_id {
        return Err(ServiceError::NotFound);
    }

    let mut active: notification::ActiveModel = row.into();
    active.read = Set(true);
    let updated = active.update(db).await?;

    hub.publish(
        &user_channel(user_id),
        &Event::update("notifications", serde_json::to_value(&updated).unwrap_or_default()),
    );

    Ok(updated)
}

pub async fn mark_all_read(
    db: &DatabaseConnection,
    hub: &Hub,
    user_id: i32,
) -> Result<u64, ServiceError> {
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::Read, Expr::value(true))
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::Read.eq(false))
        .exec(db)
        .await?;

    hub.publish(
        &user_channel(user_id),
        &Event::update("notifications", json!({ "all_read": true })),
    );

    Ok(result.rows_affected)
}

/// Admin broadcast: one system notification per registered profile,
/// inserted in a single statement. The history row is written first and
/// is best-effort: its failure is logged and the broadcast proceeds.
pub async fn broadcast(
    db: &DatabaseConnection,
    hub: &Hub,
    admin_id: i32,
    title: &str,
    message: &str,
) -> Result<u64, ServiceError> {
    if title.trim().is_empty() || message.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Title and message are required".to_string(),
        ));
    }

    let recipients = profile::Entity::find().all(db).await?;
    let now = chrono::Utc::now().to_rfc3339();

    let history = broadcast_history::ActiveModel {
        title: Set(title.to_owned()),
        message: Set(message.to_owned()),
        admin_id: Set(Some(admin_id)),
        recipient_count: Set(recipients.len() as i32),
        created_at: Set(now.clone()),
        ..Default::default()
    };
    if let Err(e) = history.insert(db).await {
        tracing::warn!("broadcast history write failed: {}", e);
    }

    if recipients.is_empty() {
        return Ok(0);
    }

    let rows: Vec<notification::ActiveModel> = recipients
        .iter()
        .map(|p| notification::ActiveModel {
            user_id: Set(p.id),
            title: Set(title.to_owned()),
            message: Set(message.to_owned()),
            kind: Set(NotificationKind::System.as_str().to_owned()),
            read: Set(false),
            link: Set(None),
            created_at: Set(now.clone()),
            ..Default::default()
        })
        .collect();

    notification::Entity::insert_many(rows).exec(db).await?;

    for p in &recipients {
        hub.publish(
            &user_channel(p.id),
            &Event::insert(
                "notifications",
                json!({ "title": title, "message": message, "kind": "system" }),
            ),
        );
    }

    Ok(recipients.len() as u64)
}

pub async fn broadcast_log(
    db: &DatabaseConnection,
) -> Result<Vec<broadcast_history::Model>, ServiceError> {
    let rows = broadcast_history::Entity::find()
        .order_by_desc(broadcast_history::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}
