use sea_orm::*;
use serde::Deserialize;

use crate::domain::errors::ServiceError;
use crate::domain::status::NotificationKind;
use crate::domain::Viewer;
use crate::models::{message, request_message};
use crate::notify::Notifier;
use crate::realtime::{Event, Hub, request_channel, user_channel, SUPPORT_CHANNEL};
use crate::services::request_service;

/// Preview length for message notifications; enough to recognize the
/// conversation without mirroring the whole text.
const PREVIEW_LEN: usize = 80;

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub recipient_id: Option<i32>,
    pub content: String,
    pub client_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewRequestMessage {
    pub message: String,
    pub client_ref: Option<String>,
}

pub fn preview(content: &str) -> String {
    let mut p: String = content.chars().take(PREVIEW_LEN).collect();
    if content.chars().count() > PREVIEW_LEN {
        p.push('…');
    }
    p
}

fn is_duplicate_ref(e: &DbErr) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

fn ref_or_random(client_ref: Option<String>) -> String {
    client_ref
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Send a direct message, or a support message when no recipient is
/// given. The persisted row is published with its client_ref so the
/// sender's optimistic copy reconciles by exact key.
pub async fn send_message(
    db: &DatabaseConnection,
    hub: &Hub,
    notifier: &Notifier,
    viewer: Viewer,
    new: NewMessage,
) -> Result<message::Model, ServiceError> {
    if new.content.trim().is_empty() {
        return Err(ServiceError::Validation("Message is empty".to_string()));
    }

    let sender_id = viewer.id();
    let result = message::ActiveModel {
        sender_id: Set(sender_id),
        recipient_id: Set(new.recipient_id),
        content: Set(new.content.clone()),
        client_ref: Set(ref_or_random(new.client_ref)),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await;

    let saved = match result {
        Ok(saved) => saved,
        Err(e) if is_duplicate_ref(&e) => {
            return Err(ServiceError::Conflict(
                "A message with this reference was already sent".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let payload = serde_json::to_value(&saved).unwrap_or_default();
    let event = Event::insert("messages", payload);
    match saved.recipient_id {
        Some(recipient) => hub.publish(&user_channel(recipient), &event),
        None => hub.publish(SUPPORT_CHANNEL, &event),
    }
    // Echo to the sender's own channel for their other tabs/devices.
    hub.publish(&user_channel(sender_id), &event);

    // Two independent best-effort dispatches; message delivery succeeded
    // regardless of what happens to either.
    if !viewer.is_admin() {
        notifier.dispatch_admins(
            NotificationKind::System,
            "New support message",
            preview(&saved.content),
            Some("/support".to_string()),
        );
    }
    if let Some(recipient) = saved.recipient_id {
        notifier.dispatch(
            recipient,
            NotificationKind::System,
            "New message",
            preview(&saved.content),
            Some("/messages".to_string()),
        );
    }

    Ok(saved)
}

/// Conversation listing. With a counter-party id: both directions
/// between the two profiles. Without one: an admin reads the general
/// support inbox, anyone else reads their own traffic.
pub async fn list_messages(
    db: &DatabaseConnection,
    viewer: Viewer,
    with: Option<i32>,
) -> Result<Vec<message::Model>, ServiceError> {
    let me = viewer.id();

    let condition = match with {
        Some(other) => Condition::any()
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(me))
                    .add(message::Column::RecipientId.eq(other)),
            )
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(other))
                    .add(message::Column::RecipientId.eq(me)),
            ),
        None if viewer.is_admin() => Condition::all().add(message::Column::RecipientId.is_null()),
        None => Condition::any()
            .add(message::Column::SenderId.eq(me))
            .add(message::Column::RecipientId.eq(me)),
    };

    let rows = message::Entity::find()
        .filter(condition)
        .order_by_asc(message::Column::Id)
        .all(db)
        .await?;

    Ok(rows)
}

/// Post into a request thread. Participants only: the owning customer,
/// the assigned agent, or an admin.
pub async fn send_request_message(
    db: &DatabaseConnection,
    hub: &Hub,
    notifier: &Notifier,
    viewer: Viewer,
    request_id: i32,
    new: NewRequestMessage,
) -> Result<request_message::Model, ServiceError> {
    if new.message.trim().is_empty() {
        return Err(ServiceError::Validation("Message is empty".to_string()));
    }

    // Participant check doubles as the visibility check.
    let request = request_service::get_request(db, viewer, request_id).await?;

    let sender_id = viewer.id();
    let result = request_message::ActiveModel {
        request_id: Set(request_id),
        sender_id: Set(sender_id),
        message: Set(new.message.clone()),
        client_ref: Set(ref_or_random(new.client_ref)),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await;

    let saved = match result {
        Ok(saved) => saved,
        Err(e) if is_duplicate_ref(&e) => {
            return Err(ServiceError::Conflict(
                "A message with this reference was already sent".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    hub.publish(
        &request_channel(request_id),
        &Event::insert(
            "request_messages",
            serde_json::to_value(&saved).unwrap_or_default(),
        ),
    );

    let link = Some(format!("/requests/{}", request_id));
    if !viewer.is_admin() {
        notifier.dispatch_admins(
            NotificationKind::Request,
            "New request message",
            preview(&saved.message),
            link.clone(),
        );
    }

    // Counter-party: the agent hears from the customer and vice versa;
    // admin posts go to the customer.
    let counterparty = match viewer {
        Viewer::Customer(_) => request.agent_id,
        Viewer::Agent(_) | Viewer::Admin(_) => Some(request.user_id),
    };
    if let Some(counterparty) = counterparty.filter(|&id| id != sender_id) {
        notifier.dispatch(
            counterparty,
            NotificationKind::Request,
            format!("New message on '{}'", request.part_name),
            preview(&saved.message),
            link,
        );
    }

    Ok(saved)
}

pub async fn list_request_messages(
    db: &DatabaseConnection,
    viewer: Viewer,
    request_id: i32,
) -> Result<Vec<request_message::Model>, ServiceError> {
    request_service::get_request(db, viewer, request_id).await?;

    let rows = request_message::Entity::find()
        .filter(request_message::Column::RequestId.eq(request_id))
        .order_by_asc(request_message::Column::Id)
        .all(db)
        .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "ä".repeat(120);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_LEN + 1);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn preview_keeps_short_messages() {
        assert_eq!(preview("brake pads?"), "brake pads?");
    }
}
