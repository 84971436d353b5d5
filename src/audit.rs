use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;

use crate::models::audit_log;

/// Append an audit entry for a privileged action. Best-effort: runs on a
/// detached task and a failure is logged, never surfaced.
pub fn record(
    db: &DatabaseConnection,
    actor_id: i32,
    action: &str,
    entity_type: &str,
    entity_id: Option<i32>,
    detail: Option<Value>,
) {
    let db = db.clone();
    let action = action.to_owned();
    let entity_type = entity_type.to_owned();

    tokio::spawn(async move {
        let entry = audit_log::ActiveModel {
            actor_id: Set(Some(actor_id)),
            action: Set(action.clone()),
            entity_type: Set(entity_type),
            entity_id: Set(entity_id),
            detail: Set(detail.map(|v| v.to_string())),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        if let Err(e) = entry.insert(&db).await {
            tracing::warn!("audit log write for '{}' failed: {}", action, e);
        }
    });
}
