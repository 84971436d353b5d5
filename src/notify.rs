//! Fire-and-forget notification dispatch.
//!
//! Every notification triggered as a side effect of another operation
//! goes through here: the insert and the realtime publish run on a
//! detached task, failures are logged and never reach the caller. The
//! primary operation (shipment update, message send, order creation) has
//! already succeeded by the time a dispatch is queued and must not be
//! rolled back by a notification problem.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::domain::status::NotificationKind;
use crate::models::profile;
use crate::realtime::Hub;
use crate::services::notification_service;

#[derive(Clone)]
pub struct Notifier {
    db: DatabaseConnection,
    hub: Hub,
}

impl Notifier {
    pub fn new(db: DatabaseConnection, hub: Hub) -> Self {
        Self { db, hub }
    }

    /// Queue a notification for one user.
    pub fn dispatch(
        &self,
        user_id: i32,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
    ) {
        let db = self.db.clone();
        let hub = self.hub.clone();
        let title = title.into();
        let message = message.into();

        tokio::spawn(async move {
            if let Err(e) =
                notification_service::push(&db, &hub, user_id, kind, &title, &message, link).await
            {
                tracing::warn!("notification dispatch to user {} failed: {}", user_id, e);
            }
        });
    }

    /// Queue a notification for every admin. Failures for one admin do
    /// not stop the rest.
    pub fn dispatch_admins(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
    ) {
        let db = self.db.clone();
        let hub = self.hub.clone();
        let title = title.into();
        let message = message.into();

        tokio::spawn(async move {
            let admins = match profile::Entity::find()
                .filter(profile::Column::Role.eq("admin"))
                .all(&db)
                .await
            {
                Ok(admins) => admins,
                Err(e) => {
                    tracing::warn!("admin notification fan-out aborted: {}", e);
                    return;
                }
            };

            for admin in admins {
                if let Err(e) = notification_service::push(
                    &db,
                    &hub,
                    admin.id,
                    kind,
                    &title,
                    &message,
                    link.clone(),
                )
                .await
                {
                    tracing::warn!("notification dispatch to admin {} failed: {}", admin.id, e);
                }
            }
        });
    }
}
