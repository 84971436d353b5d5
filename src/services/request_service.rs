use sea_orm::*;
use serde::Deserialize;

use crate::domain::errors::ServiceError;
use crate::domain::status::{NotificationKind, RequestStatus};
use crate::domain::vin::validate_vin;
use crate::domain::{Role, Viewer};
use crate::models::{profile, sourcing_request};
use crate::notify::Notifier;

#[derive(Debug, Deserialize)]
pub struct NewRequest {
    pub part_name: String,
    pub vin: Option<String>,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
}

pub async fn create_request(
    db: &DatabaseConnection,
    user_id: i32,
    req: NewRequest,
) -> Result<sourcing_request::Model, ServiceError> {
    if req.part_name.trim().is_empty() {
        return Err(ServiceError::Validation("Part name is required".to_string()));
    }

    if let Some(vin) = req.vin.as_deref() {
        if !validate_vin(vin) {
            return Err(ServiceError::Validation(
                "VIN must be 17 characters from A-HJ-NPR-Z0-9".to_string(),
            ));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();
    let request = sourcing_request::ActiveModel {
        user_id: Set(user_id),
        agent_id: Set(None),
        part_name: Set(req.part_name.trim().to_owned()),
        vin: Set(req.vin),
        vehicle_info: Set(req.vehicle_info),
        notes: Set(req.notes),
        images: Set(serde_json::to_string(&req.images).unwrap_or_else(|_| "[]".to_string())),
        status: Set(RequestStatus::Pending.as_str().to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let saved = request.insert(db).await?;
    Ok(saved)
}

fn scope_condition(viewer: Viewer) -> Condition {
    match viewer {
        Viewer::Customer(id) => Condition::all().add(sourcing_request::Column::UserId.eq(id)),
        Viewer::Agent(id) => Condition::all().add(sourcing_request::Column::AgentId.eq(id)),
        Viewer::Admin(_) => Condition::all(),
    }
}

pub fn visible_to(request: &sourcing_request::Model, viewer: Viewer) -> bool {
    match viewer {
        Viewer::Customer(id) => request.user_id == id,
        Viewer::Agent(id) => request.agent_id == Some(id),
        Viewer::Admin(_) => true,
    }
}

pub async fn list_requests(
    db: &DatabaseConnection,
    viewer: Viewer,
    filter: RequestFilter,
) -> Result<Vec<sourcing_request::Model>, ServiceError> {
    let mut condition = scope_condition(viewer);

    if let Some(status) = filter.status {
        let status = RequestStatus::parse(&status)
            .ok_or_else(|| ServiceError::Validation(format!("Unknown status '{}'", status)))?;
        condition = condition.add(sourcing_request::Column::Status.eq(status.as_str()));
    }

    let rows = sourcing_request::Entity::find()
        .filter(condition)
        .order_by_desc(sourcing_request::Column::Id)
        .all(db)
        .await?;

    Ok(rows)
}

/// Fetch one request, enforcing visibility. A request outside the
/// viewer's scope reads as not found rather than forbidden.
pub async fn get_request(
    db: &DatabaseConnection,
    viewer: Viewer,
    id: i32,
) -> Result<sourcing_request::Model, ServiceError> {
    let request = sourcing_request::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if !visible_to(&request, viewer) {
        return Err(ServiceError::NotFound);
    }

    Ok(request)
}

/// Admin action: hand a request to an agent. No status transition is
/// forced; the agent picks the work up in whatever state it is in.
pub async fn assign_agent(
    db: &DatabaseConnection,
    notifier: &Notifier,
    request_id: i32,
    agent_id: i32,
) -> Result<sourcing_request::Model, ServiceError> {
    let request = sourcing_request::Entity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let agent = profile::Entity::find_by_id(agent_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Validation("Agent profile not found".to_string()))?;

    if Role::parse(&agent.role) != Some(Role::Agent) {
        return Err(ServiceError::Validation(format!(
            "Profile {} is not an agent",
            agent_id
        )));
    }

    let part_name = request.part_name.clone();
    let mut active: sourcing_request::ActiveModel = request.into();
    active.agent_id = Set(Some(agent_id));
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    let updated = active.update(db).await?;

    notifier.dispatch(
        agent_id,
        NotificationKind::Request,
        "New request assigned",
        format!("You have been assigned the sourcing request for '{}'", part_name),
        Some(format!("/requests/{}", updated.id)),
    );

    Ok(updated)
}

/// Role-gated status change, validated against the transition table.
/// Admins may perform any legal transition, the assigned agent likewise;
/// the owning customer may only cancel.
pub async fn update_status(
    db: &DatabaseConnection,
    viewer: Viewer,
    request_id: i32,
    next: RequestStatus,
) -> Result<sourcing_request::Model, ServiceError> {
    let request = get_request(db, viewer, request_id).await?;

    match viewer {
        Viewer::Admin(_) => {}
        Viewer::Agent(id) => {
            if request.agent_id != Some(id) {
                return Err(ServiceError::Forbidden);
            }
        }
        Viewer::Customer(_) => {
            if next != RequestStatus::Cancelled {
                return Err(ServiceError::Forbidden);
            }
        }
    }

    let next = RequestStatus::step_from(&request.status, next)?;

    let mut active: sourcing_request::ActiveModel = request.into();
    active.status = Set(next.as_str().to_owned());
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    let updated = active.update(db).await?;

    Ok(updated)
}

/// Images are stored as a JSON array string; decode for API responses.
pub fn decode_images(request: &sourcing_request::Model) -> Vec<String> {
    serde_json::from_str(&request.images).unwrap_or_default()
}
