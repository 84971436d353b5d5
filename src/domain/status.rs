//! Status state machines for requests, orders and shipments.
//!
//! Every status column in the database is a plain TEXT value; these enums
//! are the single authority on which values exist and which transitions
//! are legal. Services parse the stored value, check the transition and
//! reject anything illegal, so no call site can push an entity into an
//! arbitrary state.

use serde::{Deserialize, Serialize};

use super::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Processing,
    Quoted,
    Shipped,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Processing => "processing",
            RequestStatus::Quoted => "quoted",
            RequestStatus::Shipped => "shipped",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "processing" => Some(RequestStatus::Processing),
            "quoted" => Some(RequestStatus::Quoted),
            "shipped" => Some(RequestStatus::Shipped),
            "completed" => Some(RequestStatus::Completed),
            "cancelled" => Some(RequestStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Quoted)
                | (Pending, Cancelled)
                | (Processing, Quoted)
                | (Processing, Shipped)
                | (Processing, Completed)
                | (Processing, Cancelled)
                | (Quoted, Processing)
                | (Quoted, Shipped)
                | (Quoted, Completed)
                | (Quoted, Cancelled)
                | (Shipped, Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(OrderStatus::PendingPayment),
            "paid" => Some(OrderStatus::Paid),
            "processing" => Some(OrderStatus::Processing),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, Paid)
                | (PendingPayment, Cancelled)
                | (Paid, Processing)
                | (Paid, Cancelled)
                | (Processing, Completed)
                | (Processing, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    ReceivedAtHub,
    InTransitAir,
    InTransitSea,
    ClearingCustoms,
    ReadyForPickup,
    Delivered,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::ReceivedAtHub => "received_at_hub",
            ShipmentStatus::InTransitAir => "in_transit_air",
            ShipmentStatus::InTransitSea => "in_transit_sea",
            ShipmentStatus::ClearingCustoms => "clearing_customs",
            ShipmentStatus::ReadyForPickup => "ready_for_pickup",
            ShipmentStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "received_at_hub" => Some(ShipmentStatus::ReceivedAtHub),
            "in_transit_air" => Some(ShipmentStatus::InTransitAir),
            "in_transit_sea" => Some(ShipmentStatus::InTransitSea),
            "clearing_customs" => Some(ShipmentStatus::ClearingCustoms),
            "ready_for_pickup" => Some(ShipmentStatus::ReadyForPickup),
            "delivered" => Some(ShipmentStatus::Delivered),
            _ => None,
        }
    }

    /// Monotonic progression: hub -> transit (air or sea) -> customs ->
    /// pickup -> delivered.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (ReceivedAtHub, InTransitAir)
                | (ReceivedAtHub, InTransitSea)
                | (InTransitAir, ClearingCustoms)
                | (InTransitSea, ClearingCustoms)
                | (ClearingCustoms, ReadyForPickup)
                | (ReadyForPickup, Delivered)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreightType {
    Air,
    Sea,
}

impl FreightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreightType::Air => "air",
            FreightType::Sea => "sea",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "air" => Some(FreightType::Air),
            "sea" => Some(FreightType::Sea),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    Promo,
    System,
    Request,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Order => "order",
            NotificationKind::Promo => "promo",
            NotificationKind::System => "system",
            NotificationKind::Request => "request",
        }
    }
}

macro_rules! impl_step_from {
    ($ty:ty) => {
        impl $ty {
            /// Parse a stored status value and check the transition to
            /// `next` in one step.
            pub fn step_from(current: &str, next: Self) -> Result<Self, ServiceError> {
                let from = Self::parse(current).ok_or_else(|| {
                    ServiceError::Database(format!("unknown stored status '{}'", current))
                })?;
                if !from.can_transition_to(next) {
                    return Err(ServiceError::InvalidTransition {
                        from: from.as_str().to_string(),
                        to: next.as_str().to_string(),
                    });
                }
                Ok(next)
            }
        }
    };
}

impl_step_from!(RequestStatus);
impl_step_from!(OrderStatus);
impl_step_from!(ShipmentStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipment_progression_is_monotonic() {
        use ShipmentStatus::*;
        assert!(ReceivedAtHub.can_transition_to(InTransitSea));
        assert!(InTransitSea.can_transition_to(ClearingCustoms));
        assert!(ClearingCustoms.can_transition_to(ReadyForPickup));
        assert!(ReadyForPickup.can_transition_to(Delivered));

        // No going backwards, no skipping customs
        assert!(!Delivered.can_transition_to(ReceivedAtHub));
        assert!(!InTransitAir.can_transition_to(ReceivedAtHub));
        assert!(!ReceivedAtHub.can_transition_to(Delivered));
        assert!(!InTransitAir.can_transition_to(InTransitSea));
    }

    #[test]
    fn order_terminal_states_have_no_exits() {
        use OrderStatus::*;
        for next in [PendingPayment, Paid, Processing, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(!PendingPayment.can_transition_to(Completed));
    }

    #[test]
    fn request_roundtrips_between_processing_and_quoted() {
        use RequestStatus::*;
        assert!(Processing.can_transition_to(Quoted));
        assert!(Quoted.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn step_from_rejects_and_accepts() {
        assert!(OrderStatus::step_from("paid", OrderStatus::Processing).is_ok());

        match OrderStatus::step_from("pending_payment", OrderStatus::Completed) {
            Err(ServiceError::InvalidTransition { from, to }) => {
                assert_eq!(from, "pending_payment");
                assert_eq!(to, "completed");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }
}
