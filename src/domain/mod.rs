pub mod errors;
pub mod status;
pub mod vin;

use serde::{Deserialize, Serialize};

/// Profile role. Immutable except through the admin role-change action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Role::Customer),
            "agent" => Some(Role::Agent),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Who is looking. Services use this to scope reads and gate writes:
/// customers see their own rows, agents the rows assigned to them,
/// admins everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Customer(i32),
    Agent(i32),
    Admin(i32),
}

impl Viewer {
    pub fn id(&self) -> i32 {
        match self {
            Viewer::Customer(id) | Viewer::Agent(id) | Viewer::Admin(id) => *id,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Viewer::Admin(_))
    }
}
