use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the signed-in operator, as stored on the user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    HealthWorker,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::HealthWorker => "health_worker",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "health_worker" => Some(UserRole::HealthWorker),
            _ => None,
        }
    }
}

/// Represents the authenticated operator for the current operation.
///
/// Session management lives with the host; this crate only records who
/// created a beneficiary or administered a dose.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The ID of the authenticated user
    pub user_id: Uuid,

    /// The role of the authenticated user
    pub role: UserRole,

    /// The ID of the current device
    pub device_id: String,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid, role: UserRole, device_id: String) -> Self {
        Self {
            user_id,
            role,
            device_id,
        }
    }

    /// Create a new authentication context for internal system operations
    pub fn internal_system_context() -> Self {
        Self {
            user_id: Uuid::nil(),
            role: UserRole::Admin,
            device_id: "system".to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}
