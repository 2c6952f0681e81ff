//! User domain models and auth DTOs.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role assigned to a user profile.
///
/// New signups start as `user`; only an admin may change a role afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Technician,
    Engineer,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Technician => "technician",
            Self::Engineer => "engineer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "technician" => Some(Self::Technician),
            "engineer" => Some(Self::Engineer),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User profile record stored at `users/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User profile with its store key, as returned by listing endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Signup request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    /// Plaintext password; wrapped so it is never logged.
    #[schema(value_type = String)]
    pub password: SecretString,
}

/// Login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

/// Session issued after a successful login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub uid: String,
    pub email: String,
    /// None until an admin assigns a role or the profile write lands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Body for the admin role-assignment endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    pub role: Role,
}

/// Query parameters for listing users.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListUsersQuery {
    /// Filter by role (e.g. "technician" for the assignment dropdown).
    #[serde(default)]
    pub role: Option<Role>,
}
