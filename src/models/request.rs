//! Repair request domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::recommendation::ApprovalStatus;

/// Repair request status.
///
/// The wire strings match the store schema exactly, including the space in
/// "In Progress".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RequestStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Recommended,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Recommended => "Recommended",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Self::Pending),
            "In Progress" => Some(Self::InProgress),
            "Recommended" => Some(Self::Recommended),
            "Completed" => Some(Self::Completed),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether no further transitions leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the direct status-update operation may move from `self` to `next`.
    ///
    /// Encodes the forward-only workflow graph:
    /// Pending -> In Progress -> {Recommended | Completed | Cancelled},
    /// with Cancelled reachable from any non-terminal state. Regressions
    /// (e.g. Completed -> Pending) happen only as recommendation-rejection
    /// side effects, never through this operation.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        match (self, next) {
            (Pending, InProgress) => true,
            (InProgress, Completed) => true,
            (InProgress, Recommended) => true,
            (Recommended, Completed) => true,
            (_, Cancelled) => !self.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Repair request priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Repair request record stored at `requests/{requestId}`.
///
/// `id` is the human-readable allocated key, carried in responses but not
/// duplicated inside the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_id: String,
    pub user_email: String,
    pub device_type: String,
    pub device_id: String,
    pub problem_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: RequestStatus,
    pub priority: Priority,
    /// Assigned technician email, set via admin edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Legacy single-field recommendation path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_recommendation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Body for submitting a new repair request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequestBody {
    pub device_type: String,
    pub device_id: String,
    pub problem_description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body for the direct status-transition operation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusBody {
    pub status: RequestStatus,
}

/// Body for the admin edit operation. All fields optional; only supplied
/// fields are patched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditRequestBody {
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub problem_description: Option<String>,
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}
