//! Dashboard and report projection models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Aggregate counters shown on the admin/manager dashboards.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_requests: u64,
    pub completed_repairs: u64,
    /// Pending here means "not yet done": Pending plus In Progress.
    pub pending_requests: u64,
    pub active_technicians: u64,
    pub requests_by_device: BTreeMap<String, u64>,
    pub requests_by_priority: BTreeMap<String, u64>,
    pub requests_by_status: BTreeMap<String, u64>,
}

/// Date-filtered report summary.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_requests: u64,
    /// Month buckets keyed "YYYY-MM" so they sort chronologically.
    pub requests_by_month: BTreeMap<String, u64>,
    pub requests_by_device: BTreeMap<String, u64>,
    pub requests_by_priority: BTreeMap<String, u64>,
    pub requests_by_status: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    pub generated_at: DateTime<Utc>,
}

/// Query parameters for the report summary endpoint.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReportQuery {
    /// Inclusive start date (YYYY-MM-DD).
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD).
    #[serde(default)]
    pub to: Option<NaiveDate>,
}
