//! Parts procurement models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Parts request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PartsStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
}

impl PartsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processed => "processed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "processed" => Some(Self::Processed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PartsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One requested part. `amount` stays a free-form string in the store schema
/// (quantities like "2" and costs like "1500.00" both occur).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartItem {
    pub name: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PartItem {
    /// A row is blank when its name or amount is empty after trimming;
    /// blank rows are dropped before persisting.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() || self.amount.trim().is_empty()
    }
}

/// Parts request record stored at `partsRequests/{autoId}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartsRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub request_id: String,
    pub technician_email: String,
    pub technician_name: String,
    #[serde(default)]
    pub items: Vec<PartItem>,
    pub status: PartsStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
}

/// Body for submitting a parts request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitPartsBody {
    pub items: Vec<PartItem>,
}

/// Paperwork reference numbers stamped onto a supply-division document,
/// supplied by the requesting admin. All optional.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DocumentReferences {
    pub device_no: Option<String>,
    pub quotation_tender_no: Option<String>,
    pub purchase_order_no: Option<String>,
    pub grn_no: Option<String>,
}

/// Supply-division document data, generated as a one-shot snapshot of a
/// parts request. Rendering/printing happens client-side.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyDocument {
    pub request_id: String,
    pub technician_email: String,
    pub items: Vec<PartItem>,
    /// Sum of the item amounts that parse as numbers, rendered with two
    /// decimal places.
    pub total: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_tender_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grn_no: Option<String>,
}

impl SupplyDocument {
    /// Build the document from a parts request snapshot plus the caller's
    /// reference numbers. Unparseable amounts contribute zero.
    pub fn from_parts_request(
        parts: &PartsRequest,
        refs: DocumentReferences,
        now: DateTime<Utc>,
    ) -> Self {
        let total: f64 = parts
            .items
            .iter()
            .map(|item| item.amount.trim().parse::<f64>().unwrap_or(0.0))
            .sum();

        Self {
            request_id: parts.request_id.clone(),
            technician_email: parts.technician_email.clone(),
            items: parts.items.clone(),
            total: format!("{:.2}", total),
            generated_at: now,
            device_no: refs.device_no,
            quotation_tender_no: refs.quotation_tender_no,
            purchase_order_no: refs.purchase_order_no,
            grn_no: refs.grn_no,
        }
    }
}
