//! Domain models for the RepairDesk server.

pub mod dashboard;
pub mod parts;
pub mod recommendation;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use dashboard::{DashboardStats, ReportQuery, ReportSummary};
pub use parts::{
    DocumentReferences, PartItem, PartsRequest, PartsStatus, SubmitPartsBody, SupplyDocument,
};
pub use recommendation::{
    ApprovalStatus, ListRecommendationsQuery, Recommendation, RejectRecommendationBody,
    SubmitRecommendationBody,
};
pub use request::{
    EditRequestBody, Priority, RepairRequest, RequestStatus, SubmitRequestBody, UpdateStatusBody,
};
pub use user::{
    AssignRoleRequest, ListUsersQuery, LoginRequest, Role, SessionResponse, SignUpRequest,
    UserProfile, UserRecord,
};
