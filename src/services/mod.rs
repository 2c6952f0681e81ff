//! Workflow services: all domain rules live here, between the HTTP handlers
//! and the typed store.

pub mod dashboard;
pub mod parts;
pub mod recommendations;
pub mod requests;
pub mod roles;
pub mod ticket_id;

pub use dashboard::DashboardService;
pub use parts::PartsService;
pub use recommendations::RecommendationService;
pub use requests::RequestService;
pub use roles::{Action, Actor};
