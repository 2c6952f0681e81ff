//! RepairDesk server library.
//!
//! Role-based repair request tracking: ticket submission, technician status
//! workflow, engineer recommendations with manager approval, parts
//! procurement, and live change streaming over WebSockets.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
