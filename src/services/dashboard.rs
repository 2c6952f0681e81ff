//! Dashboard and report projections.
//!
//! Pure fold over the request list; nothing here writes to the store.

use chrono::{Datelike, Utc};

use crate::error::{AppError, AppResult};
use crate::models::{
    DashboardStats, RepairRequest, ReportQuery, ReportSummary, RequestStatus, Role,
};
use crate::store::TicketStore;

use super::roles::{Action, Actor};

#[derive(Clone)]
pub struct DashboardService {
    store: TicketStore,
}

impl DashboardService {
    pub fn new(store: TicketStore) -> Self {
        Self { store }
    }

    pub async fn stats(&self, actor: &Actor) -> AppResult<DashboardStats> {
        if !actor.can(Action::ViewDashboard) {
            return Err(AppError::Forbidden(
                "your role may not view the dashboard".to_string(),
            ));
        }
        let requests = self.store.list_requests(None).await?;
        let technicians = self.store.list_users(Some(Role::Technician)).await?;
        Ok(compute_stats(&requests, technicians.len() as u64))
    }

    pub async fn report(&self, actor: &Actor, query: &ReportQuery) -> AppResult<ReportSummary> {
        if !actor.can(Action::ViewDashboard) {
            return Err(AppError::Forbidden(
                "your role may not view reports".to_string(),
            ));
        }
        let requests = self.store.list_requests(None).await?;
        Ok(compute_report(&requests, query))
    }
}

fn compute_stats(requests: &[RepairRequest], active_technicians: u64) -> DashboardStats {
    let mut stats = DashboardStats {
        total_requests: requests.len() as u64,
        active_technicians,
        ..Default::default()
    };
    for request in requests {
        match request.status {
            RequestStatus::Completed => stats.completed_repairs += 1,
            RequestStatus::Pending | RequestStatus::InProgress => stats.pending_requests += 1,
            _ => {}
        }
        *stats
            .requests_by_device
            .entry(request.device_type.clone())
            .or_default() += 1;
        *stats
            .requests_by_priority
            .entry(request.priority.as_str().to_string())
            .or_default() += 1;
        *stats
            .requests_by_status
            .entry(request.status.as_str().to_string())
            .or_default() += 1;
    }
    stats
}

fn compute_report(requests: &[RepairRequest], query: &ReportQuery) -> ReportSummary {
    let mut summary = ReportSummary {
        from: query.from,
        to: query.to,
        generated_at: Utc::now(),
        ..Default::default()
    };
    for request in requests {
        let day = request.created_at.date_naive();
        if query.from.map(|from| day < from).unwrap_or(false) {
            continue;
        }
        if query.to.map(|to| day > to).unwrap_or(false) {
            continue;
        }
        summary.total_requests += 1;
        let month = format!("{:04}-{:02}", day.year(), day.month());
        *summary.requests_by_month.entry(month).or_default() += 1;
        *summary
            .requests_by_device
            .entry(request.device_type.clone())
            .or_default() += 1;
        *summary
            .requests_by_priority
            .entry(request.priority.as_str().to_string())
            .or_default() += 1;
        *summary
            .requests_by_status
            .entry(request.status.as_str().to_string())
            .or_default() += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::{DateTime, NaiveDate};

    fn request(device: &str, status: RequestStatus, created_at: &str) -> RepairRequest {
        RepairRequest {
            id: "REQ-x".to_string(),
            user_id: "u1".to_string(),
            user_email: "u@example.com".to_string(),
            device_type: device.to_string(),
            device_id: "D-1".to_string(),
            problem_description: "broken".to_string(),
            image_url: None,
            status,
            priority: Priority::Low,
            technician: None,
            vendor: None,
            recommendation: None,
            has_recommendation: None,
            recommendation_status: None,
            approved_recommendation: None,
            final_recommendation: None,
            rejection_note: None,
            created_at: created_at.parse::<DateTime<Utc>>().unwrap(),
            updated_at: created_at.parse::<DateTime<Utc>>().unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn test_stats_counters() {
        let requests = vec![
            request("Laptop", RequestStatus::Pending, "2026-01-10T00:00:00Z"),
            request("Laptop", RequestStatus::InProgress, "2026-02-10T00:00:00Z"),
            request("Printer", RequestStatus::Completed, "2026-03-10T00:00:00Z"),
            request("PC", RequestStatus::Cancelled, "2026-03-11T00:00:00Z"),
        ];
        let stats = compute_stats(&requests, 3);

        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.completed_repairs, 1);
        // Pending counter covers both Pending and In Progress.
        assert_eq!(stats.pending_requests, 2);
        assert_eq!(stats.active_technicians, 3);
        assert_eq!(stats.requests_by_device["Laptop"], 2);
        assert_eq!(stats.requests_by_status["In Progress"], 1);
    }

    #[test]
    fn test_report_date_window_inclusive() {
        let requests = vec![
            request("Laptop", RequestStatus::Pending, "2026-01-31T23:59:00Z"),
            request("Laptop", RequestStatus::Pending, "2026-02-01T00:00:00Z"),
            request("Laptop", RequestStatus::Pending, "2026-03-01T00:00:00Z"),
        ];
        let query = ReportQuery {
            from: NaiveDate::from_ymd_opt(2026, 2, 1),
            to: NaiveDate::from_ymd_opt(2026, 3, 1),
        };
        let summary = compute_report(&requests, &query);

        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.requests_by_month["2026-02"], 1);
        assert_eq!(summary.requests_by_month["2026-03"], 1);
        assert!(!summary.requests_by_month.contains_key("2026-01"));
    }

    #[test]
    fn test_report_unbounded_query_counts_everything() {
        let requests = vec![
            request("Laptop", RequestStatus::Pending, "2026-01-10T00:00:00Z"),
            request("PC", RequestStatus::Completed, "2026-02-10T00:00:00Z"),
        ];
        let summary = compute_report(&requests, &ReportQuery::default());
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.requests_by_device.len(), 2);
    }
}
