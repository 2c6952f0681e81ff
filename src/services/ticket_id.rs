//! Human-readable request ID allocation.
//!
//! IDs look like `REQ-jo-20260830-832123`: the requester's email local part,
//! the UTC date, and the last six digits of the epoch-millisecond clock at
//! derivation time. On collision the base is re-derived (so the clock tail
//! moves) and a zero-padded two-digit attempt counter is appended, e.g.
//! `REQ-jo-20260830-832124-01`. Allocation drives the store's keyed create
//! until an unused ID sticks, bounded so a pathological collision run fails
//! loudly instead of spinning forever.

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};
use crate::models::RepairRequest;
use crate::store::TicketStore;

/// Attempt cap before allocation gives up with a 503.
pub const MAX_ATTEMPTS: u32 = 50;

/// Build one candidate ID from the clock. Attempt 0 is the bare base token;
/// retries carry the attempt counter as an extra suffix.
pub fn candidate_id(email: &str, now: DateTime<Utc>, attempt: u32) -> String {
    let base = format!(
        "REQ-{}-{}-{:06}",
        local_part(email),
        now.format("%Y%m%d"),
        now.timestamp_millis().rem_euclid(1_000_000)
    );
    if attempt == 0 {
        base
    } else {
        format!("{}-{:02}", base, attempt)
    }
}

/// Allocate an unused ID and persist the record under it in one step; the
/// keyed create doubles as the existence check, so no window exists between
/// "ID is free" and "record is written". Each retry rereads the clock, so
/// both the millisecond tail and the counter vary across attempts.
pub async fn allocate(
    store: &TicketStore,
    email: &str,
    record: &RepairRequest,
) -> AppResult<String> {
    for attempt in 0..MAX_ATTEMPTS {
        let id = candidate_id(email, Utc::now(), attempt);
        match store.insert_request(&id, record).await {
            Ok(()) => return Ok(id),
            Err(AppError::AlreadyExists(_)) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(AppError::AllocationExhausted(MAX_ATTEMPTS))
}

fn local_part(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let cleaned: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if cleaned.is_empty() {
        "user".to_string()
    } else {
        cleaned
    }
}
