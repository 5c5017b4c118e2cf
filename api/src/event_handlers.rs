use crate::{ApiError, ApiResult, ApiState};
use axum::{
    extract::{Query, State},
    Json,
};
use compost_core::RecordedEvent;
use serde::{Deserialize, Serialize};

/// Upper bound on events returned by one `/events` call
pub const MAX_EVENTS_PER_PAGE: u64 = 1_000;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<RecordedEvent>,
    /// Cursor to pass as `since` on the next poll
    pub next: u64,
    /// Oldest sequence still retained; older events were compacted away
    pub oldest: u64,
}

pub async fn get_events(
    State(state): State<ApiState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<EventsResponse>> {
    let limit = query.limit.unwrap_or(MAX_EVENTS_PER_PAGE);
    if limit == 0 || limit > MAX_EVENTS_PER_PAGE {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_EVENTS_PER_PAGE
        )));
    }

    let ledger = state.ledger.read().await;
    let oldest = ledger.oldest_event_sequence();
    let events = ledger.events_page(query.since, limit as usize).to_vec();
    let next = match events.last() {
        Some(last) => last.sequence + 1,
        None => query.since.max(oldest).min(ledger.next_event_sequence()),
    };

    Ok(Json(EventsResponse {
        events,
        next,
        oldest,
    }))
}
