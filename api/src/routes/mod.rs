//! API routes organization
//!
//! Route groups by domain:
//! - `tokens` - Deposit queues and per-token sales
//! - `income` - Period clock and income queries
//! - `payout` - Reward payout schedule and claims
//! - `admin` - Owner-only parameter changes
//!
//! Each submodule exports a router function nested under its prefix.

mod admin;
mod income;
mod payout;
mod tokens;

use crate::event_handlers::get_events;
use crate::income_handlers::get_current_period;
use crate::token_handlers::deposit_tokens;
use crate::ApiState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

/// Create the main router with all API endpoints
pub fn create_routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/deposits", post(deposit_tokens))
        .route("/periods/current", get(get_current_period))
        .route("/events", get(get_events))
        .nest("/tokens", tokens::token_routes())
        .nest("/income", income::income_routes())
        .nest("/payout", payout::payout_routes())
        .nest("/admin", admin::admin_routes())
}

async fn root() -> &'static str {
    "Compost Ledger API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    current_period: u64,
    uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    persistence_error: Option<String>,
}

/// `degraded` while the latest snapshot write has failed
async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let now = state.now();
    let current_period = state.ledger.read().await.current_period(now);
    let persistence_error = state.persistence_error();
    let status = if persistence_error.is_some() {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        current_period,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        persistence_error,
    })
}
