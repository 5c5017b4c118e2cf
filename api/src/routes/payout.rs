//! Reward payout endpoints

use crate::payout_handlers::{claim, get_payout_status, initiate_payout};
use crate::ApiState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn payout_routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(get_payout_status))
        .route("/initiate", post(initiate_payout))
        .route("/claim", post(claim))
}
