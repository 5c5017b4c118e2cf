//! Owner-only configuration endpoints

use crate::admin_handlers::{
    get_config, set_daily_mint, set_payout_frequency, set_sale_amount, set_sale_period,
    transfer_owner,
};
use crate::ApiState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn admin_routes() -> Router<ApiState> {
    Router::new()
        .route("/config", get(get_config))
        .route("/sale-period", post(set_sale_period))
        .route("/sale-amount", post(set_sale_amount))
        .route("/daily-mint", post(set_daily_mint))
        .route("/payout-frequency", post(set_payout_frequency))
        .route("/owner", post(transfer_owner))
}
