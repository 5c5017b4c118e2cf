//! Deposit queue and sale endpoints

use crate::token_handlers::{get_deposit, get_token_deposits, list_tokens, sell_tokens};
use crate::ApiState;
use axum::{
    routing::{get, post},
    Router,
};

/// Register per-token routes
pub fn token_routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(list_tokens))
        .route("/{token}/deposits", get(get_token_deposits))
        .route("/{token}/deposits/{index}", get(get_deposit))
        .route("/{token}/sell", post(sell_tokens))
}
