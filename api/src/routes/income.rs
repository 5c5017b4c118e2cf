//! Income query endpoints

use crate::income_handlers::{get_daily_income, get_period_incomes};
use crate::ApiState;
use axum::{routing::get, Router};

pub fn income_routes() -> Router<ApiState> {
    Router::new()
        .route("/daily", get(get_daily_income))
        .route("/periods", get(get_period_incomes))
}
