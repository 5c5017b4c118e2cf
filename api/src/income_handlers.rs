//! Period and income queries

use crate::{ApiError, ApiResult, ApiState};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// Upper bound on periods returned by one `/income/periods` call
pub const MAX_PERIODS_PER_PAGE: u64 = compost_core::MAX_INCOME_PERIODS_PER_QUERY;

#[derive(Debug, Serialize)]
pub struct CurrentPeriodResponse {
    pub current_period: u64,
    pub periods_per_day: u64,
    pub sale_period_seconds: u64,
    pub seconds_until_next_period: u64,
}

#[derive(Debug, Serialize)]
pub struct DailyIncomeResponse {
    pub current_period: u64,
    pub periods_per_day: u64,
    #[serde(with = "compost_core::amount")]
    pub daily_income: u128,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodIncomesQuery {
    pub from: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PeriodIncomesResponse {
    pub current_period: u64,
    pub from: u64,
    #[serde(with = "compost_core::amount::vec")]
    pub incomes: Vec<u128>,
}

pub async fn get_current_period(State(state): State<ApiState>) -> Json<CurrentPeriodResponse> {
    let now = state.now();
    let ledger = state.ledger.read().await;
    let status = ledger.status(now);

    Json(CurrentPeriodResponse {
        current_period: status.current_period,
        periods_per_day: status.periods_per_day,
        sale_period_seconds: ledger.sale_period(),
        seconds_until_next_period: status.seconds_until_next_period,
    })
}

pub async fn get_daily_income(
    State(state): State<ApiState>,
) -> ApiResult<Json<DailyIncomeResponse>> {
    let now = state.now();
    let ledger = state.ledger.read().await;

    Ok(Json(DailyIncomeResponse {
        current_period: ledger.current_period(now),
        periods_per_day: ledger.periods_per_day(),
        daily_income: ledger.daily_income(now)?,
    }))
}

/// Zero-filled income of completed periods, one page at a time
pub async fn get_period_incomes(
    State(state): State<ApiState>,
    Query(query): Query<PeriodIncomesQuery>,
) -> ApiResult<Json<PeriodIncomesResponse>> {
    let limit = query.limit.unwrap_or(MAX_PERIODS_PER_PAGE);
    if limit == 0 || limit > MAX_PERIODS_PER_PAGE {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PERIODS_PER_PAGE
        )));
    }

    let now = state.now();
    let ledger = state.ledger.read().await;
    let current = ledger.current_period(now);
    let from = query
        .from
        .unwrap_or_else(|| current.saturating_sub(limit))
        .min(current);

    Ok(Json(PeriodIncomesResponse {
        current_period: current,
        from,
        incomes: ledger.period_incomes_between(from, from.saturating_add(limit), now),
    }))
}
