//! Owner-only parameter changes
//!
//! Every request names its `caller`; the ledger rejects anyone but the owner.

use crate::{ApiResult, ApiState};
use axum::{extract::State, Json};
use compost_core::LedgerConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SalePeriodRequest {
    pub caller: String,
    pub seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub caller: String,
    #[serde(with = "compost_core::amount")]
    pub amount: u128,
}

#[derive(Debug, Deserialize)]
pub struct PayoutFrequencyRequest {
    pub caller: String,
    pub seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct TransferOwnerRequest {
    pub caller: String,
    pub new_owner: String,
}

pub async fn get_config(State(state): State<ApiState>) -> Json<LedgerConfig> {
    Json(state.ledger.read().await.config())
}

pub async fn set_sale_period(
    State(state): State<ApiState>,
    Json(request): Json<SalePeriodRequest>,
) -> ApiResult<Json<LedgerConfig>> {
    state
        .mutate(|ledger, now| {
            ledger.set_sale_period(&request.caller, request.seconds, now)?;
            Ok(Json(ledger.config()))
        })
        .await
}

pub async fn set_sale_amount(
    State(state): State<ApiState>,
    Json(request): Json<AmountRequest>,
) -> ApiResult<Json<LedgerConfig>> {
    state
        .mutate(|ledger, _| {
            ledger.set_sale_amount(&request.caller, request.amount)?;
            Ok(Json(ledger.config()))
        })
        .await
}

pub async fn set_daily_mint(
    State(state): State<ApiState>,
    Json(request): Json<AmountRequest>,
) -> ApiResult<Json<LedgerConfig>> {
    state
        .mutate(|ledger, _| {
            ledger.set_daily_mint(&request.caller, request.amount)?;
            Ok(Json(ledger.config()))
        })
        .await
}

pub async fn set_payout_frequency(
    State(state): State<ApiState>,
    Json(request): Json<PayoutFrequencyRequest>,
) -> ApiResult<Json<LedgerConfig>> {
    state
        .mutate(|ledger, _| {
            ledger.set_payout_frequency(&request.caller, request.seconds)?;
            Ok(Json(ledger.config()))
        })
        .await
}

pub async fn transfer_owner(
    State(state): State<ApiState>,
    Json(request): Json<TransferOwnerRequest>,
) -> ApiResult<Json<LedgerConfig>> {
    state
        .mutate(|ledger, _| {
            ledger.transfer_owner(&request.caller, &request.new_owner)?;
            Ok(Json(ledger.config()))
        })
        .await
}
