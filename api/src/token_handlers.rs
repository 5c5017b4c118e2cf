//! Deposit and sale endpoints

use crate::{ApiError, ApiResult, ApiState};
use axum::{
    extract::{Path, State},
    Json,
};
use compost_core::{Deposit, SaleReceipt};
use serde::{Deserialize, Serialize};
use tracing as log;

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub token: String,
    pub depositor: String,
    #[serde(with = "compost_core::amount")]
    pub amount: u128,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub token: String,
    pub depositor: String,
    #[serde(with = "compost_core::amount")]
    pub amount: u128,
    pub num_deposits: usize,
}

#[derive(Debug, Serialize)]
pub struct TokenDepositsResponse {
    pub token: String,
    pub num_deposits: usize,
    #[serde(with = "compost_core::amount")]
    pub outstanding: u128,
    pub last_sold_period: Option<u64>,
    pub deposits: Vec<Deposit>,
}

#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub tokens: Vec<String>,
}

/// Queue a deposit after pulling the tokens from the depositor
pub async fn deposit_tokens(
    State(state): State<ApiState>,
    Json(request): Json<DepositRequest>,
) -> ApiResult<Json<DepositResponse>> {
    let num_deposits = state
        .mutate(|ledger, _| {
            ledger.deposit_tokens(&request.token, &request.depositor, request.amount)?;
            Ok(ledger.num_deposits(&request.token))
        })
        .await?;

    Ok(Json(DepositResponse {
        token: request.token,
        depositor: request.depositor,
        amount: request.amount,
        num_deposits,
    }))
}

pub async fn list_tokens(State(state): State<ApiState>) -> Json<TokenListResponse> {
    let ledger = state.ledger.read().await;
    Json(TokenListResponse {
        tokens: ledger.tokens(),
    })
}

pub async fn get_token_deposits(
    State(state): State<ApiState>,
    Path(token): Path<String>,
) -> Json<TokenDepositsResponse> {
    let ledger = state.ledger.read().await;
    Json(TokenDepositsResponse {
        num_deposits: ledger.num_deposits(&token),
        outstanding: ledger.outstanding(&token),
        last_sold_period: ledger.last_sold_period(&token),
        deposits: ledger.deposits(&token),
        token,
    })
}

pub async fn get_deposit(
    State(state): State<ApiState>,
    Path((token, index)): Path<(String, usize)>,
) -> ApiResult<Json<Deposit>> {
    let ledger = state.ledger.read().await;
    ledger
        .get_deposit(&token, index)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("deposit {} of token {}", index, token)))
}

/// Sell this period's chunk of `token`
pub async fn sell_tokens(
    State(state): State<ApiState>,
    Path(token): Path<String>,
) -> ApiResult<Json<SaleReceipt>> {
    let receipt = state
        .mutate(|ledger, now| ledger.sell_tokens(&token, now))
        .await
        .inspect_err(|e| log::debug!("Sale of {} refused: {}", token, e))?;

    Ok(Json(receipt))
}
