//! Reward payout endpoints

use crate::{ApiResult, ApiState};
use axum::{extract::State, Json};
use compost_core::{ClaimReceipt, ReputationProof};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PayoutStatusResponse {
    pub time_to_payout: u64,
    pub payout_frequency_seconds: u64,
    #[serde(with = "compost_core::amount")]
    pub daily_mint: u128,
}

#[derive(Debug, Default, Deserialize)]
pub struct InitiatePayoutRequest {
    #[serde(default)]
    pub proof: ReputationProof,
}

#[derive(Debug, Serialize)]
pub struct InitiatePayoutResponse {
    #[serde(with = "compost_core::amount")]
    pub amount: u128,
    pub time_to_payout: u64,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub recipient: String,
}

pub async fn get_payout_status(State(state): State<ApiState>) -> Json<PayoutStatusResponse> {
    let now = state.now();
    let ledger = state.ledger.read().await;

    Json(PayoutStatusResponse {
        time_to_payout: ledger.time_to_payout(now),
        payout_frequency_seconds: ledger.payout_frequency(),
        daily_mint: ledger.daily_mint(),
    })
}

pub async fn initiate_payout(
    State(state): State<ApiState>,
    Json(request): Json<InitiatePayoutRequest>,
) -> ApiResult<Json<InitiatePayoutResponse>> {
    let (amount, time_to_payout) = state
        .mutate(|ledger, now| {
            let amount = ledger.initiate_reward_payout(&request.proof, now)?;
            Ok((amount, ledger.time_to_payout(now)))
        })
        .await?;

    Ok(Json(InitiatePayoutResponse {
        amount,
        time_to_payout,
    }))
}

/// Claims leave ledger state untouched, so no snapshot is taken
pub async fn claim(
    State(state): State<ApiState>,
    Json(request): Json<ClaimRequest>,
) -> ApiResult<Json<ClaimReceipt>> {
    let ledger = state.ledger.read().await;
    Ok(Json(ledger.claim(&request.recipient)?))
}
