//! API Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use compost_core::{ErrorKind, LedgerError};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(e) => match e.kind() {
                ErrorKind::Config | ErrorKind::State => StatusCode::BAD_REQUEST,
                ErrorKind::Throttle => StatusCode::TOO_MANY_REQUESTS,
                ErrorKind::Auth => StatusCode::FORBIDDEN,
                ErrorKind::Collaborator => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::Ledger(e) => match e {
                LedgerError::IntervalTooLong { .. } => "interval_too_long",
                LedgerError::InvalidConfig(_) => "invalid_config",
                LedgerError::SaleTooSoon { .. } => "sale_too_soon",
                LedgerError::NoTokenDeposits(_) => "no_token_deposits",
                LedgerError::InvalidAmount(_) => "invalid_amount",
                LedgerError::Unauthorized(_) => "unauthorized",
                LedgerError::PayoutTooSoon { .. } => "payout_too_soon",
                LedgerError::Transfer(_) => "transfer_failed",
                LedgerError::Oracle(_) => "oracle_failed",
                LedgerError::ArithmeticOverflow(_) => "arithmetic_overflow",
                LedgerError::Snapshot(_) => "snapshot_failed",
            },
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.error_type(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compost_core::{OracleError, TransferError};

    #[test]
    fn test_ledger_error_status() {
        let cases = vec![
            (
                LedgerError::IntervalTooLong {
                    seconds: 86_401,
                    max: 86_400,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::NoTokenDeposits("tok".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::SaleTooSoon {
                    token: "tok".to_string(),
                    period: 1,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                LedgerError::Unauthorized("mallory".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                TransferError::Unavailable("down".to_string()).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                OracleError::Rejected("no".to_string()).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                LedgerError::ArithmeticOverflow("income"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_message_passes_through() {
        let err = ApiError::from(LedgerError::NoTokenDeposits("0xtok".to_string()));
        assert_eq!(err.to_string(), "No deposits outstanding for token 0xtok");
        assert_eq!(err.error_type(), "no_token_deposits");
    }
}
