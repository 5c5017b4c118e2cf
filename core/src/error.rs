//! Ledger error types

use crate::collaborators::{OracleError, TransferError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Sale interval too long: {seconds}s exceeds {max}s")]
    IntervalTooLong { seconds: u64, max: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Token {token} already sold in period {period}")]
    SaleTooSoon { token: String, period: u64 },

    #[error("No deposits outstanding for token {0}")]
    NoTokenDeposits(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payout not due for another {remaining} seconds")]
    PayoutTooSoon { remaining: u64 },

    #[error("Token transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Reputation oracle failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Coarse classification used by callers to decide between retrying,
/// surfacing, or alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected configuration change; state unchanged
    Config,
    /// Already sold this period, or payout not yet due
    Throttle,
    /// Nothing to act on (empty queue, bad amount)
    State,
    /// Caller is not the owner
    Auth,
    /// Token transfer or reputation oracle failed
    Collaborator,
    /// Overflow or persistence failure
    Internal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IntervalTooLong { .. } | Self::InvalidConfig(_) => ErrorKind::Config,
            Self::SaleTooSoon { .. } | Self::PayoutTooSoon { .. } => ErrorKind::Throttle,
            Self::NoTokenDeposits(_) | Self::InvalidAmount(_) => ErrorKind::State,
            Self::Unauthorized(_) => ErrorKind::Auth,
            Self::Transfer(_) | Self::Oracle(_) => ErrorKind::Collaborator,
            Self::ArithmeticOverflow(_) | Self::Snapshot(_) => ErrorKind::Internal,
        }
    }

    /// Expected conditions a scheduler should simply retry later
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Throttle | ErrorKind::Collaborator)
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
