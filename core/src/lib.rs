//! Compost Core Library
//!
//! Period-throttled deposit and sale accounting:
//! - Deposits queue per token in FIFO order
//! - Each token is sold at most once per period, one chunk at a time
//! - Proceeds are booked per period and summed over a trailing day
//! - Reward payouts are timed here and executed by a reputation oracle

pub mod amount;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod deposits;
pub mod error;
pub mod events;
pub mod income;
pub mod ledger;
pub mod payout;
pub mod sale;
pub mod snapshot;

// Re-export main types
pub use clock::{ManualClock, PeriodAnchor, PeriodClock, PeriodIndex, SystemClock, TimeSource};
pub use collaborators::{
    OracleError, ReputationOracle, ReputationProof, Share, StaticReputation, TokenBank,
    TokenBankState, TokenTransfer, TransferError,
};
pub use config::LedgerConfig;
pub use constants::{MAX_INCOME_PERIODS_PER_QUERY, SECONDS_PER_DAY, WAD};
pub use deposits::{Deposit, DepositLedger, TokenLedger};
pub use error::{ErrorKind, LedgerError, Result};
pub use events::{ConfigParameter, LedgerEvent, RecordedEvent};
pub use income::{IncomeWindow, PeriodIncome};
pub use ledger::{Ledger, LedgerStatus};
pub use payout::{ClaimReceipt, PayoutScheduler};
pub use sale::{DrainStep, SaleEngine, SaleReceipt};
pub use snapshot::LedgerSnapshot;

/// Type alias for account and token identifiers
pub type Address = String;
