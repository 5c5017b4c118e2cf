//! The accounting engine
//!
//! `Ledger` owns every piece of mutable state (deposit queues, throttle
//! marks, income series, payout clock, configuration, event log). Mutations
//! take `&mut self`, so a host serialises writers simply by holding the
//! ledger behind one lock. Every mutation validates first and commits last:
//! a failed call leaves the ledger exactly as it was.

use crate::clock::{PeriodClock, PeriodIndex};
use crate::collaborators::{ReputationOracle, ReputationProof, TokenTransfer};
use crate::config::LedgerConfig;
use crate::deposits::{validate_deposit, Deposit, DepositLedger};
use crate::error::{LedgerError, Result};
use crate::events::{ConfigParameter, EventLog, LedgerEvent, RecordedEvent};
use crate::income::IncomeWindow;
use crate::payout::{ClaimReceipt, PayoutScheduler};
use crate::sale::{SaleEngine, SaleReceipt};
use crate::snapshot::LedgerSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct Ledger {
    owner: String,
    address: String,
    clock: PeriodClock,
    deposits: DepositLedger,
    sales: SaleEngine,
    income: IncomeWindow,
    payouts: PayoutScheduler,
    events: EventLog,
    tokens: Arc<dyn TokenTransfer>,
    oracle: Arc<dyn ReputationOracle>,
}

/// Point-in-time summary for dashboards and health checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatus {
    pub owner: String,
    pub current_period: PeriodIndex,
    pub periods_per_day: u64,
    pub seconds_until_next_period: u64,
    pub time_to_payout: u64,
    pub tracked_tokens: usize,
    pub event_count: u64,
}

impl Ledger {
    /// Create an empty ledger. Period 0 starts at `config.deploy_time`, or
    /// at `now` when none is configured. A configured `anchor` resumes the
    /// period count of a ledger whose period length was changed.
    pub fn new(
        config: &LedgerConfig,
        now: u64,
        tokens: Arc<dyn TokenTransfer>,
        oracle: Arc<dyn ReputationOracle>,
    ) -> Result<Self> {
        config.validate()?;
        let deploy_time = config.deploy_time.unwrap_or(now);
        let clock = match config.anchor {
            Some(anchor) => {
                PeriodClock::resume(deploy_time, anchor, config.sale_period_seconds)?
            }
            None => PeriodClock::new(deploy_time, config.sale_period_seconds)?,
        };

        log::info!(
            "Ledger created: owner={}, period={}s, sale_amount={}, payout every {}s",
            config.owner,
            config.sale_period_seconds,
            config.sale_amount,
            config.payout_frequency_seconds
        );

        Ok(Self {
            owner: config.owner.clone(),
            address: config.address.clone(),
            clock,
            deposits: DepositLedger::new(),
            sales: SaleEngine::new(config.sale_amount)?,
            income: IncomeWindow::new(),
            payouts: PayoutScheduler::new(
                deploy_time,
                config.payout_frequency_seconds,
                config.daily_mint,
            )?,
            events: EventLog::with_retention(config.event_retention),
            tokens,
            oracle,
        })
    }

    /// Rebuild a ledger from a snapshot, wiring in fresh collaborators
    pub fn restore(
        snapshot: LedgerSnapshot,
        tokens: Arc<dyn TokenTransfer>,
        oracle: Arc<dyn ReputationOracle>,
    ) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self {
            owner: snapshot.owner,
            address: snapshot.address,
            clock: snapshot.clock,
            deposits: snapshot.deposits,
            sales: snapshot.sales,
            income: snapshot.income,
            payouts: snapshot.payouts,
            events: snapshot.events,
            tokens,
            oracle,
        })
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(
            self.owner.clone(),
            self.address.clone(),
            self.clock.clone(),
            self.deposits.clone(),
            self.sales.clone(),
            self.income.clone(),
            self.payouts.clone(),
            self.events.clone(),
            self.tokens.export_state(),
        )
    }

    // ------------------------------------------------------------------
    // Deposits
    // ------------------------------------------------------------------

    /// Pull `amount` of `token` from `depositor` and queue it for sale
    pub fn deposit_tokens(&mut self, token: &str, depositor: &str, amount: u128) -> Result<()> {
        validate_deposit(token, depositor, amount)?;

        if let Err(e) = self
            .tokens
            .transfer_from(token, depositor, &self.address, amount)
        {
            log::warn!(
                "Deposit of {} {} from {} failed: {}",
                amount,
                token,
                depositor,
                e
            );
            return Err(e.into());
        }

        self.deposits.push(token, depositor, amount)?;
        self.events.append(LedgerEvent::TokensDeposited {
            depositor: depositor.to_string(),
            token: token.to_string(),
            amount,
        });

        log::debug!(
            "Deposited {} {} from {} ({} queued)",
            amount,
            token,
            depositor,
            self.deposits.num_deposits(token)
        );
        Ok(())
    }

    pub fn num_deposits(&self, token: &str) -> usize {
        self.deposits.num_deposits(token)
    }

    pub fn get_deposit(&self, token: &str, index: usize) -> Option<Deposit> {
        self.deposits.get_deposit(token, index).cloned()
    }

    pub fn deposits(&self, token: &str) -> Vec<Deposit> {
        self.deposits.deposits(token)
    }

    pub fn outstanding(&self, token: &str) -> u128 {
        self.deposits.outstanding(token)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.deposits.tokens()
    }

    pub fn last_sold_period(&self, token: &str) -> Option<PeriodIndex> {
        self.deposits
            .token(token)
            .and_then(|ledger| ledger.last_sold_period())
    }

    // ------------------------------------------------------------------
    // Sales
    // ------------------------------------------------------------------

    /// Sell up to one chunk of `token` for the period containing `now`
    pub fn sell_tokens(&mut self, token: &str, now: u64) -> Result<SaleReceipt> {
        let period = self.clock.current_period(now);
        let receipt = self
            .sales
            .sell(&mut self.deposits, &mut self.income, token, period)?;

        self.events
            .extend(receipt.drained.iter().map(|step| LedgerEvent::TokensComposted {
                depositor: step.depositor.clone(),
                token: token.to_string(),
                amount: step.amount,
                period,
            }));

        log::info!(
            "Composted {} {} in period {} from {} deposit(s), {} remaining",
            receipt.total,
            token,
            period,
            receipt.drained.len(),
            receipt.remaining_deposits
        );
        Ok(receipt)
    }

    /// Whether `sell_tokens(token, now)` would pass the throttle and
    /// empty-queue checks
    pub fn can_sell(&self, token: &str, now: u64) -> bool {
        let period = self.clock.current_period(now);
        self.deposits
            .token(token)
            .map(|ledger| !ledger.is_empty() && ledger.can_sell_in(period))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Periods and income
    // ------------------------------------------------------------------

    pub fn current_period(&self, now: u64) -> PeriodIndex {
        self.clock.current_period(now)
    }

    pub fn periods_per_day(&self) -> u64 {
        self.clock.periods_per_day()
    }

    pub fn sale_period(&self) -> u64 {
        self.clock.sale_period()
    }

    pub fn sale_amount(&self) -> u128 {
        self.sales.sale_amount()
    }

    /// Income of the trailing day of completed periods
    pub fn daily_income(&self, now: u64) -> Result<u128> {
        self.income
            .daily_income(self.clock.current_period(now), self.clock.periods_per_day())
    }

    /// Zero-filled income of every completed period. Grows with the age of
    /// the ledger; prefer `period_incomes_between` for long-lived ledgers.
    pub fn period_incomes(&self, now: u64) -> Vec<u128> {
        self.income.period_incomes(self.clock.current_period(now))
    }

    /// Zero-filled income of completed periods in `from..to`, at most
    /// `MAX_INCOME_PERIODS_PER_QUERY` of them
    pub fn period_incomes_between(
        &self,
        from: PeriodIndex,
        to: PeriodIndex,
        now: u64,
    ) -> Vec<u128> {
        self.income
            .period_incomes_between(from, to, self.clock.current_period(now))
    }

    pub fn period_income(&self, period: PeriodIndex) -> u128 {
        self.income.period_income(period)
    }

    // ------------------------------------------------------------------
    // Payouts
    // ------------------------------------------------------------------

    pub fn time_to_payout(&self, now: u64) -> u64 {
        self.payouts.time_to_payout(now)
    }

    pub fn daily_mint(&self) -> u128 {
        self.payouts.daily_mint()
    }

    pub fn payout_frequency(&self) -> u64 {
        self.payouts.payout_frequency()
    }

    /// Start a reward payout through the oracle once the cycle has elapsed.
    /// Returns the pot handed to the oracle.
    pub fn initiate_reward_payout(&mut self, proof: &ReputationProof, now: u64) -> Result<u128> {
        let remaining = self.payouts.time_to_payout(now);
        if remaining > 0 {
            return Err(LedgerError::PayoutTooSoon { remaining });
        }

        let amount = self.payouts.payout_amount()?;
        if let Err(e) = self.oracle.start_payout(proof, amount) {
            log::warn!("Reward payout of {} rejected: {}", amount, e);
            return Err(e.into());
        }

        self.payouts.mark_paid(now);
        self.events.append(LedgerEvent::RewardPayoutInitiated {
            amount,
            timestamp: now,
        });
        log::info!(
            "Reward payout of {} started, next due at {}",
            amount,
            self.payouts.next_payout_at()
        );
        Ok(amount)
    }

    /// Claim `recipient`'s share of the current payout from the oracle
    pub fn claim(&self, recipient: &str) -> Result<ClaimReceipt> {
        let share = self.oracle.reputation_share(recipient)?;
        self.oracle.claim_funds(recipient)?;

        log::info!(
            "{} claimed {}/{} of the reward pot",
            recipient,
            share.numerator,
            share.denominator
        );
        Ok(ClaimReceipt {
            recipient: recipient.to_string(),
            share,
        })
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn require_owner(&self, caller: &str) -> Result<()> {
        if caller != self.owner {
            return Err(LedgerError::Unauthorized(format!(
                "{} is not the ledger owner",
                caller
            )));
        }
        Ok(())
    }

    fn config_updated(&mut self, parameter: ConfigParameter, value: String) {
        log::info!("Config updated: {} = {}", parameter, value);
        self.events
            .append(LedgerEvent::ConfigUpdated { parameter, value });
    }

    pub fn set_sale_period(&mut self, caller: &str, seconds: u64, now: u64) -> Result<()> {
        self.require_owner(caller)?;
        self.clock.set_sale_period(seconds, now)?;
        self.config_updated(ConfigParameter::SalePeriod, seconds.to_string());
        Ok(())
    }

    pub fn set_sale_amount(&mut self, caller: &str, amount: u128) -> Result<()> {
        self.require_owner(caller)?;
        self.sales.set_sale_amount(amount)?;
        self.config_updated(ConfigParameter::SaleAmount, amount.to_string());
        Ok(())
    }

    pub fn set_daily_mint(&mut self, caller: &str, amount: u128) -> Result<()> {
        self.require_owner(caller)?;
        self.payouts.set_daily_mint(amount);
        self.config_updated(ConfigParameter::DailyMint, amount.to_string());
        Ok(())
    }

    pub fn set_payout_frequency(&mut self, caller: &str, seconds: u64) -> Result<()> {
        self.require_owner(caller)?;
        self.payouts.set_payout_frequency(seconds)?;
        self.config_updated(ConfigParameter::PayoutFrequency, seconds.to_string());
        Ok(())
    }

    pub fn transfer_owner(&mut self, caller: &str, new_owner: &str) -> Result<()> {
        self.require_owner(caller)?;
        if new_owner.trim().is_empty() {
            return Err(LedgerError::InvalidConfig(
                "new owner address is required".to_string(),
            ));
        }

        let previous = std::mem::replace(&mut self.owner, new_owner.to_string());
        log::info!("Ownership transferred from {} to {}", previous, new_owner);
        self.events.append(LedgerEvent::OwnerTransferred {
            previous,
            owner: new_owner.to_string(),
        });
        Ok(())
    }

    /// Effective configuration, as it would be written back to a config file
    pub fn config(&self) -> LedgerConfig {
        LedgerConfig {
            owner: self.owner.clone(),
            address: self.address.clone(),
            deploy_time: Some(self.clock.deploy_time()),
            anchor: self.clock.anchor(),
            sale_period_seconds: self.clock.sale_period(),
            sale_amount: self.sales.sale_amount(),
            daily_mint: self.payouts.daily_mint(),
            payout_frequency_seconds: self.payouts.payout_frequency(),
            event_retention: self.events.retention(),
        }
    }

    // ------------------------------------------------------------------
    // Events and status
    // ------------------------------------------------------------------

    /// Retained events, oldest first
    pub fn events(&self) -> &[RecordedEvent] {
        self.events.all()
    }

    pub fn events_since(&self, cursor: u64) -> &[RecordedEvent] {
        self.events.since(cursor)
    }

    pub fn events_page(&self, cursor: u64, limit: usize) -> &[RecordedEvent] {
        self.events.page(cursor, limit)
    }

    pub fn oldest_event_sequence(&self) -> u64 {
        self.events.first_sequence()
    }

    /// Number of events ever recorded, including compacted ones
    pub fn next_event_sequence(&self) -> u64 {
        self.events.next_sequence()
    }

    pub fn status(&self, now: u64) -> LedgerStatus {
        LedgerStatus {
            owner: self.owner.clone(),
            current_period: self.clock.current_period(now),
            periods_per_day: self.clock.periods_per_day(),
            seconds_until_next_period: self.clock.seconds_until_next_period(now),
            time_to_payout: self.payouts.time_to_payout(now),
            tracked_tokens: self.deposits.tokens().len(),
            event_count: self.events.next_sequence(),
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("owner", &self.owner)
            .field("address", &self.address)
            .field("clock", &self.clock)
            .field("deposits", &self.deposits)
            .field("sales", &self.sales)
            .field("income", &self.income)
            .field("payouts", &self.payouts)
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}
