//! Period-throttled sale of queued deposits
//!
//! Each sale releases up to one chunk (`sale_amount`) from the head of a
//! token's queue. A deposit straddling the chunk boundary is drained whole
//! when what it would leave behind is smaller than a chunk, so a queue can
//! always reach zero without waiting for new deposits to top up a remainder.

use crate::clock::PeriodIndex;
use crate::deposits::{DepositLedger, TokenLedger};
use crate::error::{LedgerError, Result};
use crate::income::IncomeWindow;
use serde::{Deserialize, Serialize};

/// Amount taken from a single deposit by a sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainStep {
    pub depositor: String,
    #[serde(with = "crate::amount")]
    pub amount: u128,
    /// True when the deposit leaves the queue
    pub consumes_deposit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainPlan {
    pub steps: Vec<DrainStep>,
    pub total: u128,
}

/// Outcome of a committed sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub token: String,
    pub period: PeriodIndex,
    #[serde(with = "crate::amount")]
    pub total: u128,
    pub drained: Vec<DrainStep>,
    pub remaining_deposits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEngine {
    #[serde(with = "crate::amount")]
    sale_amount: u128,
}

impl SaleEngine {
    pub fn new(sale_amount: u128) -> Result<Self> {
        validate_sale_amount(sale_amount)?;
        Ok(Self { sale_amount })
    }

    pub fn sale_amount(&self) -> u128 {
        self.sale_amount
    }

    pub fn set_sale_amount(&mut self, amount: u128) -> Result<()> {
        validate_sale_amount(amount)?;
        self.sale_amount = amount;
        Ok(())
    }

    /// Work out which deposits a sale would drain, without touching the queue
    pub fn plan(&self, queue: &TokenLedger) -> Result<DrainPlan> {
        let chunk = self.sale_amount;
        let mut remaining = chunk;
        let mut plan = DrainPlan::default();

        for deposit in queue.deposits() {
            if remaining == 0 {
                break;
            }

            let step = if deposit.amount <= remaining {
                remaining -= deposit.amount;
                DrainStep {
                    depositor: deposit.depositor.clone(),
                    amount: deposit.amount,
                    consumes_deposit: true,
                }
            } else {
                let leftover = deposit.amount - remaining;
                let take_all = leftover < chunk;
                let amount = if take_all { deposit.amount } else { remaining };
                remaining = 0;
                DrainStep {
                    depositor: deposit.depositor.clone(),
                    amount,
                    consumes_deposit: take_all,
                }
            };

            plan.total = plan
                .total
                .checked_add(step.amount)
                .ok_or(LedgerError::ArithmeticOverflow("sale total"))?;
            plan.steps.push(step);
        }

        Ok(plan)
    }

    /// Sell `token` for `period`: drain its queue and book the proceeds.
    ///
    /// Either the drain, the income entry, and the throttle mark all commit,
    /// or the call fails and nothing changes.
    pub fn sell(
        &self,
        deposits: &mut DepositLedger,
        income: &mut IncomeWindow,
        token: &str,
        period: PeriodIndex,
    ) -> Result<SaleReceipt> {
        let queue = deposits
            .token(token)
            .ok_or_else(|| LedgerError::NoTokenDeposits(token.to_string()))?;

        if !queue.can_sell_in(period) {
            return Err(LedgerError::SaleTooSoon {
                token: token.to_string(),
                period,
            });
        }
        if queue.is_empty() {
            return Err(LedgerError::NoTokenDeposits(token.to_string()));
        }

        let plan = self.plan(queue)?;
        if !income.can_record(period, plan.total) {
            return Err(LedgerError::ArithmeticOverflow("period income"));
        }

        // Validation done; everything below is infallible
        let queue = deposits
            .token_mut(token)
            .ok_or_else(|| LedgerError::NoTokenDeposits(token.to_string()))?;
        for step in &plan.steps {
            if step.consumes_deposit {
                queue.pop_front();
            } else {
                queue.take_from_front(step.amount);
            }
        }
        queue.mark_sold(period);
        let remaining_deposits = queue.len();
        income.record(period, plan.total)?;

        Ok(SaleReceipt {
            token: token.to_string(),
            period,
            total: plan.total,
            drained: plan.steps,
            remaining_deposits,
        })
    }
}

pub fn validate_sale_amount(amount: u128) -> Result<()> {
    if amount == 0 {
        return Err(LedgerError::InvalidConfig(
            "sale amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
