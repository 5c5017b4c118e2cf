//! Period clock and time sources
//!
//! Periods are derived on demand from the caller-supplied `now`; nothing in
//! the ledger runs on a timer. Period 0 starts at deployment.

use crate::constants::{MAX_SALE_PERIOD_SECONDS, SECONDS_PER_DAY};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Index of a fixed-length sale period since deployment
pub type PeriodIndex = u64;

/// Start of the period the clock currently counts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodAnchor {
    pub time: u64,
    pub period: PeriodIndex,
}

/// Converts elapsed time into a monotonically increasing period index.
///
/// The clock keeps an anchor `(anchor_time, anchor_period)`. Changing the
/// period length rebases the anchor to the start of the current period, so
/// indices already handed out are never rewritten. `deploy_time` never moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClock {
    deploy_time: u64,
    sale_period: u64,
    anchor_time: u64,
    anchor_period: PeriodIndex,
}

impl PeriodClock {
    pub fn new(deploy_time: u64, sale_period: u64) -> Result<Self> {
        validate_sale_period(sale_period)?;
        Ok(Self {
            deploy_time,
            sale_period,
            anchor_time: deploy_time,
            anchor_period: 0,
        })
    }

    /// Rebuild a clock that was rebased after deployment
    pub fn resume(deploy_time: u64, anchor: PeriodAnchor, sale_period: u64) -> Result<Self> {
        validate_sale_period(sale_period)?;
        validate_anchor(deploy_time, anchor)?;
        Ok(Self {
            deploy_time,
            sale_period,
            anchor_time: anchor.time,
            anchor_period: anchor.period,
        })
    }

    pub fn deploy_time(&self) -> u64 {
        self.deploy_time
    }

    pub fn sale_period(&self) -> u64 {
        self.sale_period
    }

    /// `None` until the period length has been changed
    pub fn anchor(&self) -> Option<PeriodAnchor> {
        (self.anchor_period > 0 || self.anchor_time != self.deploy_time).then_some(PeriodAnchor {
            time: self.anchor_time,
            period: self.anchor_period,
        })
    }

    pub fn anchor_time(&self) -> u64 {
        self.anchor_time
    }

    pub fn anchor_period(&self) -> PeriodIndex {
        self.anchor_period
    }

    /// Period containing `now`. Times before the anchor map to the anchor period.
    pub fn current_period(&self, now: u64) -> PeriodIndex {
        let elapsed = now.saturating_sub(self.anchor_time);
        self.anchor_period + elapsed / self.sale_period
    }

    pub fn periods_per_day(&self) -> u64 {
        SECONDS_PER_DAY / self.sale_period
    }

    /// Timestamp at which `period` began (clamped to the anchor for older periods)
    pub fn period_start(&self, period: PeriodIndex) -> u64 {
        let offset = period.saturating_sub(self.anchor_period);
        self.anchor_time
            .saturating_add(offset.saturating_mul(self.sale_period))
    }

    /// Seconds until the period containing `now` closes
    pub fn seconds_until_next_period(&self, now: u64) -> u64 {
        let next = self.period_start(self.current_period(now) + 1);
        next.saturating_sub(now)
    }

    /// Switch to a new period length from the current period onward.
    pub fn set_sale_period(&mut self, seconds: u64, now: u64) -> Result<()> {
        validate_sale_period(seconds)?;

        let current = self.current_period(now);
        self.anchor_time = self.period_start(current);
        self.anchor_period = current;
        self.sale_period = seconds;
        Ok(())
    }
}

/// Reject zero-length periods and periods longer than one day
pub fn validate_sale_period(seconds: u64) -> Result<()> {
    if seconds == 0 {
        return Err(LedgerError::InvalidConfig(
            "sale period must be at least one second".to_string(),
        ));
    }
    if seconds > MAX_SALE_PERIOD_SECONDS {
        return Err(LedgerError::IntervalTooLong {
            seconds,
            max: MAX_SALE_PERIOD_SECONDS,
        });
    }
    Ok(())
}

/// An anchor can only lie after deployment, and period 0 always starts there
pub fn validate_anchor(deploy_time: u64, anchor: PeriodAnchor) -> Result<()> {
    if anchor.time < deploy_time {
        return Err(LedgerError::InvalidConfig(format!(
            "period anchor {} is before deploy time {}",
            anchor.time, deploy_time
        )));
    }
    if anchor.period == 0 && anchor.time != deploy_time {
        return Err(LedgerError::InvalidConfig(
            "period 0 must start at the deploy time".to_string(),
        ));
    }
    Ok(())
}

/// Source of "now" for callers that do not carry their own timestamp
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time in Unix seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Settable clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, timestamp: u64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) -> u64 {
        self.now.fetch_add(seconds, Ordering::SeqCst) + seconds
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOY: u64 = 1_700_000_000;

    #[test]
    fn test_current_period() {
        let clock = PeriodClock::new(DEPLOY, 1_800).unwrap();
        assert_eq!(clock.current_period(DEPLOY), 0);
        assert_eq!(clock.current_period(DEPLOY + 1_799), 0);
        assert_eq!(clock.current_period(DEPLOY + 1_800), 1);
        assert_eq!(clock.current_period(DEPLOY + 10 * 1_800 + 5), 10);
    }

    #[test]
    fn test_time_before_deploy_is_period_zero() {
        let clock = PeriodClock::new(DEPLOY, 60).unwrap();
        assert_eq!(clock.current_period(DEPLOY - 1_000), 0);
    }

    #[test]
    fn test_periods_per_day() {
        let clock = PeriodClock::new(DEPLOY, 1_800).unwrap();
        assert_eq!(clock.periods_per_day(), 48);

        let clock = PeriodClock::new(DEPLOY, 86_400).unwrap();
        assert_eq!(clock.periods_per_day(), 1);

        let clock = PeriodClock::new(DEPLOY, 7_000).unwrap();
        assert_eq!(clock.periods_per_day(), 12);
    }

    #[test]
    fn test_interval_limits() {
        assert!(matches!(
            PeriodClock::new(DEPLOY, 86_401),
            Err(LedgerError::IntervalTooLong { seconds: 86_401, .. })
        ));
        assert!(matches!(
            PeriodClock::new(DEPLOY, 0),
            Err(LedgerError::InvalidConfig(_))
        ));
        assert!(PeriodClock::new(DEPLOY, 86_400).is_ok());
    }

    #[test]
    fn test_rebase_keeps_past_indices() {
        let mut clock = PeriodClock::new(DEPLOY, 3_600).unwrap();

        // 5.5 hours in: period 5 began at DEPLOY + 18000
        let now = DEPLOY + 5 * 3_600 + 1_800;
        clock.set_sale_period(600, now).unwrap();

        assert_eq!(clock.anchor_period(), 5);
        assert_eq!(clock.anchor_time(), DEPLOY + 5 * 3_600);
        // 30 minutes into period 5 with 10-minute periods is period 8
        assert_eq!(clock.current_period(now), 8);
        assert_eq!(clock.periods_per_day(), 144);
    }

    #[test]
    fn test_rebase_keeps_deploy_time() {
        let mut clock = PeriodClock::new(DEPLOY, 3_600).unwrap();
        assert_eq!(clock.anchor(), None);

        let now = DEPLOY + 10 * 3_600 + 100;
        clock.set_sale_period(1_800, now).unwrap();
        assert_eq!(clock.deploy_time(), DEPLOY);

        let anchor = clock.anchor().unwrap();
        assert_eq!(anchor.time, DEPLOY + 36_000);
        assert_eq!(anchor.period, 10);

        let resumed = PeriodClock::resume(DEPLOY, anchor, 1_800).unwrap();
        assert_eq!(resumed, clock);
        assert_eq!(resumed.current_period(now + 5_400), 13);
    }

    #[test]
    fn test_resume_rejects_anchor_before_deploy() {
        let anchor = PeriodAnchor {
            time: DEPLOY - 1,
            period: 3,
        };
        assert!(matches!(
            PeriodClock::resume(DEPLOY, anchor, 60),
            Err(LedgerError::InvalidConfig(_))
        ));

        let anchor = PeriodAnchor {
            time: DEPLOY + 60,
            period: 0,
        };
        assert!(PeriodClock::resume(DEPLOY, anchor, 60).is_err());
    }

    #[test]
    fn test_rejected_period_change_leaves_clock_untouched() {
        let mut clock = PeriodClock::new(DEPLOY, 3_600).unwrap();
        let before = clock.clone();

        assert!(clock.set_sale_period(86_401, DEPLOY + 10_000).is_err());
        assert_eq!(clock, before);
    }

    #[test]
    fn test_seconds_until_next_period() {
        let clock = PeriodClock::new(DEPLOY, 100).unwrap();
        assert_eq!(clock.seconds_until_next_period(DEPLOY), 100);
        assert_eq!(clock.seconds_until_next_period(DEPLOY + 250), 50);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now(), 10);
        assert_eq!(clock.advance(5), 15);
        clock.set(100);
        assert_eq!(clock.now(), 100);
    }
}
