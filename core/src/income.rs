//! Per-period income series and the trailing daily window
//!
//! Income is kept sparse (only periods with a sale have an entry) and
//! expanded to a dense, zero-filled series on query.

use crate::clock::PeriodIndex;
use crate::constants::MAX_INCOME_PERIODS_PER_QUERY;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proceeds recorded for one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodIncome {
    pub period: PeriodIndex,
    #[serde(with = "crate::amount")]
    pub amount: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PeriodIncome>", into = "Vec<PeriodIncome>")]
pub struct IncomeWindow {
    incomes: BTreeMap<PeriodIndex, u128>,
}

impl IncomeWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `period`'s total. Nothing is written on overflow.
    pub fn record(&mut self, period: PeriodIndex, amount: u128) -> Result<u128> {
        let total = self
            .period_income(period)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("period income"))?;
        self.incomes.insert(period, total);
        Ok(total)
    }

    /// Whether `record(period, amount)` would succeed
    pub fn can_record(&self, period: PeriodIndex, amount: u128) -> bool {
        self.period_income(period).checked_add(amount).is_some()
    }

    pub fn period_income(&self, period: PeriodIndex) -> u128 {
        self.incomes.get(&period).copied().unwrap_or(0)
    }

    /// Dense series for completed periods `0..current_period`
    pub fn period_incomes(&self, current_period: PeriodIndex) -> Vec<u128> {
        (0..current_period).map(|p| self.period_income(p)).collect()
    }

    /// Dense series for `from..to`, cut off at `current_period` and at
    /// `MAX_INCOME_PERIODS_PER_QUERY` entries
    pub fn period_incomes_between(
        &self,
        from: PeriodIndex,
        to: PeriodIndex,
        current_period: PeriodIndex,
    ) -> Vec<u128> {
        let end = to
            .min(current_period)
            .min(from.saturating_add(MAX_INCOME_PERIODS_PER_QUERY));
        (from..end).map(|p| self.period_income(p)).collect()
    }

    /// Sum of the last `min(periods_per_day, current_period)` completed
    /// periods. The in-progress period never counts.
    pub fn daily_income(&self, current_period: PeriodIndex, periods_per_day: u64) -> Result<u128> {
        let window = periods_per_day.min(current_period);
        let start = current_period - window;

        self.incomes
            .range(start..current_period)
            .try_fold(0u128, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(LedgerError::ArithmeticOverflow("daily income"))
    }

    /// Sum of every recorded period
    pub fn lifetime_income(&self) -> u128 {
        self.incomes
            .values()
            .fold(0u128, |acc, amount| acc.saturating_add(*amount))
    }

    /// Periods with a recorded sale, in order
    pub fn entries(&self) -> Vec<PeriodIncome> {
        self.incomes
            .iter()
            .map(|(&period, &amount)| PeriodIncome { period, amount })
            .collect()
    }
}

impl From<Vec<PeriodIncome>> for IncomeWindow {
    fn from(entries: Vec<PeriodIncome>) -> Self {
        let mut window = Self::new();
        for entry in entries {
            let total = window.period_income(entry.period).saturating_add(entry.amount);
            window.incomes.insert(entry.period, total);
        }
        window
    }
}

impl From<IncomeWindow> for Vec<PeriodIncome> {
    fn from(window: IncomeWindow) -> Self {
        window.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WAD;

    #[test]
    fn test_record_accumulates_within_period() {
        let mut window = IncomeWindow::new();
        window.record(2, WAD).unwrap();
        assert_eq!(window.record(2, 2 * WAD).unwrap(), 3 * WAD);
        assert_eq!(window.period_income(2), 3 * WAD);
        assert_eq!(window.period_income(1), 0);
    }

    #[test]
    fn test_dense_series_is_zero_filled() {
        let mut window = IncomeWindow::new();
        window.record(1, 5).unwrap();
        window.record(3, 7).unwrap();

        assert_eq!(window.period_incomes(4), vec![0, 5, 0, 7]);
        // The open period is not part of the series
        assert_eq!(window.period_incomes(3), vec![0, 5, 0]);
        assert!(window.period_incomes(0).is_empty());
    }

    #[test]
    fn test_ranged_series_is_bounded() {
        let mut window = IncomeWindow::new();
        window.record(2, 5).unwrap();
        window.record(6, 7).unwrap();

        assert_eq!(window.period_incomes_between(1, 4, 10), vec![0, 5, 0]);
        // Never reaches into the open period
        assert_eq!(window.period_incomes_between(5, 50, 7), vec![0, 7]);
        assert!(window.period_incomes_between(9, 4, 10).is_empty());

        let wide = window.period_incomes_between(0, u64::MAX, u64::MAX);
        assert_eq!(wide.len() as u64, MAX_INCOME_PERIODS_PER_QUERY);
    }

    #[test]
    fn test_daily_income_excludes_current_period() {
        let mut window = IncomeWindow::new();
        for period in 0..=14 {
            window.record(period, WAD).unwrap();
        }

        assert_eq!(window.daily_income(14, 24).unwrap(), 14 * WAD);
        assert_eq!(window.daily_income(15, 24).unwrap(), 15 * WAD);
    }

    #[test]
    fn test_daily_income_window_is_capped() {
        let mut window = IncomeWindow::new();
        for period in 0..30 {
            window.record(period, WAD).unwrap();
        }

        assert_eq!(window.daily_income(29, 24).unwrap(), 24 * WAD);
        // Old entries stay addressable after leaving the window
        assert_eq!(window.period_income(0), WAD);
        assert_eq!(window.lifetime_income(), 30 * WAD);
    }

    #[test]
    fn test_overflow_leaves_entry_untouched() {
        let mut window = IncomeWindow::new();
        window.record(0, u128::MAX).unwrap();

        assert!(!window.can_record(0, 1));
        assert!(window.record(0, 1).is_err());
        assert_eq!(window.period_income(0), u128::MAX);
    }

    #[test]
    fn test_serde_round_trip_preserves_entries() {
        let mut window = IncomeWindow::new();
        window.record(4, 9).unwrap();

        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"[{"period":4,"amount":"9"}]"#);
        let restored: IncomeWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, window);
    }
}
