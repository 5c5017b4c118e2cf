//! Ledger-wide constants

/// One whole token in base units (18 decimal places)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Seconds in one day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Longest sale period accepted by `set_sale_period` (one day)
pub const MAX_SALE_PERIOD_SECONDS: u64 = SECONDS_PER_DAY;

/// Default sale period (30 minutes, 48 periods per day)
pub const DEFAULT_SALE_PERIOD_SECONDS: u64 = 1_800;

/// Default reward payout frequency (7 days)
pub const DEFAULT_PAYOUT_FREQUENCY_SECONDS: u64 = 7 * SECONDS_PER_DAY;

/// Default amount released for sale per token per period (1 WAD)
pub const DEFAULT_SALE_AMOUNT: u128 = WAD;

/// Most periods returned by one ranged income query
pub const MAX_INCOME_PERIODS_PER_QUERY: u64 = 10_000;

/// Events kept in memory and in snapshots before the oldest are compacted away
pub const DEFAULT_EVENT_RETENTION: usize = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_periods_per_day() {
        assert_eq!(SECONDS_PER_DAY / DEFAULT_SALE_PERIOD_SECONDS, 48);
        assert_eq!(DEFAULT_PAYOUT_FREQUENCY_SECONDS, 604_800);
    }
}
