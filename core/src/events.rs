//! Ledger events, appended in commit order

use crate::constants::DEFAULT_EVENT_RETENTION;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    TokensDeposited {
        depositor: String,
        token: String,
        #[serde(with = "crate::amount")]
        amount: u128,
    },
    TokensComposted {
        depositor: String,
        token: String,
        #[serde(with = "crate::amount")]
        amount: u128,
        period: u64,
    },
    RewardPayoutInitiated {
        #[serde(with = "crate::amount")]
        amount: u128,
        timestamp: u64,
    },
    ConfigUpdated {
        parameter: ConfigParameter,
        value: String,
    },
    OwnerTransferred {
        previous: String,
        owner: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigParameter {
    SalePeriod,
    SaleAmount,
    DailyMint,
    PayoutFrequency,
}

impl std::fmt::Display for ConfigParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SalePeriod => write!(f, "sale_period"),
            Self::SaleAmount => write!(f, "sale_amount"),
            Self::DailyMint => write!(f, "daily_mint"),
            Self::PayoutFrequency => write!(f, "payout_frequency"),
        }
    }
}

/// Event with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub sequence: u64,
    pub event: LedgerEvent,
}

/// Append-only event log with bounded retention.
///
/// Sequence numbers keep counting across compaction. Once the log holds twice
/// `retention` events, everything but the newest `retention` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    first_sequence: u64,
    retention: usize,
    events: Vec<RecordedEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_retention(DEFAULT_EVENT_RETENTION)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            first_sequence: 0,
            retention: retention.max(1),
            events: Vec::new(),
        }
    }

    pub fn append(&mut self, event: LedgerEvent) -> u64 {
        let sequence = self.next_sequence();
        self.events.push(RecordedEvent { sequence, event });
        self.compact();
        sequence
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = LedgerEvent>) {
        for event in events {
            self.append(event);
        }
    }

    fn compact(&mut self) {
        if self.events.len() < self.retention.saturating_mul(2) {
            return;
        }
        let excess = self.events.len() - self.retention;
        self.events.drain(..excess);
        self.first_sequence += excess as u64;
        log::debug!(
            "Event log compacted, oldest retained sequence is {}",
            self.first_sequence
        );
    }

    /// Events currently retained
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Sequence of the oldest retained event
    pub fn first_sequence(&self) -> u64 {
        self.first_sequence
    }

    /// Sequence the next appended event will get; also the total ever recorded
    pub fn next_sequence(&self) -> u64 {
        self.first_sequence + self.events.len() as u64
    }

    pub fn all(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Retained events with `sequence >= cursor`
    pub fn since(&self, cursor: u64) -> &[RecordedEvent] {
        let offset = cursor.saturating_sub(self.first_sequence);
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.events.len());
        &self.events[start..]
    }

    /// At most `limit` events from `since(cursor)`
    pub fn page(&self, cursor: u64, limit: usize) -> &[RecordedEvent] {
        let events = self.since(cursor);
        &events[..limit.min(events.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_cursor() {
        let mut log = EventLog::new();
        for amount in 1..=3 {
            log.append(LedgerEvent::TokensDeposited {
                depositor: "alice".to_string(),
                token: "tok".to_string(),
                amount,
            });
        }

        assert_eq!(log.since(0).len(), 3);
        assert_eq!(log.since(2)[0].sequence, 2);
        assert!(log.since(10).is_empty());
    }

    fn deposit(amount: u128) -> LedgerEvent {
        LedgerEvent::TokensDeposited {
            depositor: "alice".to_string(),
            token: "tok".to_string(),
            amount,
        }
    }

    #[test]
    fn test_compaction_keeps_sequences() {
        let mut log = EventLog::with_retention(3);
        for amount in 0..5 {
            log.append(deposit(amount));
        }
        assert_eq!(log.len(), 5);

        // The sixth append reaches twice the retention
        assert_eq!(log.append(deposit(5)), 5);
        assert_eq!(log.len(), 3);
        assert_eq!(log.first_sequence(), 3);
        assert_eq!(log.next_sequence(), 6);

        // Cursors older than the retained range start at the oldest event
        assert_eq!(log.since(0)[0].sequence, 3);
        assert_eq!(log.since(4)[0].sequence, 4);
        assert!(log.since(6).is_empty());
    }

    #[test]
    fn test_page_limit() {
        let mut log = EventLog::new();
        for amount in 0..10 {
            log.append(deposit(amount));
        }

        let page = log.page(2, 3);
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].sequence, 2);
        assert_eq!(page[2].sequence, 4);
        assert_eq!(log.page(8, 100).len(), 2);
        assert!(log.page(0, 0).is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let event = LedgerEvent::TokensComposted {
            depositor: "alice".to_string(),
            token: "tok".to_string(),
            amount: crate::WAD,
            period: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tokens_composted");
        assert_eq!(json["amount"], "1000000000000000000");
        assert_eq!(json["period"], 4);
    }
}
