//! Serde helpers for `u128` amounts
//!
//! Amounts are written as decimal strings so they survive JSON consumers
//! limited to 53-bit numbers. Plain integers are still accepted on input.

use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(u64),
}

impl RawAmount {
    fn into_amount<E: de::Error>(self) -> Result<u128, E> {
        match self {
            Self::Text(text) => parse_amount(&text).map_err(E::custom),
            Self::Number(n) => Ok(n as u128),
        }
    }
}

/// Parse a decimal amount string (surrounding whitespace and `_` separators allowed)
pub fn parse_amount(text: &str) -> Result<u128, String> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err("empty amount".to_string());
    }
    cleaned
        .parse::<u128>()
        .map_err(|e| format!("invalid amount '{}': {}", text, e))
}

pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&amount.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    RawAmount::deserialize(deserializer)?.into_amount()
}

/// Same encoding for `Vec<u128>`
pub mod vec {
    use super::RawAmount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amounts: &[u128], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(amounts.iter().map(|a| a.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u128>, D::Error> {
        Vec::<RawAmount>::deserialize(deserializer)?
            .into_iter()
            .map(RawAmount::into_amount)
            .collect()
    }
}
