use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

pub mod transactions;

/// Marker character the explorer prepends to raw address bytes.
pub const ADDRESS_MARKER: char = 'Q';

/// Placeholder stored when the explorer omits or mangles a field.
pub const UNKNOWN: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Address(pub String);

impl Address {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Address(format!("{}{}", ADDRESS_MARKER, hex::encode(bytes)))
    }

    pub fn unknown() -> Self {
        Address(UNKNOWN.to_string())
    }

    /// The all-zero address is the chain's "no address" value (coinbase
    /// sender, unset master address). It must never be fetched.
    pub fn is_sentinel(&self) -> bool {
        let payload = self
            .0
            .strip_prefix(ADDRESS_MARKER)
            .unwrap_or(self.0.as_str());
        !payload.is_empty() && payload.chars().all(|c| c == '0')
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn datetime_from_timestamp_seconds(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
}

#[test]
fn sentinel_address_test() {
    let sentinel = Address::from_bytes(&[0u8; 39]);
    assert!(sentinel.is_sentinel());

    let mut bytes = [0u8; 39];
    bytes[38] = 1;
    assert!(!Address::from_bytes(&bytes).is_sentinel());

    assert!(!Address(String::from("Q")).is_sentinel());
    assert!(!Address::unknown().is_sentinel());
}
