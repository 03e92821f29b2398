//! Timestamp helpers.
//!
//! All timestamps on the wire are unix epoch milliseconds (UTC). Consumers
//! that need a human-readable form convert with [`timestamp_to_rfc3339`].

use chrono::{DateTime, Utc};

/// Current UTC time as unix epoch milliseconds.
pub fn utc_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a unix-millisecond timestamp to an RFC3339 string.
///
/// Out-of-range values fall back to the unix epoch rather than panicking.
pub fn timestamp_to_rfc3339(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp_millis(0).unwrap())
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_timestamp_ms_is_recent() {
        // 2020-01-01 as a lower bound; anything earlier means a broken clock source
        let ts = utc_timestamp_ms();
        assert!(ts > 1_577_836_800_000);
    }

    #[test]
    fn test_timestamp_to_rfc3339_known_value() {
        let formatted = timestamp_to_rfc3339(0);
        assert!(formatted.starts_with("1970-01-01T00:00:00"));
    }

    #[test]
    fn test_timestamp_to_rfc3339_out_of_range_falls_back() {
        let formatted = timestamp_to_rfc3339(i64::MAX);
        assert!(formatted.starts_with("1970-01-01T00:00:00"));
    }
}
