//! Timestamp utilities

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for use inside file names, to the millisecond
/// (`20261017T093000123Z`)
pub fn compact_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%3fZ").to_string()
}

/// Parse an RFC 3339 timestamp stored in the database
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_compact_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 5).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(compact_timestamp(at), "20261017T093005042Z");
    }

    #[test]
    fn test_parse_rfc3339_round_trip() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let parsed = parse_rfc3339(&at.to_rfc3339()).unwrap();
        assert_eq!(parsed, at);
    }

    #[test]
    fn test_parse_rfc3339_rejects_garbage() {
        assert!(parse_rfc3339("yesterday").is_err());
    }
}
