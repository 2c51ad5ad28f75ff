//! `MM:SS` start-time parsing

use crate::error::{ClipError, Result};
use tracing::error;

/// Parse a `MM:SS` start time into milliseconds
///
/// Minutes may be any magnitude; seconds are not range-checked, so `1:75`
/// is 135 seconds. Surrounding whitespace is ignored.
pub fn parse_start_ms(value: &str) -> Result<u64> {
    let invalid = |reason: &str| ClipError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = value.trim().split(':');
    let (Some(minutes), Some(seconds), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid("expected exactly one ':' separator"));
    };

    let minutes: i64 = minutes
        .trim()
        .parse()
        .map_err(|_| invalid("minutes are not an integer"))?;
    let seconds: i64 = seconds
        .trim()
        .parse()
        .map_err(|_| invalid("seconds are not an integer"))?;

    let total_ms = minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .ok_or_else(|| invalid("value out of range"))?;

    u64::try_from(total_ms).map_err(|_| invalid("start time is negative"))
}

/// Parse a start time, logging and discarding the error
///
/// Returns `None` for any malformed input; callers treat that as a
/// per-row failure.
pub fn timestamp_to_ms(value: &str) -> Option<u64> {
    match parse_start_ms(value) {
        Ok(ms) => Some(ms),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_timestamps() {
        assert_eq!(timestamp_to_ms("0:00"), Some(0));
        assert_eq!(timestamp_to_ms("1:05"), Some(65_000));
        assert_eq!(timestamp_to_ms("02:30"), Some(150_000));
        assert_eq!(timestamp_to_ms("125:09"), Some(7_509_000));
        assert_eq!(timestamp_to_ms(" 3:15 "), Some(195_000));
    }

    #[test]
    fn test_formula_holds_across_range() {
        for mm in [0u64, 1, 9, 59, 60, 999] {
            for ss in [0u64, 1, 30, 59] {
                let ts = format!("{}:{:02}", mm, ss);
                assert_eq!(timestamp_to_ms(&ts), Some((mm * 60 + ss) * 1000), "{}", ts);
            }
        }
    }

    #[test]
    fn test_seconds_overflowing_a_minute_are_accepted() {
        assert_eq!(timestamp_to_ms("1:75"), Some(135_000));
    }

    #[test]
    fn test_malformed_timestamps() {
        for bad in ["", "abc", "1", "1:2:3", "1.30", "1;30", "a:30", "1:bb", ":30", "1:", "1:3.5"] {
            assert_eq!(timestamp_to_ms(bad), None, "'{}' should be invalid", bad);
        }
    }

    #[test]
    fn test_negative_result_is_invalid() {
        assert_eq!(timestamp_to_ms("-1:30"), None);
        assert_eq!(timestamp_to_ms("0:-1"), None);
        // Negative seconds are fine as long as the total stays non-negative
        assert_eq!(timestamp_to_ms("1:-5"), Some(55_000));
    }

    #[test]
    fn test_error_carries_input() {
        let err = parse_start_ms("x:y").unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("x:y"));
    }
}
