//! Duration parsing utilities.

use super::ConfigError;
use std::time::Duration;

/// Parse a duration string like "250ms", "5s", "2m", "1h" or "300".
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Milliseconds suffix: "250ms"
/// - Seconds suffix: "300s"
/// - Minutes suffix: "30m"
/// - Hours suffix: "1h"
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid(s, "empty duration string"));
    }

    // "ms" must be checked before the bare "m" and "s" suffixes
    if let Some(num_str) = s.strip_suffix("ms") {
        return Ok(Duration::from_millis(number(s, num_str)?));
    }
    if let Some(num_str) = s.strip_suffix('h') {
        return Ok(Duration::from_secs(number(s, num_str)?.saturating_mul(3600)));
    }
    if let Some(num_str) = s.strip_suffix('m') {
        return Ok(Duration::from_secs(number(s, num_str)?.saturating_mul(60)));
    }
    if let Some(num_str) = s.strip_suffix('s') {
        return Ok(Duration::from_secs(number(s, num_str)?));
    }

    // No suffix - treat as seconds
    Ok(Duration::from_secs(number(s, s)?))
}

fn number(whole: &str, num_str: &str) -> Result<u64, ConfigError> {
    num_str
        .trim()
        .parse()
        .map_err(|e| invalid(whole, &format!("'{num_str}' is not a whole number ({e})")))
}

fn invalid(value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidDuration {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_suffixes() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_duration_plain_seconds() {
        assert_eq!(parse_duration("300").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration(" 0 ").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for bad in ["", "   ", "s", "ms", "-1s", "1.5s", "1d", "abc"] {
            assert!(
                matches!(parse_duration(bad), Err(ConfigError::InvalidDuration { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
