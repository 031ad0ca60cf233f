//! Duration string parsing and formatting.
//!
//! Accepts the short form used by moderation commands: "30s", "10m",
//! "2h", "3d", "1w", "1M" (uppercase M = 30-day month).

pub const MINUTE: u64 = 60;
pub const HOUR: u64 = 60 * MINUTE;
pub const DAY: u64 = 24 * HOUR;
pub const WEEK: u64 = 7 * DAY;
pub const MONTH: u64 = 30 * DAY;

/// Telegram rejects restriction dates more than 366 days out.
pub const MAX_RESTRICTION_SECS: u64 = 366 * DAY;

/// Parse a duration string like "1h" or "3d" into seconds.
///
/// Returns `None` for anything that does not match `^\d+[smhdwM]$`.
pub fn parse_duration_secs(input: &str) -> Option<u64> {
    let input = input.trim().replace(' ', "");
    if input.len() < 2 {
        return None;
    }

    let (digits, unit) = input.split_at(input.len() - 1);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let multiplier = match unit {
        "s" => 1,
        "m" => MINUTE,
        "h" => HOUR,
        "d" => DAY,
        "w" => WEEK,
        "M" => MONTH,
        _ => return None,
    };

    amount.checked_mul(multiplier)
}

/// Format seconds as a readable duration, e.g. "2 days, 3 hours".
pub fn format_duration(mut seconds: u64) -> String {
    if seconds == 0 {
        return "0 seconds".to_string();
    }

    const UNITS: [(&str, u64); 5] = [
        ("week", WEEK),
        ("day", DAY),
        ("hour", HOUR),
        ("minute", MINUTE),
        ("second", 1),
    ];

    let mut parts = Vec::new();
    for (name, unit_secs) in UNITS {
        if seconds >= unit_secs {
            let count = seconds / unit_secs;
            seconds %= unit_secs;
            if count == 1 {
                parts.push(format!("{} {}", count, name));
            } else {
                parts.push(format!("{} {}s", count, name));
            }
        }
    }

    match parts.len() {
        1 => parts.remove(0),
        2 => format!("{} and {}", parts[0], parts[1]),
        _ => {
            let last = parts.pop().unwrap();
            format!("{}, and {}", parts.join(", "), last)
        }
    }
}

/// Parse a duration and enforce bounds, producing a user-facing error
/// message on failure.
pub fn parse_duration_bounded(
    input: &str,
    min_secs: u64,
    max_secs: Option<u64>,
) -> Result<u64, String> {
    let seconds = parse_duration_secs(input)
        .ok_or_else(|| "Invalid time format. Use format like: 1m, 2h, 3d, 1w".to_string())?;

    if seconds < min_secs {
        return Err(format!(
            "Duration must be at least {}",
            format_duration(min_secs)
        ));
    }

    if let Some(max) = max_secs {
        if seconds > max {
            return Err(format!("Duration cannot exceed {}", format_duration(max)));
        }
    }

    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_units() {
        assert_eq!(parse_duration_secs("45s"), Some(45));
        assert_eq!(parse_duration_secs("30m"), Some(1800));
        assert_eq!(parse_duration_secs("1h"), Some(3600));
        assert_eq!(parse_duration_secs("3d"), Some(3 * 86400));
        assert_eq!(parse_duration_secs("1w"), Some(604800));
        assert_eq!(parse_duration_secs("1M"), Some(2_592_000));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_duration_secs(""), None);
        assert_eq!(parse_duration_secs("h"), None);
        assert_eq!(parse_duration_secs("10"), None);
        assert_eq!(parse_duration_secs("10x"), None);
        assert_eq!(parse_duration_secs("-5m"), None);
        assert_eq!(parse_duration_secs("1.5h"), None);
    }

    #[test]
    fn parse_format_reparse_is_stable() {
        // The string form may differ ("90m" -> "1 hour and 30 minutes"),
        // but the second count must round-trip.
        for input in ["1m", "90m", "2h", "3d", "1w", "2M"] {
            let secs = parse_duration_secs(input).unwrap();
            let formatted = format_duration(secs);
            // Re-derive total seconds from the formatted parts.
            let mut total = 0u64;
            for part in formatted.replace(", and", ",").replace(" and ", ", ").split(", ") {
                let mut it = part.split_whitespace();
                let n: u64 = it.next().unwrap().parse().unwrap();
                let unit = it.next().unwrap().trim_end_matches('s');
                total += n * match unit {
                    "week" => WEEK,
                    "day" => DAY,
                    "hour" => HOUR,
                    "minute" => MINUTE,
                    "second" => 1,
                    other => panic!("unexpected unit {other}"),
                };
            }
            assert_eq!(total, secs, "round-trip failed for {input}");
        }
    }

    #[test]
    fn formats_compound_durations() {
        assert_eq!(format_duration(0), "0 seconds");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(3661), "1 hour, 1 minute, and 1 second");
        assert_eq!(format_duration(2 * 86400 + 3 * 3600), "2 days and 3 hours");
    }

    #[test]
    fn bounded_rejects_over_ceiling() {
        let err = parse_duration_bounded("400d", 0, Some(MAX_RESTRICTION_SECS)).unwrap_err();
        assert!(err.contains("cannot exceed"));
        assert!(parse_duration_bounded("1h", 0, Some(MAX_RESTRICTION_SECS)).is_ok());
    }
}
