//! Parsing of schedule times given by users.

use crate::error::BotError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a due time relative to `now`.
///
/// Accepts a relative offset `<integer><unit>` with unit `m` or `h` (either
/// case), an RFC 3339 timestamp, or a naive `YYYY-MM-DD[ T]HH:MM[:SS]` /
/// `YYYY-MM-DD` value which is read as UTC.
///
/// # Errors
///
/// Returns [`BotError::Validation`] for anything else, including offsets that
/// overflow the representable range.
pub fn parse_due_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, BotError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(BotError::invalid("time", "empty time"));
    }

    if let Some(offset) = parse_relative(input) {
        return offset
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| BotError::invalid("time", format!("offset out of range: {input}")));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(BotError::invalid("time", format!("unrecognized time: {input}")))
}

/// `Some(None)` means "looked relative but overflowed".
fn parse_relative(input: &str) -> Option<Option<Duration>> {
    let (last, _) = input.char_indices().last()?;
    let (digits, unit) = input.split_at(last);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: i64 = match digits.parse() {
        Ok(amount) => amount,
        Err(_) => return Some(None),
    };
    match unit {
        "m" | "M" => Some(Duration::try_minutes(amount)),
        "h" | "H" => Some(Duration::try_hours(amount)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 6, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_minutes_and_hours() {
        assert_eq!(parse_due_time("10m", now()).unwrap(), now() + Duration::minutes(10));
        assert_eq!(parse_due_time("2H", now()).unwrap(), now() + Duration::hours(2));
        assert_eq!(parse_due_time(" 0m ", now()).unwrap(), now());
    }

    #[test]
    fn test_absolute_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 6, 12, 0, 0).unwrap();
        assert_eq!(parse_due_time("2025-12-06T12:00:00", now()).unwrap(), expected);
        assert_eq!(parse_due_time("2025-12-06 12:00", now()).unwrap(), expected);
        assert_eq!(parse_due_time("2025-12-06T13:00:00+01:00", now()).unwrap(), expected);
        assert_eq!(parse_due_time("2025-12-06T12:00:00Z", now()).unwrap(), expected);
        assert_eq!(
            parse_due_time("2025-12-24", now()).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 24, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rejections() {
        for bad in ["", "10", "m", "10s", "-5m", "1.5h", "tomorrow", "99999999999999999999m"] {
            let err = parse_due_time(bad, now()).unwrap_err();
            assert!(matches!(err, BotError::Validation { .. }), "{bad} should be rejected");
        }
    }
}
