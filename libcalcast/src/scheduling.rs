//! Schedule parsing for post dates
//!
//! Turns what a user types for "when" into the naive wall-clock datetime the
//! calendar stores.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::{CalcastError, Result};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse a schedule string into a calendar datetime
///
/// Supports:
/// - Absolute times: "2024-06-01 15:00", "2024-06-01T15:00:00"
/// - Dates: "2024-06-01" (midnight)
/// - Durations from now: "2h", "3 days"
/// - Natural language: "tomorrow 3pm", "next monday 10am"
///
/// # Errors
///
/// Returns `InvalidInput` if the string is empty or matches none of the above.
pub fn parse_schedule(input: &str) -> Result<NaiveDateTime> {
    parse_schedule_at(input, Local::now().naive_local())
}

/// Same as [`parse_schedule`], relative to an explicit "now"
pub fn parse_schedule_at(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CalcastError::InvalidInput(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    if let Some(dt) = parse_absolute(input) {
        return Ok(dt);
    }

    if let Ok(duration) = parse_duration(input) {
        return now
            .checked_add_signed(duration)
            .ok_or_else(|| CalcastError::InvalidInput("Duration out of range".to_string()));
    }

    if let Ok(dt) = parse_natural_language(input, now) {
        return Ok(dt);
    }

    Err(CalcastError::InvalidInput(format!(
        "Could not parse schedule string: {}",
        input
    )))
}

/// Parse a calendar day such as "2024-06-01"
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| {
        CalcastError::InvalidInput(format!("Invalid date '{}': {}. Use YYYY-MM-DD", input, e))
    })
}

fn parse_absolute(input: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_duration(input: &str) -> Result<Duration> {
    let std_duration = humantime::parse_duration(input)
        .map_err(|e| CalcastError::InvalidInput(format!("Could not parse duration: {}", e)))?;
    Duration::from_std(std_duration)
        .map_err(|_| CalcastError::InvalidInput("Duration out of range".to_string()))
}

/// Wall-clock arithmetic: `now` is pinned to UTC so no offset shifts the result
fn parse_natural_language(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let now = Utc.from_utc_datetime(&now);
    chrono_english::parse_date_string(input, now, chrono_english::Dialect::Us)
        .map(|dt| dt.naive_utc())
        .map_err(|e| CalcastError::InvalidInput(format!("Could not parse time: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_absolute_with_space() {
        let dt = parse_schedule_at("2024-06-02 15:30", fixed_now()).unwrap();
        assert_eq!(dt.to_string(), "2024-06-02 15:30:00");
    }

    #[test]
    fn test_parse_absolute_iso() {
        let dt = parse_schedule_at("2024-06-02T08:15:45", fixed_now()).unwrap();
        assert_eq!(dt.to_string(), "2024-06-02 08:15:45");
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let dt = parse_schedule_at("2024-12-25", fixed_now()).unwrap();
        assert_eq!(dt.to_string(), "2024-12-25 00:00:00");
    }

    #[test]
    fn test_parse_duration_from_now() {
        let dt = parse_schedule_at("2h", fixed_now()).unwrap();
        assert_eq!(dt.to_string(), "2024-06-01 14:00:00");

        let dt = parse_schedule_at("3days", fixed_now()).unwrap();
        assert_eq!(dt.to_string(), "2024-06-04 12:00:00");
    }

    #[test]
    fn test_parse_tomorrow() {
        let now = Local::now().naive_local();
        let dt = parse_schedule("tomorrow").unwrap();
        let diff = (dt - now).num_hours();
        // chrono-english keeps the current time of day for "tomorrow"
        assert!((20..=28).contains(&diff), "Expected ~24 hours, got {}", diff);
    }

    #[test]
    fn test_natural_language_uses_given_now() {
        let now = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let dt = parse_schedule_at("tomorrow 3pm", now).unwrap();
        assert_eq!(dt.to_string(), "2020-01-02 15:00:00");

        let dt = parse_schedule_at("tomorrow 3pm", fixed_now()).unwrap();
        assert_eq!(dt.to_string(), "2024-06-02 15:00:00");
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(parse_schedule("").is_err());
        assert!(parse_schedule("   ").is_err());
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!(parse_schedule("not a time").is_err());
    }

    #[test]
    fn test_parse_day() {
        let day = parse_day("2024-06-01").unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(parse_day("06/01/2024").is_err());
    }
}
