// Schedule time normalization and daily trigger calculation
//
// The recurring job fires once a day at a wall-clock time entered by the user.
// Incoming times arrive in several shapes (12-hour with AM/PM, the browser's
// `HH:mm:ss.SSS` time-input value, or plain 24-hour) and are canonicalized to
// `HH:mm` before they can reach a schedule write.

use crate::errors::{NormalizationError, ScheduleError};
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

fn twelve_hour_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(0?\d|1[0-2]):(\d{2})\s*(AM|PM)$").expect("Invalid regex pattern")
    })
}

fn extended_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([01]\d|2[0-3]):([0-5]\d):[0-5]\d\.\d{3}$").expect("Invalid regex pattern")
    })
}

fn canonical_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("Invalid regex pattern"))
}

/// Returns true if `time` is already a canonical 24-hour `HH:mm` value
pub fn is_canonical(time: &str) -> bool {
    canonical_pattern().is_match(time) && NaiveTime::parse_from_str(time, "%H:%M").is_ok()
}

/// Normalize a time of day into canonical 24-hour `HH:mm`.
///
/// Accepted forms, in precedence order:
/// 1. `H:MM AM` / `HH:MM pm` (hour 0-12, case-insensitive suffix, optional space)
/// 2. `HH:mm:ss.SSS` (seconds and fraction are dropped)
/// 3. `HH:mm`
///
/// Surrounding whitespace is ignored. Every converted result is re-checked
/// against the canonical form, so "2:75 PM" fails instead of producing "14:75".
pub fn normalize(input: &str) -> Result<String, NormalizationError> {
    let trimmed = input.trim();

    let candidate = if let Some(caps) = twelve_hour_pattern().captures(trimmed) {
        let hour: u32 = caps[1]
            .parse()
            .map_err(|_| NormalizationError::new(input))?;
        let is_pm = caps[3].eq_ignore_ascii_case("PM");
        let hour24 = match (is_pm, hour) {
            (false, 12) => 0,
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, h) => h,
        };
        format!("{:02}:{}", hour24, &caps[2])
    } else if let Some(caps) = extended_pattern().captures(trimmed) {
        format!("{}:{}", &caps[1], &caps[2])
    } else if canonical_pattern().is_match(trimmed) {
        trimmed.to_string()
    } else {
        return Err(NormalizationError::new(input));
    };

    if !is_canonical(&candidate) {
        tracing::debug!(input = input, converted = %candidate, "Converted time failed canonical check");
        return Err(NormalizationError::new(input));
    }

    Ok(candidate)
}

/// Build the second-precision cron expression that fires daily at `time`
pub fn daily_cron_expression(time: &str) -> Result<String, ScheduleError> {
    let canonical = normalize(time)?;
    let parsed = NaiveTime::parse_from_str(&canonical, "%H:%M")
        .map_err(|_| NormalizationError::new(time))?;

    Ok(format!("0 {} {} * * *", parsed.minute(), parsed.hour()))
}

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Calculate the next daily trigger strictly after `after`.
///
/// `time` is evaluated as wall-clock time in `timezone`; the result is in UTC.
pub fn next_daily_run(
    time: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let expression = daily_cron_expression(time)?;
    let schedule = parse_cron_expression(&expression)?;

    let reference_in_tz = after.with_timezone(&timezone);
    let next_in_tz = schedule
        .after(&reference_in_tz)
        .next()
        .ok_or_else(|| ScheduleError::NoNextExecution(time.to_string()))?;

    Ok(next_in_tz.with_timezone(&Utc))
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    Tz::from_str(name.trim()).map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// Timezone used when none is configured
pub fn default_timezone() -> Tz {
    chrono_tz::UTC
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_twelve_hour_conversion() {
        assert_eq!(normalize("2:30 PM").unwrap(), "14:30");
        assert_eq!(normalize("12:00 AM").unwrap(), "00:00");
        assert_eq!(normalize("12:15 PM").unwrap(), "12:15");
        assert_eq!(normalize("9:05 am").unwrap(), "09:05");
        assert_eq!(normalize("11:59PM").unwrap(), "23:59");
        assert_eq!(normalize("0:45 AM").unwrap(), "00:45");
    }

    #[test]
    fn test_extended_form_drops_seconds() {
        assert_eq!(normalize("00:45:00.000").unwrap(), "00:45");
        assert_eq!(normalize("23:10:59.999").unwrap(), "23:10");
    }

    #[test]
    fn test_canonical_passthrough() {
        assert_eq!(normalize("14:30").unwrap(), "14:30");
        assert_eq!(normalize("00:00").unwrap(), "00:00");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(normalize("  14:30 \n").unwrap(), "14:30");
        assert_eq!(normalize(" 2:30 PM ").unwrap(), "14:30");
    }

    #[test]
    fn test_rejects_out_of_range_and_garbage() {
        for input in [
            "25:00", "24:00", "9:30", "14:60", "13:30 PM", "2:75 PM", "", "noon", "14:30:00",
            "24:00:00.000", "2:30 XM",
        ] {
            let err = normalize(input).unwrap_err();
            assert_eq!(err.input, input, "input {input:?} should be rejected");
        }
    }

    #[test]
    fn test_daily_cron_expression() {
        assert_eq!(daily_cron_expression("2:30 PM").unwrap(), "0 30 14 * * *");
        assert_eq!(daily_cron_expression("00:05").unwrap(), "0 5 0 * * *");
        assert!(daily_cron_expression("25:00").is_err());
    }

    #[test]
    fn test_next_daily_run_same_day() {
        let after = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let next = next_daily_run("14:30", chrono_tz::UTC, after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_next_daily_run_rolls_to_next_day() {
        let after = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let next = next_daily_run("14:30", chrono_tz::UTC, after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 2, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_next_daily_run_respects_timezone() {
        // 00:00 UTC is 07:00 in Ho Chi Minh City, so 09:00 local is 02:00 UTC
        let after = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let next = next_daily_run("9:00 AM", chrono_tz::Asia::Ho_Chi_Minh, after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Europe/Paris").unwrap(), chrono_tz::Europe::Paris);
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
        assert_eq!(default_timezone(), chrono_tz::UTC);
    }
}
