//! Normalizes the heterogeneous departure-time expressions the platform
//! sends into one canonical `+07:00`-qualified timestamp string.
//!
//! The offset is appended, never converted through UTC: re-serializing would
//! double-shift the instant when the backend or the display layer interprets
//! it again in local time.

use chrono::DateTime;
use serde_json::Value;

use crate::models::TimeExpression;

pub const LOCAL_UTC_OFFSET: &str = "+07:00";

/// Inclusive hour-of-day range a stated departure plausibly falls in. Used to
/// pick the user-stated timestamp out of an array that also carries midnight
/// date boundaries.
const EARLIEST_DEPARTURE_HOUR: u32 = 5;
const LATEST_DEPARTURE_HOUR: u32 = 22;

/// Turns a time expression into a `YYYY-MM-DDTHH:MM:SS+07:00` string, or
/// nothing when the expression is unparseable. Never fails.
pub fn normalize_departure(expr: &TimeExpression) -> Option<String> {
    let built = match expr {
        TimeExpression::Resolved { date_time } => with_local_offset(date_time.trim()),
        TimeExpression::Text(raw) => normalize_text(raw)?,
        TimeExpression::Candidates(items) => pick_candidate(items)?,
        TimeExpression::Other(_) => return None,
    };
    is_valid_instant(&built).then_some(built)
}

fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains('T') && trimmed.contains(':') {
        return Some(with_local_offset(trimmed));
    }
    if trimmed.contains(':') {
        if let Some((date, time)) = trimmed.split_once(' ') {
            // "YYYY-MM-DD HH:MM:SS[.ffffff]": drop the fraction and force the
            // time-of-day to exactly hour:minute:second.
            let time = time.split('.').next().unwrap_or(time);
            let mut parts: Vec<&str> = time.split(':').collect();
            parts.truncate(3);
            while parts.len() < 3 {
                parts.push("00");
            }
            return Some(format!("{date}T{}{LOCAL_UTC_OFFSET}", parts.join(":")));
        }
    }
    // Date only: the user did not state a time, departure is local midnight.
    Some(format!("{trimmed}T00:00:00{LOCAL_UTC_OFFSET}"))
}

/// Selects one timestamp from an array mixing date-range descriptor objects
/// with literal timestamp strings. Non-timestamp entries are range metadata
/// and dropped. Later entries carry the most specific user-stated value, so
/// the rightmost plausible-hour candidate wins; with no plausible hour the
/// last candidate overall does.
fn pick_candidate(items: &[Value]) -> Option<String> {
    let candidates: Vec<&str> = items
        .iter()
        .filter_map(Value::as_str)
        .filter(|text| text.contains('T') && text.contains(':'))
        .collect();

    let preferred = candidates
        .iter()
        .rev()
        .find(|text| hour_of_day(text).is_some_and(is_plausible_departure_hour))
        .copied();

    preferred
        .or_else(|| candidates.last().copied())
        .map(with_local_offset)
}

fn hour_of_day(timestamp: &str) -> Option<u32> {
    let (_, time) = timestamp.split_once('T')?;
    time.get(..2)?.parse().ok()
}

fn is_plausible_departure_hour(hour: u32) -> bool {
    (EARLIEST_DEPARTURE_HOUR..=LATEST_DEPARTURE_HOUR).contains(&hour)
}

fn with_local_offset(text: &str) -> String {
    if text.contains('+') || text.ends_with('Z') {
        text.to_string()
    } else {
        format!("{text}{LOCAL_UTC_OFFSET}")
    }
}

fn is_valid_instant(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: serde_json::Value) -> Option<String> {
        let expr: TimeExpression = serde_json::from_value(value).unwrap();
        normalize_departure(&expr)
    }

    #[test]
    fn space_separated_datetime_is_canonicalized() {
        assert_eq!(
            normalize(json!("2025-11-24 07:00:00")),
            Some("2025-11-24T07:00:00+07:00".to_string())
        );
    }

    #[test]
    fn fractional_seconds_are_stripped() {
        assert_eq!(
            normalize(json!("2025-11-24 07:00:00.000000")),
            Some("2025-11-24T07:00:00+07:00".to_string())
        );
    }

    #[test]
    fn date_only_becomes_local_midnight() {
        assert_eq!(
            normalize(json!("2025-11-24")),
            Some("2025-11-24T00:00:00+07:00".to_string())
        );
    }

    #[test]
    fn iso_without_offset_gets_local_offset() {
        assert_eq!(
            normalize(json!("2025-11-24T07:00:00")),
            Some("2025-11-24T07:00:00+07:00".to_string())
        );
    }

    #[test]
    fn existing_offset_is_preserved() {
        assert_eq!(
            normalize(json!("2025-11-24T07:00:00+07:00")),
            Some("2025-11-24T07:00:00+07:00".to_string())
        );
        assert_eq!(
            normalize(json!("2025-11-24T07:00:00Z")),
            Some("2025-11-24T07:00:00Z".to_string())
        );
    }

    #[test]
    fn resolved_object_is_used_verbatim() {
        assert_eq!(
            normalize(json!({ "date_time": "2025-11-24T07:00:00+07:00" })),
            Some("2025-11-24T07:00:00+07:00".to_string())
        );
        assert_eq!(
            normalize(json!({ "date_time": "2025-11-24T07:00:00" })),
            Some("2025-11-24T07:00:00+07:00".to_string())
        );
    }

    #[test]
    fn array_prefers_rightmost_plausible_hour() {
        assert_eq!(
            normalize(json!([
                { "startDate": "2025-01-01T00:00:00+07:00", "endDate": "2025-12-31T23:59:59+07:00" },
                "2025-11-07T23:00:00+07:00",
                "2025-11-08T00:00:00+07:00",
                "2025-11-08T07:00:00+07:00",
            ])),
            Some("2025-11-08T07:00:00+07:00".to_string())
        );
    }

    #[test]
    fn array_of_midnights_falls_back_to_last() {
        assert_eq!(
            normalize(json!([
                "2025-11-08T00:00:00+07:00",
                "2025-11-09T00:00:00+07:00",
            ])),
            Some("2025-11-09T00:00:00+07:00".to_string())
        );
    }

    #[test]
    fn array_with_multiple_specific_hours_takes_last() {
        assert_eq!(
            normalize(json!([
                "2025-11-24T14:00:00+07:00",
                "2025-11-24T07:00:00+07:00",
                "2025-11-24T09:30:00+07:00",
            ])),
            Some("2025-11-24T09:30:00+07:00".to_string())
        );
    }

    #[test]
    fn malformed_inputs_yield_nothing() {
        assert_eq!(normalize(json!("")), None);
        assert_eq!(normalize(json!("   ")), None);
        assert_eq!(normalize(json!("ngày mai")), None);
        // A space without a colon is not a datetime, and the date-only
        // reading of the whole string is not a valid date either.
        assert_eq!(normalize(json!("2025-11-24 07")), None);
        assert_eq!(normalize(json!([])), None);
        assert_eq!(normalize(json!([{ "startDate": "x" }])), None);
        assert_eq!(normalize(json!(42)), None);
        assert_eq!(normalize(json!(null)), None);
    }

    #[test]
    fn invalid_calendar_values_yield_nothing() {
        assert_eq!(normalize(json!("2025-13-40 07:00:00")), None);
        assert_eq!(normalize(json!("2025-02-30")), None);
        assert_eq!(normalize(json!({ "date_time": "not a date" })), None);
    }
}
