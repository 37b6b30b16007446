use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const DEFAULT_UTC_OFFSET_HOURS: i32 = 0;
const SECS_PER_DAY: f64 = 86_400.0;

/// Calendar day an aggregation run is filed under. An explicit `YYYY-MM-DD` wins; otherwise
/// today's date at `SCREENER_UTC_OFFSET_HOURS` (default UTC).
pub fn resolve_run_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid as_of_date (expected YYYY-MM-DD): {s}"));
    }

    let hours = std::env::var("SCREENER_UTC_OFFSET_HOURS")
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
    let offset = FixedOffset::east_opt(hours * 3600)
        .with_context(|| format!("invalid SCREENER_UTC_OFFSET_HOURS: {hours}"))?;

    Ok(now_utc.with_timezone(&offset).date_naive())
}

/// Parses provider timestamps: RFC 3339 (`2026-01-27T10:00:00Z`, with or without fractional
/// seconds) and a bare `YYYY-MM-DDTHH:MM:SS` read as UTC.
pub fn parse_published_at(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Fractional days from `published` to `now`, floored at zero for timestamps in the future.
pub fn age_in_days(published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let secs = (now - published).num_milliseconds() as f64 / 1000.0;
    (secs / SECS_PER_DAY).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn explicit_date_wins() {
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 8, 0, 0).unwrap();
        let d = resolve_run_date(Some("2025-12-31"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn rejects_malformed_date_arg() {
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 8, 0, 0).unwrap();
        assert!(resolve_run_date(Some("31/12/2025"), now).is_err());
    }

    #[test]
    fn parses_zulu_and_offset_timestamps() {
        let z = parse_published_at("2026-01-27T10:00:00Z").unwrap();
        let o = parse_published_at("2026-01-27T19:00:00+09:00").unwrap();
        assert_eq!(z, o);
        assert!(parse_published_at("2026-01-27T10:00:00.123Z").is_some());
        assert_eq!(parse_published_at("2026-01-27T10:00:00"), Some(z));
    }

    #[test]
    fn garbage_timestamps_do_not_parse() {
        assert!(parse_published_at("").is_none());
        assert!(parse_published_at("yesterday").is_none());
    }

    #[test]
    fn age_is_fractional_and_never_negative() {
        let now = Utc.with_ymd_and_hms(2026, 1, 27, 12, 0, 0).unwrap();
        let half_day_ago = Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap();
        assert!((age_in_days(half_day_ago, now) - 0.5).abs() < 1e-12);
        let future = Utc.with_ymd_and_hms(2026, 1, 28, 0, 0, 0).unwrap();
        assert_eq!(age_in_days(future, now), 0.0);
    }
}
