use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::error::TaskError;

const MAX_TITLE_LEN: usize = 255;

/// Stored timestamps are compared as text, which only orders correctly for
/// four-digit years.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Validate a task title: must be non-blank and at most 255 characters.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TaskError::invalid("title is required").into());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TaskError::invalid(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        ))
        .into());
    }
    Ok(())
}

/// Parse an ISO-8601-ish timestamp into naive UTC.
///
/// Accepts `T` or space separators, optional seconds and fraction, a bare
/// date (midnight), and RFC 3339 with an offset (converted to UTC).
/// Returns `None` for blank or unrecognised input, and for years outside
/// 1..=9999.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    parse_any(s.trim()).filter(|dt| YEARS.contains(&dt.year()))
}

fn parse_any(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Strict variant for structured input: blank means absent, anything else
/// must parse.
pub fn parse_timestamp_field(field: &str, value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => match parse_timestamp(raw) {
            Some(dt) => Ok(Some(dt)),
            None => Err(TaskError::invalid(format!("invalid {field} timestamp '{raw}'")).into()),
        },
    }
}

/// A new task may not be due in the past.
pub fn check_due_in_future(due: Option<NaiveDateTime>, now: NaiveDateTime) -> Result<()> {
    match due {
        Some(due) if due < now => Err(TaskError::invalid("due_at must be in the future").into()),
        _ => Ok(()),
    }
}

/// An explicit reminder may not fire after the task is due.
pub fn check_remind_before_due(
    field: &str,
    remind: Option<NaiveDateTime>,
    due: Option<NaiveDateTime>,
) -> Result<()> {
    match (remind, due) {
        (Some(remind), Some(due)) if remind > due => {
            Err(TaskError::invalid(format!("{field} must be <= due_at")).into())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn valid_titles() {
        assert!(validate_title("Buy milk").is_ok());
        assert!(validate_title(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn invalid_titles() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(256)).is_err());
    }

    #[test]
    fn parses_form_and_iso_formats() {
        let expected = ts("2026-05-01 09:30:00");
        assert_eq!(parse_timestamp("2026-05-01T09:30"), Some(expected));
        assert_eq!(parse_timestamp("2026-05-01T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-05-01 09:30"), Some(expected));
        assert_eq!(parse_timestamp(" 2026-05-01 09:30:00 "), Some(expected));
        assert_eq!(parse_timestamp("2026-05-01T11:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-05-01T09:30:00Z"), Some(expected));
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        assert_eq!(parse_timestamp("2026-05-01"), Some(ts("2026-05-01 00:00:00")));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("tomorrow"), None);
        assert_eq!(parse_timestamp("2026-13-01T00:00"), None);
    }

    #[test]
    fn rejects_years_that_do_not_sort_as_text() {
        assert_eq!(parse_timestamp("-262143-01-01T00:00:00"), None);
        assert_eq!(parse_timestamp("+10000-01-01T00:00:00"), None);
        assert_eq!(parse_timestamp("0000-06-01T00:00"), None);
        assert_eq!(parse_timestamp("9999-12-31T23:59"), Some(ts("9999-12-31 23:59:00")));
    }

    #[test]
    fn strict_field_parsing() {
        assert_eq!(parse_timestamp_field("due_at", None).unwrap(), None);
        assert_eq!(parse_timestamp_field("due_at", Some("")).unwrap(), None);
        let err = parse_timestamp_field("due_at", Some("soon")).unwrap_err();
        assert!(err.to_string().contains("due_at"), "{err}");
    }

    #[test]
    fn due_must_be_future() {
        let now = ts("2026-05-01 00:00:00");
        assert!(check_due_in_future(None, now).is_ok());
        assert!(check_due_in_future(Some(ts("2026-05-02 00:00:00")), now).is_ok());
        assert!(check_due_in_future(Some(ts("2026-04-30 00:00:00")), now).is_err());
    }

    #[test]
    fn remind_must_not_follow_due() {
        let due = Some(ts("2026-05-02 00:00:00"));
        assert!(check_remind_before_due("remind_at", None, due).is_ok());
        assert!(check_remind_before_due("remind_at", due, due).is_ok());
        assert!(check_remind_before_due("remind_at", Some(ts("2026-05-03 00:00:00")), None).is_ok());
        let err =
            check_remind_before_due("custom_remind_at", Some(ts("2026-05-03 00:00:00")), due)
                .unwrap_err();
        assert_eq!(err.to_string(), "custom_remind_at must be <= due_at");
    }
}
