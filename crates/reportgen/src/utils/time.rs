use std::sync::OnceLock;

use regex::Regex;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

#[must_use]
pub fn utc_today() -> Date {
    OffsetDateTime::now_utc().date()
}

#[must_use]
pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoDateError {
    Format,
    Calendar,
}

pub fn parse_iso_date(raw: &str) -> Result<Date, IsoDateError> {
    if !iso_date_regex().is_match(raw) {
        return Err(IsoDateError::Format);
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| IsoDateError::Calendar)
}

#[must_use]
pub fn generated_at_utc_now() -> String {
    format_utc_timestamp(OffsetDateTime::now_utc())
}

#[must_use]
pub fn format_utc_timestamp(timestamp: OffsetDateTime) -> String {
    let dt = timestamp.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.millisecond()
    )
}

fn iso_date_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("iso date regex should compile"))
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::{IsoDateError, format_iso_date, format_utc_timestamp, parse_iso_date};

    #[test]
    fn formats_dates_with_zero_padding() {
        assert_eq!(format_iso_date(date!(2024 - 03 - 05)), "2024-03-05");
    }

    #[test]
    fn parses_strict_iso_dates() {
        assert_eq!(parse_iso_date("2024-01-31"), Ok(date!(2024 - 01 - 31)));
        assert_eq!(parse_iso_date("2024-1-31"), Err(IsoDateError::Format));
        assert_eq!(parse_iso_date("2024-01-31T00:00"), Err(IsoDateError::Format));
        assert_eq!(parse_iso_date("2023-02-29"), Err(IsoDateError::Calendar));
    }

    #[test]
    fn timestamps_render_in_utc_with_millis() {
        let rendered = format_utc_timestamp(datetime!(2026-02-25 10:11:12.345 UTC));
        assert_eq!(rendered, "2026-02-25T10:11:12.345Z");
    }
}
