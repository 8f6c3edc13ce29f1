/// Lenient timestamp parsing for schedule documents.
use crate::{EventError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

/// Offset-less date-time formats, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    // Schedule display format, i.e. `Mar 8 2026 04:00 UTC`.
    "%b %d %Y %H:%M UTC",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a timestamp in one of the supported formats:
/// - RFC 3339 with offset: `2023-11-20T00:00:01Z`, `2023-11-20T02:00:01+02:00`;
/// - ISO-8601 date and time without offset (seconds and fraction are optional): `2023-11-20T00:00:01`, `2023-11-20 14:00`;
/// - ISO-8601 date only: `2023-11-19`, which means midnight;
/// - schedule display format: `Mar 8 2026 04:00 UTC`.
///
/// Values without offset are treated as UTC.
///
/// Returns `None` if the input doesn't match any format.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
    {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Same as [`parse_timestamp`] but returns [`EventError::InvalidTimestamp`] instead of `None`.
pub fn parse_timestamp_strict(input: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(input).ok_or_else(|| EventError::InvalidTimestamp(input.to_owned()))
}

/// Combines separate date (`2023-11-19`) and time (`14:00`) values into a single timestamp.
///
/// Empty `time` means midnight.
pub fn parse_date_time(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let (date, time) = (date.trim(), time.trim());
    if time.is_empty() {
        parse_timestamp(date)
    } else {
        parse_timestamp(&format!("{date}T{time}"))
    }
}

/// Describes where the timestamp lives inside a JSON record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimestampSource {
    field: String,
    time_field: Option<String>,
}

impl TimestampSource {
    /// Timestamp is stored in a single `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            time_field: None,
        }
    }

    /// Date is stored in `field` and time of day in a separate `time_field`.
    pub fn with_time_field(mut self, time_field: impl Into<String>) -> Self {
        self.time_field = Some(time_field.into());
        self
    }

    /// Name of the field with timestamp (or date).
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Name of the optional time-of-day field.
    pub fn time_field(&self) -> Option<&str> {
        self.time_field.as_deref()
    }

    /// Extracts the timestamp from `record`.
    ///
    /// Returns `None` if the field is absent, isn't a string or can't be parsed.
    /// A missing or non-string time field falls back to the date field alone.
    pub fn extract(&self, record: &serde_json::Map<String, Value>) -> Option<DateTime<Utc>> {
        let date = record.get(&self.field)?.as_str()?;
        match self
            .time_field
            .as_ref()
            .and_then(|field| record.get(field))
            .and_then(Value::as_str)
        {
            Some(time) => parse_date_time(date, time),
            None => parse_timestamp(date),
        }
    }
}

impl Default for TimestampSource {
    fn default() -> Self {
        Self::new("Race")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[rstest]
    #[case("2023-11-20T00:00:01Z", utc(2023, 11, 20, 0, 0, 1))]
    #[case("2023-11-20T02:00:01+02:00", utc(2023, 11, 20, 0, 0, 1))]
    #[case("2023-11-19T23:00:00-01:00", utc(2023, 11, 20, 0, 0, 0))]
    #[case("2023-11-20T00:00:01", utc(2023, 11, 20, 0, 0, 1))]
    #[case("2023-11-20T14:00", utc(2023, 11, 20, 14, 0, 0))]
    #[case("2023-11-20 14:00:30", utc(2023, 11, 20, 14, 0, 30))]
    #[case("2023-11-20 14:00", utc(2023, 11, 20, 14, 0, 0))]
    #[case("2023-11-19", utc(2023, 11, 19, 0, 0, 0))]
    #[case("  2023-11-19  ", utc(2023, 11, 19, 0, 0, 0))]
    #[case("Mar 8 2026 04:00 UTC", utc(2026, 3, 8, 4, 0, 0))]
    #[case("Nov 26 2023 14:00 UTC", utc(2023, 11, 26, 14, 0, 0))]
    fn parse_timestamp_valid(#[case] input: &str, #[case] expected: DateTime<Utc>) {
        assert_eq!(parse_timestamp(input), Some(expected), "input: {input:?}");
    }

    #[test]
    fn parse_timestamp_fraction() {
        let parsed = parse_timestamp("2023-11-20T00:00:00.250").unwrap();
        assert_eq!(parsed.timestamp_millis(), utc(2023, 11, 20, 0, 0, 0).timestamp_millis() + 250);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("TBA")]
    #[case("2023-13-01")]
    #[case("2023-02-30")]
    #[case("2023-11-20T25:00")]
    #[case("Foo 8 2026 04:00 UTC")]
    #[case("1700000000")]
    fn parse_timestamp_invalid(#[case] input: &str) {
        assert_eq!(parse_timestamp(input), None, "input: {input:?}");
    }

    #[test]
    fn parse_timestamp_strict_error() {
        assert_eq!(
            parse_timestamp_strict("TBA"),
            Err(EventError::InvalidTimestamp("TBA".to_owned()))
        );
        assert_eq!(parse_timestamp_strict("2023-11-19"), Ok(utc(2023, 11, 19, 0, 0, 0)));
    }

    #[rstest]
    #[case("2023-11-19", "14:00", Some(utc(2023, 11, 19, 14, 0, 0)))]
    #[case("2023-11-19", "14:00:15", Some(utc(2023, 11, 19, 14, 0, 15)))]
    #[case("2023-11-19", " ", Some(utc(2023, 11, 19, 0, 0, 0)))]
    #[case("2023-11-19", "2pm", None)]
    #[case("", "14:00", None)]
    fn parse_date_time_cases(#[case] date: &str, #[case] time: &str, #[case] expected: Option<DateTime<Utc>>) {
        assert_eq!(parse_date_time(date, time), expected);
    }

    #[test]
    fn extract_single_field() {
        let source = TimestampSource::default();
        let record = json!({"Country": "Australia", "Race": "Mar 8 2026 04:00 UTC"});
        assert_eq!(
            source.extract(record.as_object().unwrap()),
            Some(utc(2026, 3, 8, 4, 0, 0))
        );
    }

    #[test]
    fn extract_with_time_field() {
        let source = TimestampSource::new("date").with_time_field("time");
        let record = json!({"country": "Mexico", "date": "2023-11-26", "time": "14:00"});
        assert_eq!(
            source.extract(record.as_object().unwrap()),
            Some(utc(2023, 11, 26, 14, 0, 0))
        );

        // no time - date only
        let record = json!({"country": "Mexico", "date": "2023-11-26"});
        assert_eq!(
            source.extract(record.as_object().unwrap()),
            Some(utc(2023, 11, 26, 0, 0, 0))
        );
    }

    #[rstest]
    #[case(json!({"Country": "Monaco"}))]
    #[case(json!({"Race": null}))]
    #[case(json!({"Race": 1700000000}))]
    #[case(json!({"Race": "TBA"}))]
    fn extract_missing_or_invalid(#[case] record: Value) {
        assert_eq!(TimestampSource::default().extract(record.as_object().unwrap()), None);
    }
}
