use crate::{
    event::{Dated, Event},
    timestamp::parse_timestamp,
    EventError, Result,
};
use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Utc,
};
use serde_json::{Map, Value};
use std::{fmt::Display, str::FromStr};

/// Default display format of the date fields, i.e. `Mar 8 2026 04:00 UTC`.
pub const DEFAULT_DATE_FORMAT: &str = "%b %-d %Y %H:%M %Z";

/// Time zone used to render date fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayTimeZone {
    /// Coordinated Universal Time.
    #[default]
    Utc,
    /// Any IANA time zone, i.e. `Europe/Paris`.
    #[cfg(feature = "tz")]
    Named(chrono_tz::Tz),
}

impl DisplayTimeZone {
    /// Renders `at` in this time zone with `format`.
    ///
    /// `format` must be validated by the caller.
    fn format(&self, at: &DateTime<Utc>, format: &str) -> String {
        match self {
            DisplayTimeZone::Utc => at.format(format).to_string(),
            #[cfg(feature = "tz")]
            DisplayTimeZone::Named(tz) => at.with_timezone(tz).format(format).to_string(),
        }
    }
}

impl FromStr for DisplayTimeZone {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("UTC") || s.eq_ignore_ascii_case("Z") {
            return Ok(DisplayTimeZone::Utc);
        }

        #[cfg(feature = "tz")]
        if let Ok(tz) = chrono_tz::Tz::from_str(s) {
            return Ok(DisplayTimeZone::Named(tz));
        }

        Err(EventError::InvalidTimeZone(s.to_owned()))
    }
}

impl Display for DisplayTimeZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayTimeZone::Utc => write!(f, "UTC"),
            #[cfg(feature = "tz")]
            DisplayTimeZone::Named(tz) => write!(f, "{tz}"),
        }
    }
}

/// Describes how the selected event is turned into the sink document:
/// which fields to keep and which of them to reformat as display dates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Projection {
    fields: Option<Vec<String>>,
    date_fields: Vec<String>,
    date_format: String,
    time_zone: DisplayTimeZone,
    timestamp_field: Option<String>,
}

impl Projection {
    /// Identity projection: keeps all fields as is.
    pub fn new() -> Self {
        Self {
            fields: None,
            date_fields: Vec::new(),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
            time_zone: DisplayTimeZone::default(),
            timestamp_field: None,
        }
    }

    /// Keeps listed fields only, in the listed order.
    pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Fields to reformat as display dates.
    pub fn with_date_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets `strftime`-like format of the date fields.
    ///
    /// Returns [`EventError::InvalidConfig`] if `format` has unknown specifiers.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(EventError::InvalidConfig(format!("invalid date format: {format}")));
        }
        self.date_format = format;
        Ok(self)
    }

    /// Sets time zone of the date fields.
    pub fn with_time_zone(mut self, time_zone: DisplayTimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Sets name of the field the events' timestamps are taken from.
    ///
    /// If it's one of the date fields, it's rendered from the event's resolved timestamp
    /// instead of its own value, so a separate time-of-day field isn't lost.
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = Some(field.into());
        self
    }

    /// Projects `event` into a JSON object.
    ///
    /// Missing fields are omitted, date fields with unparseable values are left untouched.
    pub fn apply(&self, event: &Event) -> Value {
        let mut projected = match &self.fields {
            Some(fields) => fields
                .iter()
                .filter_map(|name| Some((name.clone(), event.get(name)?.clone())))
                .collect::<Map<String, Value>>(),
            None => event.attributes().clone(),
        };

        for name in &self.date_fields {
            let Some(Value::String(value)) = projected.get_mut(name) else {
                continue;
            };

            let at = match event.occurs_at() {
                Some(at) if self.timestamp_field.as_ref() == Some(name) => Some(at),
                _ => parse_timestamp(value),
            };
            if let Some(at) = at {
                *value = self.time_zone.format(&at, &self.date_format);
            }
        }

        Value::Object(projected)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::TimestampSource;
    use rstest::rstest;
    use serde_json::json;

    fn event(record: Value) -> Event {
        let Value::Object(record) = record else {
            unreachable!()
        };
        Event::from_record(record, &TimestampSource::new("date").with_time_field("time"))
    }

    fn mexico() -> Event {
        event(json!({
            "country": "Mexico",
            "location": "Autodromo Hermanos Rodriguez",
            "date": "2023-11-26",
            "time": "14:00",
            "laps": 71
        }))
    }

    #[test]
    fn identity_keeps_everything() {
        assert_eq!(Projection::new().apply(&mexico()), serde_json::to_value(mexico()).unwrap());
    }

    #[test]
    fn fields_subset_in_listed_order() {
        let projection = Projection::new().with_fields(["location", "country", "missing"]);
        let projected = projection.apply(&mexico());
        assert_eq!(
            projected,
            json!({"location": "Autodromo Hermanos Rodriguez", "country": "Mexico"})
        );

        let keys: Vec<&String> = projected.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["location", "country"]);
    }

    #[rstest]
    #[case(DEFAULT_DATE_FORMAT, "Nov 26 2023 14:00 UTC")]
    #[case("%d.%m.%Y", "26.11.2023")]
    #[case("%A, %B %-d %H:%M", "Sunday, November 26 14:00")]
    fn date_fields_reformatted(#[case] format: &str, #[case] expected: &str) {
        let projection = Projection::new()
            .with_fields(["country", "date"])
            .with_date_fields(["date"])
            .with_date_format(format)
            .unwrap()
            .with_timestamp_field("date");
        assert_eq!(
            projection.apply(&mexico()),
            json!({"country": "Mexico", "date": expected})
        );
    }

    #[test]
    fn other_date_fields_use_own_value() {
        let race = event(json!({
            "date": "2023-11-26",
            "time": "14:00",
            "qualifying": "2023-11-25T21:00:00Z"
        }));
        let projection = Projection::new()
            .with_date_fields(["date", "qualifying"])
            .with_timestamp_field("date");
        assert_eq!(
            projection.apply(&race),
            json!({
                "date": "Nov 26 2023 14:00 UTC",
                "time": "14:00",
                "qualifying": "Nov 25 2023 21:00 UTC"
            })
        );

        // without the timestamp field every date field is parsed on its own
        let projection = Projection::new().with_date_fields(["date"]);
        assert_eq!(projection.apply(&race)["date"], "Nov 26 2023 00:00 UTC");
    }

    #[test]
    fn timestamp_field_without_timestamp_left_untouched() {
        let race = event(json!({"country": "China", "date": "TBA"}));
        let projection = Projection::new().with_date_fields(["date"]).with_timestamp_field("date");
        assert_eq!(projection.apply(&race), json!({"country": "China", "date": "TBA"}));
    }

    #[test]
    fn date_fields_not_parseable_left_untouched() {
        let projection = Projection::new().with_date_fields(["time", "laps", "country", "absent"]);
        assert_eq!(projection.apply(&mexico()), serde_json::to_value(mexico()).unwrap());
    }

    #[test]
    fn invalid_date_format() {
        let result = Projection::new().with_date_format("%Y-%");
        assert!(matches!(result, Err(EventError::InvalidConfig(_))), "{result:?}");
    }

    #[rstest]
    #[case("UTC")]
    #[case("utc")]
    #[case(" Z ")]
    fn display_time_zone_utc(#[case] input: &str) {
        assert_eq!(input.parse::<DisplayTimeZone>(), Ok(DisplayTimeZone::Utc));
    }

    #[test]
    fn display_time_zone_unknown() {
        assert_eq!(
            "Mars/Olympus".parse::<DisplayTimeZone>(),
            Err(EventError::InvalidTimeZone("Mars/Olympus".to_owned()))
        );
    }

    #[cfg(feature = "tz")]
    #[test]
    fn named_time_zone() {
        let tz: DisplayTimeZone = "America/Mexico_City".parse().unwrap();
        assert_eq!(tz.to_string(), "America/Mexico_City");

        let race = event(json!({"country": "Mexico", "date": "2023-10-29T20:00:00Z"}));
        let projection = Projection::new()
            .with_date_fields(["date"])
            .with_date_format("%Y-%m-%d %H:%M %Z")
            .unwrap()
            .with_time_zone(tz);
        assert_eq!(
            projection.apply(&race),
            json!({"country": "Mexico", "date": "2023-10-29 14:00 CST"})
        );
    }
}
