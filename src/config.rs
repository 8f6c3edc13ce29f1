use crate::{
    projection::{DisplayTimeZone, Projection},
    source::{SourceLocation, DEFAULT_LIST_FIELD},
    standings::DEFAULT_RESULTS_API,
    timestamp::TimestampSource,
    EventError, Result,
};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "next-event.toml";
/// Prefix of the environment variables overriding configuration, i.e. `NEXT_EVENT_INTERVAL_SECS=60`.
/// Nested keys are separated by `__`: `NEXT_EVENT_PROJECTION__TIME_ZONE=UTC`.
pub const ENV_PREFIX: &str = "NEXT_EVENT_";

const DEFAULT_TIMESTAMP_FIELD: &str = "Race";
const DEFAULT_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WINDOW_HOURS: u32 = 48;

/// Updater configuration (`next-event.toml` + `NEXT_EVENT_*` env overrides).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Schedule document location: path or HTTP(S) URL.
    pub source: String,
    /// Path of the output document.
    pub sink: PathBuf,
    /// Name of the events list field in the source document.
    #[serde(default = "default_list_field")]
    pub list_field: String,
    /// Name of the event's timestamp (or date) field.
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
    /// Name of the optional time-of-day field.
    #[serde(default)]
    pub time_field: Option<String>,
    /// Seconds between updates.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Output shape.
    #[serde(default)]
    pub projection: ProjectionConfig,
    /// Standings and podium updater, disabled if absent.
    #[serde(default)]
    pub results: Option<ResultsConfig>,
}

/// `[projection]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Fields to keep, all if absent.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    /// Fields to render as display dates.
    #[serde(default)]
    pub date_fields: Vec<String>,
    /// `strftime`-like format of the date fields.
    #[serde(default)]
    pub date_format: Option<String>,
    /// Time zone of the date fields, `UTC` by default.
    #[serde(default)]
    pub time_zone: Option<String>,
}

/// `[results]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsConfig {
    /// Path of the standings document.
    pub standings_sink: PathBuf,
    /// Path of the podium document.
    pub podiums_sink: PathBuf,
    /// Base URL of the Ergast compatible results API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// How many hours after the race the results are refreshed.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    /// Seconds between updates, top level `interval_secs` if absent.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_RESULTS_API.to_owned()
}

fn default_window_hours() -> u32 {
    DEFAULT_WINDOW_HOURS
}

fn default_list_field() -> String {
    DEFAULT_LIST_FIELD.to_owned()
}

fn default_timestamp_field() -> String {
    DEFAULT_TIMESTAMP_FIELD.to_owned()
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    /// Returns configuration providers: TOML file at `path` (or [`DEFAULT_CONFIG_FILE`]) and environment.
    ///
    /// Missing file is not an error. More providers may be merged on top before [`from_figment`](Config::from_figment).
    pub fn figment(path: Option<&Path>) -> Figment {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates configuration from the file at `path` and environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path))
    }

    /// Extracts and validates configuration.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment
            .extract()
            .map_err(|e| EventError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values which can't be checked by deserialization.
    pub fn validate(&self) -> Result<()> {
        self.source_location()?;
        if self.sink.as_os_str().is_empty() {
            return Err(EventError::InvalidConfig("sink path is empty".to_owned()));
        }
        if self.interval_secs == 0 {
            return Err(EventError::InvalidConfig("interval_secs must be positive".to_owned()));
        }
        if self.timeout_secs == 0 {
            return Err(EventError::InvalidConfig("timeout_secs must be positive".to_owned()));
        }
        if self.list_field.is_empty() || self.timestamp_field.is_empty() {
            return Err(EventError::InvalidConfig(
                "list_field and timestamp_field must not be empty".to_owned(),
            ));
        }
        self.projection()?;

        if let Some(results) = &self.results {
            if results.standings_sink.as_os_str().is_empty() || results.podiums_sink.as_os_str().is_empty() {
                return Err(EventError::InvalidConfig("results sink path is empty".to_owned()));
            }
            if !(results.api_url.starts_with("http://") || results.api_url.starts_with("https://")) {
                return Err(EventError::InvalidConfig(format!(
                    "results api_url must be an HTTP(S) URL: {}",
                    results.api_url
                )));
            }
            if results.window_hours == 0 {
                return Err(EventError::InvalidConfig("results window_hours must be positive".to_owned()));
            }
            if results.interval_secs == Some(0) {
                return Err(EventError::InvalidConfig("results interval_secs must be positive".to_owned()));
            }
        }

        Ok(())
    }

    /// Parsed source location.
    pub fn source_location(&self) -> Result<SourceLocation> {
        self.source.parse()
    }

    /// Where the timestamp lives inside the event record.
    pub fn timestamp_source(&self) -> TimestampSource {
        let source = TimestampSource::new(&self.timestamp_field);
        match &self.time_field {
            Some(time_field) => source.with_time_field(time_field),
            None => source,
        }
    }

    /// Output projection.
    pub fn projection(&self) -> Result<Projection> {
        let config = &self.projection;
        let mut projection = Projection::new().with_date_fields(config.date_fields.iter().cloned());
        if let Some(fields) = &config.fields {
            projection = projection.with_fields(fields.iter().cloned());
        }
        if let Some(format) = &config.date_format {
            projection = projection.with_date_format(format)?;
        }
        if let Some(time_zone) = &config.time_zone {
            projection = projection.with_time_zone(time_zone.parse::<DisplayTimeZone>()?);
        }
        Ok(projection)
    }

    /// Interval between updates.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// HTTP request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Interval between results updates, `None` if the updater is disabled.
    pub fn results_interval(&self) -> Option<Duration> {
        let results = self.results.as_ref()?;
        Some(Duration::from_secs(results.interval_secs.unwrap_or(self.interval_secs)))
    }

    /// Builds the update pipeline.
    #[cfg(feature = "async")]
    pub fn pipeline(&self) -> Result<crate::pipeline::Pipeline> {
        let source = crate::source::Source::new(self.source_location()?)?
            .with_list_field(&self.list_field)
            .with_timestamp(self.timestamp_source())
            .with_timeout(self.timeout())?;

        Ok(crate::pipeline::Pipeline::new(source, &self.sink).with_projection(self.projection()?))
    }

    /// Builds the standings and podium pipeline, `None` if there's no `[results]` section.
    #[cfg(feature = "async")]
    pub fn results_pipeline(&self) -> Result<Option<crate::pipeline::ResultsPipeline>> {
        let Some(results) = &self.results else {
            return Ok(None);
        };

        let source = crate::source::Source::new(self.source_location()?)?
            .with_list_field(&self.list_field)
            .with_timestamp(self.timestamp_source())
            .with_timeout(self.timeout())?;
        let api = crate::standings::ResultsApi::new(&results.api_url)?.with_timeout(self.timeout())?;

        let pipeline =
            crate::pipeline::ResultsPipeline::new(source, api, &results.standings_sink, &results.podiums_sink)
                .with_window(chrono::TimeDelta::hours(i64::from(results.window_hours)));
        Ok(Some(pipeline))
    }
}

/// Values which override file and environment configuration, i.e. command line arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overrides {
    /// Overrides `source`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Overrides `sink`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<PathBuf>,
    /// Overrides `interval_secs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl Overrides {
    /// Merges overrides on top of `figment`.
    pub fn apply(&self, figment: Figment) -> Figment {
        figment.merge(Serialized::defaults(self))
    }
}
