//! Next upcoming event selector and race schedule updater.
#![deny(unsafe_code, missing_docs)]

//! This is a tiny crate, intended to:
//! - find the next upcoming event in a list of dated events;
//! - keep a small JSON document with the next race up to date, using a race schedule document as a source;
//! - refresh championship standings and the last podium after a race weekend.
//!
//! ## Selection rules
//!
//! The core of the crate is [`select_next`]: given a collection of dated events and a reference time
//! (usually "now"), it returns the event with the smallest positive distance from the reference time:
//! - the collection doesn't have to be sorted;
//! - events at or before the reference time are never selected;
//! - events with missing or unparseable timestamp are skipped, they don't abort the scan;
//! - if several events share the nearest timestamp, the first one wins;
//! - `None` is returned for an empty collection or if all events are in the past.
//!
//! Reference time is always an explicit parameter, so selection is a pure function.
//!
//! ## Timestamp formats
//!
//! | Format                       | Example                     | Meaning                |
//! |------------------------------|-----------------------------|------------------------|
//! | RFC 3339                     | `2023-11-20T00:00:01+02:00` | as is                  |
//! | ISO-8601 without offset      | `2023-11-20T00:00:01`       | UTC                    |
//! | ISO-8601 date                | `2023-11-19`                | midnight UTC           |
//! | Schedule display format      | `Mar 8 2026 04:00 UTC`      | UTC                    |
//!
//! Date and time may be stored in separate fields as well, see [`TimestampSource`].
//!
//! ## How to use
//!
//! ### Example with `select_next`
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use next_event::{EventCollection, TimestampSource};
//! use serde_json::json;
//!
//! let schedule = json!([
//!     {"country": "United States", "date": "2023-11-19", "time": "14:00"},
//!     {"country": "Mexico", "date": "2023-11-26", "time": "14:00"},
//! ]);
//! let races = EventCollection::from_records(
//!     schedule.as_array().unwrap().clone(),
//!     &TimestampSource::new("date").with_time_field("time"),
//! );
//!
//! let now = Utc.with_ymd_and_hms(2023, 11, 20, 0, 0, 0).unwrap();
//! let next = races.next_after(&now).unwrap();
//! assert_eq!(next.get_str("country"), Some("Mexico"));
//! ```
//!
//! ### Example with `Scheduler`
//! ```rust,no_run
//! use next_event::{Pipeline, Result, Scheduler, Source, SourceLocation};
//! use std::time::Duration;
//!
//! async fn update_hourly() -> Result<()> {
//!     let source = Source::new("https://example.com/races.json".parse::<SourceLocation>()?)?;
//!     let pipeline = Pipeline::new(source, "racesmini.json");
//!
//!     // Update right now and then every hour
//!     let scheduler = Scheduler::new(pipeline, Duration::from_secs(3600))?.start();
//!     tokio::signal::ctrl_c().await.ok();
//!     scheduler.stop().await;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Standings and podiums
//!
//! [`ResultsPipeline`] uses the same schedule to decide if a race has finished recently
//! (see [`select_recent`], 48 hours by default). If so, it fetches driver standings and the last race
//! results from an Ergast compatible API ([Jolpica](https://api.jolpi.ca/ergast/f1) by default)
//! and rewrites two documents: top six of the championship and the podium with earned points.
//! Both pipelines implement [`Update`], so either of them can be run by a [`Scheduler`].
//!
//! # Feature flags
//! * `async` (default): HTTP source, [`Pipeline`], [`ResultsPipeline`] and [`Scheduler`].
//! * `cli`: `next-event` command line updater.
//! * `tz`: support of named display time zones, i.e. `Europe/Paris`.

/// Updater configuration.
pub mod config;
/// Crate specific Error implementation.
pub mod error;
/// Dated events and collections of them.
pub mod event;
/// Load, select, project and write pipeline.
#[cfg(feature = "async")]
pub mod pipeline;
/// Output shape of the selected event.
pub mod projection;
/// Periodic pipeline runner.
#[cfg(feature = "async")]
pub mod scheduler;
/// Next, recent and upcoming events selection.
pub mod selector;
/// Output document writer.
pub mod sink;
/// Schedule document loader.
pub mod source;
/// Championship standings and podium documents.
pub mod standings;
/// Timestamp parsing.
pub mod timestamp;

// Re-export of public entities.
pub use config::Config;
pub use error::EventError;
pub use event::{Dated, Event, EventCollection};
#[cfg(feature = "async")]
pub use pipeline::{Outcome, Pipeline, ResultsOutcome, ResultsPipeline, Update};
pub use projection::{DisplayTimeZone, Projection};
#[cfg(feature = "async")]
pub use scheduler::{Clock, FixedClock, Scheduler, SchedulerHandle, SystemClock};
pub use selector::{select_next, select_recent, upcoming};
pub use source::{Source, SourceLocation};
#[cfg(feature = "async")]
pub use standings::ResultsApi;
pub use timestamp::{parse_timestamp, TimestampSource};

/// Convenient alias for `Result`.
pub type Result<T, E = EventError> = std::result::Result<T, E>;
