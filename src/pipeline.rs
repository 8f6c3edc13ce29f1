use crate::{
    event::Dated,
    projection::Projection,
    sink,
    source::Source,
    standings::{podiums_document, standings_document, ResultsApi},
    Result,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default width of the window [`ResultsPipeline`] looks for a finished race in.
pub const DEFAULT_RECENT_WINDOW_HOURS: i64 = 48;

/// Unit of work the [`Scheduler`](crate::scheduler::Scheduler) runs periodically.
#[async_trait]
pub trait Update: Send + Sync + 'static {
    /// Result of a successful run.
    type Outcome: std::fmt::Debug + Send + 'static;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Runs once with `now` as the reference time.
    async fn update(&self, now: DateTime<Utc>) -> Result<Self::Outcome>;
}

/// Result of a single successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Sink was updated with this projected event.
    Updated(Value),
    /// There is no event after the reference time, sink is left untouched.
    NoUpcoming,
}

/// Load, select, project and write, once.
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Source,
    sink: PathBuf,
    projection: Projection,
}

impl Pipeline {
    /// Constructs pipeline with identity projection.
    pub fn new(source: Source, sink: impl Into<PathBuf>) -> Self {
        Self {
            source,
            sink: sink.into(),
            projection: Projection::default(),
        }
    }

    /// Sets projection of the selected event.
    ///
    /// The source's timestamp field is rendered from the resolved event time if it's a date field.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection.with_timestamp_field(self.source.timestamp().field());
        self
    }

    /// Returns the sink path.
    pub fn sink(&self) -> &Path {
        &self.sink
    }

    /// Loads the source, selects the event next to `now` and writes its projection to the sink.
    ///
    /// Source and sink errors are returned as is, absence of the upcoming event isn't an error.
    pub async fn run_once<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Outcome> {
        let now = now.with_timezone(&Utc);
        let events = self.source.load().await?;

        let Some(next) = events.next_after(&now) else {
            warn!(source = %self.source.location(), %now, events = events.len(), "no upcoming events found");
            return Ok(Outcome::NoUpcoming);
        };

        let projected = self.projection.apply(next);
        sink::write_json_async(self.sink.clone(), projected.clone()).await?;

        if let Some(at) = next.occurs_at() {
            info!(sink = %self.sink.display(), %at, "next event updated");
        }

        Ok(Outcome::Updated(projected))
    }
}

#[async_trait]
impl Update for Pipeline {
    type Outcome = Outcome;

    fn name(&self) -> &'static str {
        "next event"
    }

    async fn update(&self, now: DateTime<Utc>) -> Result<Outcome> {
        self.run_once(&now).await
    }
}

/// Result of a single successful results pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsOutcome {
    /// Both documents were rewritten.
    Updated {
        /// New standings document.
        standings: Value,
        /// New podium document.
        podiums: Value,
    },
    /// No race finished within the window, documents are left untouched.
    NoRecentRace,
}

/// Refreshes championship standings and the last podium after a race weekend.
///
/// Runs only if the schedule has a race within the window before the reference time.
#[derive(Debug, Clone)]
pub struct ResultsPipeline {
    source: Source,
    api: ResultsApi,
    standings_sink: PathBuf,
    podiums_sink: PathBuf,
    window: TimeDelta,
}

impl ResultsPipeline {
    /// Constructs pipeline with the default window.
    pub fn new(
        source: Source,
        api: ResultsApi,
        standings_sink: impl Into<PathBuf>,
        podiums_sink: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            api,
            standings_sink: standings_sink.into(),
            podiums_sink: podiums_sink.into(),
            window: TimeDelta::hours(DEFAULT_RECENT_WINDOW_HOURS),
        }
    }

    /// Sets how long after the race the results are refreshed.
    pub fn with_window(mut self, window: TimeDelta) -> Self {
        self.window = window;
        self
    }

    /// Loads the schedule, and if a race finished within the window before `now`,
    /// fetches standings and results and writes both documents.
    pub async fn run_once<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<ResultsOutcome> {
        let now = now.with_timezone(&Utc);
        let events = self.source.load().await?;

        let Some(race) = events.recent_within(&now, self.window) else {
            info!(%now, window_hours = self.window.num_hours(), "no recent race, results are up to date");
            return Ok(ResultsOutcome::NoRecentRace);
        };

        let (drivers, results) = tokio::try_join!(self.api.driver_standings(), self.api.last_results())?;
        let standings = standings_document(race, &drivers);
        let podiums = podiums_document(race, &results, &drivers);

        sink::write_json_async(self.standings_sink.clone(), standings.clone()).await?;
        sink::write_json_async(self.podiums_sink.clone(), podiums.clone()).await?;
        info!(race = %results.race_name, round = %results.round, "standings and podium updated");

        Ok(ResultsOutcome::Updated { standings, podiums })
    }
}

#[async_trait]
impl Update for ResultsPipeline {
    type Outcome = ResultsOutcome;

    fn name(&self) -> &'static str {
        "results"
    }

    async fn update(&self, now: DateTime<Utc>) -> Result<ResultsOutcome> {
        self.run_once(&now).await
    }
}
