use crate::{pipeline::Update, EventError, Result};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Interval, MissedTickBehavior},
};
use tracing::{debug, error, info};

/// Source of the reference time for every scheduled run.
pub trait Clock: Send + Sync + 'static {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock which always returns the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Runs an [`Update`], i.e. [`Pipeline`](crate::Pipeline), immediately and then every `interval`.
///
/// Interval is fixed: no backoff and no jitter, failed runs don't change it.
/// If a run takes longer than `interval`, the next one starts right after it.
#[derive(Debug)]
pub struct Scheduler<U: Update, C: Clock = SystemClock> {
    job: U,
    interval: Duration,
    clock: C,
}

impl<U: Update> Scheduler<U, SystemClock> {
    /// Constructs scheduler with the wall clock.
    pub fn new(job: U, interval: Duration) -> Result<Self> {
        Self::with_clock(job, interval, SystemClock)
    }
}

impl<U: Update, C: Clock> Scheduler<U, C> {
    /// Constructs scheduler which takes reference time from `clock`.
    ///
    /// Returns [`EventError::InvalidConfig`] if `interval` is zero.
    pub fn with_clock(job: U, interval: Duration, clock: C) -> Result<Self> {
        if interval.is_zero() {
            return Err(EventError::InvalidConfig("update interval must be positive".to_owned()));
        }

        Ok(Self {
            job,
            interval,
            clock,
        })
    }

    /// Returns interval between runs.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Consumes scheduler and returns an endless stream of runs outcomes.
    ///
    /// The first item is produced immediately, the following ones every `interval`.
    /// Nothing happens until the stream is polled.
    pub fn into_stream(self) -> impl Stream<Item = Result<U::Outcome>> + Send {
        futures::stream::unfold((self, None::<Interval>), |(scheduler, ticker)| async move {
            let mut ticker = ticker.unwrap_or_else(|| {
                let mut ticker = tokio::time::interval(scheduler.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });

            ticker.tick().await;
            let now = scheduler.clock.now();
            debug!(update = scheduler.job.name(), %now, "scheduled run");
            let outcome = scheduler.job.update(now).await;

            Some((outcome, (scheduler, Some(ticker))))
        })
    }

    /// Spawns the scheduler onto the current tokio runtime.
    ///
    /// Failed runs are logged and don't stop the schedule.
    /// Scheduler works until [`SchedulerHandle::stop`] is called or the handle is dropped.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let runs = Arc::new(AtomicU64::new(0));
        let counter = runs.clone();
        let interval = self.interval;
        let name = self.job.name();

        let task = tokio::spawn(async move {
            info!(update = name, ?interval, "scheduler started");
            let mut outcomes = Box::pin(self.into_stream());

            loop {
                tokio::select! {
                    outcome = outcomes.next() => {
                        match outcome {
                            Some(Ok(outcome)) => debug!(update = name, ?outcome, "scheduled update finished"),
                            Some(Err(e)) => error!(update = name, error = %e, "scheduled update failed"),
                            None => break,
                        }
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!(update = name, "scheduler stopped");
                            break;
                        }
                    }
                }
            }
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
            runs,
        }
    }
}

/// Controls the running [`Scheduler`].
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    runs: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Number of completed runs, successful or not.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Returns `true` if the scheduler task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the scheduler to stop and waits until it finishes.
    ///
    /// A run in progress is cancelled.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "scheduler task failed");
        }
    }
}
