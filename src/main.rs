use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use next_event::{
    config::Overrides, timestamp::parse_timestamp_strict, Config, FixedClock, Outcome, ResultsOutcome, Scheduler,
    SchedulerHandle, Update,
};
use std::{path::PathBuf, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "next_event=info";

/// Keeps the next race document up to date.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Schedule document: path or HTTP(S) URL.
    #[arg(short, long, value_name = "LOCATION")]
    source: Option<String>,

    /// Output document path.
    #[arg(short = 'o', long, value_name = "PATH")]
    sink: Option<PathBuf>,

    /// Seconds between updates.
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Update once and exit.
    #[arg(long)]
    once: bool,

    /// Don't update standings and podium even if configured.
    #[arg(long)]
    no_results: bool,

    /// Reference time instead of the current time, i.e. `2023-11-20T00:00:00Z`.
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp_strict)]
    at: Option<DateTime<Utc>>,
}

/// `RUST_LOG` if set, [`DEFAULT_LOG_FILTER`] otherwise.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn start<U: Update>(job: U, interval: Duration, at: Option<DateTime<Utc>>) -> next_event::Result<SchedulerHandle> {
    Ok(match at {
        Some(at) => Scheduler::with_clock(job, interval, FixedClock(at))?.start(),
        None => Scheduler::new(job, interval)?.start(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    let cli = Cli::parse();
    let overrides = Overrides {
        source: cli.source,
        sink: cli.sink,
        interval_secs: cli.interval,
    };
    let mut config = Config::from_figment(overrides.apply(Config::figment(cli.config.as_deref())))
        .context("failed to load configuration")?;
    if cli.no_results {
        config.results = None;
    }

    let pipeline = config.pipeline().context("failed to build update pipeline")?;
    let results = config
        .results_pipeline()
        .context("failed to build results pipeline")?;

    if cli.once {
        let now = cli.at.unwrap_or_else(Utc::now);
        match pipeline.run_once(&now).await? {
            Outcome::Updated(_) => info!(sink = %config.sink.display(), "done"),
            Outcome::NoUpcoming => info!("nothing to update"),
        }
        if let Some(results) = &results {
            match results.run_once(&now).await? {
                ResultsOutcome::Updated { .. } => info!("standings and podium updated"),
                ResultsOutcome::NoRecentRace => info!("no recent race, standings not updated"),
            }
        }
        return Ok(());
    }

    let mut handles = vec![start(pipeline, config.interval(), cli.at)?];
    if let (Some(results), Some(interval)) = (results, config.results_interval()) {
        handles.push(start(results, interval, cli.at)?);
    }

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    for handle in handles {
        info!(runs = handle.runs(), "shutting down");
        handle.stop().await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_respects_rust_log() {
        std::env::remove_var("RUST_LOG");
        let default = log_filter().to_string().to_lowercase();
        assert!(default.contains("next_event") && default.contains("info"), "{default}");

        std::env::set_var("RUST_LOG", "next_event=debug");
        let custom = log_filter().to_string().to_lowercase();
        assert!(custom.contains("debug") && !custom.contains("info"), "{custom}");
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::try_parse_from(["next-event", "--once", "--no-results", "--at", "2023-11-20T00:00:00Z"]).unwrap();
        assert!(cli.once && cli.no_results);
        assert_eq!(cli.at, next_event::parse_timestamp("2023-11-20"));

        assert!(Cli::try_parse_from(["next-event", "--at", "someday"]).is_err());
    }
}
