use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use next_event::{select_next, source::parse_document, upcoming, TimestampSource};
use serde_json::{json, Value};

const SIZES: &[usize] = &[24, 1_000, 100_000];
const NOW: &[&str] = &["1999-12-31T23:59:59Z", "2050-01-01T00:00:00Z", "2099-12-31T23:59:59Z"];

/// Weekly events starting from 2000-01-01, in reversed order to defeat any luck of a sorted input.
fn timestamps(size: usize) -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2000, 1, 1, 14, 0, 0).unwrap();
    (0..size as i64).rev().map(|week| start + TimeDelta::weeks(week)).collect()
}

fn document(size: usize) -> String {
    let races: Vec<Value> = timestamps(size)
        .into_iter()
        .enumerate()
        .map(|(round, at)| {
            json!({
                "Round": round,
                "Country": "Somewhere",
                "Race": at.format("%b %-d %Y %H:%M UTC").to_string(),
            })
        })
        .collect();
    json!({ "Races": races }).to_string()
}

pub fn select_next_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next");
    for size in SIZES {
        let events = timestamps(*size);
        for now_str in NOW {
            let now = DateTime::parse_from_rfc3339(now_str).unwrap();
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{size}/{now_str}")),
                &(now, &events),
                |b, (now, events)| b.iter(|| select_next(events.iter(), now)),
            );
        }
    }
    group.finish();
}

pub fn upcoming_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("upcoming");
    for size in SIZES {
        let events = timestamps(*size);
        let now = DateTime::parse_from_rfc3339(NOW[1]).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &(now, &events), |b, (now, events)| {
            b.iter(|| upcoming(events.iter(), now).len())
        });
    }
    group.finish();
}

pub fn parse_document_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_document");
    let timestamp = TimestampSource::default();
    for size in SIZES {
        let text = document(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parse_document(text, "Races", &timestamp).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, select_next_benchmark, upcoming_benchmark, parse_document_benchmark);
criterion_main!(benches);
