//! Criterion benchmarks for timeline seeks and checkpoint restores.

use std::io::Cursor;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hindsight_bench::synthetic_log;
use hindsight_codec::LogReader;
use hindsight_core::Tick;
use hindsight_engine::{EngineConfig, SessionStats, Timeline};

const TICKS: u64 = 5000;

/// Build a timeline over a shared synthetic log.
fn make_timeline(log: &[u8], interval: u64) -> Timeline<Cursor<&[u8]>> {
    let reader = LogReader::open(Cursor::new(log)).unwrap();
    let config = EngineConfig {
        checkpoint_interval: interval,
        ..EngineConfig::default()
    };
    Timeline::new(reader, &config, Arc::new(SessionStats::default()))
}

/// Benchmark: first pass over a 5000-tick log, capturing checkpoints.
fn bench_first_scan(c: &mut Criterion) {
    let log = synthetic_log(42, TICKS, 16);

    c.bench_function("timeline_first_scan_5k", |b| {
        b.iter(|| {
            let mut timeline = make_timeline(&log, 1000);
            timeline.seek(Tick(TICKS), || false).unwrap();
            black_box(timeline.current_tick());
        });
    });
}

/// Benchmark: backward seek on a warmed timeline. Each iteration
/// restores a checkpoint and replays at most one interval of ticks.
fn bench_checkpoint_seek(c: &mut Criterion) {
    let log = synthetic_log(42, TICKS, 16);
    let mut timeline = make_timeline(&log, 500);
    timeline.seek(Tick(TICKS), || false).unwrap();

    c.bench_function("timeline_checkpoint_seek", |b| {
        b.iter(|| {
            timeline.seek(Tick(1234), || false).unwrap();
            timeline.seek(Tick(4321), || false).unwrap();
            black_box(timeline.current_tick());
        });
    });
}

/// Benchmark: a scrub-like target sequence on a warmed timeline.
fn bench_scrub_sequence(c: &mut Criterion) {
    let log = synthetic_log(42, TICKS, 16);
    let mut timeline = make_timeline(&log, 500);
    timeline.seek(Tick(TICKS), || false).unwrap();
    let targets = [4500u64, 100, 2300, 2250, 4999, 10, 4998];

    c.bench_function("timeline_scrub_sequence", |b| {
        b.iter(|| {
            for &target in &targets {
                timeline.seek(Tick(target), || false).unwrap();
            }
            black_box(timeline.current_tick());
        });
    });
}

criterion_group!(
    benches,
    bench_first_scan,
    bench_checkpoint_seek,
    bench_scrub_sequence
);
criterion_main!(benches);
