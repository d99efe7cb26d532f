//! Hindsight scrubbing demo — record a session log, then move through it.
//!
//! Demonstrates:
//!   1. Recording a small skirmish to a session log with LogWriter
//!   2. Opening the file through ReplayController
//!   3. Scrubbing to arbitrary ticks and reading state via LiveEntityView
//!   4. Real-time playback that pauses itself at the end of the log
//!
//! Run with:
//!   cargo run --example scrub
//!
//! Set `RUST_LOG=hindsight_engine=debug` to watch checkpoint captures
//! and restores as the timeline moves.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use hindsight_codec::{LogHeader, LogWriter};
use hindsight_core::{ChangeRecord, EntityId, PropList, PropValue, Tick};
use hindsight_engine::{EngineConfig, LiveEntityView, ReplayController};
use tracing_subscriber::EnvFilter;

// ─── Recording parameters ───────────────────────────────────────

const NUM_TICKS: u64 = 120;
const CHECKPOINT_INTERVAL: u64 = 25;

// Grunt-2's scripted lifecycle: destroyed mid-session, then a fresh
// entity reuses the id with a different property set.
const DEATH_TICK: u64 = 40;
const RESPAWN_TICK: u64 = 90;

// ─── Recording ──────────────────────────────────────────────────

fn props(pairs: &[(&str, PropValue)]) -> PropList {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Change records for one tick of the scripted skirmish.
fn tick_records(tick: u64) -> Vec<ChangeRecord> {
    let mut records = Vec::new();

    if tick == 1 {
        let roster = [
            (0u32, "scout", 80i64),
            (1, "grunt-1", 100),
            (2, "grunt-2", 100),
            (3, "medic", 60),
        ];
        for (id, name, hp) in roster {
            records.push(ChangeRecord::Created {
                id: EntityId(id),
                name: name.to_string(),
                props: props(&[("hp", PropValue::Int(hp))]),
            });
        }
    }

    // The scout sweeps east; the grunts trade hit points with an
    // off-screen enemy.
    records.push(ChangeRecord::Updated {
        id: EntityId(0),
        props: props(&[("x", PropValue::Float(tick as f64 * 1.5))]),
    });
    records.push(ChangeRecord::Updated {
        id: EntityId(1),
        props: props(&[("hp", PropValue::Int(100 - tick as i64 / 2))]),
    });

    if tick < DEATH_TICK {
        records.push(ChangeRecord::Updated {
            id: EntityId(2),
            props: props(&[("hp", PropValue::Int(100 - 2 * tick as i64))]),
        });
    } else if tick == DEATH_TICK {
        records.push(ChangeRecord::Deleted { id: EntityId(2) });
    } else if tick == RESPAWN_TICK {
        // The replacement carries a shield instead of hit points.
        records.push(ChangeRecord::Created {
            id: EntityId(2),
            name: "grunt-2".to_string(),
            props: props(&[("shield", PropValue::Int(50))]),
        });
    } else if tick > RESPAWN_TICK {
        records.push(ChangeRecord::Updated {
            id: EntityId(2),
            props: props(&[(
                "shield",
                PropValue::Int(50 - (tick - RESPAWN_TICK) as i64),
            )]),
        });
    }

    if tick % 10 == 0 {
        records.push(ChangeRecord::Updated {
            id: EntityId(3),
            props: props(&[("heals", PropValue::Int(tick as i64 / 10))]),
        });
    }

    records
}

/// Record the skirmish to `path`, returning the record count.
fn record_session(path: &Path) -> Result<u64, Box<dyn Error>> {
    let header = LogHeader {
        recorder: "hindsight-demo/0.1".to_string(),
        map: "canyon-skirmish".to_string(),
        tick_rate: 30.0,
    };
    let sink = BufWriter::new(File::create(path)?);
    let mut writer = LogWriter::new(sink, &header)?;

    for tick in 1..=NUM_TICKS {
        writer.write_tick(Tick(tick), &tick_records(tick))?;
    }

    writer.flush()?;
    Ok(writer.records_written())
}

// ─── Inspection helpers ─────────────────────────────────────────

/// Demand `tick` and block until the runner has materialized it.
fn goto(controller: &ReplayController, tick: u64) -> Result<(), Box<dyn Error>> {
    controller.set_demanded_tick(tick as i64);
    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.current_tick() != Tick(tick) || controller.is_seeking() {
        if let Some(err) = controller.take_error() {
            return Err(err.into());
        }
        if Instant::now() > deadline {
            return Err(format!("timed out seeking to tick {tick}").into());
        }
        thread::sleep(Duration::from_millis(1));
    }
    Ok(())
}

fn print_entities(view: &LiveEntityView) {
    println!("  tick {:>3}, {} entities:", view.tick().0, view.len());
    for entity in view.iter() {
        let fields: Vec<String> = entity
            .properties
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!(
            "    #{} {:<8} {}",
            entity.id.0,
            entity.name,
            fields.join("  ")
        );
    }
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    println!("=== Hindsight Scrub Demo ===\n");

    // ----------------------------------------------------------------
    // Phase 1: Record a session log.
    // ----------------------------------------------------------------

    println!("--- Phase 1: Record ---\n");

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("skirmish.hnds");
    let written = record_session(&path)?;
    println!(
        "Recorded {} ticks ({} records, {} bytes) to {}\n",
        NUM_TICKS,
        written,
        std::fs::metadata(&path)?.len(),
        path.display()
    );

    // ----------------------------------------------------------------
    // Phase 2: Open the log and scrub around.
    // ----------------------------------------------------------------

    println!("--- Phase 2: Scrub ---\n");

    let config = EngineConfig {
        checkpoint_interval: CHECKPOINT_INTERVAL,
        ..EngineConfig::default()
    };
    let mut controller = ReplayController::new(config)?;
    let mut view = controller.open(&path)?;

    // Forward past the death, back before it, then to the respawn.
    // The backward hop restores a checkpoint instead of rescanning.
    for target in [DEATH_TICK, DEATH_TICK - 1, RESPAWN_TICK, NUM_TICKS] {
        goto(&controller, target)?;
        view.refresh();
        print_entities(&view);
    }

    println!("\nLast known tick: {}", controller.last_known_tick().0);

    // A refresh reports what changed since the caller last looked.
    // Step across the death tick and diff.
    goto(&controller, DEATH_TICK - 1)?;
    view.refresh();
    goto(&controller, DEATH_TICK)?;
    let delta = view.refresh();
    println!(
        "\nDelta across the death tick: {} created, {} updated, {} removed",
        delta.created.len(),
        delta.updated.len(),
        delta.removed.len()
    );

    // ----------------------------------------------------------------
    // Phase 3: Playback to the end.
    // ----------------------------------------------------------------

    println!("\n--- Phase 3: Playback ---\n");

    controller.close();

    // Reopen with an explicit playback rate, eight times the recorded
    // 30 Hz, so the demo finishes quickly. A fresh session starts at
    // tick 0.
    let fast = EngineConfig {
        checkpoint_interval: CHECKPOINT_INTERVAL,
        playback_hz: Some(240.0),
    };
    let mut controller = ReplayController::new(fast)?;
    let mut view = controller.open(&path)?;
    controller.set_playing(true);
    println!("Playing from tick 0 at 240 Hz...");

    // The play command travels through the runner's mailbox; wait for
    // the state flip before polling for the auto-pause.
    let deadline = Instant::now() + Duration::from_secs(1);
    while !controller.is_playing() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }

    let mut last_printed = 0u64;
    while controller.is_playing() {
        view.refresh();
        let tick = view.tick().0;
        if tick >= last_printed + 30 {
            print_entities(&view);
            last_printed = tick;
        }
        thread::sleep(Duration::from_millis(5));
    }
    view.refresh();
    println!(
        "\nPlayback paused itself at tick {} (end of log).",
        view.tick().0
    );

    // ----------------------------------------------------------------
    // Phase 4: Session statistics.
    // ----------------------------------------------------------------

    let stats = controller.stats();
    println!("\n--- Phase 4: Stats ---\n");
    println!("  records applied:      {}", stats.records_applied);
    println!("  ticks committed:      {}", stats.ticks_committed);
    println!("  checkpoints captured: {}", stats.checkpoints_captured);
    println!("  checkpoint restores:  {}", stats.checkpoint_restores);
    println!("  seeks completed:      {}", stats.seeks_completed);

    controller.close();
    println!("\nDone.");
    Ok(())
}
