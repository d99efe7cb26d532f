//! Test utilities and canned session logs for Hindsight development.
//!
//! Provides [`LogBuilder`] for constructing in-memory logs byte by
//! byte (including deliberately corrupt ones), short constructors for
//! change records, and ready-made logs for recurring test scenarios.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use hindsight_codec::codec::{encode_header, encode_record};
use hindsight_codec::LogHeader;
use hindsight_core::record::{ChangeRecord, PropList};
use hindsight_core::{EntityId, PropValue, Tick};

/// Header used by all canned logs.
pub fn test_header() -> LogHeader {
    LogHeader {
        recorder: "test".into(),
        map: "test".into(),
        tick_rate: 60.0,
    }
}

/// Build a property list from key/value pairs.
pub fn props(pairs: &[(&str, PropValue)]) -> PropList {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A `Created` record.
pub fn created(id: u32, name: &str, props: PropList) -> ChangeRecord {
    ChangeRecord::Created {
        id: EntityId(id),
        name: name.to_string(),
        props,
    }
}

/// An `Updated` record.
pub fn updated(id: u32, props: PropList) -> ChangeRecord {
    ChangeRecord::Updated {
        id: EntityId(id),
        props,
    }
}

/// An `Updated` record setting a single integer property.
pub fn updated_int(id: u32, key: &str, value: i64) -> ChangeRecord {
    updated(id, props(&[(key, PropValue::Int(value))]))
}

/// A `Deleted` record.
pub fn deleted(id: u32) -> ChangeRecord {
    ChangeRecord::Deleted { id: EntityId(id) }
}

/// Builds a session log in memory, one record at a time.
///
/// Unlike [`LogWriter`](hindsight_codec::LogWriter), the builder
/// performs no ordering checks, so out-of-order boundaries, reserved
/// ticks, and raw garbage bytes can all be constructed for decoder
/// and session error tests. [`position`](LogBuilder::position) reports
/// the offset the next record will start at, which is also the offset
/// decode errors for that record will carry.
pub struct LogBuilder {
    buf: Vec<u8>,
}

impl LogBuilder {
    /// Start a log with the standard test header.
    pub fn new() -> Self {
        Self::with_header(&test_header())
    }

    /// Start a log with a custom header.
    pub fn with_header(header: &LogHeader) -> Self {
        let mut buf = Vec::new();
        encode_header(&mut buf, header).expect("encode header");
        Self { buf }
    }

    /// Byte offset of the next record.
    pub fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Append one record.
    pub fn push_record(&mut self, record: &ChangeRecord) -> &mut Self {
        encode_record(&mut self.buf, record).expect("encode record");
        self
    }

    /// Append a batch of changes committed by a boundary at `tick`.
    pub fn push_tick(&mut self, tick: u64, records: &[ChangeRecord]) -> &mut Self {
        for record in records {
            self.push_record(record);
        }
        self.push_record(&ChangeRecord::Boundary { tick: Tick(tick) })
    }

    /// Append raw bytes verbatim, with no validity checks.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Finish and return the encoded log.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A ten-tick log exercising the full entity lifecycle.
///
/// Three entities; entity 2 is deleted at tick 5 and recreated at
/// tick 8 with a disjoint property set, so stale-property bleed-through
/// after recreation is detectable:
///
/// ```text
/// tick 1: create 0 "alpha" (hp 100), create 1 "bravo" (hp 100)
/// tick 2: create 2 "charlie" (hp 80, armor 10)
/// tick 3: update 0 (hp 90)
/// tick 4: update 2 (hp 40)
/// tick 5: delete 2
/// tick 6: update 1 (hp 75)
/// tick 7: (no changes)
/// tick 8: create 2 "charlie" (shield 50)
/// tick 9: update 2 (shield 30)
/// tick 10: update 0 (hp 85)
/// ```
pub fn lifecycle_log() -> Vec<u8> {
    let mut b = LogBuilder::new();
    b.push_tick(
        1,
        &[
            created(0, "alpha", props(&[("hp", PropValue::Int(100))])),
            created(1, "bravo", props(&[("hp", PropValue::Int(100))])),
        ],
    );
    b.push_tick(
        2,
        &[created(
            2,
            "charlie",
            props(&[("hp", PropValue::Int(80)), ("armor", PropValue::Int(10))]),
        )],
    );
    b.push_tick(3, &[updated_int(0, "hp", 90)]);
    b.push_tick(4, &[updated_int(2, "hp", 40)]);
    b.push_tick(5, &[deleted(2)]);
    b.push_tick(6, &[updated_int(1, "hp", 75)]);
    b.push_tick(7, &[]);
    b.push_tick(8, &[created(2, "charlie", props(&[("shield", PropValue::Int(50))]))]);
    b.push_tick(9, &[updated_int(2, "shield", 30)]);
    b.push_tick(10, &[updated_int(0, "hp", 85)]);
    b.finish()
}

/// A log where every entity's `stamp` property equals the current tick.
///
/// All `entities` are created at tick 1; every tick from 1 through
/// `ticks` stamps every entity. A snapshot is internally consistent
/// exactly when all stamps agree with its tick, which makes this the
/// log of choice for torn-read and determinism tests.
pub fn stamped_log(ticks: u64, entities: u32) -> Vec<u8> {
    assert!(ticks >= 1, "need at least one tick");
    let mut b = LogBuilder::new();

    let mut first: Vec<ChangeRecord> = Vec::new();
    for id in 0..entities {
        first.push(created(
            id,
            &format!("unit-{id}"),
            props(&[("stamp", PropValue::Int(1))]),
        ));
    }
    b.push_tick(1, &first);

    for tick in 2..=ticks {
        let batch: Vec<ChangeRecord> = (0..entities)
            .map(|id| updated_int(id, "stamp", tick as i64))
            .collect();
        b.push_tick(tick, &batch);
    }
    b.finish()
}
