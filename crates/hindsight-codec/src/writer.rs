//! Session log recording writer.
//!
//! [`LogWriter`] streams change records to any `Write` sink, encoding
//! the binary log format. The header is written immediately on
//! construction, and the batch/boundary discipline a reader relies on
//! is enforced at write time: ticks start at 1, strictly increase, and
//! every batch is committed by its trailing boundary marker.

use std::io::Write;

use hindsight_core::record::ChangeRecord;
use hindsight_core::Tick;

use crate::codec::{encode_header, encode_record};
use crate::error::EncodeError;
use crate::types::LogHeader;

/// Writes a session log to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use hindsight_codec::{LogHeader, LogReader, LogWriter};
/// use hindsight_core::record::ChangeRecord;
/// use hindsight_core::{EntityId, PropList, Tick};
///
/// let header = LogHeader {
///     recorder: "demo".into(),
///     map: "dust_bowl".into(),
///     tick_rate: 60.0,
/// };
///
/// // Write two ticks to an in-memory buffer.
/// let mut buf = Vec::new();
/// let mut writer = LogWriter::new(&mut buf, &header).unwrap();
/// writer
///     .write_tick(
///         Tick(1),
///         &[ChangeRecord::Created {
///             id: EntityId(0),
///             name: "scout".into(),
///             props: PropList::new(),
///         }],
///     )
///     .unwrap();
/// writer.write_tick(Tick(2), &[]).unwrap();
/// assert_eq!(writer.records_written(), 3);
/// drop(writer);
///
/// // Read them back.
/// let mut reader = LogReader::open(buf.as_slice()).unwrap();
/// assert_eq!(reader.header(), &header);
/// let mut count = 0;
/// while reader.next_record().unwrap().is_some() {
///     count += 1;
/// }
/// assert_eq!(count, 3);
/// ```
pub struct LogWriter<W: Write> {
    writer: W,
    records_written: u64,
    // Highest boundary tick written so far; 0 while none has been.
    last_boundary: u64,
}

impl<W: Write> LogWriter<W> {
    /// Create a new log writer, immediately writing the header.
    pub fn new(mut writer: W, header: &LogHeader) -> Result<Self, EncodeError> {
        encode_header(&mut writer, header)?;
        Ok(Self {
            writer,
            records_written: 0,
            last_boundary: 0,
        })
    }

    /// Record one tick: the batch of changes followed by the boundary
    /// marker that commits them.
    ///
    /// The batch itself must not contain boundary records; passing one
    /// is rejected with [`EncodeError::MisplacedBoundary`] before
    /// anything is written.
    pub fn write_tick(&mut self, tick: Tick, records: &[ChangeRecord]) -> Result<(), EncodeError> {
        if records.iter().any(ChangeRecord::is_boundary) {
            return Err(EncodeError::MisplacedBoundary);
        }
        for record in records {
            self.write_record(record)?;
        }
        self.write_record(&ChangeRecord::Boundary { tick })
    }

    /// Write a single record, enforcing the boundary discipline.
    ///
    /// Most callers want [`Self::write_tick`]; this lower-level entry
    /// point exists for tooling that re-emits an already grouped
    /// stream.
    pub fn write_record(&mut self, record: &ChangeRecord) -> Result<(), EncodeError> {
        if let ChangeRecord::Boundary { tick } = record {
            if tick.0 == 0 {
                return Err(EncodeError::ReservedTickZero);
            }
            if tick.0 <= self.last_boundary {
                return Err(EncodeError::NonMonotonicTick {
                    tick: tick.0,
                    previous: self.last_boundary,
                });
            }
            self.last_boundary = tick.0;
        }
        encode_record(&mut self.writer, record)?;
        self.records_written += 1;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of records written so far (boundaries included).
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Highest boundary tick written so far, or `None` before the
    /// first tick is committed.
    pub fn last_tick(&self) -> Option<Tick> {
        (self.last_boundary > 0).then_some(Tick(self.last_boundary))
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
