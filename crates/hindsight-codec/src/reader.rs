//! Session log playback reader.
//!
//! [`LogReader`] reads change records from any `Read` source, decoding
//! the binary log format lazily: one record per call, nothing buffered
//! ahead. The header is validated on construction. Sources that also
//! implement `Seek` can rewind to a previously observed record offset,
//! which is how checkpoint restoration re-enters the stream.

use std::io::{Read, Seek, SeekFrom};

use hindsight_core::record::ChangeRecord;
use hindsight_core::Tick;

use crate::codec::{decode_header, decode_record};
use crate::error::DecodeError;
use crate::types::LogHeader;

/// A `Read` adapter that tracks the absolute byte offset of the
/// underlying stream.
///
/// Record offsets reported in errors and recorded by checkpoints are
/// derived from this counter, so it must see every byte the decoder
/// consumes.
pub struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R> CountingReader<R> {
    /// Wrap a reader, starting the offset counter at zero.
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Absolute byte offset of the next read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Consume the adapter and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> CountingReader<R> {
    /// Seek the underlying stream to an absolute offset and reset the
    /// counter to match.
    pub fn seek_to(&mut self, offset: u64) -> std::io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }
}

/// Reads a session log from a byte stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`. Beyond pure decoding, the reader
/// enforces the stream-level frame rules: boundary ticks start at 1
/// and strictly increase, and a record cut off by end of stream is an
/// error rather than a clean finish.
pub struct LogReader<R: Read> {
    reader: CountingReader<R>,
    header: LogHeader,
    data_start: u64,
    records_read: u64,
    // Highest boundary tick decoded so far; 0 while none has been.
    last_boundary: u64,
}

impl<R: Read> LogReader<R> {
    /// Open a log stream, reading and validating the header.
    pub fn open(reader: R) -> Result<Self, DecodeError> {
        let mut reader = CountingReader::new(reader);
        let header = decode_header(&mut reader)?;
        let data_start = reader.position();
        Ok(Self {
            reader,
            header,
            data_start,
            records_read: 0,
            last_boundary: 0,
        })
    }

    /// Header metadata from the front of the log.
    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// Byte offset of the first record (immediately after the header).
    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    /// Byte offset of the next record to be decoded.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// Read the next record, or `None` if the stream is cleanly
    /// exhausted.
    ///
    /// Errors carry the byte offset of the record that produced them.
    /// After an error the stream position is unspecified; callers must
    /// not continue decoding without a rewind.
    pub fn next_record(&mut self) -> Result<Option<ChangeRecord>, DecodeError> {
        let at = self.reader.position();
        let record = match decode_record(&mut self.reader, at) {
            Ok(record) => record,
            Err(DecodeError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(DecodeError::MalformedRecord {
                    offset: at,
                    detail: "record truncated by end of stream".to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        if let Some(ChangeRecord::Boundary { tick }) = &record {
            if tick.0 == 0 {
                return Err(DecodeError::MalformedRecord {
                    offset: at,
                    detail: "tick 0 is reserved for the empty pre-roll state".to_string(),
                });
            }
            if tick.0 <= self.last_boundary {
                return Err(DecodeError::NonMonotonicTick {
                    offset: at,
                    tick: tick.0,
                    previous: self.last_boundary,
                });
            }
            self.last_boundary = tick.0;
        }

        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    /// Number of records read so far (across rewinds).
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Convert into a record iterator.
    pub fn records(self) -> RecordIter<R> {
        RecordIter {
            reader: self,
            done: false,
        }
    }
}

impl<R: Read + Seek> LogReader<R> {
    /// Rewind to a record offset captured by an earlier read.
    ///
    /// `after_tick` is the tick whose state the caller has restored
    /// for that offset; boundaries decoded after the rewind must
    /// increase over it. Offsets must come from [`Self::position`] (or
    /// [`Self::data_start`] with `after_tick` 0), so the stream always
    /// resumes at a record start.
    pub fn rewind_to(&mut self, offset: u64, after_tick: Tick) -> Result<(), DecodeError> {
        self.reader.seek_to(offset)?;
        self.last_boundary = after_tick.0;
        Ok(())
    }
}

/// Iterator adapter over change records.
///
/// Fused: after the first error or clean EOF it yields `None` forever.
pub struct RecordIter<R: Read> {
    reader: LogReader<R>,
    done: bool,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<ChangeRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_record;
    use crate::writer::LogWriter;
    use hindsight_core::record::PropList;
    use hindsight_core::{EntityId, PropValue};
    use std::io::Cursor;

    fn test_header() -> LogHeader {
        LogHeader {
            recorder: "test".into(),
            map: "test".into(),
            tick_rate: 60.0,
        }
    }

    fn created(id: u32, name: &str) -> ChangeRecord {
        ChangeRecord::Created {
            id: EntityId(id),
            name: name.to_string(),
            props: PropList::new(),
        }
    }

    fn updated(id: u32, key: &str, value: i64) -> ChangeRecord {
        let mut props = PropList::new();
        props.push((key.to_string(), PropValue::Int(value)));
        ChangeRecord::Updated {
            id: EntityId(id),
            props,
        }
    }

    fn boundary(tick: u64) -> ChangeRecord {
        ChangeRecord::Boundary { tick: Tick(tick) }
    }

    /// Encode a header plus the given records, bypassing the writer's
    /// own ordering checks.
    fn raw_log(records: &[ChangeRecord]) -> Vec<u8> {
        let mut buf = Vec::new();
        crate::codec::encode_header(&mut buf, &test_header()).unwrap();
        for record in records {
            encode_record(&mut buf, record).unwrap();
        }
        buf
    }

    #[test]
    fn roundtrip_write_read_records() {
        let mut buf = Vec::new();
        {
            let mut writer = LogWriter::new(&mut buf, &test_header()).unwrap();
            writer
                .write_tick(Tick(1), &[created(0, "scout"), created(1, "heavy")])
                .unwrap();
            writer.write_tick(Tick(2), &[updated(0, "hp", 125)]).unwrap();
            assert_eq!(writer.records_written(), 5);
        }

        let mut reader = LogReader::open(buf.as_slice()).unwrap();
        assert_eq!(reader.header(), &test_header());

        let mut records = Vec::new();
        while let Some(record) = reader.next_record().unwrap() {
            records.push(record);
        }
        assert_eq!(records.len(), 5);
        assert_eq!(records[2], boundary(1));
        assert_eq!(records[4], boundary(2));
        assert_eq!(reader.records_read(), 5);
    }

    #[test]
    fn record_iterator_works() {
        let buf = raw_log(&[created(0, "a"), boundary(1), updated(0, "hp", 1), boundary(2)]);
        let reader = LogReader::open(buf.as_slice()).unwrap();
        let records: Vec<_> = reader.records().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[1], boundary(1));
    }

    #[test]
    fn bad_magic_on_open() {
        let data = b"XNDS\x01rest of data";
        assert!(matches!(
            LogReader::open(data.as_slice()),
            Err(DecodeError::InvalidMagic)
        ));
    }

    #[test]
    fn truncated_record_is_malformed_with_offset() {
        let buf = raw_log(&[created(0, "engineer"), boundary(1)]);
        let full = LogReader::open(buf.as_slice()).unwrap();
        let record_start = full.position();

        // Cut inside the first record body.
        let cut = buf.len() - 12;
        let mut reader = LogReader::open(&buf[..cut]).unwrap();
        match reader.next_record() {
            Err(DecodeError::MalformedRecord { offset, detail }) => {
                assert_eq!(offset, record_start);
                assert!(detail.contains("truncated"), "detail: {detail}");
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn boundary_regression_detected() {
        let buf = raw_log(&[boundary(5), boundary(5)]);
        let mut reader = LogReader::open(buf.as_slice()).unwrap();
        assert_eq!(reader.next_record().unwrap(), Some(boundary(5)));
        assert!(matches!(
            reader.next_record(),
            Err(DecodeError::NonMonotonicTick {
                tick: 5,
                previous: 5,
                ..
            })
        ));
    }

    #[test]
    fn sparse_boundaries_are_fine() {
        let buf = raw_log(&[boundary(1), boundary(7), boundary(500)]);
        let reader = LogReader::open(buf.as_slice()).unwrap();
        let records: Vec<_> = reader.records().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn tick_zero_boundary_rejected() {
        let buf = raw_log(&[boundary(0)]);
        let mut reader = LogReader::open(buf.as_slice()).unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(DecodeError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn rewind_replays_from_offset() {
        let buf = raw_log(&[
            created(0, "a"),
            boundary(1),
            updated(0, "hp", 10),
            boundary(2),
        ]);
        let mut reader = LogReader::open(Cursor::new(buf)).unwrap();

        // Read through the first batch and note where the second starts.
        assert_eq!(reader.next_record().unwrap(), Some(created(0, "a")));
        assert_eq!(reader.next_record().unwrap(), Some(boundary(1)));
        let resume = reader.position();
        assert_eq!(reader.next_record().unwrap(), Some(updated(0, "hp", 10)));
        assert_eq!(reader.next_record().unwrap(), Some(boundary(2)));
        assert_eq!(reader.next_record().unwrap(), None);

        // Rewind to the second batch and read it again. The boundary
        // monotonicity window restarts from the restored tick.
        reader.rewind_to(resume, Tick(1)).unwrap();
        assert_eq!(reader.next_record().unwrap(), Some(updated(0, "hp", 10)));
        assert_eq!(reader.next_record().unwrap(), Some(boundary(2)));
        assert_eq!(reader.next_record().unwrap(), None);
        assert_eq!(reader.records_read(), 6);
    }

    #[test]
    fn rewind_to_data_start_replays_everything() {
        let buf = raw_log(&[created(0, "a"), boundary(1)]);
        let mut reader = LogReader::open(Cursor::new(buf)).unwrap();
        let start = reader.data_start();
        let first: Vec<_> = std::iter::from_fn(|| reader.next_record().transpose())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        reader.rewind_to(start, Tick(0)).unwrap();
        let second: Vec<_> = std::iter::from_fn(|| reader.next_record().transpose())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(first, second);
    }
}
