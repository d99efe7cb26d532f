//! Binary log format for the Hindsight replay inspection engine.
//!
//! A session log is a header followed by a forward-only stream of
//! delta-encoded change records, grouped into per-tick batches by
//! trailing boundary markers. This crate owns the wire format: the
//! record codec, the offset-tracking [`LogReader`], and the
//! [`LogWriter`] used by recorders and test fixtures.
//!
//! All I/O uses a hand-rolled little-endian codec (no serde
//! dependency). Decoding is restartable at record boundaries, which is
//! what lets the engine resume from a checkpoint's stream offset
//! instead of replaying a file from the start.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::{DecodeError, EncodeError};
pub use reader::{CountingReader, LogReader, RecordIter};
pub use types::LogHeader;
pub use writer::LogWriter;

/// Magic bytes at the start of every Hindsight session log.
pub const MAGIC: [u8; 4] = *b"HNDS";

/// Current log format version.
///
/// Version history:
/// - v1: initial format. Header (recorder, map, tick rate) followed by
///   a flat record stream with trailing per-tick boundary markers.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum nesting depth of composite property values.
///
/// The value codec recurses; the cap keeps corrupt or hostile input
/// from exhausting the stack. Real logs nest two or three levels deep.
pub const MAX_VALUE_DEPTH: u8 = 16;
