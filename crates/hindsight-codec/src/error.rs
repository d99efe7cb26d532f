//! Error types for the log codec.

use std::fmt;
use std::io;

/// Errors raised while decoding a session log.
///
/// Everything that can go wrong mid-stream carries the byte offset of
/// the record that failed, so a caller can report where a file went
/// bad. Decode errors are not recoverable: the stream past the failure
/// point is invalid for the rest of the session.
#[derive(Debug)]
pub enum DecodeError {
    /// An I/O error occurred during read.
    Io(io::Error),
    /// The file does not start with the expected `b"HNDS"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u8,
    },
    /// The header decoded but carries invalid values.
    InvalidHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A record could not be decoded (truncated or corrupt data).
    MalformedRecord {
        /// Byte offset of the start of the failing record.
        offset: u64,
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A record type tag is not recognized.
    UnknownRecordTag {
        /// Byte offset of the start of the failing record.
        offset: u64,
        /// The unrecognized tag.
        tag: u8,
    },
    /// A property value type tag is not recognized.
    UnknownValueTag {
        /// Byte offset of the start of the record containing the value.
        offset: u64,
        /// The unrecognized tag.
        tag: u8,
    },
    /// A tick boundary does not increase over its predecessor.
    NonMonotonicTick {
        /// Byte offset of the start of the boundary record.
        offset: u64,
        /// The decoded boundary tick.
        tick: u64,
        /// The previous boundary tick.
        previous: u64,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"HNDS\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::InvalidHeader { detail } => write!(f, "invalid header: {detail}"),
            Self::MalformedRecord { offset, detail } => {
                write!(f, "malformed record at offset {offset}: {detail}")
            }
            Self::UnknownRecordTag { offset, tag } => {
                write!(f, "unknown record tag {tag} at offset {offset}")
            }
            Self::UnknownValueTag { offset, tag } => {
                write!(f, "unknown value tag {tag} in record at offset {offset}")
            }
            Self::NonMonotonicTick {
                offset,
                tick,
                previous,
            } => {
                write!(
                    f,
                    "tick boundary {tick} at offset {offset} does not increase \
                     over previous boundary {previous}"
                )
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors raised while writing a session log.
#[derive(Debug)]
pub enum EncodeError {
    /// An I/O error occurred during write.
    Io(io::Error),
    /// The header's tick rate is not a finite positive number.
    InvalidTickRate {
        /// The rejected rate.
        rate: f32,
    },
    /// Tick 0 is reserved for the empty pre-session state and cannot be
    /// recorded as a boundary.
    ReservedTickZero,
    /// A tick boundary does not increase over the previously written
    /// boundary.
    NonMonotonicTick {
        /// The rejected boundary tick.
        tick: u64,
        /// The previously written boundary tick.
        previous: u64,
    },
    /// A boundary record appeared inside a batch that is committed
    /// separately.
    MisplacedBoundary,
    /// A composite value nests deeper than the format allows.
    DepthExceeded,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidTickRate { rate } => {
                write!(f, "tick rate {rate} is not a finite positive number")
            }
            Self::ReservedTickZero => {
                write!(f, "tick 0 is reserved and cannot be written as a boundary")
            }
            Self::NonMonotonicTick { tick, previous } => {
                write!(
                    f,
                    "tick boundary {tick} does not increase over previous boundary {previous}"
                )
            }
            Self::MisplacedBoundary => {
                write!(f, "batch records must not contain boundary markers")
            }
            Self::DepthExceeded => {
                write!(f, "composite value nests deeper than the format allows")
            }
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EncodeError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
