//! Engine-level error types.
//!
//! [`OpenError`] covers failures while opening a session log;
//! [`SessionError`] covers failures after open, all of which are fatal
//! to the remainder of the stream (no recovery past a corruption
//! point, no resynchronization heuristics).

use std::fmt;
use std::io;
use std::path::PathBuf;

use hindsight_codec::DecodeError;
use hindsight_core::{ApplyError, Tick};

/// Error opening a session log.
///
/// Open failures leave no partial session behind; the controller stays
/// in whatever state it was in before the attempt.
#[derive(Debug)]
pub enum OpenError {
    /// The log file could not be opened.
    Io {
        /// Path of the file that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The header failed to decode or validate.
    Header(DecodeError),
    /// The runner thread could not be spawned.
    WorkerSpawn {
        /// The underlying I/O error from `thread::Builder::spawn`.
        source: io::Error,
    },
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to open session log {}: {source}", path.display())
            }
            Self::Header(e) => write!(f, "invalid session log header: {e}"),
            Self::WorkerSpawn { source } => {
                write!(f, "failed to spawn runner thread: {source}")
            }
        }
    }
}

impl std::error::Error for OpenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } | Self::WorkerSpawn { source } => Some(source),
            Self::Header(e) => Some(e),
        }
    }
}

/// A session-fatal playback failure.
///
/// Both variants poison the remainder of the stream: `last_known_tick`
/// freezes at the last committed boundary, the runner transitions to
/// `Closed`, and the error is surfaced to the foreground exactly once
/// via `take_error`. Demanded ticks issued afterwards are clamped and
/// ignored rather than re-raising the failure.
#[derive(Debug)]
pub enum SessionError {
    /// The log stream failed to decode mid-session.
    Decode(DecodeError),
    /// A decoded record contradicts the reconstructed state.
    Consistency {
        /// Boundary tick of the batch being applied.
        tick: Tick,
        /// The contradiction the store detected.
        source: ApplyError,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "session log decode failure: {e}"),
            Self::Consistency { tick, source } => {
                write!(f, "state consistency failure in tick {tick}: {source}")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Consistency { source, .. } => Some(source),
        }
    }
}

impl From<DecodeError> for SessionError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}
