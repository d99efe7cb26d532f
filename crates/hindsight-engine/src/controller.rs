//! Foreground session facade.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use hindsight_codec::LogReader;
use hindsight_core::Tick;

use crate::config::{ConfigError, EngineConfig};
use crate::error::{OpenError, SessionError};
use crate::publish::{RunnerState, SharedState};
use crate::runner::{ControlMsg, Runner};
use crate::stats::{SessionStats, StatsSnapshot};
use crate::timeline::Timeline;
use crate::view::LiveEntityView;

/// One open session and its runner thread.
struct Session {
    tx: Sender<ControlMsg>,
    handle: JoinHandle<()>,
    shared: Arc<SharedState>,
    stats: Arc<SessionStats>,
}

/// Owns replay sessions and forwards intent to their runner threads.
///
/// All methods return immediately. Mutating calls send a message to
/// the runner; reading calls observe the runner's last publication.
/// The runner applies demands latest-wins, so scrubbing a slider and
/// flooding the controller with demanded ticks materializes the most
/// recent one rather than every intermediate.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use std::time::Duration;
/// use hindsight_engine::{EngineConfig, ReplayController};
/// use hindsight_test_utils::lifecycle_log;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut controller = ReplayController::new(EngineConfig::default())?;
/// let mut view = controller.open_source(Cursor::new(lifecycle_log()))?;
///
/// controller.set_demanded_tick(6);
/// for _ in 0..1000 {
///     if controller.current_tick().0 == 6 {
///         break;
///     }
///     std::thread::sleep(Duration::from_millis(1));
/// }
/// assert_eq!(controller.current_tick().0, 6);
///
/// view.refresh();
/// assert_eq!(view.tick().0, 6);
/// assert_eq!(view.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct ReplayController {
    config: EngineConfig,
    session: Option<Session>,
}

impl ReplayController {
    /// Create a controller with the given configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            session: None,
        })
    }

    /// Open a session log file and start its runner thread.
    ///
    /// Any previously open session is halted first. The returned view
    /// starts at tick 0, the empty pre-roll state.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<LiveEntityView, OpenError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| OpenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "opening session log");
        self.open_source(BufReader::new(file))
    }

    /// Open a session from any seekable byte source.
    pub fn open_source<R>(&mut self, source: R) -> Result<LiveEntityView, OpenError>
    where
        R: Read + Seek + Send + 'static,
    {
        self.halt_if_running();

        let reader = LogReader::open(source).map_err(OpenError::Header)?;
        let header = reader.header().clone();

        let hz = self
            .config
            .playback_hz
            .unwrap_or(f64::from(header.tick_rate));
        let cadence = Duration::from_secs_f64(1.0 / hz);

        let stats = Arc::new(SessionStats::default());
        let shared = Arc::new(SharedState::new());
        let timeline = Timeline::new(reader, &self.config, Arc::clone(&stats));

        let (tx, rx) = crossbeam_channel::unbounded();
        let runner = Runner::new(timeline, Arc::clone(&shared), rx, cadence);
        let handle = thread::Builder::new()
            .name("hindsight-runner".into())
            .spawn(move || runner.run())
            .map_err(|source| OpenError::WorkerSpawn { source })?;

        tracing::info!(
            recorder = %header.recorder,
            map = %header.map,
            tick_rate = header.tick_rate,
            "session started"
        );

        self.session = Some(Session {
            tx,
            handle,
            shared: Arc::clone(&shared),
            stats,
        });
        Ok(LiveEntityView::new(shared))
    }

    /// Demand the state at `tick`. Negative values clamp to the
    /// start; values beyond the end clamp to the final tick once the
    /// log's length is known. Latest demand wins.
    pub fn set_demanded_tick(&self, tick: i64) {
        if let Some(session) = &self.session {
            let target = Tick(tick.max(0) as u64);
            // Send failure means the runner is gone; reads will show
            // the session closed.
            let _ = session.tx.send(ControlMsg::Seek(target));
        }
    }

    /// Start or pause playback.
    pub fn set_playing(&self, playing: bool) {
        if let Some(session) = &self.session {
            let _ = session.tx.send(ControlMsg::SetPlaying(playing));
        }
    }

    /// Halt the current session, if any, and join its runner thread.
    /// Idempotent.
    pub fn halt_if_running(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.tx.send(ControlMsg::Shutdown);
            let _ = session.handle.join();
            tracing::info!("session halted");
        }
    }

    /// Alias for [`halt_if_running`](Self::halt_if_running).
    pub fn close(&mut self) {
        self.halt_if_running();
    }

    /// Tick of the most recently published state; 0 with no session.
    pub fn current_tick(&self) -> Tick {
        self.session
            .as_ref()
            .map_or(Tick(0), |s| s.shared.current_tick())
    }

    /// Highest tick observed so far; the log's final tick once the
    /// end has been reached.
    pub fn last_known_tick(&self) -> Tick {
        self.session
            .as_ref()
            .map_or(Tick(0), |s| s.shared.last_known_tick())
    }

    /// Whether playback is on.
    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.shared.is_playing())
    }

    /// Whether a demanded tick is still being materialized.
    pub fn is_seeking(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.shared.is_seeking())
    }

    /// Lifecycle state of the session.
    pub fn state(&self) -> RunnerState {
        self.session
            .as_ref()
            .map_or(RunnerState::Idle, |s| s.shared.state())
    }

    /// Take the session's terminal error, if one occurred. Each error
    /// is surfaced at most once; later calls return `None`.
    pub fn take_error(&self) -> Option<SessionError> {
        self.session.as_ref().and_then(|s| s.shared.take_error())
    }

    /// Counters for the current session.
    pub fn stats(&self) -> StatsSnapshot {
        self.session
            .as_ref()
            .map_or_else(StatsSnapshot::default, |s| s.stats.snapshot())
    }

    /// Another view over the current session, if one is open.
    pub fn view(&self) -> Option<LiveEntityView> {
        self.session
            .as_ref()
            .map(|s| LiveEntityView::new(Arc::clone(&s.shared)))
    }
}

impl Default for ReplayController {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            session: None,
        }
    }
}

impl Drop for ReplayController {
    fn drop(&mut self) {
        self.halt_if_running();
    }
}
