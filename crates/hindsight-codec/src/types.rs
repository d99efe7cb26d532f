//! Wire-level types and record tag constants.

/// Session log header.
///
/// Written once at the start of a log, decoded and validated on open.
/// The tick rate is the recording cadence in ticks per wall-clock
/// second; the engine uses it to pace real-time playback.
///
/// # Examples
///
/// ```
/// use hindsight_codec::LogHeader;
///
/// let header = LogHeader {
///     recorder: "srcds 9432".to_string(),
///     map: "kings_row".to_string(),
///     tick_rate: 30.0,
/// };
/// assert!(header.tick_rate > 0.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LogHeader {
    /// Identifies the recording application or server build.
    pub recorder: String,
    /// Name of the map or arena the session was played on.
    pub map: String,
    /// Recording cadence in ticks per second. Finite and positive.
    pub tick_rate: f32,
}

// ── Record tags ─────────────────────────────────────────────────

/// Tag for a tick boundary (commit marker) record.
pub const RECORD_BOUNDARY: u8 = 0;
/// Tag for an entity creation record.
pub const RECORD_CREATED: u8 = 1;
/// Tag for an entity update record.
pub const RECORD_UPDATED: u8 = 2;
/// Tag for an entity deletion record.
pub const RECORD_DELETED: u8 = 3;

// ── Value tags ──────────────────────────────────────────────────

/// Tag for a signed 64-bit integer value.
pub const VALUE_INT: u8 = 0;
/// Tag for a 64-bit float value.
pub const VALUE_FLOAT: u8 = 1;
/// Tag for a boolean value (encoded as 0 or 1).
pub const VALUE_BOOL: u8 = 2;
/// Tag for a length-prefixed UTF-8 string value.
pub const VALUE_STR: u8 = 3;
/// Tag for a composite (nested ordered mapping) value.
pub const VALUE_COMPOSITE: u8 = 4;
