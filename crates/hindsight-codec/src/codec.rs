//! Binary encode/decode for the session log format.
//!
//! All integers are little-endian. Strings are length-prefixed with a
//! `u32` length. The format is intentionally simple: no compression,
//! no alignment padding, no self-describing schema:
//!
//! ```text
//! file    := header record*
//! header  := magic("HNDS") version(u8) recorder(str) map(str) tick_rate(f32)
//! record  := tag(u8) body
//!   0 Boundary: tick(u64)
//!   1 Created:  id(u32) name(str) count(u32) prop*
//!   2 Updated:  id(u32) count(u32) prop*
//!   3 Deleted:  id(u32)
//! prop    := key(str) value
//! value   := vtag(u8) body
//!   0 Int: i64   1 Float: f64   2 Bool: u8   3 Str: str
//!   4 Composite: count(u32) prop*
//! ```
//!
//! Boundary discipline (ticks start at 1, strictly increase) is
//! enforced by [`LogReader`](crate::LogReader) and
//! [`LogWriter`](crate::LogWriter), not here: these functions are pure
//! wire-shape codecs.

use std::io::{Read, Write};

use hindsight_core::record::{ChangeRecord, PropList};
use hindsight_core::value::PropValue;
use hindsight_core::{EntityId, Tick};
use indexmap::IndexMap;

use crate::error::{DecodeError, EncodeError};
use crate::types::*;
use crate::{FORMAT_VERSION, MAGIC, MAX_VALUE_DEPTH};

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), EncodeError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), EncodeError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), EncodeError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i64.
pub fn write_i64_le(w: &mut dyn Write, v: i64) -> Result<(), EncodeError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f32.
pub fn write_f32_le(w: &mut dyn Write, v: f32) -> Result<(), EncodeError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), EncodeError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), EncodeError> {
    write_u32_le(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, DecodeError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, DecodeError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, DecodeError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i64.
pub fn read_i64_le(r: &mut dyn Read) -> Result<i64, DecodeError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Read a little-endian f32.
pub fn read_f32_le(r: &mut dyn Read) -> Result<f32, DecodeError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, DecodeError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string.
///
/// `at` is the byte offset of the enclosing record, used in error
/// reports when the bytes are not valid UTF-8.
pub fn read_length_prefixed_str(r: &mut dyn Read, at: u64) -> Result<String, DecodeError> {
    let len = read_u32_le(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| DecodeError::MalformedRecord {
        offset: at,
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the log header (magic, version, recorder, map, tick rate).
///
/// Rejects a non-finite or non-positive tick rate before writing
/// anything, so a failed call leaves the sink untouched.
pub fn encode_header(w: &mut dyn Write, header: &LogHeader) -> Result<(), EncodeError> {
    if !header.tick_rate.is_finite() || header.tick_rate <= 0.0 {
        return Err(EncodeError::InvalidTickRate {
            rate: header.tick_rate,
        });
    }

    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_length_prefixed_str(w, &header.recorder)?;
    write_length_prefixed_str(w, &header.map)?;
    write_f32_le(w, header.tick_rate)?;
    Ok(())
}

/// Decode and validate the log header.
pub fn decode_header(r: &mut dyn Read) -> Result<LogHeader, DecodeError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(DecodeError::InvalidMagic);
    }

    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }

    let recorder = read_length_prefixed_str(r, 0)?;
    let map = read_length_prefixed_str(r, 0)?;
    let tick_rate = read_f32_le(r)?;
    if !tick_rate.is_finite() || tick_rate <= 0.0 {
        return Err(DecodeError::InvalidHeader {
            detail: format!("tick rate {tick_rate} is not a finite positive number"),
        });
    }

    Ok(LogHeader {
        recorder,
        map,
        tick_rate,
    })
}

// ── Value encode/decode ─────────────────────────────────────────

/// Serialize a property value; `depth` tracks composite nesting.
fn encode_value(w: &mut dyn Write, value: &PropValue, depth: u8) -> Result<(), EncodeError> {
    match value {
        PropValue::Int(v) => {
            write_u8(w, VALUE_INT)?;
            write_i64_le(w, *v)?;
        }
        PropValue::Float(v) => {
            write_u8(w, VALUE_FLOAT)?;
            write_f64_le(w, *v)?;
        }
        PropValue::Bool(v) => {
            write_u8(w, VALUE_BOOL)?;
            write_u8(w, u8::from(*v))?;
        }
        PropValue::Str(v) => {
            write_u8(w, VALUE_STR)?;
            write_length_prefixed_str(w, v)?;
        }
        PropValue::Composite(map) => {
            if depth >= MAX_VALUE_DEPTH {
                return Err(EncodeError::DepthExceeded);
            }
            write_u8(w, VALUE_COMPOSITE)?;
            write_u32_le(w, map.len() as u32)?;
            for (key, sub) in map {
                write_length_prefixed_str(w, key)?;
                encode_value(w, sub, depth + 1)?;
            }
        }
    }
    Ok(())
}

/// Deserialize a property value; `at` is the enclosing record's offset.
fn decode_value(r: &mut dyn Read, at: u64, depth: u8) -> Result<PropValue, DecodeError> {
    let tag = read_u8(r)?;
    match tag {
        VALUE_INT => Ok(PropValue::Int(read_i64_le(r)?)),
        VALUE_FLOAT => Ok(PropValue::Float(read_f64_le(r)?)),
        VALUE_BOOL => match read_u8(r)? {
            0 => Ok(PropValue::Bool(false)),
            1 => Ok(PropValue::Bool(true)),
            flag => Err(DecodeError::MalformedRecord {
                offset: at,
                detail: format!("invalid bool encoding: {flag}"),
            }),
        },
        VALUE_STR => Ok(PropValue::Str(read_length_prefixed_str(r, at)?)),
        VALUE_COMPOSITE => {
            if depth >= MAX_VALUE_DEPTH {
                return Err(DecodeError::MalformedRecord {
                    offset: at,
                    detail: format!("composite value nests deeper than {MAX_VALUE_DEPTH} levels"),
                });
            }
            let count = read_u32_le(r)? as usize;
            let mut map = IndexMap::with_capacity(count);
            for _ in 0..count {
                let key = read_length_prefixed_str(r, at)?;
                let sub = decode_value(r, at, depth + 1)?;
                map.insert(key, sub);
            }
            Ok(PropValue::Composite(map))
        }
        tag => Err(DecodeError::UnknownValueTag { offset: at, tag }),
    }
}

fn encode_props(w: &mut dyn Write, props: &PropList) -> Result<(), EncodeError> {
    write_u32_le(w, props.len() as u32)?;
    for (key, value) in props {
        write_length_prefixed_str(w, key)?;
        encode_value(w, value, 0)?;
    }
    Ok(())
}

fn decode_props(r: &mut dyn Read, at: u64) -> Result<PropList, DecodeError> {
    let count = read_u32_le(r)? as usize;
    let mut props = PropList::with_capacity(count);
    for _ in 0..count {
        let key = read_length_prefixed_str(r, at)?;
        let value = decode_value(r, at, 0)?;
        props.push((key, value));
    }
    Ok(props)
}

// ── Record encode/decode ────────────────────────────────────────

/// Encode a single change record.
pub fn encode_record(w: &mut dyn Write, record: &ChangeRecord) -> Result<(), EncodeError> {
    match record {
        ChangeRecord::Boundary { tick } => {
            write_u8(w, RECORD_BOUNDARY)?;
            write_u64_le(w, tick.0)?;
        }
        ChangeRecord::Created { id, name, props } => {
            write_u8(w, RECORD_CREATED)?;
            write_u32_le(w, id.0)?;
            write_length_prefixed_str(w, name)?;
            encode_props(w, props)?;
        }
        ChangeRecord::Updated { id, props } => {
            write_u8(w, RECORD_UPDATED)?;
            write_u32_le(w, id.0)?;
            encode_props(w, props)?;
        }
        ChangeRecord::Deleted { id } => {
            write_u8(w, RECORD_DELETED)?;
            write_u32_le(w, id.0)?;
        }
    }
    Ok(())
}

/// Decode a single change record.
///
/// `at` is the byte offset of the record's first byte in the stream,
/// carried into any error this record produces. Returns `Ok(None)` on
/// clean EOF (zero bytes available at a record start), `Ok(Some(_))` on
/// success. Truncation after the tag surfaces as an
/// `UnexpectedEof` I/O error; [`LogReader`](crate::LogReader) rewrites
/// that into a [`DecodeError::MalformedRecord`] with this offset.
pub fn decode_record(r: &mut dyn Read, at: u64) -> Result<Option<ChangeRecord>, DecodeError> {
    // Read the tag with a raw read() so zero-bytes-available (clean
    // EOF between records) is distinguishable from truncation inside
    // a record body.
    let mut tag_buf = [0u8; 1];
    let tag = loop {
        match r.read(&mut tag_buf) {
            Ok(0) => return Ok(None),
            Ok(_) => break tag_buf[0],
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DecodeError::Io(e)),
        }
    };

    let record = match tag {
        RECORD_BOUNDARY => ChangeRecord::Boundary {
            tick: Tick(read_u64_le(r)?),
        },
        RECORD_CREATED => {
            let id = EntityId(read_u32_le(r)?);
            let name = read_length_prefixed_str(r, at)?;
            let props = decode_props(r, at)?;
            ChangeRecord::Created { id, name, props }
        }
        RECORD_UPDATED => {
            let id = EntityId(read_u32_le(r)?);
            let props = decode_props(r, at)?;
            ChangeRecord::Updated { id, props }
        }
        RECORD_DELETED => ChangeRecord::Deleted {
            id: EntityId(read_u32_le(r)?),
        },
        tag => return Err(DecodeError::UnknownRecordTag { offset: at, tag }),
    };

    Ok(Some(record))
}
