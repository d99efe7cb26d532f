//! Typed property values carried by change records.

use indexmap::IndexMap;
use std::fmt;

/// A single typed property value.
///
/// Properties are the leaves of reconstructed entity state. The wire
/// format tags each value with its type, so a property may legally
/// change type between ticks (a recorder quirk some logs exhibit; the
/// store does not reject it).
///
/// `Composite` nests an ordered map of named sub-values, used by logs
/// that group related fields (for example a position with `x`/`y`/`z`
/// members). Nesting depth is bounded by the codec.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// UTF-8 string.
    Str(String),
    /// Ordered nested mapping of name to sub-value.
    Composite(IndexMap<String, PropValue>),
}

impl PropValue {
    /// Short name of the value's type tag, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            PropValue::Int(_) => "int",
            PropValue::Float(_) => "float",
            PropValue::Bool(_) => "bool",
            PropValue::Str(_) => "str",
            PropValue::Composite(_) => "composite",
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Str(v) => write!(f, "{v}"),
            PropValue::Composite(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Float(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Str(v)
    }
}
