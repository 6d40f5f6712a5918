//! The tagged scalar cell held by nodes and attributes.

use std::fmt;
use thiserror::Error;

/// The tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Absent,
    Bool,
    Int,
    Float,
    Str,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Absent => "absent",
            Kind::Bool => "boolean",
            Kind::Int => "integer",
            Kind::Float => "float",
            Kind::Str => "string",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a present value cannot be coerced to the requested
/// type. Absence is only an error when no default was supplied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("cannot read {found} value as {requested}")]
    Mismatch { requested: Kind, found: Kind },
    #[error("cannot parse {text:?} as {requested}")]
    BadParse { requested: Kind, text: String },
    #[error("value is absent (no {requested} present and no default supplied)")]
    Absent { requested: Kind },
}

/// A tagged scalar: absent, boolean, 64-bit integer, double-precision
/// float, or string.
///
/// Coercion is on demand: the stored tag never changes, each `as_*`
/// accessor converts a copy. Heterogeneous values are legal siblings
/// anywhere in a tree.
///
/// # Example
///
/// ```
/// use keytree::Value;
///
/// assert_eq!(Value::from(42).as_str().unwrap(), "42");
/// assert!(Value::from("abc").as_int().is_err());
/// assert_eq!(Value::Absent.or(7).as_int().unwrap(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Absent => Kind::Absent,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Substitute `default` for an absent cell. Present values pass
    /// through unchanged; this never fails.
    pub fn or(&self, default: impl Into<Value>) -> Value {
        match self {
            Value::Absent => default.into(),
            present => present.clone(),
        }
    }

    /// Coerce to a boolean. Strings `"true"` and `"false"` convert;
    /// numbers do not.
    pub fn as_bool(&self) -> Result<bool, TypeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Str(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(TypeError::BadParse {
                    requested: Kind::Bool,
                    text: s.clone(),
                }),
            },
            Value::Absent => Err(TypeError::Absent {
                requested: Kind::Bool,
            }),
            other => Err(TypeError::Mismatch {
                requested: Kind::Bool,
                found: other.kind(),
            }),
        }
    }

    /// Coerce to an integer. Floats truncate toward zero; strings parse.
    pub fn as_int(&self) -> Result<i64, TypeError> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(f) => Ok(*f as i64),
            Value::Str(s) => s.trim().parse().map_err(|_| TypeError::BadParse {
                requested: Kind::Int,
                text: s.clone(),
            }),
            Value::Absent => Err(TypeError::Absent {
                requested: Kind::Int,
            }),
            other => Err(TypeError::Mismatch {
                requested: Kind::Int,
                found: other.kind(),
            }),
        }
    }

    /// Coerce to a float. Integers widen; strings parse.
    pub fn as_float(&self) -> Result<f64, TypeError> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            Value::Str(s) => s.trim().parse().map_err(|_| TypeError::BadParse {
                requested: Kind::Float,
                text: s.clone(),
            }),
            Value::Absent => Err(TypeError::Absent {
                requested: Kind::Float,
            }),
            other => Err(TypeError::Mismatch {
                requested: Kind::Float,
                found: other.kind(),
            }),
        }
    }

    /// Coerce to a string. Every present value has literal text.
    pub fn as_str(&self) -> Result<String, TypeError> {
        match self {
            Value::Str(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(f) => Ok(format_float(*f)),
            Value::Absent => Err(TypeError::Absent {
                requested: Kind::Str,
            }),
        }
    }

    /// Generic coercion through [`FromValue`].
    pub fn to<T: FromValue>(&self) -> Result<T, TypeError> {
        T::from_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Format a float so it always re-reads as a float: a decimal point or
/// exponent is guaranteed for finite values.
pub(crate) fn format_float(f: f64) -> String {
    let text = format!("{f}");
    if f.is_finite() && !text.contains('.') && !text.contains('e') && !text.contains('E') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Conversion out of a [`Value`], used by the generic accessor and the
/// built-in registry decoders.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, TypeError>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_int()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_float()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        value.as_str()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
