//! Core runtime value type
//!
//! `Value` is the dynamically-typed value the expression library operates
//! on. It implements SQLite's coercion rules: every value can be viewed as
//! an integer, a float, text, or a blob, with lossy conversions defined for
//! each combination.

use std::fmt;

/// Column data types (SQLITE_INTEGER, SQLITE_FLOAT, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ColumnType {
    /// SQLITE_INTEGER = 1
    Integer = 1,
    /// SQLITE_FLOAT = 2
    Float = 2,
    /// SQLITE_TEXT = 3
    Text = 3,
    /// SQLITE_BLOB = 4
    Blob = 4,
    /// SQLITE_NULL = 5
    Null = 5,
}

/// Dynamic SQL value
///
/// The tagged union the expression library operates on. The mixed-type
/// sort order is NULL < numeric < text < blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Integer value (64-bit signed)
    Integer(i64),
    /// Real/float value (64-bit IEEE 754)
    Real(f64),
    /// Text value (UTF-8 string)
    Text(String),
    /// Binary large object
    Blob(Vec<u8>),
}

impl Value {
    /// Get the storage class of this value
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Null,
            Value::Integer(_) => ColumnType::Integer,
            Value::Real(_) => ColumnType::Float,
            Value::Text(_) => ColumnType::Text,
            Value::Blob(_) => ColumnType::Blob,
        }
    }

    /// Convert to i64 with SQLite coercion rules
    ///
    /// - NULL -> 0
    /// - Integer -> value
    /// - Real -> truncated toward zero
    /// - Text -> parsed as integer, else as float then truncated, else 0
    /// - Blob -> 0
    pub fn to_i64(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Integer(i) => *i,
            Value::Real(f) => *f as i64,
            Value::Text(s) => {
                let t = s.trim();
                t.parse::<i64>()
                    .unwrap_or_else(|_| t.parse::<f64>().map(|f| f as i64).unwrap_or(0))
            }
            Value::Blob(_) => 0,
        }
    }

    /// Convert to f64 with SQLite coercion rules
    pub fn to_f64(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Integer(i) => *i as f64,
            Value::Real(f) => *f,
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
            Value::Blob(_) => 0.0,
        }
    }

    /// Convert to text with SQLite coercion rules
    ///
    /// Floats render with a decimal point even for whole numbers (1.0, not
    /// 1) so they remain distinguishable from integers.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => format_real(*f),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Convert to bytes with SQLite coercion rules
    pub fn to_blob(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::Integer(i) => i.to_string().into_bytes(),
            Value::Real(f) => format_real(*f).into_bytes(),
            Value::Text(s) => s.as_bytes().to_vec(),
            Value::Blob(b) => b.clone(),
        }
    }

    /// Check if value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is Integer or Real
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }

    /// Get byte length of the value
    pub fn bytes(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Integer(_) => 8,
            Value::Real(_) => 8,
            Value::Text(s) => s.len(),
            Value::Blob(b) => b.len(),
        }
    }
}

/// Canonical text form of a float: append ".0" when neither a decimal
/// point nor an exponent appears in the default rendering.
pub fn format_real(f: f64) -> String {
    let s = f.to_string();
    if !s.contains('.') && !s.contains('e') && !s.contains('E') && !s.contains("inf") && !s.contains("NaN")
    {
        format!("{}.0", s)
    } else {
        s
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", format_real(*r)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "x'{}'", hex::encode(b)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
