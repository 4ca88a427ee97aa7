//! Typed query result rows
//!
//! Backends hand rows over as column name → `Scalar`. Numeric columns may
//! come back as integers or floats depending on how the point was written;
//! the accessors normalize both and return `None` for anything else, so a
//! caller can drop the row instead of failing the query.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A single typed value in a result row
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Float(f64),
    Integer(i64),
    UInteger(u64),
    Boolean(bool),
    String(String),
    Time(DateTime<Utc>),
}

impl Scalar {
    /// Numeric value, accepting either integer or floating-point representation
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(*v),
            Scalar::Integer(v) => Some(*v as f64),
            Scalar::UInteger(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer value; floats are truncated toward zero
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(v) => Some(*v),
            Scalar::UInteger(v) => i64::try_from(*v).ok(),
            Scalar::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Instant value; timestamp strings are parsed as UTC
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Scalar::Time(t) => Some(*t),
            Scalar::String(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Convert a JSON value; `null` and nested values have no scalar form
    pub fn from_json(value: Value) -> Option<Scalar> {
        match value {
            Value::Bool(b) => Some(Scalar::Boolean(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Scalar::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Scalar::UInteger(u))
                } else {
                    n.as_f64().map(Scalar::Float)
                }
            }
            Value::String(s) => Some(Scalar::String(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Parse a backend timestamp
///
/// Accepts RFC 3339 with an offset, or a bare `YYYY-MM-DDTHH:MM:SS[.f]`
/// which InfluxDB uses for UTC `time` columns.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// A single result row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: HashMap<String, Scalar>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set a column
    pub fn with(mut self, column: impl Into<String>, value: Scalar) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Scalar) {
        self.columns.insert(column.into(), value);
    }

    /// Build a row from a decoded JSON object, skipping null columns
    pub fn from_json(object: Map<String, Value>) -> Self {
        let columns = object
            .into_iter()
            .filter_map(|(k, v)| Scalar::from_json(v).map(|s| (k, s)))
            .collect();
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns.get(column)
    }

    pub fn f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Scalar::as_f64)
    }

    pub fn i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Scalar::as_i64)
    }

    pub fn str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Scalar::as_str)
    }

    pub fn time(&self, column: &str) -> Option<DateTime<Utc>> {
        self.get(column).and_then(Scalar::as_time)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
