//! Write-side data model
//!
//! A `Metric` is one point as submitted by a client: a measurement name,
//! string tags, typed fields and an optional timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A typed field value
///
/// The variant is fixed by the runtime type of the value: JSON `7` is an
/// integer, `7.0` and `3.14` are floats. Variant order matters for
/// untagged deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// A single point to ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Measurement name, e.g. "heart_rate"
    pub measurement: String,
    /// Dimensions used for filtering and grouping
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Measured values
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
    /// When absent the backend stamps the point at write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Metric {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: HashMap::new(),
            fields: HashMap::new(),
            timestamp: None,
        }
    }

    /// Builder method: add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Builder method: add a field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder method: set timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_types_follow_json_literals() {
        let metric: Metric = serde_json::from_str(
            r#"{
                "measurement": "m",
                "tags": {"source": "RingConn"},
                "fields": {"f": 3.14, "i": 7, "w": 7.0, "b": true, "s": "x"}
            }"#,
        )
        .unwrap();

        assert_eq!(metric.fields["f"], FieldValue::Float(3.14));
        assert_eq!(metric.fields["i"], FieldValue::Integer(7));
        assert_eq!(metric.fields["w"], FieldValue::Float(7.0));
        assert_eq!(metric.fields["b"], FieldValue::Boolean(true));
        assert_eq!(metric.fields["s"], FieldValue::String("x".to_string()));
        assert!(metric.timestamp.is_none());
    }

    #[test]
    fn test_timestamp_parses_rfc3339() {
        let metric: Metric = serde_json::from_str(
            r#"{"measurement": "m", "fields": {"v": 1}, "timestamp": "2024-05-01T12:00:00-04:00"}"#,
        )
        .unwrap();

        assert_eq!(
            metric.timestamp.unwrap().to_rfc3339(),
            "2024-05-01T16:00:00+00:00"
        );
    }
}
