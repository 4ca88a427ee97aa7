//! InfluxDB line protocol codec
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp_ns]
//! ```
//!
//! Tags and fields are written in sorted key order so the same metric always
//! encodes to the same line. Field encodings:
//!
//! | type    | encoding            |
//! |---------|---------------------|
//! | integer | `7i`                |
//! | float   | `3.14`, `7`         |
//! | boolean | `true` / `false`    |
//! | string  | `"x"` (`\"`, `\\`)  |
//!
//! A float with no fractional part is written without a suffix and is still
//! read back as a float: only the `i` suffix makes an integer.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

use super::point::{FieldValue, Metric};

/// Characters escaped in measurement names
const MEASUREMENT_SPECIALS: &[char] = &[',', ' ', '\\'];

/// Characters escaped in tag keys, tag values and field keys
const KEY_SPECIALS: &[char] = &[',', '=', ' ', '\\'];

/// A point that cannot be expressed in line protocol, or a line that does not parse
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("metric #{index}: {reason}")]
pub struct LineProtocolError {
    /// Position of the offending point (or line) in the batch
    pub index: usize,
    pub reason: String,
}

impl LineProtocolError {
    fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Encode a batch into a newline-terminated line-protocol body
///
/// Fails on the first point that cannot be written; nothing is returned for
/// the points before it.
pub fn encode_batch(metrics: &[Metric]) -> Result<String, LineProtocolError> {
    let mut body = String::with_capacity(metrics.len() * 64);
    for (index, metric) in metrics.iter().enumerate() {
        encode_metric(metric, &mut body).map_err(|reason| LineProtocolError::new(index, reason))?;
        body.push('\n');
    }
    Ok(body)
}

fn encode_metric(metric: &Metric, out: &mut String) -> Result<(), String> {
    validate(metric)?;

    escape_into(out, &metric.measurement, MEASUREMENT_SPECIALS);

    let tags: BTreeMap<_, _> = metric.tags.iter().collect();
    for (key, value) in tags {
        out.push(',');
        escape_into(out, key, KEY_SPECIALS);
        out.push('=');
        escape_into(out, value, KEY_SPECIALS);
    }

    out.push(' ');
    let fields: BTreeMap<_, _> = metric.fields.iter().collect();
    for (i, (key, value)) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        escape_into(out, key, KEY_SPECIALS);
        out.push('=');
        encode_field_value(out, value);
    }

    if let Some(ts) = metric.timestamp {
        let nanos = ts
            .timestamp_nanos_opt()
            .ok_or_else(|| format!("timestamp {} is outside the nanosecond range", ts))?;
        let _ = write!(out, " {}", nanos);
    }

    Ok(())
}

fn validate(metric: &Metric) -> Result<(), String> {
    if metric.measurement.is_empty() {
        return Err("measurement name cannot be empty".to_string());
    }
    if metric.fields.is_empty() {
        return Err(format!("'{}' has no fields", metric.measurement));
    }
    if metric.measurement.contains('\n') {
        return Err("measurement name contains a newline".to_string());
    }

    for (key, value) in &metric.tags {
        if key.is_empty() {
            return Err("tag key cannot be empty".to_string());
        }
        if value.is_empty() {
            return Err(format!("tag '{}' has an empty value", key));
        }
        if key.contains('\n') || value.contains('\n') {
            return Err(format!("tag '{}' contains a newline", key));
        }
    }

    for (key, value) in &metric.fields {
        if key.is_empty() {
            return Err("field key cannot be empty".to_string());
        }
        if key.contains('\n') {
            return Err(format!("field key '{}' contains a newline", key));
        }
        match value {
            FieldValue::Float(v) if !v.is_finite() => {
                return Err(format!("field '{}' is not a finite number", key));
            }
            FieldValue::String(s) if s.contains('\n') => {
                return Err(format!("field '{}' contains a newline", key));
            }
            _ => {}
        }
    }

    Ok(())
}

fn encode_field_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Float(v) => {
            let _ = write!(out, "{}", v);
        }
        FieldValue::Integer(v) => {
            let _ = write!(out, "{}i", v);
        }
        FieldValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        FieldValue::String(s) => {
            out.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
}

fn escape_into(out: &mut String, raw: &str, specials: &[char]) {
    for c in raw.chars() {
        if specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

// ============================================
// Decoding
// ============================================

/// Decode a line-protocol body; blank lines and `#` comments are skipped
pub fn decode_batch(body: &str) -> Result<Vec<Metric>, LineProtocolError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(index, line)| decode_line(line).map_err(|reason| LineProtocolError::new(index, reason)))
        .collect()
}

fn decode_line(line: &str) -> Result<Metric, String> {
    // Quotes only delimit string field values; in the series they are literal.
    let (series, rest) = split_series(line).ok_or("expected 2 or 3 sections, found 1")?;
    let sections = split_fields(rest, ' ');
    let (fields, timestamp) = match sections.as_slice() {
        [fields] => (*fields, None),
        [fields, ts] => (*fields, Some(*ts)),
        _ => return Err(format!("expected 2 or 3 sections, found {}", sections.len() + 1)),
    };

    let mut series_parts = split_unescaped(series, ',').into_iter();
    let measurement = unescape(series_parts.next().unwrap_or_default());
    if measurement.is_empty() {
        return Err("missing measurement".to_string());
    }

    let mut metric = Metric::new(measurement);

    for tag in series_parts {
        let (key, value) =
            split_once_unescaped(tag).ok_or_else(|| format!("malformed tag '{}'", tag))?;
        metric.tags.insert(unescape(key), unescape(value));
    }

    for field in split_fields(fields, ',') {
        let (key, raw) =
            split_once_unescaped(field).ok_or_else(|| format!("malformed field '{}'", field))?;
        metric.fields.insert(unescape(key), parse_field_value(raw)?);
    }
    if metric.fields.is_empty() {
        return Err("no fields".to_string());
    }

    if let Some(ts) = timestamp {
        let nanos: i64 = ts
            .parse()
            .map_err(|_| format!("invalid timestamp '{}'", ts))?;
        metric.timestamp = Some(from_nanos(nanos));
    }

    Ok(metric)
}

fn from_nanos(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}

fn parse_field_value(raw: &str) -> Result<FieldValue, String> {
    if let Some(inner) = raw.strip_prefix('"') {
        let inner = inner
            .strip_suffix('"')
            .ok_or_else(|| format!("unterminated string '{}'", raw))?;
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(&next) = chars.peek() {
                    if next == '"' || next == '\\' {
                        value.push(next);
                        chars.next();
                        continue;
                    }
                }
            }
            value.push(c);
        }
        return Ok(FieldValue::String(value));
    }

    match raw {
        "t" | "T" | "true" | "True" | "TRUE" => return Ok(FieldValue::Boolean(true)),
        "f" | "F" | "false" | "False" | "FALSE" => return Ok(FieldValue::Boolean(false)),
        _ => {}
    }

    if let Some(digits) = raw.strip_suffix('i') {
        return digits
            .parse()
            .map(FieldValue::Integer)
            .map_err(|_| format!("invalid integer '{}'", raw));
    }

    raw.parse()
        .map(FieldValue::Float)
        .map_err(|_| format!("invalid field value '{}'", raw))
}

/// Split on `sep` where it is not backslash-escaped
fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == sep => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Split the series (measurement and tags) from the rest of the line
fn split_series(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ' ' => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Split a field section on `sep`, skipping over quoted string values
///
/// A `"` opens a string only as the first character after a field's
/// unescaped `=`; anywhere in a key it is literal. Unescaped commas start a
/// new field whatever `sep` is.
fn split_fields(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut in_value = false;
    let mut value_start = None;
    let mut in_quotes = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if in_quotes {
            match c {
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' if value_start == Some(i) => in_quotes = true,
            '=' if !in_value => {
                in_value = true;
                value_start = Some(i + 1);
            }
            c if c == sep => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
                in_value = false;
                value_start = None;
            }
            ',' => {
                in_value = false;
                value_start = None;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Split `key=value` at the first unescaped `=`
fn split_once_unescaped(s: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if KEY_SPECIALS.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
