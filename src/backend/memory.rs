//! In-process backend
//!
//! Accepts the same line-protocol bodies as InfluxDB and evaluates
//! `SeriesQuery` descriptors directly over the stored points. Used by the
//! test suite and by `VITALSTREAM_BACKEND=memory` for running without a
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::line_protocol::decode_batch;
use super::point::{FieldValue, Metric};
use super::query::{SelectItem, SeriesQuery, TIME_COLUMN};
use super::row::{Row, Scalar};
use super::{BackendError, BackendResult, QueryContext, RowStream, TimeSeriesBackend};
use crate::time::{Clock, SystemClock};

/// A stored point; the timestamp is always resolved
#[derive(Debug, Clone)]
struct StoredPoint {
    measurement: String,
    timestamp: DateTime<Utc>,
    tags: HashMap<String, String>,
    fields: HashMap<String, FieldValue>,
}

impl StoredPoint {
    fn value(&self, column: &str) -> Option<Scalar> {
        if column == TIME_COLUMN {
            return Some(Scalar::Time(self.timestamp));
        }
        if let Some(tag) = self.tags.get(column) {
            return Some(Scalar::String(tag.clone()));
        }
        self.fields.get(column).map(field_scalar)
    }

    fn all_columns(&self) -> Row {
        let mut row = Row::new().with(TIME_COLUMN, Scalar::Time(self.timestamp));
        for (k, v) in &self.tags {
            row.insert(k.clone(), Scalar::String(v.clone()));
        }
        for (k, v) in &self.fields {
            row.insert(k.clone(), field_scalar(v));
        }
        row
    }
}

fn field_scalar(value: &FieldValue) -> Scalar {
    match value {
        FieldValue::Boolean(b) => Scalar::Boolean(*b),
        FieldValue::Integer(i) => Scalar::Integer(*i),
        FieldValue::Float(f) => Scalar::Float(*f),
        FieldValue::String(s) => Scalar::String(s.clone()),
    }
}

/// Backend that keeps every point in memory
pub struct MemoryBackend {
    points: RwLock<Vec<StoredPoint>>,
    available: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Backend that stamps untimed points using `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            points: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            clock,
        }
    }

    /// Simulate an outage: every call fails with `Unavailable` while false
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Store points directly, bypassing line-protocol encoding
    pub async fn insert(&self, metrics: impl IntoIterator<Item = Metric>) {
        let now = self.clock.now();
        let mut points = self.points.write().await;
        points.extend(metrics.into_iter().map(|m| StoredPoint {
            timestamp: m.timestamp.unwrap_or(now),
            measurement: m.measurement,
            tags: m.tags,
            fields: m.fields,
        }));
    }

    /// Number of stored points
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }

    fn ensure_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable(
                "memory backend marked unavailable".to_string(),
            ))
        }
    }
}

/// Evaluate a query over matching points (already filtered and ordered)
fn evaluate(query: &SeriesQuery, points: &[&StoredPoint]) -> Vec<Row> {
    let aggregated = query.select.iter().any(|item| item.aggregation.is_some());

    if !aggregated && query.group_by.is_none() {
        return points.iter().map(|p| project(&query.select, p)).collect();
    }

    // Groups in first-seen order; points without the group column are skipped
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&StoredPoint>> = HashMap::new();
    for point in points {
        let key = match &query.group_by {
            Some(column) => match point.value(column) {
                Some(Scalar::String(s)) => s,
                Some(other) => format!("{:?}", other),
                None => continue,
            },
            None => String::new(),
        };
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(*point);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(|members| aggregate_group(&query.select, &members))
        .collect()
}

fn project(select: &[SelectItem], point: &StoredPoint) -> Row {
    if select.is_empty() {
        return point.all_columns();
    }
    let mut row = Row::new();
    for item in select {
        if let Some(value) = point.value(&item.column) {
            row.insert(item.output_name(), value);
        }
    }
    row
}

fn aggregate_group(select: &[SelectItem], members: &[&StoredPoint]) -> Row {
    let mut row = Row::new();
    for item in select {
        let value = match item.aggregation {
            Some(agg) => {
                let values: Vec<f64> = members
                    .iter()
                    .filter_map(|p| p.value(&item.column).and_then(|v| v.as_f64()))
                    .collect();
                agg.apply(&values).map(Scalar::Float)
            }
            None => members.first().and_then(|p| p.value(&item.column)),
        };
        if let Some(value) = value {
            row.insert(item.output_name(), value);
        }
    }
    row
}

#[async_trait]
impl TimeSeriesBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write(&self, body: String, ctx: &QueryContext) -> BackendResult<()> {
        ctx.check()?;
        self.ensure_available()?;

        let metrics = decode_batch(&body).map_err(|e| BackendError::Write(e.to_string()))?;
        self.insert(metrics).await;
        Ok(())
    }

    async fn query(&self, query: &SeriesQuery, ctx: &QueryContext) -> BackendResult<RowStream> {
        ctx.check()?;
        self.ensure_available()?;

        let points = self.points.read().await;
        let mut matching: Vec<&StoredPoint> = points
            .iter()
            .filter(|p| p.measurement == query.measurement && query.window.contains(p.timestamp))
            .collect();
        if query.order_by_time {
            matching.sort_by_key(|p| p.timestamp);
        }

        let rows = evaluate(query, &matching);
        drop(points);

        tracing::trace!(
            measurement = %query.measurement,
            rows = rows.len(),
            "Memory backend query evaluated"
        );

        Ok(ctx.guard(stream::iter(rows.into_iter().map(Ok)).boxed()))
    }

    async fn health_check(&self) -> BackendResult<()> {
        self.ensure_available()
    }
}
