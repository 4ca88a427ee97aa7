//! Heart rate, blood pressure and glucose views

use chrono::{DateTime, Duration, DurationRound, Utc};
use std::collections::BTreeMap;

use super::classify::classify_bp;
use super::error::StoreResult;
use super::types::{BloodPressure, Glucose, TimeSeriesValue};
use super::HealthStore;
use crate::backend::{QueryContext, SeriesQuery};
use crate::time::{TimeWindow, ZoneResolver};

const HEART_RATE: &str = "heart_rate";
const BLOOD_PRESSURE: &str = "blood_pressure";
const BLOOD_GLUCOSE: &str = "blood_glucose";

/// Length of the live heart-rate window
pub const HR_WINDOW_HOURS: i64 = 24;
/// Width of a heart-rate bucket
pub const HR_BUCKET_MINUTES: i64 = 10;
/// Trailing days shown by the blood-pressure and glucose views
pub const VITALS_WINDOW_DAYS: u32 = 30;

/// Running sum and count for one bucket
#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    sum: f64,
    count: u32,
}

impl Bucket {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / f64::from(self.count)
    }
}

/// Average samples into fixed-width buckets keyed by bucket start
///
/// Buckets come out in chronological order. Samples whose instant cannot be
/// truncated are dropped.
pub(crate) fn bucket_average(
    samples: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    width: Duration,
) -> Vec<(DateTime<Utc>, f64)> {
    let mut buckets: BTreeMap<DateTime<Utc>, Bucket> = BTreeMap::new();
    for (at, value) in samples {
        if let Ok(start) = at.duration_trunc(width) {
            buckets.entry(start).or_default().add(value);
        }
    }
    buckets
        .into_iter()
        .map(|(start, bucket)| (start, bucket.mean()))
        .collect()
}

impl HealthStore {
    /// Average heart rate in 10-minute buckets over the 24 hours ending now
    ///
    /// The window is live: `date` is validated but does not move it.
    /// Buckets are ordered by instant, not by label, so a label can repeat
    /// when the window spans midnight of the same clock time.
    pub async fn heart_rate(
        &self,
        date: &str,
        ctx: &QueryContext,
    ) -> StoreResult<Vec<TimeSeriesValue>> {
        ZoneResolver::parse_date(date)?;

        let window = TimeWindow::trailing(self.clock.now(), Duration::hours(HR_WINDOW_HOURS));
        let query = SeriesQuery::from(HEART_RATE, window)
            .column("time")
            .column("avg")
            .order_by_time()
            .build();

        let samples = self
            .executor
            .collect(&query, ctx, |row| Some((row.time("time")?, row.f64("avg")?)))
            .await?;

        let series: Vec<TimeSeriesValue> =
            bucket_average(samples, Duration::minutes(HR_BUCKET_MINUTES))
                .into_iter()
                .map(|(start, value)| TimeSeriesValue {
                    time: self.zone.clock_label(start),
                    value,
                })
                .collect();

        tracing::debug!(window = %window, buckets = series.len(), "Built heart-rate series");
        Ok(series)
    }

    /// Every blood-pressure reading in the 30 days ending at `end_date`, classified
    pub async fn blood_pressure(
        &self,
        end_date: &str,
        ctx: &QueryContext,
    ) -> StoreResult<Vec<BloodPressure>> {
        let window = self
            .zone
            .days_range_ending_at(end_date, VITALS_WINDOW_DAYS)?;
        let query = SeriesQuery::from(BLOOD_PRESSURE, window)
            .column("time")
            .column("systolic")
            .column("diastolic")
            .order_by_time()
            .build();

        let readings = self
            .executor
            .collect(&query, ctx, |row| {
                let at = row.time("time")?;
                let systolic = row.i64("systolic")?;
                let diastolic = row.i64("diastolic")?;
                Some(BloodPressure {
                    time: self.zone.day_label(at),
                    systolic,
                    diastolic,
                    category: classify_bp(systolic, diastolic).to_string(),
                })
            })
            .await?;

        tracing::debug!(end_date, readings = readings.len(), "Built blood-pressure series");
        Ok(readings)
    }

    /// Glucose samples in the 30 days ending at `end_date`
    pub async fn glucose(&self, end_date: &str, ctx: &QueryContext) -> StoreResult<Vec<Glucose>> {
        let window = self
            .zone
            .days_range_ending_at(end_date, VITALS_WINDOW_DAYS)?;
        let query = SeriesQuery::from(BLOOD_GLUCOSE, window)
            .column("time")
            .column("qty")
            .order_by_time()
            .build();

        self.executor
            .collect(&query, ctx, |row| {
                Some(Glucose {
                    time: self.zone.day_label(row.time("time")?),
                    value: row.f64("qty")?,
                })
            })
            .await
    }
}
