//! Daily summary view

use futures_util::future::try_join;

use super::error::StoreResult;
use super::types::Summary;
use super::HealthStore;
use crate::backend::{QueryContext, SeriesQuery};

const DAILY_TOTALS: &str = "daily_totals";
const DIETARY_ENERGY: &str = "dietary_energy";

/// Device-reported daily totals the summary understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyMetric {
    StepCount,
    WalkingRunningDistance,
    ActiveEnergy,
    BasalEnergyBurned,
}

/// `metric` tag value → daily total
const DAILY_METRICS: [(&str, DailyMetric); 4] = [
    ("step_count", DailyMetric::StepCount),
    ("walking_running_distance", DailyMetric::WalkingRunningDistance),
    ("active_energy", DailyMetric::ActiveEnergy),
    ("basal_energy_burned", DailyMetric::BasalEnergyBurned),
];

impl DailyMetric {
    pub fn from_name(name: &str) -> Option<Self> {
        DAILY_METRICS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, metric)| *metric)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StepCount => "step_count",
            Self::WalkingRunningDistance => "walking_running_distance",
            Self::ActiveEnergy => "active_energy",
            Self::BasalEnergyBurned => "basal_energy_burned",
        }
    }

    /// Whether only the configured wearable's total counts
    ///
    /// Phones and watches both report steps and energy; summing them double
    /// counts. Distance has a single reporter.
    pub fn source_filtered(&self) -> bool {
        match self {
            Self::StepCount | Self::ActiveEnergy | Self::BasalEnergyBurned => true,
            Self::WalkingRunningDistance => false,
        }
    }

    fn apply(&self, summary: &mut Summary, value: f64) {
        match self {
            Self::StepCount => summary.steps = value as i64,
            Self::WalkingRunningDistance => summary.distance = value,
            Self::ActiveEnergy => summary.active_calories = value,
            Self::BasalEnergyBurned => summary.basal_calories = value,
        }
    }
}

impl HealthStore {
    /// Activity totals and dietary calories for one local day
    pub async fn summary(&self, date: &str, ctx: &QueryContext) -> StoreResult<Summary> {
        let window = self.zone.day_range(date)?;

        let totals_query = SeriesQuery::from(DAILY_TOTALS, window)
            .column("metric")
            .column("source")
            .column("value")
            .build();
        let dietary_query = SeriesQuery::from(DIETARY_ENERGY, window)
            .column("qty")
            .build();

        let wearable = self.settings.wearable_source.as_str();
        let mut summary = Summary::default();
        let mut dietary_calories = 0.0;

        try_join(
            self.executor.for_each_row(&totals_query, ctx, |row| {
                let Some(metric) = row.str("metric") else {
                    return false;
                };
                let Some(value) = row.f64("value") else {
                    return false;
                };
                // Unknown metrics are other devices' business
                let Some(metric) = DailyMetric::from_name(metric) else {
                    return true;
                };
                if metric.source_filtered() && row.str("source") != Some(wearable) {
                    return true;
                }
                metric.apply(&mut summary, value);
                true
            }),
            self.executor.for_each_row(&dietary_query, ctx, |row| match row.f64("qty") {
                Some(qty) => {
                    dietary_calories += qty;
                    true
                }
                None => false,
            }),
        )
        .await?;

        summary.dietary_calories = dietary_calories;

        tracing::debug!(date, window = %window, ?summary, "Built summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Metric;
    use crate::store::fixtures::*;
    use crate::store::StoreError;

    fn total(metric: &str, source: &str, value: f64, h: u32) -> Metric {
        Metric::new(DAILY_TOTALS)
            .tag("metric", metric)
            .tag("source", source)
            .field("value", value)
            .at(local(2024, 5, 1, h, 0))
    }

    #[test]
    fn test_lookup_table_covers_every_metric() {
        for (name, metric) in DAILY_METRICS {
            assert_eq!(metric.name(), name);
            assert_eq!(DailyMetric::from_name(name), Some(metric));
        }
        assert_eq!(DailyMetric::from_name("flights_climbed"), None);
    }

    #[tokio::test]
    async fn test_summary_filters_by_wearable_source() {
        let (store, backend) = store_at(noon_may_first());
        backend
            .insert(vec![
                total("step_count", "RingConn", 8421.0, 23),
                total("step_count", "iPhone", 9999.0, 23),
                total("walking_running_distance", "iPhone", 6.2, 23),
                total("active_energy", "RingConn", 512.5, 23),
                total("active_energy", "iPhone", 800.0, 23),
                total("basal_energy_burned", "RingConn", 1650.0, 23),
                total("flights_climbed", "RingConn", 12.0, 23),
                Metric::new(DIETARY_ENERGY).field("qty", 600.0).at(local(2024, 5, 1, 8, 0)),
                Metric::new(DIETARY_ENERGY).field("qty", 750i64).at(local(2024, 5, 1, 13, 0)),
                // Previous local day, although the same UTC date
                Metric::new(DIETARY_ENERGY).field("qty", 999.0).at(local(2024, 4, 30, 23, 0)),
            ])
            .await;

        let summary = store.summary("2024-05-01", &QueryContext::new()).await.unwrap();

        assert_eq!(summary.steps, 8421);
        assert_eq!(summary.distance, 6.2);
        assert_eq!(summary.active_calories, 512.5);
        assert_eq!(summary.basal_calories, 1650.0);
        assert_eq!(summary.dietary_calories, 1350.0);
    }

    #[tokio::test]
    async fn test_missing_metrics_stay_zero() {
        let (store, _) = store_at(noon_may_first());
        let summary = store.summary("2024-05-01", &QueryContext::new()).await.unwrap();
        assert_eq!(summary, Summary::default());
    }

    #[tokio::test]
    async fn test_invalid_date_fails_before_querying() {
        let (store, backend) = store_at(noon_may_first());
        backend.set_available(false);

        let result = store.summary("05/01/2024", &QueryContext::new()).await;
        assert!(matches!(result, Err(StoreError::InvalidDate(_))));
    }

    #[tokio::test]
    async fn test_backend_outage_fails_whole_view() {
        let (store, backend) = store_at(noon_may_first());
        backend.set_available(false);

        let result = store.summary("2024-05-01", &QueryContext::new()).await;
        assert!(matches!(result, Err(StoreError::BackendUnavailable(_))));
    }
}
