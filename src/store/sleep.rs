//! Sleep view

use super::error::StoreResult;
use super::types::Sleep;
use super::HealthStore;
use crate::backend::{QueryContext, SeriesQuery};

const SLEEP_ANALYSIS: &str = "sleep_analysis";

pub const SLEEP_WINDOW_DAYS: u32 = 7;

/// Reported for every night until stage data supports computing it
pub const SLEEP_EFFICIENCY: f64 = 95.0;

impl HealthStore {
    /// Nightly sleep stages for the 7 days ending at `end_date`
    ///
    /// A night is reported only when all five durations are present.
    pub async fn sleep(&self, end_date: &str, ctx: &QueryContext) -> StoreResult<Vec<Sleep>> {
        let window = self
            .zone
            .days_range_ending_at(end_date, SLEEP_WINDOW_DAYS)?;
        let query = SeriesQuery::from(SLEEP_ANALYSIS, window)
            .column("time")
            .column("totalSleep")
            .column("deep")
            .column("rem")
            .column("core")
            .column("awake")
            .order_by_time()
            .build();

        let nights = self
            .executor
            .collect(&query, ctx, |row| {
                Some(Sleep {
                    date: self.zone.day_label(row.time("time")?),
                    total_duration: row.f64("totalSleep")?,
                    deep_sleep: row.f64("deep")?,
                    rem_sleep: row.f64("rem")?,
                    light_sleep: row.f64("core")?,
                    awake: row.f64("awake")?,
                    efficiency: SLEEP_EFFICIENCY,
                })
            })
            .await?;

        tracing::debug!(end_date, nights = nights.len(), "Built sleep series");
        Ok(nights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Metric;
    use crate::store::fixtures::*;

    fn night(month: u32, day: u32, total: f64) -> Metric {
        Metric::new(SLEEP_ANALYSIS)
            .field("totalSleep", total)
            .field("deep", 1.2)
            .field("rem", 1.8)
            .field("core", 4.0)
            .field("awake", 0.5)
            .at(local(2024, month, day, 7, 0))
    }

    #[tokio::test]
    async fn test_sleep_requires_all_stages() {
        let (store, backend) = store_at(noon_may_first());
        let mut partial = night(4, 30, 6.0);
        partial.fields.remove("rem");

        backend
            .insert(vec![
                night(5, 1, 7.5),
                partial,
                Metric::new(SLEEP_ANALYSIS)
                    .field("totalSleep", 8i64)
                    .field("deep", 1i64)
                    .field("rem", 2i64)
                    .field("core", 4i64)
                    .field("awake", 1i64)
                    .at(local(2024, 4, 29, 7, 0)),
            ])
            .await;

        let nights = store.sleep("2024-05-01", &QueryContext::new()).await.unwrap();

        assert_eq!(nights.len(), 2);
        assert_eq!(nights[0].date, "Apr 29");
        assert_eq!(nights[0].total_duration, 8.0);
        assert_eq!(nights[1].date, "May 01");
        assert_eq!(nights[1].light_sleep, 4.0);
        assert!(nights.iter().all(|n| n.efficiency == SLEEP_EFFICIENCY));
    }

    #[tokio::test]
    async fn test_sleep_window_is_seven_days() {
        let (store, backend) = store_at(noon_may_first());
        backend
            .insert(vec![
                Metric::new(SLEEP_ANALYSIS)
                    .field("totalSleep", 7.0)
                    .field("deep", 1.0)
                    .field("rem", 1.0)
                    .field("core", 4.0)
                    .field("awake", 1.0)
                    .at(local(2024, 4, 25, 7, 0)),
                Metric::new(SLEEP_ANALYSIS)
                    .field("totalSleep", 6.0)
                    .field("deep", 1.0)
                    .field("rem", 1.0)
                    .field("core", 3.0)
                    .field("awake", 1.0)
                    .at(local(2024, 4, 24, 23, 0)),
            ])
            .await;

        let nights = store.sleep("2024-05-01", &QueryContext::new()).await.unwrap();
        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].date, "Apr 25");
    }
}
