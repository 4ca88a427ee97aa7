//! Workout view
//!
//! Workouts and their heart-rate samples live in separate measurements and
//! are joined on `workout_id`. The join never reorders: workouts come out in
//! the order the workout query first saw their ids.

use futures_util::future::try_join;
use std::collections::HashMap;

use super::error::StoreResult;
use super::types::Workout;
use super::HealthStore;
use crate::backend::{Aggregation, QueryContext, Row, SeriesQuery};
use crate::time::ZoneResolver;

const WORKOUT: &str = "workout";
const WORKOUT_HEART_RATE: &str = "workout_heart_rate";

pub const WORKOUT_WINDOW_DAYS: u32 = 90;

/// Workouts in first-seen order with O(1) lookup by id
#[derive(Debug, Default)]
struct WorkoutIndex {
    workouts: Vec<Workout>,
    by_id: HashMap<String, usize>,
}

impl WorkoutIndex {
    /// Insert, or replace in place when the id was already seen
    fn upsert(&mut self, workout: Workout) {
        match self.by_id.get(&workout.id) {
            Some(&slot) => self.workouts[slot] = workout,
            None => {
                self.by_id.insert(workout.id.clone(), self.workouts.len());
                self.workouts.push(workout);
            }
        }
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Workout> {
        let slot = *self.by_id.get(id)?;
        self.workouts.get_mut(slot)
    }

    fn into_vec(self) -> Vec<Workout> {
        self.workouts
    }
}

fn decode_workout(zone: &ZoneResolver, row: &Row) -> Option<Workout> {
    let id = row.str("workout_id")?.to_string();
    let at = row.time("time")?;
    let name = row.str("workout_name").unwrap_or_default().to_string();

    Some(Workout {
        id,
        time: zone.timestamp_label(at),
        kind: name.clone(),
        name,
        duration: row.i64("duration").unwrap_or(0) / 60,
        calories: row.f64("active_energy_value").unwrap_or(0.0),
        avg_hr: 0,
    })
}

impl HealthStore {
    /// Workouts in the 90 days ending at `date`, each with its average heart rate
    pub async fn workouts(&self, date: &str, ctx: &QueryContext) -> StoreResult<Vec<Workout>> {
        let window = self
            .zone
            .days_range_ending_at(date, WORKOUT_WINDOW_DAYS)?;

        let workout_query = SeriesQuery::from(WORKOUT, window)
            .column("workout_id")
            .column("time")
            .column("workout_name")
            .column("duration")
            .column("active_energy_value")
            .order_by_time()
            .build();
        let hr_query = SeriesQuery::from(WORKOUT_HEART_RATE, window)
            .column("workout_id")
            .aggregate(Aggregation::Avg, "avg", "avg_hr")
            .group_by("workout_id")
            .build();

        let mut index = WorkoutIndex::default();
        let (_, heart_rates) = try_join(
            self.executor.for_each_row(&workout_query, ctx, |row| {
                match decode_workout(&self.zone, &row) {
                    Some(workout) => {
                        index.upsert(workout);
                        true
                    }
                    None => false,
                }
            }),
            self.executor.collect(&hr_query, ctx, |row| {
                Some((row.str("workout_id")?.to_string(), row.f64("avg_hr")?))
            }),
        )
        .await?;

        for (id, avg_hr) in heart_rates {
            if let Some(workout) = index.get_mut(&id) {
                workout.avg_hr = avg_hr as i64;
            }
        }

        let workouts = index.into_vec();
        tracing::debug!(date, workouts = workouts.len(), "Built workout list");
        Ok(workouts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Metric;
    use crate::store::fixtures::*;
    use chrono::{DateTime, Utc};

    fn workout(id: &str, name: &str, at: DateTime<Utc>, seconds: i64, calories: f64) -> Metric {
        Metric::new(WORKOUT)
            .tag("workout_id", id)
            .tag("workout_name", name)
            .field("duration", seconds)
            .field("active_energy_value", calories)
            .at(at)
    }

    fn hr(id: &str, avg: f64, at: DateTime<Utc>) -> Metric {
        Metric::new(WORKOUT_HEART_RATE)
            .tag("workout_id", id)
            .field("avg", avg)
            .at(at)
    }

    #[tokio::test]
    async fn test_join_keeps_workout_order_and_defaults_missing_hr() {
        let (store, backend) = store_at(noon_may_first());
        backend
            .insert(vec![
                workout("run-1", "Running", local(2024, 4, 20, 7, 0), 1830, 310.0),
                workout("walk-1", "Walking", local(2024, 4, 25, 18, 30), 2400, 150.0),
                workout("bike-1", "Cycling", local(2024, 4, 30, 6, 15), 3600, 540.0),
                // Heart-rate samples arrive in a different order than workouts
                hr("bike-1", 140.0, local(2024, 4, 30, 6, 20)),
                hr("bike-1", 150.0, local(2024, 4, 30, 6, 40)),
                hr("run-1", 155.9, local(2024, 4, 20, 7, 10)),
                hr("ghost", 99.0, local(2024, 4, 21, 7, 10)),
            ])
            .await;

        let workouts = store.workouts("2024-05-01", &QueryContext::new()).await.unwrap();

        let ids: Vec<&str> = workouts.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["run-1", "walk-1", "bike-1"]);

        assert_eq!(workouts[0].time, "2024-04-20 07:00");
        assert_eq!(workouts[0].duration, 30);
        assert_eq!(workouts[0].avg_hr, 155);
        assert_eq!(workouts[0].kind, "Running");

        assert_eq!(workouts[1].avg_hr, 0);
        assert_eq!(workouts[2].avg_hr, 145);
        assert_eq!(workouts[2].calories, 540.0);
    }

    #[tokio::test]
    async fn test_duplicate_id_updates_in_place() {
        let (store, backend) = store_at(noon_may_first());
        backend
            .insert(vec![
                workout("a", "Rowing", local(2024, 4, 1, 7, 0), 600, 80.0),
                workout("b", "Yoga", local(2024, 4, 2, 7, 0), 1200, 60.0),
                workout("a", "Rowing", local(2024, 4, 3, 7, 0), 900, 120.0),
            ])
            .await;

        let workouts = store.workouts("2024-05-01", &QueryContext::new()).await.unwrap();

        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[0].id, "a");
        assert_eq!(workouts[0].duration, 15);
        assert_eq!(workouts[1].id, "b");
    }

    #[test]
    fn test_rows_without_id_are_dropped() {
        let zone = ZoneResolver::default();
        let row = Row::new().with("workout_name", crate::backend::Scalar::String("Swim".into()));
        assert!(decode_workout(&zone, &row).is_none());
    }
}
