//! Body composition view
//!
//! Weight and body fat are separate series. A record exists only where both
//! have a sample at exactly the same instant; samples a second apart do not
//! pair.

use chrono::{DateTime, Utc};
use futures_util::future::try_join;
use std::collections::HashMap;

use super::error::StoreResult;
use super::types::BodyComposition;
use super::HealthStore;
use crate::backend::{QueryContext, SeriesQuery};

const WEIGHT_BODY_MASS: &str = "weight_body_mass";
const BODY_FAT_PERCENTAGE: &str = "body_fat_percentage";

pub const BODY_WINDOW_DAYS: u32 = 30;

impl HealthStore {
    /// Paired weight/body-fat samples in the 30 days ending at `end_date`
    pub async fn body_composition(
        &self,
        end_date: &str,
        ctx: &QueryContext,
    ) -> StoreResult<Vec<BodyComposition>> {
        let window = self
            .zone
            .days_range_ending_at(end_date, BODY_WINDOW_DAYS)?;

        let weight_query = SeriesQuery::from(WEIGHT_BODY_MASS, window)
            .column("time")
            .column_as("qty", "weight")
            .build();
        let fat_query = SeriesQuery::from(BODY_FAT_PERCENTAGE, window)
            .column("time")
            .column_as("qty", "body_fat")
            .build();

        // Later duplicates at one instant replace earlier ones
        let mut weights: HashMap<DateTime<Utc>, f64> = HashMap::new();
        let (_, body_fat) = try_join(
            self.executor.for_each_row(&weight_query, ctx, |row| {
                match (row.time("time"), row.f64("weight")) {
                    (Some(at), Some(weight)) => {
                        weights.insert(at, weight);
                        true
                    }
                    _ => false,
                }
            }),
            self.executor.collect(&fat_query, ctx, |row| {
                Some((row.time("time")?, row.f64("body_fat")?))
            }),
        )
        .await?;

        let mut records: Vec<BodyComposition> = body_fat
            .into_iter()
            .filter_map(|(at, body_fat)| {
                let weight = *weights.get(&at)?;
                Some(BodyComposition {
                    instant: Some(at),
                    time: self.zone.day_label(at),
                    weight,
                    body_fat,
                })
            })
            .collect();
        records.sort_by_key(|r| r.instant);

        tracing::debug!(
            end_date,
            weights = weights.len(),
            records = records.len(),
            "Built body composition"
        );
        Ok(records)
    }
}
