//! Dietary views
//!
//! The trend view sums each nutrient per local day, computes a rolling
//! calorie average over the most recent days that have data, then lays the
//! result over a dense calendar so days without data still appear.
//!
//! ```text
//! nutrient rows ──► per-day totals ──► rolling trend (≥3 of last 7 data days)
//!                                  └─► dense 30-day calendar, trend forward-filled
//! ```

use chrono::{Days, NaiveDate};
use futures_util::future::try_join_all;
use std::collections::{BTreeMap, VecDeque};

use super::error::{StoreError, StoreResult};
use super::types::{DietaryTrend, Meal};
use super::HealthStore;
use crate::backend::{QueryContext, SeriesQuery};
use crate::time::{date_label, InvalidDate, ZoneResolver};

/// Calendar days shown by the trend view
pub const DIETARY_WINDOW_DAYS: u32 = 30;
/// Extra days read before the output window so the first days have a trend
pub const TREND_PRIMING_DAYS: u32 = 7;
/// Most data days the rolling average spans
pub const TREND_SPAN: usize = 7;
/// Fewest data days before a trend is reported
pub const TREND_MIN_DAYS: usize = 3;

/// Nutrients tracked per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Energy,
    Protein,
    Carbohydrates,
    TotalFat,
}

/// Nutrient → measurement holding its samples
pub const NUTRIENTS: [(Nutrient, &str); 4] = [
    (Nutrient::Energy, "dietary_energy"),
    (Nutrient::Protein, "protein"),
    (Nutrient::Carbohydrates, "carbohydrates"),
    (Nutrient::TotalFat, "total_fat"),
];

impl Nutrient {
    pub fn measurement(&self) -> &'static str {
        match self {
            Self::Energy => "dietary_energy",
            Self::Protein => "protein",
            Self::Carbohydrates => "carbohydrates",
            Self::TotalFat => "total_fat",
        }
    }
}

/// One day's nutrient totals
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyNutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyNutrients {
    pub fn add(&mut self, nutrient: Nutrient, amount: f64) {
        match nutrient {
            Nutrient::Energy => self.calories += amount,
            Nutrient::Protein => self.protein += amount,
            Nutrient::Carbohydrates => self.carbs += amount,
            Nutrient::TotalFat => self.fat += amount,
        }
    }
}

/// Rolling calorie average keyed by day
///
/// Walks the days that have data in order, keeping the last `TREND_SPAN` of
/// them. A day gets a value once at least `TREND_MIN_DAYS` are in the span.
pub fn rolling_calorie_trend(days: &BTreeMap<NaiveDate, DailyNutrients>) -> BTreeMap<NaiveDate, f64> {
    let mut history: VecDeque<f64> = VecDeque::with_capacity(TREND_SPAN + 1);
    let mut trend = BTreeMap::new();

    for (day, totals) in days {
        history.push_back(totals.calories);
        if history.len() > TREND_SPAN {
            history.pop_front();
        }
        if history.len() >= TREND_MIN_DAYS {
            let mean = history.iter().sum::<f64>() / history.len() as f64;
            trend.insert(*day, mean);
        }
    }
    trend
}

/// Lay per-day totals over every day in `[first, last]`
///
/// Days without data are zero. The trend carries forward from the latest day
/// at or before each slot that has one, including days before `first`.
pub fn build_trends(
    days: &BTreeMap<NaiveDate, DailyNutrients>,
    first: NaiveDate,
    last: NaiveDate,
) -> Vec<DietaryTrend> {
    let trend = rolling_calorie_trend(days);
    let mut carried = trend
        .range(..first)
        .next_back()
        .map(|(_, value)| *value)
        .unwrap_or(0.0);

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| {
            let totals = days.get(&day).copied().unwrap_or_default();
            if let Some(value) = trend.get(&day) {
                carried = *value;
            }
            DietaryTrend {
                date: date_label(day),
                calories: totals.calories,
                protein: totals.protein,
                carbs: totals.carbs,
                fat: totals.fat,
                trend: carried,
            }
        })
        .collect()
}

impl HealthStore {
    /// Daily nutrients and calorie trend for the 30 days ending at `end_date`
    pub async fn dietary_trends(
        &self,
        end_date: &str,
        ctx: &QueryContext,
    ) -> StoreResult<Vec<DietaryTrend>> {
        let last = ZoneResolver::parse_date(end_date)?;
        let first = last
            .checked_sub_days(Days::new(u64::from(DIETARY_WINDOW_DAYS - 1)))
            .ok_or_else(|| InvalidDate::new(end_date))?;
        let window = self
            .zone
            .days_range_ending_at(end_date, DIETARY_WINDOW_DAYS + TREND_PRIMING_DAYS)?;

        let queries = NUTRIENTS.into_iter().map(|(nutrient, measurement)| {
            let query = SeriesQuery::from(measurement, window)
                .column("time")
                .column("qty")
                .build();
            async move {
                let samples = self
                    .executor
                    .collect(&query, ctx, |row| {
                        Some((self.zone.local_date(row.time("time")?), row.f64("qty")?))
                    })
                    .await?;
                Ok::<_, StoreError>((nutrient, samples))
            }
        });

        // Merged in table order regardless of which query finished first
        let mut days: BTreeMap<NaiveDate, DailyNutrients> = BTreeMap::new();
        for (nutrient, samples) in try_join_all(queries).await? {
            for (day, amount) in samples {
                days.entry(day).or_default().add(nutrient, amount);
            }
        }

        let trends = build_trends(&days, first, last);
        tracing::debug!(
            end_date,
            data_days = days.len(),
            rows = trends.len(),
            "Built dietary trends"
        );
        Ok(trends)
    }

    /// Today's meals
    ///
    /// Meals are not recorded as points yet, so this returns fixed
    /// placeholders. The date is still validated.
    pub async fn meals_today(&self, date: &str) -> StoreResult<Vec<Meal>> {
        ZoneResolver::parse_date(date)?;

        Ok(vec![
            Meal {
                name: "Breakfast".to_string(),
                desc: "Oatmeal, Berries, Whey".to_string(),
                cal: 420,
            },
            Meal {
                name: "Lunch".to_string(),
                desc: "Chicken Salad, Quinoa".to_string(),
                cal: 580,
            },
        ])
    }
}
