//! View records
//!
//! Every record is built fresh per call and serialized with the field names
//! the dashboard expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-day activity and energy totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub steps: i64,
    pub distance: f64,
    pub active_calories: f64,
    pub basal_calories: f64,
    pub dietary_calories: f64,
}

/// A labelled sample; the label is "HH:MM" or "Mon DD" depending on the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesValue {
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub time: String,
    pub systolic: i64,
    pub diastolic: i64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glucose {
    pub time: String,
    pub value: f64,
}

/// One night of sleep; durations in hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sleep {
    pub date: String,
    pub total_duration: f64,
    pub deep_sleep: f64,
    pub rem_sleep: f64,
    pub light_sleep: f64,
    pub awake: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    /// Local start time, "YYYY-MM-DD HH:MM"
    pub time: String,
    pub name: String,
    /// Whole minutes
    pub duration: i64,
    pub calories: f64,
    /// Mirrors `name` until workouts carry a separate activity type
    #[serde(rename = "type")]
    pub kind: String,
    /// 0 when no heart-rate samples were recorded for the workout
    pub avg_hr: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietaryTrend {
    pub date: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// Rolling calorie average, forward-filled over days without one
    pub trend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub desc: String,
    pub cal: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyComposition {
    /// Exact instant shared by the weight and body-fat samples
    #[serde(skip)]
    pub instant: Option<DateTime<Utc>>,
    /// Local "Mon DD"
    pub time: String,
    pub weight: f64,
    pub body_fat: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_match_dashboard() {
        let summary = Summary {
            steps: 8000,
            active_calories: 450.5,
            ..Default::default()
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["steps"], json!(8000));
        assert_eq!(value["activeCalories"], json!(450.5));
        assert!(value.get("dietaryCalories").is_some());

        let workout = Workout {
            id: "w1".to_string(),
            time: "2024-05-01 07:00".to_string(),
            name: "Running".to_string(),
            duration: 30,
            calories: 300.0,
            kind: "Running".to_string(),
            avg_hr: 0,
        };
        let value = serde_json::to_value(&workout).unwrap();
        assert_eq!(value["type"], json!("Running"));
        assert_eq!(value["avgHr"], json!(0));
    }

    #[test]
    fn test_body_composition_hides_instant() {
        let record = BodyComposition {
            instant: Some(Utc::now()),
            time: "May 01".to_string(),
            weight: 80.0,
            body_fat: 18.5,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"time": "May 01", "weight": 80.0, "bodyFat": 18.5}));
    }
}
