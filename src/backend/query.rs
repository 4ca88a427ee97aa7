//! Query descriptors
//!
//! A `SeriesQuery` names one measurement, the columns to read, a time window
//! and optional grouping/ordering. Backends either evaluate it directly
//! (`MemoryBackend`) or render it to SQL (`InfluxBackend`).
//!
//! ```rust,ignore
//! let query = SeriesQuery::from("blood_pressure", window)
//!     .column("time")
//!     .column("systolic")
//!     .column("diastolic")
//!     .order_by_time()
//!     .build();
//!
//! let sql = query.to_sql();
//! ```

use crate::time::TimeWindow;

/// Name of the timestamp column every measurement carries
pub const TIME_COLUMN: &str = "time";

/// Aggregation functions available to grouped queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Avg,
}

impl Aggregation {
    /// Apply aggregation to a slice of values
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        Some(match self {
            Self::Avg => values.iter().sum::<f64>() / values.len() as f64,
        })
    }

    fn sql_name(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
        }
    }
}

/// An item in the SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// Source column (tag or field)
    pub column: String,
    /// Optional aggregation function
    pub aggregation: Option<Aggregation>,
    /// Optional alias for the result column
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            aggregation: None,
            alias: None,
        }
    }

    /// Name of the column in result rows (alias or source column)
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }

    fn to_sql(&self) -> String {
        let expr = match self.aggregation {
            Some(agg) => format!("{}({})", agg.sql_name(), quote_ident(&self.column)),
            None => quote_ident(&self.column),
        };
        match &self.alias {
            Some(alias) => format!("{} AS {}", expr, quote_ident(alias)),
            None => expr,
        }
    }
}

/// A query against one measurement over one time window
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    pub measurement: String,
    pub select: Vec<SelectItem>,
    pub window: TimeWindow,
    /// Column to group by; every non-aggregated select item must be this column
    pub group_by: Option<String>,
    /// Sort rows by time ascending
    pub order_by_time: bool,
}

impl SeriesQuery {
    /// Start building a query over `measurement` within `window`
    #[allow(clippy::should_implement_trait)]
    pub fn from(measurement: impl Into<String>, window: TimeWindow) -> SeriesQueryBuilder {
        SeriesQueryBuilder {
            query: SeriesQuery {
                measurement: measurement.into(),
                select: Vec::new(),
                window,
                group_by: None,
                order_by_time: false,
            },
        }
    }

    /// Render as InfluxDB 3 SQL
    ///
    /// Identifiers are double-quoted so mixed-case column names and aliases
    /// survive (unquoted SQL identifiers fold to lower case).
    pub fn to_sql(&self) -> String {
        let columns = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select
                .iter()
                .map(SelectItem::to_sql)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} >= '{}' AND {} < '{}'",
            columns,
            quote_ident(&self.measurement),
            TIME_COLUMN,
            self.window.start_rfc3339(),
            TIME_COLUMN,
            self.window.end_rfc3339(),
        );

        if let Some(group) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(&quote_ident(group));
        }
        if self.order_by_time {
            sql.push_str(" ORDER BY ");
            sql.push_str(TIME_COLUMN);
            sql.push_str(" ASC");
        }
        sql
    }
}

/// Builder for `SeriesQuery`
#[derive(Debug, Clone)]
pub struct SeriesQueryBuilder {
    query: SeriesQuery,
}

impl SeriesQueryBuilder {
    /// Select a column as-is
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.query.select.push(SelectItem::new(column));
        self
    }

    /// Select a column under another name
    pub fn column_as(mut self, column: impl Into<String>, alias: impl Into<String>) -> Self {
        let mut item = SelectItem::new(column);
        item.alias = Some(alias.into());
        self.query.select.push(item);
        self
    }

    /// Select an aggregate of a column under an alias
    pub fn aggregate(
        mut self,
        aggregation: Aggregation,
        column: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.query.select.push(SelectItem {
            column: column.into(),
            aggregation: Some(aggregation),
            alias: Some(alias.into()),
        });
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.query.group_by = Some(column.into());
        self
    }

    pub fn order_by_time(mut self) -> Self {
        self.query.order_by_time = true;
        self
    }

    pub fn build(self) -> SeriesQuery {
        self.query
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 5, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 4, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_plain_select_sql() {
        let query = SeriesQuery::from("blood_pressure", window())
            .column("time")
            .column("systolic")
            .order_by_time()
            .build();

        assert_eq!(
            query.to_sql(),
            "SELECT \"time\", \"systolic\" FROM \"blood_pressure\" \
             WHERE time >= '2024-03-01T05:00:00Z' AND time < '2024-03-31T04:00:00Z' \
             ORDER BY time ASC"
        );
    }

    #[test]
    fn test_grouped_aggregate_sql() {
        let query = SeriesQuery::from("workout_heart_rate", window())
            .column("workout_id")
            .aggregate(Aggregation::Avg, "avg", "avg_hr")
            .group_by("workout_id")
            .build();

        assert_eq!(
            query.to_sql(),
            "SELECT \"workout_id\", avg(\"avg\") AS \"avg_hr\" FROM \"workout_heart_rate\" \
             WHERE time >= '2024-03-01T05:00:00Z' AND time < '2024-03-31T04:00:00Z' \
             GROUP BY \"workout_id\""
        );
    }

    #[test]
    fn test_alias_keeps_case_and_quotes_are_escaped() {
        let query = SeriesQuery::from("odd\"name", window())
            .column_as("qty", "bodyFat")
            .build();

        let sql = query.to_sql();
        assert!(sql.starts_with("SELECT \"qty\" AS \"bodyFat\" FROM \"odd\"\"name\""));
        assert_eq!(query.select[0].output_name(), "bodyFat");
    }

    #[test]
    fn test_empty_select_is_star() {
        let query = SeriesQuery::from("m", window()).build();
        assert!(query.to_sql().starts_with("SELECT * FROM \"m\""));
    }

    #[test]
    fn test_average() {
        assert_eq!(Aggregation::Avg.apply(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
        assert_eq!(Aggregation::Avg.apply(&[]), None);
    }
}
