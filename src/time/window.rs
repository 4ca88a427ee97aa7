//! Absolute UTC time windows
//!
//! Every backend query is bounded by a `TimeWindow`, a half-open interval
//! `[start, end)` of UTC instants.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Time window for queries (half-open interval: [start, end))
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Start instant (inclusive)
    pub start: DateTime<Utc>,
    /// End instant (exclusive)
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a new time window
    ///
    /// # Panics
    /// Panics if start >= end
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start < end, "TimeWindow: start must be before end");
        Self { start, end }
    }

    /// Create a time window, returning None if invalid
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Window of the given length ending (exclusive) at `end`
    pub fn trailing(end: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start: end - length,
            end,
        }
    }

    /// Check if an instant falls within this window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Length of the window
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Start bound as an RFC 3339 UTC literal (`2024-03-10T05:00:00Z`)
    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// End bound as an RFC 3339 UTC literal
    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start_rfc3339(), self.end_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_window_contains_is_half_open() {
        let window = TimeWindow::new(at(10, 0), at(11, 0));

        assert!(!window.contains(at(9, 59)));
        assert!(window.contains(at(10, 0)));
        assert!(window.contains(at(10, 30)));
        assert!(!window.contains(at(11, 0)));
    }

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(TimeWindow::try_new(at(10, 0), at(10, 0)).is_none());
        assert!(TimeWindow::try_new(at(11, 0), at(10, 0)).is_none());
    }

    #[test]
    fn test_trailing_and_display() {
        let window = TimeWindow::trailing(at(12, 0), Duration::hours(24));
        assert_eq!(window.duration(), Duration::hours(24));
        assert_eq!(
            window.to_string(),
            "[2024-04-30T12:00:00Z, 2024-05-01T12:00:00Z)"
        );
    }
}
