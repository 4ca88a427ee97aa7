//! Local civil time resolution
//!
//! Converts `YYYY-MM-DD` calendar dates in a fixed named zone into UTC query
//! windows, and formats UTC instants back into the local labels used by the
//! dashboard views.
//!
//! Window starts are computed by constructing the local wall-clock midnight
//! in the zone and converting it, never by subtracting a fixed offset. A
//! single-day range is always 24 hours from that midnight; multi-day ranges
//! end at the local midnight after their last day.

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use super::TimeWindow;

/// Calendar date input format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Label format for clock-time series points ("14:30")
pub const CLOCK_LABEL_FORMAT: &str = "%H:%M";

/// Label format for day-scoped points ("Mar 09")
pub const DAY_LABEL_FORMAT: &str = "%b %d";

/// Label format for workout start times ("2024-03-09 07:15")
pub const TIMESTAMP_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A date string that is not a valid `YYYY-MM-DD` calendar date
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid date '{input}': expected YYYY-MM-DD")]
pub struct InvalidDate {
    pub input: String,
}

impl InvalidDate {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Resolves calendar dates in one local zone into UTC windows
#[derive(Debug, Clone, Copy)]
pub struct ZoneResolver {
    tz: Tz,
}

impl Default for ZoneResolver {
    fn default() -> Self {
        Self::new(chrono_tz::America::New_York)
    }
}

impl ZoneResolver {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Create a resolver from an IANA zone name such as "America/New_York"
    pub fn from_name(name: &str) -> Result<Self, String> {
        let tz: Tz = name.parse().map_err(|e| format!("{}", e))?;
        Ok(Self::new(tz))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Parse a `YYYY-MM-DD` date string
    pub fn parse_date(input: &str) -> Result<NaiveDate, InvalidDate> {
        NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| InvalidDate::new(input))
    }

    /// `[local midnight of date, local midnight + 24h)` in UTC
    ///
    /// The span is 24 hours even on DST transition days.
    pub fn day_range(&self, date: &str) -> Result<TimeWindow, InvalidDate> {
        let day = Self::parse_date(date)?;
        self.day_window(day).ok_or_else(|| InvalidDate::new(date))
    }

    /// Window covering exactly `days` local calendar days, the last of which is `date`
    pub fn days_range_ending_at(&self, date: &str, days: u32) -> Result<TimeWindow, InvalidDate> {
        let end = Self::parse_date(date)?;
        self.days_window_ending_at(end, days)
            .ok_or_else(|| InvalidDate::new(date))
    }

    /// Single local day as a 24-hour UTC window
    pub fn day_window(&self, date: NaiveDate) -> Option<TimeWindow> {
        let start = self.local_midnight(date);
        TimeWindow::try_new(start, start + Duration::hours(24))
    }

    /// `days` local calendar days ending at (and including) `end`
    pub fn days_window_ending_at(&self, end: NaiveDate, days: u32) -> Option<TimeWindow> {
        let span = u64::from(days.max(1) - 1);
        let first = end.checked_sub_days(Days::new(span))?;
        let after_last = end.checked_add_days(Days::new(1))?;
        TimeWindow::try_new(self.local_midnight(first), self.local_midnight(after_last))
    }

    /// First instant of the local calendar day, in UTC
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        let mut probe = midnight;

        // A DST gap can swallow local midnight; the day then starts at the
        // first wall-clock instant that exists after the gap.
        for _ in 0..=96 {
            match self.tz.from_local_datetime(&probe) {
                LocalResult::Single(t) => return t.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
                LocalResult::None => probe += Duration::minutes(15),
            }
        }

        Utc.from_utc_datetime(&midnight)
    }

    /// Local calendar date containing the instant
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Today's local date as of `now`
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_date(now)
    }

    /// Local wall-clock "HH:MM"
    pub fn clock_label(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format(CLOCK_LABEL_FORMAT)
            .to_string()
    }

    /// Local "Mon DD"
    pub fn day_label(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format(DAY_LABEL_FORMAT)
            .to_string()
    }

    /// Local "YYYY-MM-DD HH:MM"
    pub fn timestamp_label(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format(TIMESTAMP_LABEL_FORMAT)
            .to_string()
    }
}

/// "Mon DD" label for a calendar date
pub fn date_label(date: NaiveDate) -> String {
    date.format(DAY_LABEL_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn eastern() -> ZoneResolver {
        ZoneResolver::default()
    }

    #[test]
    fn test_day_range_standard_time() {
        let window = eastern().day_range("2024-01-15").unwrap();

        assert_eq!(window.start, utc(2024, 1, 15, 5, 0));
        assert_eq!(window.end, utc(2024, 1, 16, 5, 0));
        assert_eq!(window.duration(), Duration::hours(24));
    }

    #[test]
    fn test_day_range_daylight_time() {
        let window = eastern().day_range("2024-07-04").unwrap();

        assert_eq!(window.start, utc(2024, 7, 4, 4, 0));
        assert_eq!(window.end, utc(2024, 7, 5, 4, 0));
    }

    #[test]
    fn test_day_range_spring_forward_is_24_hours() {
        let zone = eastern();
        let window = zone.day_range("2024-03-10").unwrap();

        assert_eq!(window.start, utc(2024, 3, 10, 5, 0));
        assert_eq!(window.end, utc(2024, 3, 11, 5, 0));
        assert_eq!(window.duration(), Duration::hours(24));

        let local_start = window.start.with_timezone(&zone.tz());
        assert_eq!(local_start.time(), NaiveTime::MIN);
        assert_eq!(local_start.date_naive().to_string(), "2024-03-10");
    }

    #[test]
    fn test_day_range_fall_back_is_24_hours() {
        let window = eastern().day_range("2024-11-03").unwrap();

        assert_eq!(window.start, utc(2024, 11, 3, 4, 0));
        assert_eq!(window.end, utc(2024, 11, 4, 4, 0));
        assert_eq!(window.duration(), Duration::hours(24));
    }

    #[test]
    fn test_days_range_spans_n_local_days() {
        let zone = eastern();
        for days in [1u32, 7, 30, 37, 90] {
            let window = zone.days_range_ending_at("2024-03-20", days).unwrap();
            let first = zone.local_date(window.start);
            let last = zone.local_date(window.end - Duration::nanoseconds(1));

            assert_eq!(last.to_string(), "2024-03-20");
            assert_eq!((last - first).num_days() + 1, i64::from(days));
            assert_eq!(zone.local_midnight(first), window.start);
        }
    }

    #[test]
    fn test_days_range_ends_at_local_midnight_on_dst_day() {
        let window = eastern().days_range_ending_at("2024-03-10", 1).unwrap();

        assert_eq!(window.start, utc(2024, 3, 10, 5, 0));
        assert_eq!(window.end, utc(2024, 3, 11, 4, 0));
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        let zone = eastern();
        for input in ["", "yesterday", "2024-13-01", "2024-02-30", "03/10/2024"] {
            let err = zone.day_range(input).unwrap_err();
            assert_eq!(err.input, input);
        }
        assert!(zone.days_range_ending_at("nope", 30).is_err());
    }

    #[test]
    fn test_labels_use_local_zone() {
        let zone = eastern();
        let instant = utc(2024, 3, 10, 3, 30); // 22:30 on Mar 09 in New York

        assert_eq!(zone.clock_label(instant), "22:30");
        assert_eq!(zone.day_label(instant), "Mar 09");
        assert_eq!(zone.timestamp_label(instant), "2024-03-09 22:30");
        assert_eq!(zone.local_date(instant).to_string(), "2024-03-09");
    }

    #[test]
    fn test_midnight_inside_dst_gap() {
        // Santiago springs forward at local midnight
        let zone = ZoneResolver::from_name("America/Santiago").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
        let start = zone.local_midnight(date);

        let local = start.with_timezone(&zone.tz());
        assert_eq!(local.date_naive(), date);
        assert_eq!(local.time(), NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    }

    #[test]
    fn test_from_name_rejects_unknown_zone() {
        assert!(ZoneResolver::from_name("Mars/Olympus_Mons").is_err());
    }
}
