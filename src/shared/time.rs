//! Calendar helpers for reporting windows.

use chrono::{DateTime, Days, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

/// Half-open `[start, end)` instant range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole UTC days from `first` through `last`, both inclusive.
    pub fn utc_days(first: NaiveDate, last: NaiveDate) -> Self {
        let start = first.and_time(NaiveTime::MIN).and_utc();
        let end = last
            .checked_add_days(Days::new(1))
            .unwrap_or(last)
            .and_time(NaiveTime::MIN)
            .and_utc();
        Self { start, end }
    }

    /// The server-local calendar day containing `now`.
    pub fn local_day(now: DateTime<Utc>) -> Self {
        let day = now.with_timezone(&Local).date_naive();
        let start = local_midnight(day);
        let end = day
            .checked_add_days(Days::new(1))
            .map(local_midnight)
            .unwrap_or(start + Duration::days(1));
        Self { start, end }
    }

    /// The `window` immediately preceding `now`, inclusive of `now`.
    pub fn trailing(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            start: now - window,
            end: now + Duration::milliseconds(1),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Midnight of `day` in server-local time. On a DST gap the earliest valid
/// instant of the day is used.
fn local_midnight(day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => Local
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_days_covers_whole_last_day() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let range = DateRange::utc_days(d, d);
        let inside = "2024-01-01T23:59:59.999Z".parse::<DateTime<Utc>>().unwrap();
        let outside = "2024-01-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert!(range.contains(inside));
        assert!(!range.contains(outside));
    }

    #[test]
    fn local_day_contains_now() {
        let now = Utc::now();
        let range = DateRange::local_day(now);
        assert!(range.contains(now));
        assert!(range.end - range.start >= Duration::hours(23));
    }

    #[test]
    fn trailing_window_includes_now() {
        let now = Utc::now();
        let range = DateRange::trailing(now, Duration::hours(1));
        assert!(range.contains(now));
        assert!(range.contains(now - Duration::minutes(59)));
        assert!(!range.contains(now - Duration::minutes(61)));
    }
}
