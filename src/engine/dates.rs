//! Calendar-day arithmetic for deriving owed prayer counts.
//!
//! Time-zone-naive: everything works on `NaiveDate`, so "a day" is a calendar
//! day regardless of DST or clock time. Malformed date strings are rejected
//! by callers before any of these functions run.

use chrono::{Datelike, NaiveDate, Weekday};

/// Number of calendar days from `start` to `end`, both inclusive.
/// Returns 0 when `end < start`.
pub fn inclusive_day_span(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        0
    } else {
        (end - start).num_days() as u32 + 1
    }
}

/// How many times `weekday` occurs within the inclusive span.
/// Returns 0 when `start > end`.
pub fn count_weekday(start: NaiveDate, end: NaiveDate, weekday: Weekday) -> u32 {
    let span = inclusive_day_span(start, end);
    if span == 0 {
        return 0;
    }
    // Offset from `start` to the first occurrence of `weekday`.
    let offset =
        (7 + weekday.num_days_from_monday() - start.weekday().num_days_from_monday()) % 7;
    if offset >= span {
        0
    } else {
        (span - offset - 1) / 7 + 1
    }
}

/// Estimated days to exclude for a recurring monthly-style exclusion:
/// `days_per_cycle` out of every `cycle_length_days`, scaled to the span.
///
/// Integer floor keeps the estimate monotone in both the span length and
/// `days_per_cycle`, and it is 0 whenever either input is 0.
pub fn count_recurring_period_days(
    start: NaiveDate,
    end: NaiveDate,
    days_per_cycle: u32,
    cycle_length_days: u32,
) -> u32 {
    if days_per_cycle == 0 || cycle_length_days == 0 {
        return 0;
    }
    let span = inclusive_day_span(start, end) as u64;
    (span * days_per_cycle as u64 / cycle_length_days as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn span_is_inclusive() {
        assert_eq!(inclusive_day_span(d("2024-01-01"), d("2024-01-01")), 1);
        assert_eq!(inclusive_day_span(d("2024-01-01"), d("2024-01-10")), 10);
        assert_eq!(inclusive_day_span(d("2024-01-01"), d("2024-12-31")), 366);
    }

    #[test]
    fn span_is_zero_when_reversed() {
        assert_eq!(inclusive_day_span(d("2024-01-10"), d("2024-01-01")), 0);
    }

    #[test]
    fn counts_fridays() {
        // 2024-01-05 is a Friday.
        assert_eq!(count_weekday(d("2024-01-05"), d("2024-01-05"), Weekday::Fri), 1);
        assert_eq!(count_weekday(d("2024-01-01"), d("2024-01-04"), Weekday::Fri), 0);
        // Jan 2024 has Fridays on the 5th, 12th, 19th, 26th.
        assert_eq!(count_weekday(d("2024-01-01"), d("2024-01-31"), Weekday::Fri), 4);
        // A full year of Mondays.
        assert_eq!(count_weekday(d("2024-01-01"), d("2024-12-30"), Weekday::Mon), 53);
    }

    #[test]
    fn weekday_count_zero_when_reversed() {
        assert_eq!(count_weekday(d("2024-01-10"), d("2024-01-01"), Weekday::Fri), 0);
    }

    #[test]
    fn weekday_count_grows_with_span() {
        let start = d("2024-01-01");
        let mut prev = 0;
        for days in 0..60 {
            let end = start + chrono::Duration::days(days);
            let n = count_weekday(start, end, Weekday::Fri);
            assert!(n >= prev, "count shrank when span grew");
            prev = n;
        }
    }

    #[test]
    fn recurring_period_is_proportional() {
        // 30-day span, 7 days per 30-day cycle -> exactly 7.
        assert_eq!(
            count_recurring_period_days(d("2024-01-01"), d("2024-01-30"), 7, 30),
            7
        );
        // 60-day span doubles it.
        assert_eq!(
            count_recurring_period_days(d("2024-01-01"), d("2024-02-29"), 7, 30),
            14
        );
        // Short span floors to 0 rather than over-excluding.
        assert_eq!(
            count_recurring_period_days(d("2024-01-01"), d("2024-01-03"), 7, 30),
            0
        );
    }

    #[test]
    fn recurring_period_zero_inputs() {
        assert_eq!(
            count_recurring_period_days(d("2024-01-01"), d("2024-12-31"), 0, 30),
            0
        );
        assert_eq!(
            count_recurring_period_days(d("2024-01-01"), d("2024-12-31"), 7, 0),
            0
        );
        assert_eq!(
            count_recurring_period_days(d("2024-01-10"), d("2024-01-01"), 7, 30),
            0
        );
    }

    #[test]
    fn recurring_period_monotone_in_days_per_cycle() {
        let (s, e) = (d("2024-01-01"), d("2024-03-31"));
        let mut prev = 0;
        for days in 0..=15 {
            let n = count_recurring_period_days(s, e, days, 30);
            assert!(n >= prev);
            prev = n;
        }
    }
}
