use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DateError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date from `YYYY-MM-DD` or an ISO timestamp.
///
/// Timestamps are converted to UTC before the date part is taken, so
/// `2024-03-01T23:30:00-02:00` lands on March 2nd.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.date());
    }
    Err(DateError::Invalid(trimmed.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Inclusive `[start, end]` span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if end < start {
            return Err(DateError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DateError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Number of calendar days covered, counting both endpoints.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Touching endpoints count as overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// The iterator owns its bounds, so it can outlive a temporary range.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        self.start.iter_days().take(self.span_days() as usize)
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("next year date should be valid")
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).expect("next month date should be valid")
    };
    (first_of_next - Duration::days(1)).day()
}

pub fn first_day_of_month(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), day.month(), 1).expect("first day of month must be valid")
}

pub fn last_day_of_month(day: NaiveDate) -> NaiveDate {
    let last = days_in_month(day.year(), day.month());
    NaiveDate::from_ymd_opt(day.year(), day.month(), last).expect("last day of month must be valid")
}

pub fn first_day_of_year(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), 1, 1).expect("January 1st must be valid")
}

pub fn last_day_of_year(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), 12, 31).expect("December 31st must be valid")
}

/// Saturday closing the Sunday-based week that contains `day`.
pub fn end_of_week(day: NaiveDate) -> NaiveDate {
    let days_from_sunday = day.weekday().num_days_from_sunday() as i64;
    day + Duration::days(6 - days_from_sunday)
}

pub fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
    let mut year = day.year();
    let mut month = day.month() as i32 + delta;
    while month > 12 {
        year += 1;
        month -= 12;
    }
    while month < 1 {
        year -= 1;
        month += 12;
    }
    let month_u32 = month as u32;
    let max_day = days_in_month(year, month_u32);
    let target_day = day.day().min(max_day);
    NaiveDate::from_ymd_opt(year, month_u32, target_day).expect("shifted month date must be valid")
}

pub fn shift_year(day: NaiveDate, delta: i32) -> NaiveDate {
    shift_month(day, delta * 12)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{DateRange, end_of_week, last_day_of_month, parse_date, shift_month};
    use crate::error::DateError;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_plain_dates_and_timestamps() {
        assert_eq!(parse_date("2024-01-05").unwrap(), day(2024, 1, 5));
        assert_eq!(parse_date(" 2024-01-05 ").unwrap(), day(2024, 1, 5));
        assert_eq!(parse_date("2024-01-05T10:00:00Z").unwrap(), day(2024, 1, 5));
        assert_eq!(parse_date("2024-03-01T23:30:00-02:00").unwrap(), day(2024, 3, 2));
        assert_eq!(parse_date("2024-01-05T10:00:00.000").unwrap(), day(2024, 1, 5));
        assert!(matches!(parse_date("not a date"), Err(DateError::Invalid(_))));
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn rejects_reversed_ranges() {
        let err = DateRange::new(day(2024, 1, 10), day(2024, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            DateError::Reversed {
                start: day(2024, 1, 10),
                end: day(2024, 1, 1)
            }
        );
    }

    #[test]
    fn single_day_range_spans_one_day() {
        let range = DateRange::new(day(2024, 6, 1), day(2024, 6, 1)).unwrap();
        assert_eq!(range.span_days(), 1);
        assert_eq!(range.days().collect::<Vec<_>>(), vec![day(2024, 6, 1)]);
    }

    #[test]
    fn days_outlive_a_temporary_range() {
        let bounds = [(day(2024, 1, 30), day(2024, 2, 1)), (day(2024, 2, 1), day(2024, 2, 2))];
        let days = bounds
            .iter()
            .flat_map(|(start, end)| DateRange::new(*start, *end).unwrap().days())
            .collect::<Vec<_>>();
        assert_eq!(
            days,
            vec![day(2024, 1, 30), day(2024, 1, 31), day(2024, 2, 1), day(2024, 2, 1), day(2024, 2, 2)]
        );
    }

    #[test]
    fn touching_ranges_overlap() {
        let left = DateRange::new(day(2024, 1, 1), day(2024, 1, 5)).unwrap();
        let right = DateRange::new(day(2024, 1, 5), day(2024, 1, 9)).unwrap();
        let apart = DateRange::new(day(2024, 1, 6), day(2024, 1, 9)).unwrap();
        assert!(left.overlaps(&right));
        assert!(right.overlaps(&left));
        assert!(!left.overlaps(&apart));
    }

    #[test]
    fn week_ends_on_saturday() {
        // 2024-05-15 is a Wednesday.
        assert_eq!(end_of_week(day(2024, 5, 15)), day(2024, 5, 18));
        assert_eq!(end_of_week(day(2024, 5, 18)), day(2024, 5, 18));
        assert_eq!(end_of_week(day(2024, 5, 19)), day(2024, 5, 25));
    }

    #[test]
    fn month_helpers_handle_leap_years() {
        assert_eq!(last_day_of_month(day(2024, 2, 10)), day(2024, 2, 29));
        assert_eq!(last_day_of_month(day(2023, 12, 1)), day(2023, 12, 31));
        assert_eq!(shift_month(day(2024, 1, 31), 1), day(2024, 2, 29));
        assert_eq!(shift_month(day(2024, 1, 15), -1), day(2023, 12, 15));
    }
}
