//! Business-day arithmetic.
//!
//! This module provides utilities for classifying dates as business days and
//! counting them over inclusive ranges, with holidays resolved per locality.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::Holiday;

/// Returns true for Monday through Friday.
///
/// # Example
///
/// ```
/// use vr_engine::calculation::is_weekday;
/// use chrono::NaiveDate;
///
/// // 2025-05-17 is a Saturday
/// assert!(!is_weekday(NaiveDate::from_ymd_opt(2025, 5, 17).unwrap()));
/// // 2025-05-19 is a Monday
/// assert!(is_weekday(NaiveDate::from_ymd_opt(2025, 5, 19).unwrap()));
/// ```
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts Monday-Friday dates in `start..=end`.
///
/// Returns 0 when `start` is after `end`.
///
/// # Example
///
/// ```
/// use vr_engine::calculation::count_weekdays;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap(); // Monday
/// let end = NaiveDate::from_ymd_opt(2025, 5, 18).unwrap(); // Sunday
/// assert_eq!(count_weekdays(start, end), 5);
/// ```
pub fn count_weekdays(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }

    let days = (end - start).num_days() + 1;
    let full_weeks = days / 7;
    let mut count = full_weeks * 5;

    // Remaining partial week, at most six dates.
    let mut date = start + chrono::Duration::days(full_weeks * 7);
    while date <= end {
        if is_weekday(date) {
            count += 1;
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    count as u32
}

/// Holidays known to a run.
///
/// # Example
///
/// ```
/// use vr_engine::calculation::HolidayCalendar;
/// use vr_engine::models::Holiday;
/// use chrono::NaiveDate;
///
/// let calendar = HolidayCalendar::new(vec![Holiday {
///     date: NaiveDate::from_ymd_opt(2025, 7, 9).unwrap(),
///     name: "Revolução Constitucionalista".to_string(),
///     region: "SP".to_string(),
/// }]);
///
/// let date = NaiveDate::from_ymd_opt(2025, 7, 9).unwrap();
/// assert!(calendar.is_holiday(date, Some("SP")));
/// assert!(!calendar.is_holiday(date, Some("RJ")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: Vec<Holiday>,
}

impl HolidayCalendar {
    /// Creates a calendar from a list of holidays.
    pub fn new(holidays: Vec<Holiday>) -> Self {
        Self { holidays }
    }

    /// Checks if `date` is a holiday for an employee in `region`.
    pub fn is_holiday(&self, date: NaiveDate, region: Option<&str>) -> bool {
        self.holidays
            .iter()
            .any(|h| h.date == date && h.applies_to(region))
    }

    /// Returns the holidays for `region` that fall on weekdays in
    /// `start..=end`, one per date.
    pub fn weekday_holidays(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        region: Option<&str>,
    ) -> Vec<&Holiday> {
        let mut found: Vec<&Holiday> = self
            .holidays
            .iter()
            .filter(|h| h.date >= start && h.date <= end)
            .filter(|h| is_weekday(h.date) && h.applies_to(region))
            .collect();
        found.sort_by_key(|h| h.date);
        found.dedup_by_key(|h| h.date);
        found
    }
}

/// Counts business days in `start..=end`: weekdays that are not holidays for
/// `region`.
pub fn count_business_days(
    start: NaiveDate,
    end: NaiveDate,
    calendar: &HolidayCalendar,
    region: Option<&str>,
) -> u32 {
    let weekdays = count_weekdays(start, end);
    let holidays = calendar.weekday_holidays(start, end, region).len() as u32;
    weekdays.saturating_sub(holidays)
}
