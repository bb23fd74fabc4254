//! Reference month, pay period and holiday models.
//!
//! The benefit is bought for a reference month but prorations are measured
//! against a pay period that straddles two months: from the anchor day of the
//! previous month to the day before the anchor in the reference month.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The month a benefit run is computed for.
///
/// # Example
///
/// ```
/// use vr_engine::models::ReferenceMonth;
///
/// let may = ReferenceMonth::new(5, 2025).unwrap();
/// assert_eq!(may.competence(), "05/2025");
/// assert!(ReferenceMonth::new(13, 2025).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMonth {
    /// Month number, 1-12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
}

impl ReferenceMonth {
    /// Creates a reference month, rejecting impossible months.
    ///
    /// The month after it must also be representable, so December of the
    /// last year chrono supports is rejected.
    pub fn new(month: u32, year: i32) -> EngineResult<Self> {
        let reference = Self { month, year };
        let representable = NaiveDate::from_ymd_opt(year, month, 1).is_some() && {
            let (next_year, next_month) = reference.next();
            NaiveDate::from_ymd_opt(next_year, next_month, 1).is_some()
        };
        if !representable {
            return Err(EngineError::InvalidReferenceMonth { month, year });
        }
        Ok(reference)
    }

    /// Returns the first day of the month.
    ///
    /// Months built with [`ReferenceMonth::new`] always have one; the
    /// fallback only covers values assembled field by field.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Returns the last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = self.next();
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    /// Checks whether `date` falls in this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Returns the `MM/YYYY` label used in supplier reports.
    pub fn competence(&self) -> String {
        format!("{:02}/{}", self.month, self.year)
    }

    fn previous(&self) -> (i32, u32) {
        if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        }
    }

    fn next(&self) -> (i32, u32) {
        if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }
}

/// The pay period prorations are measured against.
///
/// # Example
///
/// ```
/// use vr_engine::models::{PayPeriod, ReferenceMonth};
/// use chrono::NaiveDate;
///
/// let may = ReferenceMonth::new(5, 2025).unwrap();
/// let period = PayPeriod::for_reference(may, 16).unwrap();
///
/// assert_eq!(period.start_date, NaiveDate::from_ymd_opt(2025, 4, 16).unwrap());
/// assert_eq!(period.end_date, NaiveDate::from_ymd_opt(2025, 5, 15).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The reference month this period closes.
    pub reference: ReferenceMonth,
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
}

impl PayPeriod {
    /// Builds the pay period for `reference` with the given anchor day.
    ///
    /// The anchor must lie in 2..=28 so both boundaries exist in every month.
    pub fn for_reference(reference: ReferenceMonth, anchor_day: u32) -> EngineResult<Self> {
        if !(2..=28).contains(&anchor_day) {
            return Err(EngineError::InvalidConfig {
                field: "calendar.pay_period_anchor_day".to_string(),
                message: format!("must be between 2 and 28, got {}", anchor_day),
            });
        }

        let (prev_year, prev_month) = reference.previous();
        let start_date = NaiveDate::from_ymd_opt(prev_year, prev_month, anchor_day);
        let end_date = NaiveDate::from_ymd_opt(reference.year, reference.month, anchor_day - 1);

        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) => Ok(Self {
                reference,
                start_date,
                end_date,
            }),
            _ => Err(EngineError::InvalidReferenceMonth {
                month: reference.month,
                year: reference.year,
            }),
        }
    }

    /// Checks if a given date falls within this pay period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// A public holiday.
///
/// # Example
///
/// ```
/// use vr_engine::models::Holiday;
/// use chrono::NaiveDate;
///
/// let holiday = Holiday {
///     date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
///     name: "Dia do Trabalho".to_string(),
///     region: "national".to_string(),
/// };
/// assert!(holiday.applies_to(Some("SP")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub name: String,
    /// `national`, or the two-letter state code where it applies.
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "national".to_string()
}

impl Holiday {
    /// Returns true if this holiday applies to an employee in `region`.
    pub fn applies_to(&self, region: Option<&str>) -> bool {
        if self.region.eq_ignore_ascii_case("national") {
            return true;
        }
        region.is_some_and(|r| r.eq_ignore_ascii_case(&self.region))
    }
}
