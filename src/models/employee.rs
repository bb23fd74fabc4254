//! Employee model and related types.
//!
//! This module defines the [`EmployeeRecord`] the payable-days calculator
//! works on, together with its termination and vacation details.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether the termination notice was formally given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    /// Notice confirmed ("OK" in the termination sheet).
    Ok,
    /// Some other status was recorded.
    Pending,
    /// Nothing was recorded.
    None,
}

impl NoticeStatus {
    /// Parses the notice cell of the termination sheet.
    ///
    /// # Examples
    ///
    /// ```
    /// use vr_engine::models::NoticeStatus;
    ///
    /// assert_eq!(NoticeStatus::parse(Some(" ok ")), NoticeStatus::Ok);
    /// assert_eq!(NoticeStatus::parse(Some("aguardando")), NoticeStatus::Pending);
    /// assert_eq!(NoticeStatus::parse(None), NoticeStatus::None);
    /// ```
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => NoticeStatus::None,
            Some(v) if v.eq_ignore_ascii_case("ok") => NoticeStatus::Ok,
            Some(_) => NoticeStatus::Pending,
        }
    }
}

/// A termination recorded for an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    /// The last day of employment.
    pub date: NaiveDate,
    /// The notice status.
    pub notice: NoticeStatus,
}

/// Vacation taken by an employee, either as a day count or a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VacationTaken {
    /// A number of days already attributed to the reference month.
    Days {
        /// The day count.
        days: Decimal,
    },
    /// An inclusive date range; only its business days inside the reference
    /// month count.
    Range {
        /// First vacation day.
        start: NaiveDate,
        /// Last vacation day.
        end: NaiveDate,
    },
}

/// An employee on the consolidated roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Unique employee registration number.
    pub id: String,
    /// Full name, when the roster carries it.
    #[serde(default)]
    pub name: Option<String>,
    /// Job title.
    #[serde(default)]
    pub job_title: Option<String>,
    /// Union name as written in the roster.
    #[serde(default)]
    pub union_name: Option<String>,
    /// Admission date, when known and parseable.
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    /// Termination, when the employee is leaving.
    #[serde(default)]
    pub termination: Option<Termination>,
    /// Vacation entries for the reference month.
    #[serde(default)]
    pub vacations: Vec<VacationTaken>,
}

impl EmployeeRecord {
    /// Creates a record with only an ID set.
    ///
    /// # Examples
    ///
    /// ```
    /// use vr_engine::models::EmployeeRecord;
    ///
    /// let employee = EmployeeRecord::new("1001");
    /// assert_eq!(employee.id, "1001");
    /// assert!(employee.termination.is_none());
    /// ```
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            job_title: None,
            union_name: None,
            admission_date: None,
            termination: None,
            vacations: Vec::new(),
        }
    }
}
