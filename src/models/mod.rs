//! Core data models for the VR engine.
//!
//! This module contains all the domain models used throughout the engine.

mod calculation_result;
mod employee;
mod pay_period;
mod table;

pub use calculation_result::{
    AuditStep, AuditWarning, CalculationRun, EmployeeBenefit, ExcludedEmployee, ExclusionReason,
    PayableDaysRule, RunTotals,
};
pub use employee::{EmployeeRecord, NoticeStatus, Termination, VacationTaken};
pub use pay_period::{Holiday, PayPeriod, ReferenceMonth};
pub use table::{Column, Dataset, Field, Role, Table};
