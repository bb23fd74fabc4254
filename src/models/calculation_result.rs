//! Calculation result models for the VR engine.
//!
//! This module contains the [`CalculationRun`] type and its associated
//! structures that capture all outputs from a monthly benefit run, including
//! per-employee benefits, exclusions, totals and an audit trace.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PayPeriod, ReferenceMonth};

/// Which rule decided an employee's payable days.
///
/// Listed from lowest to highest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayableDaysRule {
    /// Union working days minus vacation.
    Base,
    /// Admitted during the pay period: weekdays from admission to period end.
    AdmissionProration,
    /// Terminated in the reference month after the cutoff or without notice.
    TerminationProration,
    /// Terminated with notice on or before the cutoff day: nothing is paid.
    TerminationNoPay,
}

impl PayableDaysRule {
    /// Returns a short human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            PayableDaysRule::Base => "Dias úteis do sindicato menos férias",
            PayableDaysRule::AdmissionProration => "Admissão proporcional",
            PayableDaysRule::TerminationProration => "Desligamento proporcional",
            PayableDaysRule::TerminationNoPay => "Desligamento comunicado até o dia limite",
        }
    }
}

/// Why an employee was left out of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Listed in the interns table.
    Intern,
    /// Listed in the apprentices table.
    Apprentice,
    /// Listed in the leave-of-absence table.
    Leave,
    /// Listed in the overseas table.
    Overseas,
    /// Job title is on the denylist.
    DeniedTitle,
}

/// An employee removed from the roster and the reasons why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedEmployee {
    /// The employee ID.
    pub employee_id: String,
    /// Every reason that matched, in the order they were found.
    pub reasons: Vec<ExclusionReason>,
}

/// A single step in the calculation audit trail.
///
/// Each step records one rule decision with its inputs, outputs, and
/// reasoning.
///
/// # Example
///
/// ```
/// use vr_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "base_working_days".to_string(),
///     rule_name: "Base Working Days".to_string(),
///     input: serde_json::json!({ "union_key": "SINDPDSP" }),
///     output: serde_json::json!({ "working_days": "21" }),
///     reasoning: "Union working days for the month: 21".to_string(),
/// };
/// assert_eq!(step.step_number, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The step number in the calculation sequence.
    pub step_number: u32,
    /// A unique identifier for the rule applied.
    pub rule_id: String,
    /// A human-readable name for the rule.
    pub rule_name: String,
    /// The input values used in this step.
    pub input: serde_json::Value,
    /// The output values produced by this step.
    pub output: serde_json::Value,
    /// An explanation of the calculation logic.
    pub reasoning: String,
}

/// A data-quality warning raised during a run.
///
/// Warnings never stop the run; they flag records a human should review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable warning message.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
    /// The employee concerned, when the warning is about one record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

impl AuditWarning {
    /// Creates a warning that is not tied to one employee.
    pub fn new(code: &str, message: impl Into<String>, severity: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: severity.to_string(),
            employee_id: None,
        }
    }

    /// Creates a warning about one employee.
    pub fn for_employee(
        code: &str,
        message: impl Into<String>,
        severity: &str,
        employee_id: &str,
    ) -> Self {
        Self {
            employee_id: Some(employee_id.to_string()),
            ..Self::new(code, message, severity)
        }
    }
}

/// The computed benefit for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeBenefit {
    /// The employee ID.
    pub employee_id: String,
    /// Full name, when known.
    pub name: Option<String>,
    /// Job title, when known.
    pub job_title: Option<String>,
    /// Union name as written in the roster.
    pub union_name: Option<String>,
    /// State code derived from the union name.
    pub state_code: Option<String>,
    /// Admission date, when known.
    pub admission_date: Option<NaiveDate>,
    /// Termination date, when known.
    pub termination_date: Option<NaiveDate>,
    /// Union working days for the month (0 when the union is unmatched).
    pub working_days: Decimal,
    /// Vacation days counted against the month.
    pub vacation_days: Decimal,
    /// Benefit-eligible days.
    pub payable_days: Decimal,
    /// The rule that decided `payable_days`.
    pub rule: PayableDaysRule,
    /// Daily benefit value for the employee's state.
    pub daily_rate: Decimal,
    /// `payable_days × daily_rate`, rounded.
    pub total_value: Decimal,
    /// Employer share of the total.
    pub employer_cost: Decimal,
    /// Employee share of the total.
    pub employee_cost: Decimal,
    /// The audit trail for this employee.
    pub audit_steps: Vec<AuditStep>,
}

/// Aggregated totals for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Number of employees with a computed benefit.
    pub employees: usize,
    /// Number of employees removed by exclusion rules.
    pub excluded: usize,
    /// Sum of payable days.
    pub payable_days: Decimal,
    /// Sum of total values.
    pub total_value: Decimal,
    /// Sum of employer costs.
    pub employer_cost: Decimal,
    /// Sum of employee costs.
    pub employee_cost: Decimal,
}

impl RunTotals {
    /// Sums the given benefits.
    pub fn from_benefits(benefits: &[EmployeeBenefit], excluded: usize) -> Self {
        Self {
            employees: benefits.len(),
            excluded,
            payable_days: benefits.iter().map(|b| b.payable_days).sum(),
            total_value: benefits.iter().map(|b| b.total_value).sum(),
            employer_cost: benefits.iter().map(|b| b.employer_cost).sum(),
            employee_cost: benefits.iter().map(|b| b.employee_cost).sum(),
        }
    }
}

/// The complete result of a monthly benefit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRun {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the run was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that produced the run.
    pub engine_version: String,
    /// The reference month.
    pub reference: ReferenceMonth,
    /// The pay period used for prorations.
    pub pay_period: PayPeriod,
    /// One entry per employee on the final roster, in roster order.
    pub benefits: Vec<EmployeeBenefit>,
    /// Employees removed by exclusion rules.
    pub excluded: Vec<ExcludedEmployee>,
    /// Aggregated totals.
    pub totals: RunTotals,
    /// Data-quality warnings.
    pub warnings: Vec<AuditWarning>,
    /// The total run duration in microseconds.
    pub duration_us: u64,
}
