//! Supplier report layout.
//!
//! The supplier's template sheet dictates the report's columns and their
//! order. Each template column is filled from a computed [`ReportField`]
//! through the mapping in `report.yaml`; columns the mapping does not know
//! stay empty.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ReportColumnMapping, ReportConfig};
use crate::ingest::normalize_header;
use crate::models::{CalculationRun, Dataset, EmployeeBenefit, Role};

/// A computed value a report column can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportField {
    /// Employee ID.
    EmployeeId,
    /// Employee name.
    Name,
    /// Admission date.
    AdmissionDate,
    /// Termination date.
    TerminationDate,
    /// Union name.
    Union,
    /// State code derived from the union.
    StateCode,
    /// Reference month as `MM/YYYY`.
    Competence,
    /// Union working days.
    WorkingDays,
    /// Vacation days counted.
    VacationDays,
    /// Payable days.
    PayableDays,
    /// Daily benefit value.
    DailyRate,
    /// Total benefit value.
    TotalValue,
    /// Employer cost.
    EmployerCost,
    /// Employee discount.
    EmployeeCost,
    /// The rule that decided the payable days.
    Observation,
}

/// One report cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCell {
    /// Nothing to write.
    Empty,
    /// Free text.
    Text(String),
    /// A number (days or money).
    Number(Decimal),
    /// A calendar date.
    Date(NaiveDate),
}

impl ReportCell {
    /// Renders the cell as plain text, dates as `DD/MM/YYYY`.
    ///
    /// ```
    /// use vr_engine::report::ReportCell;
    /// use chrono::NaiveDate;
    ///
    /// let cell = ReportCell::Date(NaiveDate::from_ymd_opt(2025, 4, 20).unwrap());
    /// assert_eq!(cell.to_text(), "20/04/2025");
    /// assert_eq!(ReportCell::Empty.to_text(), "");
    /// ```
    pub fn to_text(&self) -> String {
        match self {
            ReportCell::Empty => String::new(),
            ReportCell::Text(text) => text.clone(),
            ReportCell::Number(value) => value.to_string(),
            ReportCell::Date(date) => date.format("%d/%m/%Y").to_string(),
        }
    }
}

fn text(value: Option<&String>) -> ReportCell {
    value.map_or(ReportCell::Empty, |v| ReportCell::Text(v.clone()))
}

fn date(value: Option<NaiveDate>) -> ReportCell {
    value.map_or(ReportCell::Empty, ReportCell::Date)
}

impl ReportField {
    /// Extracts this field's value for one benefit.
    pub fn cell(&self, benefit: &EmployeeBenefit, run: &CalculationRun) -> ReportCell {
        match self {
            ReportField::EmployeeId => ReportCell::Text(benefit.employee_id.clone()),
            ReportField::Name => text(benefit.name.as_ref()),
            ReportField::AdmissionDate => date(benefit.admission_date),
            ReportField::TerminationDate => date(benefit.termination_date),
            ReportField::Union => text(benefit.union_name.as_ref()),
            ReportField::StateCode => text(benefit.state_code.as_ref()),
            ReportField::Competence => ReportCell::Text(run.reference.competence()),
            ReportField::WorkingDays => ReportCell::Number(benefit.working_days),
            ReportField::VacationDays => ReportCell::Number(benefit.vacation_days),
            ReportField::PayableDays => ReportCell::Number(benefit.payable_days),
            ReportField::DailyRate => ReportCell::Number(benefit.daily_rate),
            ReportField::TotalValue => ReportCell::Number(benefit.total_value),
            ReportField::EmployerCost => ReportCell::Number(benefit.employer_cost),
            ReportField::EmployeeCost => ReportCell::Number(benefit.employee_cost),
            ReportField::Observation => ReportCell::Text(benefit.rule.label().to_string()),
        }
    }
}

/// A report ready to be written: headers in template order plus rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    /// Column headers exactly as the template spells them.
    pub columns: Vec<String>,
    /// One row per benefit, one cell per column.
    pub rows: Vec<Vec<ReportCell>>,
}

/// Returns the report columns: the template table's headers when a template
/// was provided, the configured fallback otherwise.
pub fn template_columns(dataset: &Dataset, config: &ReportConfig) -> Vec<String> {
    match dataset.get(Role::Template) {
        Some(template) if !template.columns().is_empty() => {
            let columns: Vec<String> = template
                .raw_headers()
                .into_iter()
                .map(|h| h.trim().to_string())
                .collect();
            debug!(columns = columns.len(), "Using template columns");
            columns
        }
        _ => {
            warn!("No template table, using fallback report columns");
            config.fallback_columns.clone()
        }
    }
}

/// Builds the report for a run.
///
/// Template columns are matched to mapping entries by normalized header, so
/// "VALOR DIÁRIO VR" and "Valor diario VR" are the same column.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use vr_engine::calculation::run_calculation;
/// use vr_engine::config::ConfigLoader;
/// use vr_engine::ingest::DatasetLoader;
/// use vr_engine::models::ReferenceMonth;
/// use vr_engine::report::{build_report, template_columns};
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let config = loader.config();
/// let dataset = DatasetLoader::new(config).load_dir(Path::new("data/input"))?;
/// let run = run_calculation(&dataset, config, ReferenceMonth::new(5, 2025)?)?;
///
/// let columns = template_columns(&dataset, config.report());
/// let report = build_report(&run, &columns, &config.report().mapping);
/// assert_eq!(report.columns, columns);
/// # Ok::<(), vr_engine::error::EngineError>(())
/// ```
pub fn build_report(
    run: &CalculationRun,
    columns: &[String],
    mapping: &[ReportColumnMapping],
) -> ReportTable {
    let by_header: HashMap<String, ReportField> = mapping
        .iter()
        .map(|m| (normalize_header(&m.column), m.field))
        .collect();

    let fields: Vec<Option<ReportField>> = columns
        .iter()
        .map(|c| by_header.get(&normalize_header(c)).copied())
        .collect();

    let unmapped: Vec<&str> = columns
        .iter()
        .zip(&fields)
        .filter(|(_, f)| f.is_none())
        .map(|(c, _)| c.as_str())
        .collect();
    if !unmapped.is_empty() {
        debug!(columns = ?unmapped, "Template columns without a mapping are left empty");
    }

    let rows = run
        .benefits
        .iter()
        .map(|benefit| {
            fields
                .iter()
                .map(|field| match field {
                    Some(field) => field.cell(benefit, run),
                    None => ReportCell::Empty,
                })
                .collect()
        })
        .collect();

    ReportTable {
        columns: columns.to_vec(),
        rows,
    }
}
