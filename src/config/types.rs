//! Configuration types for benefit runs.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML files of a configuration directory.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{Field, Holiday, Role};
use crate::report::ReportField;

fn default_decimal_places() -> u32 {
    2
}

/// How the total benefit is split between employer and employee.
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationConfig {
    /// Share of the total paid by the employer (e.g. 0.80).
    pub employer_share: Decimal,
    /// Share of the total discounted from the employee (e.g. 0.20).
    pub employee_share: Decimal,
    /// Decimal places monetary values are rounded to.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

/// Calendar anchors for prorations.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// Day of the previous month the pay period starts on.
    pub pay_period_anchor_day: u32,
    /// Last day of the reference month on which a notified termination
    /// cancels the benefit.
    pub termination_cutoff_day: u32,
}

/// Eligibility exclusions.
#[derive(Debug, Clone, Deserialize)]
pub struct ExclusionConfig {
    /// Tables whose employee IDs are removed from the roster.
    pub source_roles: Vec<Role>,
    /// Roster fields compared against the title denylist.
    pub title_fields: Vec<Field>,
    /// Job titles that are never eligible (exact, case-sensitive).
    #[serde(default)]
    pub denied_titles: Vec<String>,
}

/// Engine settings from engine.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// A label for logs and reports.
    pub name: String,
    /// Cost split.
    pub valuation: ValuationConfig,
    /// Pay period and cutoff days.
    pub calendar: CalendarConfig,
    /// Exclusion rules.
    pub exclusions: ExclusionConfig,
}

/// Header aliases from columns.yaml.
///
/// Aliases are written as normalized headers (`DATA_DEMISSAO`), so the match
/// is insensitive to case, accents and spacing in the source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnAliases {
    /// Canonical field to the normalized headers that mean it.
    pub aliases: HashMap<Field, Vec<String>>,
}

/// Where one input role comes from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// File name inside the input directory.
    #[serde(default)]
    pub file: Option<String>,
    /// Zero-based row holding the headers.
    #[serde(default)]
    pub header_row: usize,
    /// Lowercase, accent-free keywords that identify the role in a file name.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Input and output locations from sources.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Default input directory.
    pub input_dir: String,
    /// Default report path (.xlsx or .csv).
    pub output_file: String,
    /// Per-role source settings.
    pub sources: BTreeMap<Role, SourceConfig>,
}

/// One template column mapped to a computed field.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportColumnMapping {
    /// The template column header.
    pub column: String,
    /// The computed value that fills it.
    pub field: ReportField,
}

/// Report layout from report.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Columns used when no template table is available.
    pub fallback_columns: Vec<String>,
    /// Template column mappings.
    pub mapping: Vec<ReportColumnMapping>,
}

/// Holiday list file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayFile {
    /// The holidays in this file.
    pub holidays: Vec<Holiday>,
}

/// The complete configuration loaded from a configuration directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    settings: EngineSettings,
    columns: ColumnAliases,
    sources: SourcesConfig,
    report: ReportConfig,
    /// Holidays sorted by date.
    holidays: Vec<Holiday>,
}

impl EngineConfig {
    /// Creates a configuration from its parts, validating cross-field rules.
    pub fn new(
        settings: EngineSettings,
        columns: ColumnAliases,
        sources: SourcesConfig,
        report: ReportConfig,
        holidays: Vec<Holiday>,
    ) -> EngineResult<Self> {
        let valuation = &settings.valuation;
        if valuation.employer_share < Decimal::ZERO || valuation.employee_share < Decimal::ZERO {
            return Err(EngineError::InvalidConfig {
                field: "valuation".to_string(),
                message: "shares cannot be negative".to_string(),
            });
        }
        if valuation.employer_share + valuation.employee_share != Decimal::ONE {
            return Err(EngineError::InvalidConfig {
                field: "valuation".to_string(),
                message: format!(
                    "employer_share + employee_share must equal 1, got {} + {}",
                    valuation.employer_share, valuation.employee_share
                ),
            });
        }

        let calendar = &settings.calendar;
        if !(2..=28).contains(&calendar.pay_period_anchor_day) {
            return Err(EngineError::InvalidConfig {
                field: "calendar.pay_period_anchor_day".to_string(),
                message: format!(
                    "must be between 2 and 28, got {}",
                    calendar.pay_period_anchor_day
                ),
            });
        }
        if !(1..=31).contains(&calendar.termination_cutoff_day) {
            return Err(EngineError::InvalidConfig {
                field: "calendar.termination_cutoff_day".to_string(),
                message: format!(
                    "must be between 1 and 31, got {}",
                    calendar.termination_cutoff_day
                ),
            });
        }

        if let Some(role) = settings
            .exclusions
            .source_roles
            .iter()
            .find(|r| !matches!(r, Role::Interns | Role::Apprentices | Role::Leave | Role::Overseas))
        {
            return Err(EngineError::InvalidConfig {
                field: "exclusions.source_roles".to_string(),
                message: format!("'{}' is not an exclusion table", role),
            });
        }

        let mut holidays = holidays;
        holidays.sort_by(|a, b| a.date.cmp(&b.date));

        Ok(Self {
            settings,
            columns,
            sources,
            report,
            holidays,
        })
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the header alias table.
    pub fn columns(&self) -> &ColumnAliases {
        &self.columns
    }

    /// Returns the input/output source settings.
    pub fn sources(&self) -> &SourcesConfig {
        &self.sources
    }

    /// Returns the report layout.
    pub fn report(&self) -> &ReportConfig {
        &self.report
    }

    /// Returns all configured holidays, sorted by date.
    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }
}
