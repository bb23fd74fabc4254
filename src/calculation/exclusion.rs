//! Eligibility exclusions.
//!
//! Interns, apprentices, employees on leave and those working overseas do not
//! receive the benefit, nor do holders of denylisted job titles.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::ExclusionConfig;
use crate::models::{AuditWarning, Dataset, ExcludedEmployee, ExclusionReason, Field, Role, Table};

/// The filtered roster and a record of who was removed.
#[derive(Debug, Clone)]
pub struct ExclusionOutcome {
    /// The roster without excluded employees, in original order.
    pub roster: Table,
    /// The excluded employees found on the roster, in roster order.
    pub excluded: Vec<ExcludedEmployee>,
    /// Warnings about exclusion tables that could not be used.
    pub warnings: Vec<AuditWarning>,
}

fn reason_for(role: Role) -> Option<ExclusionReason> {
    match role {
        Role::Interns => Some(ExclusionReason::Intern),
        Role::Apprentices => Some(ExclusionReason::Apprentice),
        Role::Leave => Some(ExclusionReason::Leave),
        Role::Overseas => Some(ExclusionReason::Overseas),
        _ => None,
    }
}

/// Removes ineligible employees from the roster.
///
/// An employee is excluded when their ID appears in any of the configured
/// exclusion tables, or when any configured title field equals a denylisted
/// title exactly (case-sensitive). Exclusion tables that are absent are
/// ignored; those without an ID column are ignored with a warning.
///
/// # Examples
///
/// ```
/// use vr_engine::calculation::apply_exclusions;
/// use vr_engine::config::ExclusionConfig;
/// use vr_engine::models::{Column, Dataset, Field, Role, Table};
///
/// let id_column = || Column {
///     raw: "MATRICULA".to_string(),
///     name: "MATRICULA".to_string(),
///     field: Some(Field::EmployeeId),
/// };
/// let roster = Table::new(
///     vec![id_column()],
///     vec![vec!["1001".to_string()], vec!["1002".to_string()]],
/// );
///
/// let mut dataset = Dataset::new();
/// dataset.insert(Role::Interns, Table::new(vec![id_column()], vec![vec!["1002".to_string()]]));
///
/// let config = ExclusionConfig {
///     source_roles: vec![Role::Interns],
///     title_fields: vec![Field::JobTitle],
///     denied_titles: vec!["DIRETOR".to_string()],
/// };
///
/// let outcome = apply_exclusions(roster, &dataset, &config);
/// assert_eq!(outcome.roster.len(), 1);
/// assert_eq!(outcome.excluded[0].employee_id, "1002");
/// ```
pub fn apply_exclusions(
    mut roster: Table,
    dataset: &Dataset,
    config: &ExclusionConfig,
) -> ExclusionOutcome {
    let mut warnings = Vec::new();
    let mut reasons_by_id: BTreeMap<String, Vec<ExclusionReason>> = BTreeMap::new();

    for &role in &config.source_roles {
        let Some(reason) = reason_for(role) else { continue };
        let Some(table) = dataset.get(role) else { continue };

        if !table.has_field(Field::EmployeeId) {
            warn!(role = %role, "Exclusion table has no employee ID column, skipping");
            warnings.push(AuditWarning::new(
                "EXCLUSION_TABLE_WITHOUT_ID",
                format!("Exclusion table '{}' has no employee ID column and was skipped", role),
                "high",
            ));
            continue;
        }

        for row in table.rows() {
            if let Some(id) = table.value(row, Field::EmployeeId) {
                let reasons = reasons_by_id.entry(id.to_string()).or_default();
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }
        }
    }

    let mut excluded = Vec::new();
    let mut missing_ids = 0;
    let before = roster.len();

    // Collected first so the roster can be filtered with a plain predicate.
    let decisions: Vec<bool> = roster
        .rows()
        .iter()
        .map(|row| {
            let Some(id) = roster.value(row, Field::EmployeeId) else {
                missing_ids += 1;
                return true;
            };

            let mut reasons = reasons_by_id.get(id).cloned().unwrap_or_default();
            let denied = config.title_fields.iter().any(|&field| {
                roster
                    .value(row, field)
                    .is_some_and(|title| config.denied_titles.iter().any(|d| d == title))
            });
            if denied {
                reasons.push(ExclusionReason::DeniedTitle);
            }

            if reasons.is_empty() {
                true
            } else {
                excluded.push(ExcludedEmployee {
                    employee_id: id.to_string(),
                    reasons,
                });
                false
            }
        })
        .collect();

    let mut keep = decisions.into_iter();
    roster.retain_rows(|_| keep.next().unwrap_or(true));

    if missing_ids > 0 {
        warn!(rows = missing_ids, "Roster rows without employee ID kept unfiltered");
    }

    info!(
        before,
        after = roster.len(),
        excluded = excluded.len(),
        "Applied exclusions"
    );

    ExclusionOutcome {
        roster,
        excluded,
        warnings,
    }
}
