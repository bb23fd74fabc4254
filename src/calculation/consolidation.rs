//! Roster consolidation.
//!
//! The run's roster is the active employees plus those admitted during the
//! month. The two sheets overlap (an employee admitted last month may appear in
//! both) and carry different columns, so they are merged column-wise and
//! deduplicated by employee ID.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditWarning, Column, Field, Role, Table};

/// The consolidated roster and the issues found while building it.
#[derive(Debug, Clone)]
pub struct ConsolidationResult {
    /// One row per employee ID, active rows first.
    pub roster: Table,
    /// Rows dropped as duplicates of an earlier ID.
    pub duplicates: usize,
    /// Data-quality warnings (rows without an ID, missing admissions sheet).
    pub warnings: Vec<AuditWarning>,
}

/// Merges the active and admitted rosters.
///
/// Columns are every active column in order, followed by the admission
/// columns whose [`Column::key`] the active table lacks. Rows keep the first occurrence of each employee ID, so an
/// active row always wins over an admission row. Rows without an ID are
/// skipped.
///
/// # Errors
///
/// Returns [`EngineError::MissingBaseRoster`] when the active roster is
/// absent or empty, and [`EngineError::MissingColumn`] when it has no
/// employee ID column.
///
/// # Examples
///
/// ```
/// use vr_engine::calculation::consolidate_roster;
/// use vr_engine::models::{Column, Field, Table};
///
/// let column = |name: &str, field| Column {
///     raw: name.to_string(),
///     name: name.to_string(),
///     field,
/// };
/// let active = Table::new(
///     vec![column("MATRICULA", Some(Field::EmployeeId))],
///     vec![vec!["1001".to_string()], vec!["1002".to_string()]],
/// );
/// let admissions = Table::new(
///     vec![
///         column("MATRICULA", Some(Field::EmployeeId)),
///         column("ADMISSAO", Some(Field::AdmissionDate)),
///     ],
///     vec![
///         vec!["1002".to_string(), "2025-04-20".to_string()],
///         vec!["1003".to_string(), "2025-04-28".to_string()],
///     ],
/// );
///
/// let result = consolidate_roster(Some(&active), Some(&admissions)).unwrap();
/// assert_eq!(result.roster.len(), 3);
/// assert_eq!(result.duplicates, 1);
/// ```
pub fn consolidate_roster(
    active: Option<&Table>,
    admissions: Option<&Table>,
) -> EngineResult<ConsolidationResult> {
    let active = active
        .filter(|t| !t.is_empty())
        .ok_or_else(|| EngineError::MissingBaseRoster {
            role: Role::Active.to_string(),
        })?;
    if !active.has_field(Field::EmployeeId) {
        return Err(EngineError::MissingColumn {
            table: Role::Active.to_string(),
            column: Field::EmployeeId.to_string(),
        });
    }

    let mut warnings = Vec::new();
    let admissions = match admissions {
        Some(table) if table.has_field(Field::EmployeeId) => Some(table),
        Some(_) => {
            warn!("Admissions table has no employee ID column, ignoring it");
            warnings.push(AuditWarning::new(
                "ADMISSIONS_WITHOUT_ID",
                "Admissions table has no employee ID column and was ignored",
                "medium",
            ));
            None
        }
        None => None,
    };

    // Active columns keep their positions, even when two share a key.
    // Admission columns land on the first active column with the same key,
    // or on a new column of their own.
    let mut columns: Vec<Column> = active.columns().to_vec();
    let active_positions: Vec<usize> = (0..columns.len()).collect();
    let mut admission_positions = Vec::new();
    if let Some(table) = admissions {
        for column in table.columns() {
            let position = match active.columns().iter().position(|c| c.key() == column.key()) {
                Some(position) => position,
                None => {
                    columns.push(column.clone());
                    columns.len() - 1
                }
            };
            admission_positions.push(position);
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(active.len());
    let mut duplicates = 0;
    let mut missing_ids = 0;

    let sources = [
        (Role::Active, Some(active), &active_positions),
        (Role::Admissions, admissions, &admission_positions),
    ];
    for (source, table, positions) in sources {
        let Some(table) = table else { continue };

        for row in table.rows() {
            let Some(id) = table.value(row, Field::EmployeeId) else {
                missing_ids += 1;
                warn!(role = %source, "Skipping roster row without employee ID");
                continue;
            };
            if !seen.insert(id.to_string()) {
                duplicates += 1;
                continue;
            }

            let mut merged = vec![String::new(); columns.len()];
            for (cell, &position) in row.iter().zip(positions) {
                merged[position] = cell.clone();
            }
            rows.push(merged);
        }
    }

    if missing_ids > 0 {
        warnings.push(AuditWarning::new(
            "ROSTER_ROW_WITHOUT_ID",
            format!("{} roster rows had no employee ID and were skipped", missing_ids),
            "medium",
        ));
    }

    info!(
        active = active.len(),
        admissions = admissions.map(Table::len).unwrap_or_default(),
        consolidated = rows.len(),
        duplicates,
        "Consolidated roster"
    );

    Ok(ConsolidationResult {
        roster: Table::new(columns, rows),
        duplicates,
        warnings,
    })
}
