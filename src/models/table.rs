//! Normalized tabular data.
//!
//! Every input spreadsheet is loaded into a [`Table`] whose columns have been
//! normalized and, where possible, resolved to a canonical [`Field`]. A
//! [`Dataset`] groups the tables of one monthly run by their [`Role`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical field names the engine understands.
///
/// Raw spreadsheet headers are mapped onto these through the alias table in
/// `columns.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Employee registration number, the unique key.
    EmployeeId,
    /// Employee full name.
    Name,
    /// Job title (e.g. "DIRETOR").
    JobTitle,
    /// Position, a second title column some sheets carry.
    Position,
    /// Union name as free text.
    Union,
    /// Admission date.
    AdmissionDate,
    /// Termination date.
    TerminationDate,
    /// Termination notice status ("OK" when the notice was given).
    TerminationNotice,
    /// Vacation days taken as a count.
    VacationDays,
    /// First day of a vacation range.
    VacationStart,
    /// Last day of a vacation range.
    VacationEnd,
    /// State code or state name.
    State,
    /// Daily benefit value.
    DailyValue,
    /// Official working days in the month.
    WorkingDays,
}

impl Field {
    /// Returns the snake_case name used in configuration and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::EmployeeId => "employee_id",
            Field::Name => "name",
            Field::JobTitle => "job_title",
            Field::Position => "position",
            Field::Union => "union",
            Field::AdmissionDate => "admission_date",
            Field::TerminationDate => "termination_date",
            Field::TerminationNotice => "termination_notice",
            Field::VacationDays => "vacation_days",
            Field::VacationStart => "vacation_start",
            Field::VacationEnd => "vacation_end",
            Field::State => "state",
            Field::DailyValue => "daily_value",
            Field::WorkingDays => "working_days",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role an input table plays in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Active employees, the base roster.
    Active,
    /// Employees admitted during the month.
    Admissions,
    /// Terminated employees with termination date and notice status.
    Terminations,
    /// Vacation records.
    Vacations,
    /// Union/state to daily value table.
    UnionRates,
    /// Union to working days table.
    WorkingDays,
    /// Interns (excluded).
    Interns,
    /// Apprentices (excluded).
    Apprentices,
    /// Employees on leave of absence (excluded).
    Leave,
    /// Employees working overseas (excluded).
    Overseas,
    /// Supplier template that dictates the report columns.
    Template,
}

impl Role {
    /// Every role, in classification order.
    pub const ALL: [Role; 11] = [
        Role::Active,
        Role::Admissions,
        Role::Terminations,
        Role::Vacations,
        Role::UnionRates,
        Role::WorkingDays,
        Role::Interns,
        Role::Apprentices,
        Role::Leave,
        Role::Overseas,
        Role::Template,
    ];

    /// Returns the snake_case role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Active => "active",
            Role::Admissions => "admissions",
            Role::Terminations => "terminations",
            Role::Vacations => "vacations",
            Role::UnionRates => "union_rates",
            Role::WorkingDays => "working_days",
            Role::Interns => "interns",
            Role::Apprentices => "apprentices",
            Role::Leave => "leave",
            Role::Overseas => "overseas",
            Role::Template => "template",
        }
    }

    /// Returns true if a run cannot proceed without this role.
    ///
    /// ```
    /// use vr_engine::models::Role;
    ///
    /// assert!(Role::Active.is_required());
    /// assert!(!Role::Vacations.is_required());
    /// ```
    pub fn is_required(&self) -> bool {
        matches!(self, Role::Active)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table column after header normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// The header exactly as it appeared in the source.
    pub raw: String,
    /// The normalized header (uppercase, accent-free, `_`-separated).
    pub name: String,
    /// The canonical field this column was resolved to, if any.
    pub field: Option<Field>,
}

impl Column {
    /// Returns the identity used when merging tables: the canonical field
    /// name when resolved, the normalized header otherwise.
    pub fn key(&self) -> &str {
        match self.field {
            Some(field) => field.as_str(),
            None => &self.name,
        }
    }
}

/// A normalized table: columns plus rows of trimmed string cells.
///
/// Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table, padding or truncating rows to the column count.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Returns the table columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the table rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of the column resolved to `field`.
    pub fn column_index(&self, field: Field) -> Option<usize> {
        self.columns.iter().position(|c| c.field == Some(field))
    }

    /// Returns true when some column resolved to `field`.
    pub fn has_field(&self, field: Field) -> bool {
        self.column_index(field).is_some()
    }

    /// Returns the non-empty value of `field` in `row`.
    pub fn value<'a>(&self, row: &'a [String], field: Field) -> Option<&'a str> {
        self.column_index(field)
            .and_then(|idx| row.get(idx))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    /// Returns the raw source headers, in order.
    pub fn raw_headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.raw.as_str()).collect()
    }

    /// Keeps only the rows for which `keep` returns true, preserving order.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}

/// The tables of one run, keyed by role.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tables: BTreeMap<Role, Table>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the table for `role`.
    pub fn insert(&mut self, role: Role, table: Table) {
        self.tables.insert(role, table);
    }

    /// Returns the table for `role`, if present.
    pub fn get(&self, role: Role) -> Option<&Table> {
        self.tables.get(&role)
    }

    /// Returns the roles that have a table.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.tables.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, field: Option<Field>) -> Column {
        Column {
            raw: name.to_string(),
            name: name.to_string(),
            field,
        }
    }

    fn sample_table() -> Table {
        Table::new(
            vec![
                column("MATRICULA", Some(Field::EmployeeId)),
                column("SINDICATO", Some(Field::Union)),
                column("OBS", None),
            ],
            vec![
                vec!["1001".to_string(), "SINDPD SP".to_string()],
                vec!["1002".to_string(), " ".to_string(), "x".to_string()],
            ],
        )
    }

    #[test]
    fn test_new_pads_short_rows() {
        let table = sample_table();
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.rows()[0][2], "");
    }

    #[test]
    fn test_value_by_field() {
        let table = sample_table();
        let row = &table.rows()[0];
        assert_eq!(table.value(row, Field::EmployeeId), Some("1001"));
        assert_eq!(table.value(row, Field::Union), Some("SINDPD SP"));
    }

    #[test]
    fn test_blank_value_is_none() {
        let table = sample_table();
        let row = &table.rows()[1];
        assert_eq!(table.value(row, Field::Union), None);
        assert_eq!(table.value(row, Field::AdmissionDate), None);
    }

    #[test]
    fn test_column_key_prefers_field() {
        assert_eq!(column("MATRICULA", Some(Field::EmployeeId)).key(), "employee_id");
        assert_eq!(column("OBS", None).key(), "OBS");
    }

    #[test]
    fn test_retain_rows_preserves_order() {
        let mut table = sample_table();
        table.retain_rows(|row| row[0] != "1001");
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0][0], "1002");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&Role::UnionRates).unwrap(),
            "\"union_rates\""
        );
        let role: Role = serde_json::from_str("\"working_days\"").unwrap();
        assert_eq!(role, Role::WorkingDays);
    }

    #[test]
    fn test_field_as_str_matches_serde() {
        for field in [Field::EmployeeId, Field::TerminationNotice, Field::DailyValue] {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }

    #[test]
    fn test_dataset_get_and_roles() {
        let mut dataset = Dataset::new();
        dataset.insert(Role::Active, sample_table());
        assert!(dataset.get(Role::Active).is_some());
        assert!(dataset.get(Role::Vacations).is_none());
        assert_eq!(dataset.roles().collect::<Vec<_>>(), vec![Role::Active]);
    }
}
