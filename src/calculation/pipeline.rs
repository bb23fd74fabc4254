//! The monthly benefit run.
//!
//! Threads the input tables through every stage: consolidation, exclusions,
//! union resolution, payable days and valuation. Data problems along the way
//! are logged and collected as [`AuditWarning`]s; only a missing base roster
//! or invalid configuration stops the run.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::ingest::{parse_date, parse_decimal};
use crate::models::{
    AuditWarning, CalculationRun, Dataset, EmployeeBenefit, EmployeeRecord, Field, NoticeStatus,
    PayPeriod, ReferenceMonth, Role, RunTotals, Table, Termination, VacationTaken,
};

use super::business_days::HolidayCalendar;
use super::consolidation::consolidate_roster;
use super::exclusion::apply_exclusions;
use super::payable_days::{PayableDaysInput, calculate_payable_days};
use super::union_rate::{UnionRateResolver, UnionRateTable, WorkingDaysTable};
use super::valuation::value_benefit;

/// Parses an optional date cell, warning when a value is present but
/// unreadable.
fn parse_date_cell(
    table: &Table,
    row: &[String],
    field: Field,
    employee_id: &str,
    warnings: &mut Vec<AuditWarning>,
) -> Option<chrono::NaiveDate> {
    let raw = table.value(row, field)?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        warn!(employee_id, field = %field, value = raw, "Unparseable date");
        warnings.push(AuditWarning::for_employee(
            "UNPARSEABLE_DATE",
            format!("Could not read {} '{}'", field, raw),
            "low",
            employee_id,
        ));
    }
    parsed
}

/// Reads terminations keyed by employee ID. The first row per ID wins.
fn termination_index(
    table: Option<&Table>,
    warnings: &mut Vec<AuditWarning>,
) -> HashMap<String, Termination> {
    let mut index = HashMap::new();
    let Some(table) = table else {
        return index;
    };
    if !table.has_field(Field::EmployeeId) || !table.has_field(Field::TerminationDate) {
        warn!("Terminations table lacks employee ID or date column, ignoring it");
        warnings.push(AuditWarning::new(
            "TERMINATIONS_UNUSABLE",
            "Terminations table has no employee ID or termination date column",
            "high",
        ));
        return index;
    }

    for row in table.rows() {
        let Some(id) = table.value(row, Field::EmployeeId) else {
            continue;
        };
        let Some(date) = parse_date_cell(table, row, Field::TerminationDate, id, warnings) else {
            continue;
        };
        let notice = NoticeStatus::parse(table.value(row, Field::TerminationNotice));
        index
            .entry(id.to_string())
            .or_insert(Termination { date, notice });
    }

    debug!(terminations = index.len(), "Indexed terminations");
    index
}

/// Reads vacation entries keyed by employee ID.
///
/// A row with a day count yields [`VacationTaken::Days`]; otherwise a row
/// with both range ends yields [`VacationTaken::Range`].
fn vacation_index(
    table: Option<&Table>,
    warnings: &mut Vec<AuditWarning>,
) -> HashMap<String, Vec<VacationTaken>> {
    let mut index: HashMap<String, Vec<VacationTaken>> = HashMap::new();
    let Some(table) = table else {
        return index;
    };
    if !table.has_field(Field::EmployeeId) {
        warn!("Vacations table has no employee ID column, ignoring it");
        warnings.push(AuditWarning::new(
            "VACATIONS_UNUSABLE",
            "Vacations table has no employee ID column",
            "high",
        ));
        return index;
    }

    for row in table.rows() {
        let Some(id) = table.value(row, Field::EmployeeId) else {
            continue;
        };

        let entry = if let Some(days) = table.value(row, Field::VacationDays).and_then(parse_decimal) {
            Some(VacationTaken::Days { days })
        } else {
            let start = parse_date_cell(table, row, Field::VacationStart, id, warnings);
            let end = parse_date_cell(table, row, Field::VacationEnd, id, warnings);
            start.zip(end).map(|(start, end)| VacationTaken::Range { start, end })
        };

        match entry {
            Some(vacation) => index.entry(id.to_string()).or_default().push(vacation),
            None => {
                warn!(employee_id = id, "Vacation row without days or range");
                warnings.push(AuditWarning::for_employee(
                    "VACATION_WITHOUT_DAYS",
                    "Vacation row has neither a day count nor a date range",
                    "low",
                    id,
                ));
            }
        }
    }

    index
}

/// Builds the employee record for one roster row.
fn employee_from_row(
    roster: &Table,
    row: &[String],
    id: &str,
    terminations: &HashMap<String, Termination>,
    vacations: &HashMap<String, Vec<VacationTaken>>,
    warnings: &mut Vec<AuditWarning>,
) -> EmployeeRecord {
    let text = |field| roster.value(row, field).map(str::to_string);

    // Some rosters carry the termination inline; the terminations sheet wins.
    let inline_termination = parse_date_cell(roster, row, Field::TerminationDate, id, warnings)
        .map(|date| Termination {
            date,
            notice: NoticeStatus::parse(roster.value(row, Field::TerminationNotice)),
        });

    EmployeeRecord {
        id: id.to_string(),
        name: text(Field::Name),
        job_title: text(Field::JobTitle).or_else(|| text(Field::Position)),
        union_name: text(Field::Union),
        admission_date: parse_date_cell(roster, row, Field::AdmissionDate, id, warnings),
        termination: terminations.get(id).copied().or(inline_termination),
        vacations: vacations.get(id).cloned().unwrap_or_default(),
    }
}

/// Builds a lookup from an optional table, warning when it is absent.
fn lookup_table<T, F>(
    dataset: &Dataset,
    role: Role,
    code: &str,
    build: F,
    warnings: &mut Vec<AuditWarning>,
) -> T
where
    T: Default,
    F: FnOnce(&Table) -> T,
{
    match dataset.get(role).filter(|t| !t.is_empty()) {
        Some(table) => build(table),
        None => {
            warn!(role = %role, "Lookup table missing, every employee resolves to 0");
            warnings.push(AuditWarning::new(
                code,
                format!("Table '{}' is missing or empty; values default to 0", role),
                "high",
            ));
            T::default()
        }
    }
}

/// Runs the benefit calculation for a reference month.
///
/// # Errors
///
/// Fails when the active roster is missing or empty, or when the calendar
/// configuration cannot produce a pay period.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use vr_engine::calculation::run_calculation;
/// use vr_engine::config::ConfigLoader;
/// use vr_engine::ingest::DatasetLoader;
/// use vr_engine::models::ReferenceMonth;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let config = loader.config();
/// let dataset = DatasetLoader::new(config).load_dir(Path::new("data/input"))?;
///
/// let run = run_calculation(&dataset, config, ReferenceMonth::new(5, 2025)?)?;
/// println!("{} employees, total {}", run.totals.employees, run.totals.total_value);
/// # Ok::<(), vr_engine::error::EngineError>(())
/// ```
pub fn run_calculation(
    dataset: &Dataset,
    config: &EngineConfig,
    reference: ReferenceMonth,
) -> EngineResult<CalculationRun> {
    let start_time = Instant::now();
    let run_id = Uuid::new_v4();
    let settings = config.settings();
    info!(
        run_id = %run_id,
        competence = %reference.competence(),
        "Starting benefit run"
    );

    let pay_period = PayPeriod::for_reference(reference, settings.calendar.pay_period_anchor_day)?;

    let consolidated = consolidate_roster(dataset.get(Role::Active), dataset.get(Role::Admissions))?;
    let mut warnings = consolidated.warnings;

    let outcome = apply_exclusions(consolidated.roster, dataset, &settings.exclusions);
    warnings.extend(outcome.warnings);
    let roster = outcome.roster;

    let terminations = termination_index(dataset.get(Role::Terminations), &mut warnings);
    let vacations = vacation_index(dataset.get(Role::Vacations), &mut warnings);

    let rates = lookup_table(
        dataset,
        Role::UnionRates,
        "UNION_RATES_MISSING",
        UnionRateTable::from_table,
        &mut warnings,
    );
    let working_days = lookup_table(
        dataset,
        Role::WorkingDays,
        "WORKING_DAYS_MISSING",
        WorkingDaysTable::from_table,
        &mut warnings,
    );
    let resolver = UnionRateResolver::new(rates, working_days);
    let calendar = HolidayCalendar::new(config.holidays().to_vec());

    let mut benefits = Vec::with_capacity(roster.len());
    for row in roster.rows() {
        let Some(id) = roster.value(row, Field::EmployeeId) else {
            continue;
        };
        let employee = employee_from_row(&roster, row, id, &terminations, &vacations, &mut warnings);

        if let Some(termination) = employee
            .termination
            .filter(|t| t.date < reference.first_day())
        {
            warnings.push(AuditWarning::for_employee(
                "TERMINATED_BEFORE_MONTH",
                format!(
                    "Terminated on {} but still on the roster for {}",
                    termination.date,
                    reference.competence()
                ),
                "medium",
                id,
            ));
        }

        let mut step_number: u32 = 1;
        let union = resolver.resolve(employee.union_name.as_deref(), step_number);
        step_number += 1;

        if employee.union_name.is_none() {
            warnings.push(AuditWarning::for_employee(
                "UNION_MISSING",
                "Employee has no union; rate and working days set to 0",
                "medium",
                id,
            ));
        } else {
            if !union.rate_matched {
                warn!(employee_id = id, state = ?union.state_code, "No daily rate for union state");
                warnings.push(AuditWarning::for_employee(
                    "UNION_RATE_NOT_FOUND",
                    format!(
                        "No daily rate for union '{}' (state {})",
                        employee.union_name.as_deref().unwrap_or_default(),
                        union.state_code.as_deref().unwrap_or("undefined")
                    ),
                    "medium",
                    id,
                ));
            }
            if !union.days_matched {
                warn!(employee_id = id, key = ?union.union_key, "No working days for union");
                warnings.push(AuditWarning::for_employee(
                    "WORKING_DAYS_NOT_FOUND",
                    format!(
                        "No working days for union '{}'",
                        employee.union_name.as_deref().unwrap_or_default()
                    ),
                    "medium",
                    id,
                ));
            }
        }

        let days = calculate_payable_days(
            &PayableDaysInput {
                employee: &employee,
                pay_period: &pay_period,
                working_days: union.working_days,
                state_code: union.state_code.as_deref(),
                termination_cutoff_day: settings.calendar.termination_cutoff_day,
            },
            &calendar,
            step_number,
        );
        step_number += days.audit_steps.len() as u32;

        let valuation = value_benefit(
            days.payable_days,
            union.daily_rate,
            &settings.valuation,
            step_number,
        );

        let mut audit_steps = Vec::with_capacity(days.audit_steps.len() + 2);
        audit_steps.push(union.audit_step);
        audit_steps.extend(days.audit_steps);
        audit_steps.push(valuation.audit_step);

        benefits.push(EmployeeBenefit {
            employee_id: employee.id,
            name: employee.name,
            job_title: employee.job_title,
            union_name: employee.union_name,
            state_code: union.state_code,
            admission_date: employee.admission_date,
            termination_date: employee.termination.map(|t| t.date),
            working_days: union.working_days,
            vacation_days: days.vacation_days,
            payable_days: days.payable_days,
            rule: days.rule,
            daily_rate: union.daily_rate,
            total_value: valuation.total_value,
            employer_cost: valuation.employer_cost,
            employee_cost: valuation.employee_cost,
            audit_steps,
        });
    }

    let totals = RunTotals::from_benefits(&benefits, outcome.excluded.len());
    let duration = start_time.elapsed();
    info!(
        run_id = %run_id,
        employees = totals.employees,
        excluded = totals.excluded,
        warnings = warnings.len(),
        total_value = %totals.total_value,
        duration_us = duration.as_micros(),
        "Benefit run completed"
    );

    Ok(CalculationRun {
        run_id,
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        reference,
        pay_period,
        benefits,
        excluded: outcome.excluded,
        totals,
        warnings,
        duration_us: duration.as_micros() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CalendarConfig, ColumnAliases, EngineSettings, ExclusionConfig, ReportConfig,
        SourcesConfig, ValuationConfig,
    };
    use crate::error::EngineError;
    use crate::models::{Column, Holiday, PayableDaysRule};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn config() -> EngineConfig {
        let settings = EngineSettings {
            name: "test".to_string(),
            valuation: ValuationConfig {
                employer_share: dec("0.80"),
                employee_share: dec("0.20"),
                decimal_places: 2,
            },
            calendar: CalendarConfig {
                pay_period_anchor_day: 16,
                termination_cutoff_day: 15,
            },
            exclusions: ExclusionConfig {
                source_roles: vec![Role::Interns, Role::Apprentices, Role::Leave, Role::Overseas],
                title_fields: vec![Field::JobTitle],
                denied_titles: vec!["DIRETOR".to_string()],
            },
        };
        let sources = SourcesConfig {
            input_dir: "in".to_string(),
            output_file: "out.csv".to_string(),
            sources: BTreeMap::new(),
        };
        let report = ReportConfig {
            fallback_columns: vec![],
            mapping: vec![],
        };
        let holidays = vec![Holiday {
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            name: "Dia do Trabalho".to_string(),
            region: "national".to_string(),
        }];
        EngineConfig::new(settings, ColumnAliases::default(), sources, report, holidays).unwrap()
    }

    fn table(columns: &[(&str, Field)], rows: &[&[&str]]) -> Table {
        Table::new(
            columns
                .iter()
                .map(|(name, field)| Column {
                    raw: name.to_string(),
                    name: name.to_string(),
                    field: Some(*field),
                })
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(
            Role::Active,
            table(
                &[
                    ("MATRICULA", Field::EmployeeId),
                    ("TITULO_DO_CARGO", Field::JobTitle),
                    ("SINDICATO", Field::Union),
                ],
                &[
                    &["1001", "ANALISTA", "SINDPD SP - SIND. TRAB. EM PROC DADOS"],
                    &["1002", "ANALISTA", "SINDPD SP - SIND. TRAB. EM PROC DADOS"],
                    &["1003", "DIRETOR", "SINDPD SP - SIND. TRAB. EM PROC DADOS"],
                    &["1004", "ANALISTA", "SINDICATO DOS METALURGICOS - AM"],
                    &["1005", "ANALISTA", "SINDPD SP - SIND. TRAB. EM PROC DADOS"],
                    &["1006", "ANALISTA", "SINDPD SP - SIND. TRAB. EM PROC DADOS"],
                ],
            ),
        );
        dataset.insert(
            Role::Admissions,
            table(
                &[("MATRICULA", Field::EmployeeId), ("ADMISSAO", Field::AdmissionDate)],
                &[&["1007", "2025-04-20"]],
            ),
        );
        dataset.insert(
            Role::Terminations,
            table(
                &[
                    ("MATRICULA", Field::EmployeeId),
                    ("DATA_DEMISSAO", Field::TerminationDate),
                    ("COMUNICADO_DE_DESLIGAMENTO", Field::TerminationNotice),
                ],
                &[&["1002", "10/05/2025", "OK"]],
            ),
        );
        dataset.insert(
            Role::Vacations,
            table(
                &[("MATRICULA", Field::EmployeeId), ("DIAS_DE_FERIAS", Field::VacationDays)],
                &[&["1005", "10"]],
            ),
        );
        dataset.insert(
            Role::Interns,
            table(&[("MATRICULA", Field::EmployeeId)], &[&["1006"]]),
        );
        dataset.insert(
            Role::UnionRates,
            table(
                &[("ESTADO", Field::State), ("VALOR", Field::DailyValue)],
                &[&["São Paulo", "37,50"], &["Rio de Janeiro", "35,00"]],
            ),
        );
        dataset.insert(
            Role::WorkingDays,
            table(
                &[("SINDICATO", Field::Union), ("DIAS_UTEIS", Field::WorkingDays)],
                &[&["SINDPD SP", "21"]],
            ),
        );
        dataset
    }

    fn may() -> ReferenceMonth {
        ReferenceMonth::new(5, 2025).unwrap()
    }

    fn benefit<'a>(run: &'a CalculationRun, id: &str) -> &'a EmployeeBenefit {
        run.benefits.iter().find(|b| b.employee_id == id).unwrap()
    }

    #[test]
    fn test_base_employee_is_paid_working_days() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        let b = benefit(&run, "1001");

        assert_eq!(b.payable_days, dec("21"));
        assert_eq!(b.daily_rate, dec("37.50"));
        assert_eq!(b.total_value, dec("787.50"));
        assert_eq!(b.employer_cost, dec("630.00"));
        assert_eq!(b.employee_cost, dec("157.50"));
        assert_eq!(b.rule, PayableDaysRule::Base);
    }

    #[test]
    fn test_terminated_with_notice_gets_nothing() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        let b = benefit(&run, "1002");
        assert_eq!(b.payable_days, Decimal::ZERO);
        assert_eq!(b.total_value, Decimal::ZERO);
        assert_eq!(b.rule, PayableDaysRule::TerminationNoPay);
    }

    #[test]
    fn test_excluded_employees_are_absent() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        assert!(run.benefits.iter().all(|b| b.employee_id != "1003"));
        assert!(run.benefits.iter().all(|b| b.employee_id != "1006"));
        assert_eq!(run.excluded.len(), 2);
        assert_eq!(run.totals.excluded, 2);
    }

    #[test]
    fn test_unmatched_union_gets_zero_with_warnings() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        let b = benefit(&run, "1004");

        assert_eq!(b.state_code.as_deref(), Some("AM"));
        assert_eq!(b.daily_rate, Decimal::ZERO);
        assert_eq!(b.payable_days, Decimal::ZERO);
        let codes: Vec<&str> = run
            .warnings
            .iter()
            .filter(|w| w.employee_id.as_deref() == Some("1004"))
            .map(|w| w.code.as_str())
            .collect();
        assert!(codes.contains(&"UNION_RATE_NOT_FOUND"));
        assert!(codes.contains(&"WORKING_DAYS_NOT_FOUND"));
    }

    #[test]
    fn test_vacation_days_reduce_benefit() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        let b = benefit(&run, "1005");
        assert_eq!(b.vacation_days, dec("10"));
        assert_eq!(b.payable_days, dec("11"));
    }

    #[test]
    fn test_admitted_employee_without_union_gets_zero() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        let b = benefit(&run, "1007");
        // Admission proration gives 19 weekdays, clamped to 0 union days.
        assert_eq!(b.rule, PayableDaysRule::AdmissionProration);
        assert_eq!(b.payable_days, Decimal::ZERO);
        assert!(
            run.warnings
                .iter()
                .any(|w| w.code == "UNION_MISSING" && w.employee_id.as_deref() == Some("1007"))
        );
    }

    #[test]
    fn test_roster_order_and_totals() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        let ids: Vec<&str> = run.benefits.iter().map(|b| b.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "1002", "1004", "1005", "1007"]);

        let sum: Decimal = run.benefits.iter().map(|b| b.total_value).sum();
        assert_eq!(run.totals.total_value, sum);
        assert_eq!(
            run.totals.employer_cost + run.totals.employee_cost,
            run.totals.total_value
        );
    }

    #[test]
    fn test_audit_steps_are_numbered_in_sequence() {
        let run = run_calculation(&dataset(), &config(), may()).unwrap();
        for b in &run.benefits {
            let numbers: Vec<u32> = b.audit_steps.iter().map(|s| s.step_number).collect();
            let expected: Vec<u32> = (1..=numbers.len() as u32).collect();
            assert_eq!(numbers, expected, "employee {}", b.employee_id);
        }
    }

    #[test]
    fn test_missing_rate_table_warns_once() {
        let mut dataset = dataset();
        dataset.insert(Role::UnionRates, Table::default());

        let run = run_calculation(&dataset, &config(), may()).unwrap();
        assert!(run.benefits.iter().all(|b| b.total_value == Decimal::ZERO));
        assert_eq!(
            run.warnings
                .iter()
                .filter(|w| w.code == "UNION_RATES_MISSING")
                .count(),
            1
        );
    }

    #[test]
    fn test_missing_active_roster_fails() {
        let mut dataset = Dataset::new();
        dataset.insert(Role::UnionRates, Table::default());
        let result = run_calculation(&dataset, &config(), may());
        assert!(matches!(result, Err(EngineError::MissingBaseRoster { .. })));
    }

    #[test]
    fn test_vacation_range_rows_are_read() {
        let mut dataset = dataset();
        dataset.insert(
            Role::Vacations,
            table(
                &[
                    ("MATRICULA", Field::EmployeeId),
                    ("INICIO_FERIAS", Field::VacationStart),
                    ("FIM_FERIAS", Field::VacationEnd),
                ],
                &[&["1005", "2025-05-01", "2025-05-09"]],
            ),
        );

        let run = run_calculation(&dataset, &config(), may()).unwrap();
        // Seven weekdays minus Labour Day.
        assert_eq!(benefit(&run, "1005").vacation_days, dec("6"));
        assert_eq!(benefit(&run, "1005").payable_days, dec("15"));
    }
}
