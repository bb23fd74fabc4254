//! Payable-days calculation.
//!
//! Decides how many days of benefit an employee receives for the reference
//! month. Exactly one rule applies, chosen by precedence:
//!
//! 1. Termination in the reference month with notice given on or before the
//!    cutoff day: nothing is paid.
//! 2. Any other termination in the reference month: business days from the
//!    pay-period start through the termination date, minus the holidays of
//!    the employee's state.
//! 3. Admission on or after the pay-period start: weekdays from the admission
//!    date through the pay-period end.
//! 4. Otherwise: union working days minus vacation days.
//!
//! The result is always clamped to `[0, working days]`.

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::models::{
    AuditStep, EmployeeRecord, NoticeStatus, PayPeriod, PayableDaysRule, ReferenceMonth,
    VacationTaken,
};

use super::business_days::{HolidayCalendar, count_business_days, count_weekdays};

/// Everything the calculator needs to know about one employee.
#[derive(Debug, Clone, Copy)]
pub struct PayableDaysInput<'a> {
    /// The employee record.
    pub employee: &'a EmployeeRecord,
    /// The pay period for the reference month.
    pub pay_period: &'a PayPeriod,
    /// Union working days for the month (0 when unmatched).
    pub working_days: Decimal,
    /// The employee's state code, used for regional holidays.
    pub state_code: Option<&'a str>,
    /// Last day of the month on which a notified termination cancels the
    /// benefit.
    pub termination_cutoff_day: u32,
}

/// The result of a payable-days calculation, including the audit steps.
#[derive(Debug, Clone)]
pub struct PayableDaysResult {
    /// The benefit-eligible days.
    pub payable_days: Decimal,
    /// Vacation days counted against the month.
    pub vacation_days: Decimal,
    /// The rule that decided the result.
    pub rule: PayableDaysRule,
    /// The audit steps recording the decision.
    pub audit_steps: Vec<AuditStep>,
}

/// Sums the vacation days an employee took in the reference month.
///
/// Day counts are taken as-is. Date ranges count only their business days
/// inside the reference month, excluding holidays of `region`.
///
/// # Examples
///
/// ```
/// use vr_engine::calculation::{HolidayCalendar, vacation_days_in_month};
/// use vr_engine::models::{ReferenceMonth, VacationTaken};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let may = ReferenceMonth::new(5, 2025).unwrap();
/// let vacations = [
///     VacationTaken::Days { days: Decimal::new(2, 0) },
///     // Mon 26 May to Fri 6 June: five weekdays fall in May.
///     VacationTaken::Range {
///         start: NaiveDate::from_ymd_opt(2025, 5, 26).unwrap(),
///         end: NaiveDate::from_ymd_opt(2025, 6, 6).unwrap(),
///     },
/// ];
///
/// let days = vacation_days_in_month(&vacations, &may, &HolidayCalendar::default(), None);
/// assert_eq!(days, Decimal::new(7, 0));
/// ```
pub fn vacation_days_in_month(
    vacations: &[VacationTaken],
    reference: &ReferenceMonth,
    calendar: &HolidayCalendar,
    region: Option<&str>,
) -> Decimal {
    vacations
        .iter()
        .map(|vacation| match *vacation {
            VacationTaken::Days { days } => days.max(Decimal::ZERO),
            VacationTaken::Range { start, end } => {
                let start = start.max(reference.first_day());
                let end = end.min(reference.last_day());
                Decimal::from(count_business_days(start, end, calendar, region))
            }
        })
        .sum()
}

/// Calculates the payable days for one employee.
///
/// # Arguments
///
/// * `input` - The employee, pay period and union lookups
/// * `calendar` - Holidays used for termination proration and vacation ranges
/// * `step_number` - The step number of the first audit step produced
///
/// # Examples
///
/// ```
/// use vr_engine::calculation::{HolidayCalendar, PayableDaysInput, calculate_payable_days};
/// use vr_engine::models::{
///     EmployeeRecord, NoticeStatus, PayPeriod, PayableDaysRule, ReferenceMonth, Termination,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let period = PayPeriod::for_reference(ReferenceMonth::new(5, 2025).unwrap(), 16).unwrap();
/// let mut employee = EmployeeRecord::new("1001");
/// employee.termination = Some(Termination {
///     date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
///     notice: NoticeStatus::Ok,
/// });
///
/// let input = PayableDaysInput {
///     employee: &employee,
///     pay_period: &period,
///     working_days: Decimal::new(22, 0),
///     state_code: Some("SP"),
///     termination_cutoff_day: 15,
/// };
///
/// let result = calculate_payable_days(&input, &HolidayCalendar::default(), 1);
/// assert_eq!(result.payable_days, Decimal::ZERO);
/// assert_eq!(result.rule, PayableDaysRule::TerminationNoPay);
/// ```
pub fn calculate_payable_days(
    input: &PayableDaysInput<'_>,
    calendar: &HolidayCalendar,
    step_number: u32,
) -> PayableDaysResult {
    let employee = input.employee;
    let period = input.pay_period;
    let reference = &period.reference;
    let working_days = input.working_days.max(Decimal::ZERO);

    let mut audit_steps = Vec::new();
    let mut next_step = step_number;
    let mut push_step = |rule_id: &str,
                         rule_name: &str,
                         step_input: serde_json::Value,
                         output: serde_json::Value,
                         reasoning: String| {
        audit_steps.push(AuditStep {
            step_number: next_step,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input: step_input,
            output,
            reasoning,
        });
        next_step += 1;
    };

    let vacation_days =
        vacation_days_in_month(&employee.vacations, reference, calendar, input.state_code);
    let termination = employee
        .termination
        .filter(|t| reference.contains(t.date));

    let (raw_days, rule) = if let Some(termination) = termination {
        let notified_early = termination.notice == NoticeStatus::Ok
            && termination.date.day() <= input.termination_cutoff_day;

        if notified_early {
            push_step(
                "termination_no_pay",
                "Termination Before Cutoff",
                serde_json::json!({
                    "termination_date": termination.date.to_string(),
                    "notice": termination.notice,
                    "cutoff_day": input.termination_cutoff_day,
                }),
                serde_json::json!({ "payable_days": "0" }),
                format!(
                    "Terminated on {} with notice given, on or before day {}: no benefit",
                    termination.date, input.termination_cutoff_day
                ),
            );
            (Decimal::ZERO, PayableDaysRule::TerminationNoPay)
        } else {
            let days = count_business_days(
                period.start_date,
                termination.date,
                calendar,
                input.state_code,
            );
            let holidays = calendar
                .weekday_holidays(period.start_date, termination.date, input.state_code)
                .len();
            push_step(
                "termination_proration",
                "Termination Proration",
                serde_json::json!({
                    "period_start": period.start_date.to_string(),
                    "termination_date": termination.date.to_string(),
                    "notice": termination.notice,
                    "state_code": input.state_code,
                }),
                serde_json::json!({
                    "business_days": days,
                    "holidays_excluded": holidays,
                }),
                format!(
                    "Terminated on {}: {} business days from {} ({} holidays excluded)",
                    termination.date, days, period.start_date, holidays
                ),
            );
            (Decimal::from(days), PayableDaysRule::TerminationProration)
        }
    } else if let Some(admission) = employee
        .admission_date
        .filter(|d| *d >= period.start_date)
    {
        let days = count_weekdays(admission, period.end_date);
        push_step(
            "admission_proration",
            "Admission Proration",
            serde_json::json!({
                "admission_date": admission.to_string(),
                "period_start": period.start_date.to_string(),
                "period_end": period.end_date.to_string(),
            }),
            serde_json::json!({ "weekdays": days }),
            format!(
                "Admitted on {}: {} weekdays through {}",
                admission, days, period.end_date
            ),
        );
        (Decimal::from(days), PayableDaysRule::AdmissionProration)
    } else {
        let days = (working_days - vacation_days).max(Decimal::ZERO);
        push_step(
            "base_working_days",
            "Working Days Less Vacation",
            serde_json::json!({
                "working_days": working_days.to_string(),
                "vacation_days": vacation_days.to_string(),
            }),
            serde_json::json!({ "payable_days": days.to_string() }),
            format!(
                "{} union working days - {} vacation days = {}",
                working_days, vacation_days, days
            ),
        );
        (days, PayableDaysRule::Base)
    };

    let payable_days = raw_days.max(Decimal::ZERO).min(working_days);
    if payable_days != raw_days {
        push_step(
            "payable_days_clamp",
            "Payable Days Limit",
            serde_json::json!({
                "computed_days": raw_days.to_string(),
                "working_days": working_days.to_string(),
            }),
            serde_json::json!({ "payable_days": payable_days.to_string() }),
            format!(
                "{} days exceeds the {} union working days; limited to {}",
                raw_days, working_days, payable_days
            ),
        );
    }

    PayableDaysResult {
        payable_days,
        vacation_days,
        rule,
        audit_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Holiday, Termination};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn may_period() -> PayPeriod {
        PayPeriod::for_reference(ReferenceMonth::new(5, 2025).unwrap(), 16).unwrap()
    }

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::new(vec![
            Holiday {
                date: date(2025, 4, 18),
                name: "Paixão de Cristo".to_string(),
                region: "national".to_string(),
            },
            Holiday {
                date: date(2025, 4, 21),
                name: "Tiradentes".to_string(),
                region: "national".to_string(),
            },
            Holiday {
                date: date(2025, 5, 1),
                name: "Dia do Trabalho".to_string(),
                region: "national".to_string(),
            },
            Holiday {
                date: date(2025, 4, 23),
                name: "São Jorge".to_string(),
                region: "RJ".to_string(),
            },
        ])
    }

    fn calculate(employee: &EmployeeRecord, working_days: &str, state: Option<&str>) -> PayableDaysResult {
        let period = may_period();
        let input = PayableDaysInput {
            employee,
            pay_period: &period,
            working_days: dec(working_days),
            state_code: state,
            termination_cutoff_day: 15,
        };
        calculate_payable_days(&input, &calendar(), 1)
    }

    fn terminated(day: u32, notice: NoticeStatus) -> EmployeeRecord {
        let mut employee = EmployeeRecord::new("1001");
        employee.termination = Some(Termination {
            date: date(2025, 5, day),
            notice,
        });
        employee
    }

    #[test]
    fn test_base_case_pays_working_days() {
        let employee = EmployeeRecord::new("1001");
        let result = calculate(&employee, "21", Some("SP"));

        assert_eq!(result.payable_days, dec("21"));
        assert_eq!(result.rule, PayableDaysRule::Base);
        assert_eq!(result.audit_steps.len(), 1);
        assert_eq!(result.audit_steps[0].rule_id, "base_working_days");
    }

    #[test]
    fn test_vacation_subtracted_on_base_path() {
        let mut employee = EmployeeRecord::new("1001");
        employee.vacations = vec![VacationTaken::Days { days: dec("10") }];

        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.payable_days, dec("12"));
        assert_eq!(result.vacation_days, dec("10"));
    }

    #[test]
    fn test_vacation_longer_than_month_clamps_to_zero() {
        let mut employee = EmployeeRecord::new("1001");
        employee.vacations = vec![VacationTaken::Days { days: dec("30") }];

        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.payable_days, Decimal::ZERO);
    }

    #[test]
    fn test_missing_union_days_pays_nothing() {
        let employee = EmployeeRecord::new("1001");
        let result = calculate(&employee, "0", None);
        assert_eq!(result.payable_days, Decimal::ZERO);
    }

    #[test]
    fn test_termination_with_notice_before_cutoff_pays_zero() {
        let mut employee = terminated(10, NoticeStatus::Ok);
        // No-pay wins over admission and vacation.
        employee.admission_date = Some(date(2025, 4, 20));
        employee.vacations = vec![VacationTaken::Days { days: dec("5") }];

        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.payable_days, Decimal::ZERO);
        assert_eq!(result.rule, PayableDaysRule::TerminationNoPay);
    }

    #[test]
    fn test_termination_on_cutoff_day_with_notice_pays_zero() {
        let result = calculate(&terminated(15, NoticeStatus::Ok), "22", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::TerminationNoPay);
    }

    #[test]
    fn test_termination_without_notice_is_prorated() {
        // 2025-04-16..=2025-05-10: 18 weekdays, minus 18/04, 21/04 and 01/05.
        let result = calculate(&terminated(10, NoticeStatus::Pending), "22", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::TerminationProration);
        assert_eq!(result.payable_days, dec("15"));
    }

    #[test]
    fn test_termination_proration_uses_regional_holidays() {
        let sp = calculate(&terminated(10, NoticeStatus::None), "22", Some("SP"));
        let rj = calculate(&terminated(10, NoticeStatus::None), "22", Some("RJ"));
        assert_eq!(sp.payable_days - rj.payable_days, dec("1"));
    }

    #[test]
    fn test_termination_after_cutoff_is_prorated_and_clamped() {
        // 2025-04-16..=2025-05-20: 25 weekdays minus 3 holidays = 22, clamped to 21.
        let result = calculate(&terminated(20, NoticeStatus::Ok), "21", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::TerminationProration);
        assert_eq!(result.payable_days, dec("21"));
        assert_eq!(result.audit_steps.last().unwrap().rule_id, "payable_days_clamp");
    }

    #[test]
    fn test_termination_in_other_month_is_ignored() {
        let mut employee = EmployeeRecord::new("1001");
        employee.termination = Some(Termination {
            date: date(2025, 6, 5),
            notice: NoticeStatus::Ok,
        });
        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::Base);
        assert_eq!(result.payable_days, dec("22"));
    }

    #[test]
    fn test_admission_on_20th_counts_weekdays_to_period_end() {
        let mut employee = EmployeeRecord::new("1001");
        employee.admission_date = Some(date(2025, 4, 20));

        // Sunday 20/04 through Thursday 15/05: 19 weekdays, holidays not removed.
        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::AdmissionProration);
        assert_eq!(result.payable_days, dec("19"));
    }

    #[test]
    fn test_admission_ignores_vacation() {
        let mut employee = EmployeeRecord::new("1001");
        employee.admission_date = Some(date(2025, 5, 12));
        employee.vacations = vec![VacationTaken::Days { days: dec("3") }];

        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.payable_days, dec("4"));
    }

    #[test]
    fn test_admission_after_period_end_pays_zero() {
        let mut employee = EmployeeRecord::new("1001");
        employee.admission_date = Some(date(2025, 5, 20));

        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::AdmissionProration);
        assert_eq!(result.payable_days, Decimal::ZERO);
    }

    #[test]
    fn test_admission_before_period_uses_base() {
        let mut employee = EmployeeRecord::new("1001");
        employee.admission_date = Some(date(2025, 4, 15));

        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::Base);
    }

    #[test]
    fn test_termination_outranks_admission() {
        let mut employee = terminated(20, NoticeStatus::None);
        employee.admission_date = Some(date(2025, 5, 5));

        let result = calculate(&employee, "22", Some("SP"));
        assert_eq!(result.rule, PayableDaysRule::TerminationProration);
    }

    #[test]
    fn test_vacation_range_counts_business_days_in_month() {
        let may = ReferenceMonth::new(5, 2025).unwrap();
        let vacations = [VacationTaken::Range {
            start: date(2025, 4, 28),
            end: date(2025, 5, 9),
        }];

        // 01/05 to 09/05: seven weekdays minus Labour Day.
        let days = vacation_days_in_month(&vacations, &may, &calendar(), Some("SP"));
        assert_eq!(days, dec("6"));
    }

    #[test]
    fn test_vacation_range_outside_month_is_zero() {
        let may = ReferenceMonth::new(5, 2025).unwrap();
        let vacations = [VacationTaken::Range {
            start: date(2025, 3, 1),
            end: date(2025, 3, 20),
        }];
        let days = vacation_days_in_month(&vacations, &may, &calendar(), None);
        assert_eq!(days, Decimal::ZERO);
    }
}
