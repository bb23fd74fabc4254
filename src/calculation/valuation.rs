//! Benefit valuation.
//!
//! Turns payable days into money and splits the total between employer and
//! employee.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::ValuationConfig;
use crate::models::AuditStep;

/// The valued benefit, including the audit step.
#[derive(Debug, Clone)]
pub struct ValuationResult {
    /// `payable_days × daily_rate`, rounded.
    pub total_value: Decimal,
    /// Employer share of the total, rounded.
    pub employer_cost: Decimal,
    /// Employee share: the total minus the employer share.
    pub employee_cost: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Rounds a monetary amount, midpoint away from zero.
///
/// ```
/// use vr_engine::calculation::round_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_currency(Decimal::new(12345, 3), 2), Decimal::new(1235, 2));
/// assert_eq!(round_currency(Decimal::new(-12345, 3), 2), Decimal::new(-1235, 2));
/// ```
pub fn round_currency(amount: Decimal, decimal_places: u32) -> Decimal {
    amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Values a benefit.
///
/// The total and the employer share are rounded once each. The employee share
/// is the remainder, so `employer_cost + employee_cost == total_value` holds
/// exactly.
///
/// # Examples
///
/// ```
/// use vr_engine::calculation::value_benefit;
/// use vr_engine::config::ValuationConfig;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = ValuationConfig {
///     employer_share: Decimal::from_str("0.80").unwrap(),
///     employee_share: Decimal::from_str("0.20").unwrap(),
///     decimal_places: 2,
/// };
///
/// let result = value_benefit(Decimal::from(21), Decimal::from_str("37.50").unwrap(), &config, 1);
/// assert_eq!(result.total_value, Decimal::from_str("787.50").unwrap());
/// assert_eq!(result.employer_cost, Decimal::from_str("630.00").unwrap());
/// assert_eq!(result.employee_cost, Decimal::from_str("157.50").unwrap());
/// ```
pub fn value_benefit(
    payable_days: Decimal,
    daily_rate: Decimal,
    config: &ValuationConfig,
    step_number: u32,
) -> ValuationResult {
    let places = config.decimal_places;
    let total_value = round_currency(payable_days * daily_rate, places);
    let employer_cost = round_currency(total_value * config.employer_share, places);
    let employee_cost = total_value - employer_cost;

    let audit_step = AuditStep {
        step_number,
        rule_id: "benefit_valuation".to_string(),
        rule_name: "Benefit Valuation".to_string(),
        input: serde_json::json!({
            "payable_days": payable_days.to_string(),
            "daily_rate": daily_rate.to_string(),
            "employer_share": config.employer_share.to_string(),
            "employee_share": config.employee_share.to_string(),
        }),
        output: serde_json::json!({
            "total_value": total_value.to_string(),
            "employer_cost": employer_cost.to_string(),
            "employee_cost": employee_cost.to_string(),
        }),
        reasoning: format!(
            "{} days × {} = {}; employer {} × {} = {}; employee pays {}",
            payable_days,
            daily_rate,
            total_value,
            total_value,
            config.employer_share,
            employer_cost,
            employee_cost
        ),
    };

    ValuationResult {
        total_value,
        employer_cost,
        employee_cost,
        audit_step,
    }
}
