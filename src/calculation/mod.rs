//! Calculation logic for the VR engine.
//!
//! This module contains the rule stages of a monthly benefit run: roster
//! consolidation, eligibility exclusions, union rate resolution, business-day
//! arithmetic, payable-days rules and valuation, plus the pipeline that runs
//! them in order.

mod business_days;
mod consolidation;
mod exclusion;
mod payable_days;
mod pipeline;
mod union_rate;
mod valuation;

pub use business_days::{HolidayCalendar, count_business_days, count_weekdays, is_weekday};
pub use consolidation::{ConsolidationResult, consolidate_roster};
pub use exclusion::{ExclusionOutcome, apply_exclusions};
pub use payable_days::{
    PayableDaysInput, PayableDaysResult, calculate_payable_days, vacation_days_in_month,
};
pub use pipeline::run_calculation;
pub use union_rate::{
    UnionRateResolver, UnionRateTable, UnionResolution, WorkingDaysTable, extract_state_code,
    harmonize_union_name, state_code_from_name,
};
pub use valuation::{ValuationResult, round_currency, value_benefit};
