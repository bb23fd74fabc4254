//! Cell value parsing.
//!
//! Spreadsheet exports write dates and numbers in several shapes. Anything
//! that cannot be understood parses to `None` so that the rule depending on it
//! simply does not trigger.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Parses a date cell.
///
/// Accepts ISO dates (optionally with a time part), `DD/MM/YYYY`, and Excel
/// serial day numbers.
///
/// ```
/// use vr_engine::ingest::parse_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2025, 5, 10);
/// assert_eq!(parse_date("2025-05-10"), expected);
/// assert_eq!(parse_date("10/05/2025"), expected);
/// assert_eq!(parse_date("2025-05-10 00:00:00"), expected);
/// assert_eq!(parse_date("45787"), expected);
/// assert_eq!(parse_date("soon"), None);
/// ```
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    excel_serial_date(value)
}

/// Converts an Excel serial day number (1900 date system) to a date.
fn excel_serial_date(value: &str) -> Option<NaiveDate> {
    let serial = f64::from_str(value).ok()?;
    // Plausible range: 1950..2100. Keeps small counts from reading as dates.
    if !(18_264.0..=73_051.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Returns true when `text` is digits grouped in threes by `separator`,
/// such as `1.000` or `12.345.678`.
fn is_digit_grouping(text: &str, separator: char) -> bool {
    let mut groups = text.trim_start_matches('-').split(separator);
    let lead_ok = groups
        .next()
        .is_some_and(|lead| (1..=3).contains(&lead.len()) && !lead.starts_with('0'));
    let mut rest = groups.peekable();
    lead_ok && rest.peek().is_some() && rest.all(|group| group.len() == 3)
}

/// Parses a decimal cell.
///
/// Accepts `.` or `,` as the decimal separator, thousands separators, and an
/// optional `R$` prefix. When both separators appear the last one is the
/// decimal separator. A lone comma is always decimal. Dots alone are read as
/// thousands separators when they split the digits into groups of three, as
/// Brazilian exports write `1.000`; `0.125` and `37.5` stay fractional.
///
/// ```
/// use vr_engine::ingest::parse_decimal;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_decimal("37.5"), Some(Decimal::new(375, 1)));
/// assert_eq!(parse_decimal("R$ 37,50"), Some(Decimal::new(3750, 2)));
/// assert_eq!(parse_decimal("1.234,56"), Some(Decimal::new(123456, 2)));
/// assert_eq!(parse_decimal("1.000"), Some(Decimal::new(1000, 0)));
/// assert_eq!(parse_decimal("n/a"), None);
/// ```
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let canonical = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Both present: whichever comes last is the decimal separator.
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if is_digit_grouping(&cleaned, '.') => cleaned.replace('.', ""),
        (Some(_), None) if cleaned.matches(',').count() > 1 && is_digit_grouping(&cleaned, ',') => {
            cleaned.replace(',', "")
        }
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&canonical).ok()
}

/// Renders a numeric cell as text that [`parse_decimal`] reads back exactly.
///
/// Fractions use a decimal comma so that `37.125` is not taken for a
/// thousands grouping.
pub(crate) fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string().replace('.', ",")
    }
}
