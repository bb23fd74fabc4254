//! Union rate resolution.
//!
//! Maps a free-text union name onto the two lookups a benefit needs: the daily
//! value for the union's state and the official working days of the union's
//! calendar. Union names are written inconsistently across sheets
//! ("SINDPD SP - SIND. TRAB. EM PROC DADOS E EMPR..." vs "SINDPD SP"), so both
//! joins run on derived keys rather than on the raw text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::ingest::{parse_decimal, strip_accents};
use crate::models::{AuditStep, Field, Table};

static STATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2})\b").expect("Valid regex pattern"));

static LEADING_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z\s]+").expect("Valid regex pattern"));

/// Brazilian states by accent-free uppercase name.
const STATE_NAMES: [(&str, &str); 27] = [
    ("ACRE", "AC"),
    ("ALAGOAS", "AL"),
    ("AMAPA", "AP"),
    ("AMAZONAS", "AM"),
    ("BAHIA", "BA"),
    ("CEARA", "CE"),
    ("DISTRITO FEDERAL", "DF"),
    ("ESPIRITO SANTO", "ES"),
    ("GOIAS", "GO"),
    ("MARANHAO", "MA"),
    ("MATO GROSSO", "MT"),
    ("MATO GROSSO DO SUL", "MS"),
    ("MINAS GERAIS", "MG"),
    ("PARA", "PA"),
    ("PARAIBA", "PB"),
    ("PARANA", "PR"),
    ("PERNAMBUCO", "PE"),
    ("PIAUI", "PI"),
    ("RIO DE JANEIRO", "RJ"),
    ("RIO GRANDE DO NORTE", "RN"),
    ("RIO GRANDE DO SUL", "RS"),
    ("RONDONIA", "RO"),
    ("RORAIMA", "RR"),
    ("SANTA CATARINA", "SC"),
    ("SAO PAULO", "SP"),
    ("SERGIPE", "SE"),
    ("TOCANTINS", "TO"),
];

/// Extracts the state code from a union name: the first isolated two-letter
/// uppercase token.
///
/// # Examples
///
/// ```
/// use vr_engine::calculation::extract_state_code;
///
/// assert_eq!(
///     extract_state_code("SINDICATO DOS METALURGICOS - SP").as_deref(),
///     Some("SP")
/// );
/// assert_eq!(extract_state_code("SITEPD PR - SIND DOS TRAB").as_deref(), Some("PR"));
/// assert_eq!(extract_state_code("Sindicato sem estado"), None);
/// ```
pub fn extract_state_code(union_name: &str) -> Option<String> {
    STATE_TOKEN
        .captures(union_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Derives the key used to join a union onto the working-days table.
///
/// The leading run of uppercase letters and whitespace is kept with anything
/// but `A-Z` removed. When the name does not start that way, the text before
/// the first `-` is used instead. Returns `None` when nothing is left.
///
/// # Examples
///
/// ```
/// use vr_engine::calculation::harmonize_union_name;
///
/// assert_eq!(
///     harmonize_union_name("SINDPD SP - SIND. TRAB. EM PROC DADOS").as_deref(),
///     Some("SINDPDSP")
/// );
/// assert_eq!(harmonize_union_name("SINDPD SP").as_deref(), Some("SINDPDSP"));
/// assert_eq!(harmonize_union_name("123 - ---"), None);
/// ```
pub fn harmonize_union_name(union_name: &str) -> Option<String> {
    let source = match LEADING_UPPER.find(union_name) {
        Some(m) => m.as_str(),
        None => union_name.split('-').next().unwrap_or_default(),
    };
    let key: String = source.chars().filter(|c| c.is_ascii_uppercase()).collect();
    (!key.is_empty()).then_some(key)
}

/// Maps a rate-table state cell to a two-letter code.
///
/// Accepts a code ("sp", "SP") or a full state name with or without accents
/// ("São Paulo", "PARANA").
///
/// ```
/// use vr_engine::calculation::state_code_from_name;
///
/// assert_eq!(state_code_from_name("São Paulo").as_deref(), Some("SP"));
/// assert_eq!(state_code_from_name(" rj ").as_deref(), Some("RJ"));
/// assert_eq!(state_code_from_name("Atlantis"), None);
/// ```
pub fn state_code_from_name(value: &str) -> Option<String> {
    let folded = strip_accents(value.trim()).to_uppercase();
    let folded = folded.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some((_, code)) = STATE_NAMES
        .iter()
        .find(|(name, code)| *name == folded || *code == folded)
    {
        return Some((*code).to_string());
    }
    None
}

/// Daily benefit values keyed by state code.
#[derive(Debug, Clone, Default)]
pub struct UnionRateTable {
    rates: HashMap<String, Decimal>,
}

impl UnionRateTable {
    /// Builds the rate table from the `union_rates` input.
    ///
    /// Rows whose state cannot be mapped to a code or whose value is not a
    /// number are skipped with a warning. The first row for a state wins.
    pub fn from_table(table: &Table) -> Self {
        let mut rates = HashMap::new();
        if !table.has_field(Field::State) || !table.has_field(Field::DailyValue) {
            warn!(
                has_state = table.has_field(Field::State),
                has_value = table.has_field(Field::DailyValue),
                "Union rate table lacks state or value column"
            );
            return Self { rates };
        }

        for row in table.rows() {
            let state = table.value(row, Field::State).and_then(state_code_from_name);
            let value = table.value(row, Field::DailyValue).and_then(parse_decimal);
            match (state, value) {
                (Some(state), Some(value)) => {
                    rates.entry(state).or_insert(value);
                }
                _ => warn!(
                    state = table.value(row, Field::State).unwrap_or_default(),
                    value = table.value(row, Field::DailyValue).unwrap_or_default(),
                    "Skipping unusable union rate row"
                ),
            }
        }

        debug!(states = rates.len(), "Built union rate table");
        Self { rates }
    }

    /// Creates a table from explicit state/value pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        Self {
            rates: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Returns the daily value for a state code.
    pub fn rate_for(&self, state_code: &str) -> Option<Decimal> {
        self.rates.get(state_code).copied()
    }

    /// Returns the number of states with a rate.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true when no rate is known.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Official working days keyed by harmonized union key.
#[derive(Debug, Clone, Default)]
pub struct WorkingDaysTable {
    days: HashMap<String, Decimal>,
}

impl WorkingDaysTable {
    /// Builds the working-days table from the `working_days` input.
    pub fn from_table(table: &Table) -> Self {
        let mut days = HashMap::new();
        if !table.has_field(Field::Union) || !table.has_field(Field::WorkingDays) {
            warn!(
                has_union = table.has_field(Field::Union),
                has_days = table.has_field(Field::WorkingDays),
                "Working days table lacks union or days column"
            );
            return Self { days };
        }

        for row in table.rows() {
            let key = table.value(row, Field::Union).and_then(harmonize_union_name);
            let value = table.value(row, Field::WorkingDays).and_then(parse_decimal);
            match (key, value) {
                (Some(key), Some(value)) => {
                    days.entry(key).or_insert(value);
                }
                _ => warn!(
                    union = table.value(row, Field::Union).unwrap_or_default(),
                    days = table.value(row, Field::WorkingDays).unwrap_or_default(),
                    "Skipping unusable working days row"
                ),
            }
        }

        debug!(unions = days.len(), "Built working days table");
        Self { days }
    }

    /// Creates a table from explicit key/days pairs. Keys are harmonized.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        Self {
            days: pairs
                .into_iter()
                .filter_map(|(k, v)| harmonize_union_name(k.as_ref()).map(|k| (k, v)))
                .collect(),
        }
    }

    /// Returns the working days for a harmonized union key.
    pub fn days_for(&self, union_key: &str) -> Option<Decimal> {
        self.days.get(union_key).copied()
    }
}

/// The lookups resolved for one union name.
#[derive(Debug, Clone)]
pub struct UnionResolution {
    /// State code from the union name.
    pub state_code: Option<String>,
    /// Harmonized key used for the working-days join.
    pub union_key: Option<String>,
    /// Daily benefit value, 0 when unmatched.
    pub daily_rate: Decimal,
    /// True when the state had a rate.
    pub rate_matched: bool,
    /// Official working days, 0 when unmatched.
    pub working_days: Decimal,
    /// True when the union had a working-days entry.
    pub days_matched: bool,
    /// The audit step recording this lookup.
    pub audit_step: AuditStep,
}

/// Resolves union names against the rate and working-days tables.
#[derive(Debug, Clone, Default)]
pub struct UnionRateResolver {
    rates: UnionRateTable,
    working_days: WorkingDaysTable,
}

impl UnionRateResolver {
    /// Creates a resolver over the two lookup tables.
    pub fn new(rates: UnionRateTable, working_days: WorkingDaysTable) -> Self {
        Self {
            rates,
            working_days,
        }
    }

    /// Resolves state, daily rate and working days for a union name.
    ///
    /// Unmatched lookups resolve to 0 and are flagged on the result so the
    /// caller can raise a data-quality warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use vr_engine::calculation::{UnionRateResolver, UnionRateTable, WorkingDaysTable};
    /// use rust_decimal::Decimal;
    ///
    /// let resolver = UnionRateResolver::new(
    ///     UnionRateTable::from_pairs([("SP", Decimal::new(3750, 2))]),
    ///     WorkingDaysTable::from_pairs([("SINDPD SP", Decimal::new(22, 0))]),
    /// );
    ///
    /// let found = resolver.resolve(Some("SINDPD SP - SIND. TRAB. EM PROC DADOS"), 1);
    /// assert_eq!(found.state_code.as_deref(), Some("SP"));
    /// assert_eq!(found.daily_rate, Decimal::new(3750, 2));
    /// assert_eq!(found.working_days, Decimal::new(22, 0));
    ///
    /// let missing = resolver.resolve(Some("sindicato desconhecido"), 1);
    /// assert_eq!(missing.state_code, None);
    /// assert_eq!(missing.daily_rate, Decimal::ZERO);
    /// assert!(!missing.rate_matched);
    /// ```
    pub fn resolve(&self, union_name: Option<&str>, step_number: u32) -> UnionResolution {
        let state_code = union_name.and_then(extract_state_code);
        let union_key = union_name.and_then(harmonize_union_name);

        let rate = state_code.as_deref().and_then(|s| self.rates.rate_for(s));
        let days = union_key
            .as_deref()
            .and_then(|k| self.working_days.days_for(k));

        let daily_rate = rate.unwrap_or(Decimal::ZERO);
        let working_days = days.unwrap_or(Decimal::ZERO);

        let reasoning = match (&state_code, rate, days) {
            (Some(state), Some(rate), Some(days)) => format!(
                "State {} pays {} per day; union calendar has {} working days",
                state, rate, days
            ),
            (None, _, _) => "No state code in union name; daily rate set to 0".to_string(),
            (Some(state), None, _) => format!("No rate for state {}; daily rate set to 0", state),
            (Some(_), Some(_), None) => {
                "Union not found in working days table; working days set to 0".to_string()
            }
        };

        let audit_step = AuditStep {
            step_number,
            rule_id: "union_rate_lookup".to_string(),
            rule_name: "Union Rate Lookup".to_string(),
            input: serde_json::json!({
                "union_name": union_name,
                "state_code": state_code,
                "union_key": union_key,
            }),
            output: serde_json::json!({
                "daily_rate": daily_rate.to_string(),
                "working_days": working_days.to_string(),
                "rate_matched": rate.is_some(),
                "days_matched": days.is_some(),
            }),
            reasoning,
        };

        UnionResolution {
            state_code,
            union_key,
            daily_rate,
            rate_matched: rate.is_some(),
            working_days,
            days_matched: days.is_some(),
            audit_step,
        }
    }

    /// Returns the rate table.
    pub fn rates(&self) -> &UnionRateTable {
        &self.rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn column(name: &str, field: Field) -> Column {
        Column {
            raw: name.to_string(),
            name: name.to_string(),
            field: Some(field),
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_state_code_from_metalworkers_union() {
        assert_eq!(
            extract_state_code("SINDICATO DOS METALURGICOS - SP"),
            Some("SP".to_string())
        );
    }

    #[test]
    fn test_state_code_ignores_lowercase_and_longer_tokens() {
        assert_eq!(extract_state_code("SINDPD sp"), None);
        assert_eq!(extract_state_code("SINDICATO NACIONAL"), None);
    }

    #[test]
    fn test_state_code_takes_first_token() {
        assert_eq!(
            extract_state_code("SINDPPD RS - SINDICATO DOS TRAB. RJ"),
            Some("RS".to_string())
        );
    }

    #[test]
    fn test_harmonize_falls_back_to_text_before_dash() {
        assert_eq!(
            harmonize_union_name("sindpd-SP filial"),
            None,
            "lowercase prefix before the dash leaves nothing"
        );
        assert_eq!(
            harmonize_union_name("1 SINDPD RJ - Sindicato"),
            Some("SINDPDRJ".to_string())
        );
    }

    #[test]
    fn test_harmonize_strips_punctuation_from_leading_run() {
        // The leading run stops at the first '.'.
        assert_eq!(harmonize_union_name("SIND. TRAB. RJ"), Some("SIND".to_string()));
    }

    #[test]
    fn test_state_names_map_to_codes() {
        assert_eq!(state_code_from_name("Paraná"), Some("PR".to_string()));
        assert_eq!(state_code_from_name("Rio Grande do Sul"), Some("RS".to_string()));
        assert_eq!(state_code_from_name("MATO  GROSSO DO SUL"), Some("MS".to_string()));
        assert_eq!(state_code_from_name("Pará"), Some("PA".to_string()));
    }

    #[test]
    fn test_rate_table_from_state_names() {
        let table = Table::new(
            vec![column("ESTADO", Field::State), column("VALOR", Field::DailyValue)],
            vec![
                row(&["Paraná", "35,00"]),
                row(&["São Paulo", "37,5"]),
                row(&["Rio Grande do Sul", "35"]),
                row(&["Narnia", "10"]),
                row(&["Rio de Janeiro", "n/d"]),
            ],
        );

        let rates = UnionRateTable::from_table(&table);
        assert_eq!(rates.len(), 3);
        assert_eq!(rates.rate_for("SP"), Some(dec("37.5")));
        assert_eq!(rates.rate_for("PR"), Some(dec("35.00")));
        assert_eq!(rates.rate_for("RJ"), None);
    }

    #[test]
    fn test_rate_table_without_columns_is_empty() {
        let table = Table::new(vec![column("ESTADO", Field::State)], vec![row(&["SP"])]);
        assert!(UnionRateTable::from_table(&table).is_empty());
    }

    #[test]
    fn test_working_days_table_joins_on_harmonized_key() {
        let table = Table::new(
            vec![
                column("SINDICATO", Field::Union),
                column("DIAS_UTEIS", Field::WorkingDays),
            ],
            vec![
                row(&["SINDPD SP", "22"]),
                row(&["SITEPD PR", "21"]),
                row(&["SINDPD SP", "99"]),
            ],
        );
        let days = WorkingDaysTable::from_table(&table);

        let key = harmonize_union_name("SINDPD SP - SIND. TRAB. EM PROC DADOS E EMPR")
            .unwrap();
        assert_eq!(days.days_for(&key), Some(dec("22")));
        assert_eq!(days.days_for("SITEPDPR"), Some(dec("21")));
    }

    #[test]
    fn test_resolve_unmatched_state_has_zero_rate() {
        let resolver = UnionRateResolver::new(
            UnionRateTable::from_pairs([("SP", dec("37.5"))]),
            WorkingDaysTable::from_pairs([("SINDPD RJ", dec("21"))]),
        );

        let result = resolver.resolve(Some("SINDPD RJ - SINDICATO"), 3);
        assert_eq!(result.state_code.as_deref(), Some("RJ"));
        assert_eq!(result.daily_rate, Decimal::ZERO);
        assert!(!result.rate_matched);
        assert!(result.days_matched);
        assert_eq!(result.working_days, dec("21"));
        assert_eq!(result.audit_step.step_number, 3);
        assert_eq!(result.audit_step.rule_id, "union_rate_lookup");
    }

    #[test]
    fn test_resolve_missing_union_name() {
        let resolver = UnionRateResolver::default();
        let result = resolver.resolve(None, 1);
        assert_eq!(result.state_code, None);
        assert_eq!(result.union_key, None);
        assert_eq!(result.working_days, Decimal::ZERO);
        assert!(!result.days_matched);
    }
}
