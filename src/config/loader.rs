//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{Field, Holiday, Role};

use super::types::{
    ColumnAliases, EngineConfig, EngineSettings, HolidayFile, ReportConfig, SourceConfig,
    SourcesConfig,
};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/default/
/// ├── engine.yaml     # Cost split, pay-period anchor, exclusions
/// ├── columns.yaml    # Header aliases per canonical field
/// ├── sources.yaml    # Input files per role, output path
/// ├── report.yaml     # Supplier template layout
/// └── holidays/
///     └── 2025.yaml   # Holidays for the year
/// ```
///
/// # Example
///
/// ```no_run
/// use vr_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Loaded: {}", loader.settings().name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - A value fails validation (shares not summing to 1, bad anchor day)
    ///
    /// The `holidays` directory is optional; without it no holiday is known.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let columns = Self::load_yaml::<ColumnAliases>(&path.join("columns.yaml"))?;
        let sources = Self::load_yaml::<SourcesConfig>(&path.join("sources.yaml"))?;
        let report = Self::load_yaml::<ReportConfig>(&path.join("report.yaml"))?;
        let holidays = Self::load_holidays(&path.join("holidays"))?;

        let config = EngineConfig::new(settings, columns, sources, report, holidays)?;

        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all holiday files from the holidays directory.
    fn load_holidays(holidays_dir: &Path) -> EngineResult<Vec<Holiday>> {
        if !holidays_dir.exists() {
            return Ok(Vec::new());
        }

        let dir_str = holidays_dir.display().to_string();
        let entries = fs::read_dir(holidays_dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut holidays = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let file = Self::load_yaml::<HolidayFile>(&path)?;
                holidays.extend(file.holidays);
            }
        }

        Ok(holidays)
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        self.config.settings()
    }

    /// Gets the source settings for a role.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use vr_engine::config::ConfigLoader;
    /// use vr_engine::models::Role;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// let source = loader.get_source(Role::WorkingDays)?;
    /// assert_eq!(source.header_row, 1);
    /// # Ok::<(), vr_engine::error::EngineError>(())
    /// ```
    pub fn get_source(&self, role: Role) -> EngineResult<&SourceConfig> {
        self.config
            .sources()
            .sources
            .get(&role)
            .ok_or_else(|| EngineError::InvalidConfig {
                field: format!("sources.{}", role),
                message: "no source configured for this role".to_string(),
            })
    }

    /// Gets the normalized header aliases for a field.
    pub fn get_aliases(&self, field: Field) -> &[String] {
        self.config
            .columns()
            .aliases
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.settings().name, "VR mensal");
    }

    #[test]
    fn test_valuation_shares_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let valuation = &loader.settings().valuation;

        assert_eq!(valuation.employer_share, dec("0.80"));
        assert_eq!(valuation.employee_share, dec("0.20"));
        assert_eq!(valuation.decimal_places, 2);
    }

    #[test]
    fn test_calendar_anchors_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let calendar = &loader.settings().calendar;

        assert_eq!(calendar.pay_period_anchor_day, 16);
        assert_eq!(calendar.termination_cutoff_day, 15);
    }

    #[test]
    fn test_exclusions_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let exclusions = &loader.settings().exclusions;

        assert_eq!(
            exclusions.source_roles,
            vec![Role::Interns, Role::Apprentices, Role::Leave, Role::Overseas]
        );
        assert!(exclusions.denied_titles.contains(&"DIRETOR".to_string()));
        assert!(exclusions.title_fields.contains(&Field::JobTitle));
    }

    #[test]
    fn test_aliases_for_employee_id() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let aliases = loader.get_aliases(Field::EmployeeId);

        assert!(aliases.contains(&"MATRICULA".to_string()));
        assert!(aliases.contains(&"CADASTRO".to_string()));
    }

    #[test]
    fn test_working_days_source_has_header_offset() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let source = loader.get_source(Role::WorkingDays).unwrap();

        assert_eq!(source.header_row, 1);
        assert!(!source.keywords.is_empty());
    }

    #[test]
    fn test_every_role_has_a_source() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        for role in Role::ALL {
            assert!(loader.get_source(role).is_ok(), "no source for {}", role);
        }
    }

    #[test]
    fn test_holidays_loaded_and_sorted() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let holidays = loader.config().holidays();

        assert!(!holidays.is_empty());
        assert!(holidays.windows(2).all(|w| w[0].date <= w[1].date));
        assert!(
            holidays
                .iter()
                .any(|h| h.date == NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
        );
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        assert!(result.is_err());

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_shares_must_sum_to_one() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let config = loader.config();

        let mut settings = config.settings().clone();
        settings.valuation.employee_share = dec("0.30");

        let result = EngineConfig::new(
            settings,
            config.columns().clone(),
            config.sources().clone(),
            config.report().clone(),
            vec![],
        );

        match result {
            Err(EngineError::InvalidConfig { field, .. }) => assert_eq!(field, "valuation"),
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_non_exclusion_role_rejected() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let config = loader.config();

        let mut settings = config.settings().clone();
        settings.exclusions.source_roles.push(Role::Vacations);

        let result = EngineConfig::new(
            settings,
            config.columns().clone(),
            config.sources().clone(),
            config.report().clone(),
            vec![],
        );

        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }
}
