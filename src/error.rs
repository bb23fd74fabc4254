//! Error types for the VR engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can stop a benefit run.

use thiserror::Error;

/// The main error type for the VR engine.
///
/// Soft data problems (missing side tables, unmatched unions, unparseable
/// dates) never surface here; they are logged and recorded as warnings on the
/// run. Only conditions that make the run impossible become errors.
///
/// # Example
///
/// ```
/// use vr_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but holds an unusable value.
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig {
        /// The offending configuration key.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The reference month/year pair does not name a real month.
    #[error("Invalid reference month {month}/{year}")]
    InvalidReferenceMonth {
        /// The requested month (1-12).
        month: u32,
        /// The requested year.
        year: i32,
    },

    /// The active roster is absent or empty, so there is nothing to compute.
    #[error("Base roster '{role}' is missing or empty")]
    MissingBaseRoster {
        /// The role name of the base table.
        role: String,
    },

    /// A table that is required to have a column does not have it.
    #[error("Table '{table}' has no '{column}' column")]
    MissingColumn {
        /// The role name of the table.
        table: String,
        /// The canonical column name.
        column: String,
    },

    /// Required input roles could not be matched to any source file.
    #[error("Could not find input files for: {}", roles.join(", "))]
    UnresolvedRoles {
        /// The role names left without a file.
        roles: Vec<String>,
    },

    /// An input source could not be opened or read.
    #[error("Failed to read source '{path}': {message}")]
    SourceRead {
        /// The path of the source.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The output report could not be written.
    #[error("Failed to write report '{path}': {message}")]
    ReportWrite {
        /// The path of the report.
        path: String,
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
