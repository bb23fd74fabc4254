//! Configuration loading and management for the VR engine.
//!
//! This module provides functionality to load run configurations from YAML
//! files: cost split, pay-period anchors, exclusion rules, header aliases,
//! input sources, report layout and holidays.
//!
//! # Example
//!
//! ```no_run
//! use vr_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded: {}", config.settings().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CalendarConfig, ColumnAliases, EngineConfig, EngineSettings, ExclusionConfig, HolidayFile,
    ReportColumnMapping, ReportConfig, SourceConfig, SourcesConfig, ValuationConfig,
};
