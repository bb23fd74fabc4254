//! Supplier report generation.
//!
//! This module maps a [`CalculationRun`](crate::models::CalculationRun) onto
//! the supplier's template columns and writes it as XLSX or CSV.

mod template;
mod writer;

pub use template::{ReportCell, ReportField, ReportTable, build_report, template_columns};
pub use writer::{render_xlsx, write_csv, write_report, write_xlsx};
