//! Monthly meal-voucher (VR) benefit engine
//!
//! This crate consolidates the monthly HR spreadsheets (active roster,
//! admissions, terminations, vacations, exclusion lists, union tables),
//! computes each employee's payable days and benefit value, and emits the
//! supplier report in the supplier's template layout.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod report;
