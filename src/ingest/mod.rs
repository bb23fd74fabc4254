//! Input handling for the VR engine.
//!
//! This module turns the monthly spreadsheet bundle into a normalized
//! [`Dataset`](crate::models::Dataset): file classification by name,
//! delimited-text and workbook reading, header normalization, and cell value
//! parsing.

mod classify;
mod loader;
mod normalize;
mod values;
mod workbook;

pub use classify::{classify_filename, classify_files};
pub use loader::{DatasetLoader, RawTable, read_delimited};
pub use normalize::{normalize_header, normalize_table, resolve_field, strip_accents};
pub use values::{parse_date, parse_decimal};
pub(crate) use values::number_text;
pub use workbook::{is_workbook, read_workbook};
