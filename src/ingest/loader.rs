//! Dataset loading.
//!
//! Reads the monthly input tables from a directory or a zip archive into a
//! [`Dataset`]. Only the base roster is mandatory: every other missing or
//! unreadable table is logged and left out, and the engine treats it as empty.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{Dataset, Role, Table};

use super::classify::classify_files;
use super::normalize::normalize_table;
use super::workbook::{is_workbook, read_workbook};

/// Raw headers and rows read from a delimited file or a workbook sheet.
pub type RawTable = (Vec<String>, Vec<Vec<String>>);

/// Decodes file bytes, falling back to Windows-1252 for legacy spreadsheet
/// exports.
fn decode(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0,
    };
    text.trim_start_matches('\u{feff}').to_string()
}

/// Picks the delimiter that occurs most often in the header line.
fn detect_delimiter(header_line: &str) -> u8 {
    [b';', b'\t', b',']
        .into_iter()
        .map(|d| (d, header_line.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

/// Reads a delimited text table whose headers sit on `header_row`.
///
/// Rows above the header row (titles, notes) are discarded. The delimiter
/// (`,`, `;` or tab) is detected from the header line.
///
/// ```
/// use vr_engine::ingest::read_delimited;
///
/// let data = "Base de dias\nSINDICATO;DIAS UTEIS\nSINDPD SP;22\n";
/// let (headers, rows) = read_delimited(data.as_bytes(), 1).unwrap();
/// assert_eq!(headers, vec!["SINDICATO", "DIAS UTEIS"]);
/// assert_eq!(rows, vec![vec!["SINDPD SP".to_string(), "22".to_string()]]);
/// ```
pub fn read_delimited(bytes: &[u8], header_row: usize) -> EngineResult<RawTable> {
    let text = decode(bytes);
    let delimiter = detect_delimiter(text.lines().nth(header_row).unwrap_or_default());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| EngineError::SourceRead {
            path: "<delimited>".to_string(),
            message: e.to_string(),
        })?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if records.len() <= header_row {
        return Ok((Vec::new(), Vec::new()));
    }

    let rows = records.split_off(header_row + 1);
    let headers = records.pop().unwrap_or_default();
    Ok((headers, rows))
}

/// Loads input tables according to the engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct DatasetLoader<'a> {
    config: &'a EngineConfig,
}

impl<'a> DatasetLoader<'a> {
    /// Creates a loader for the given configuration.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Parses one role's file contents into a normalized table.
    ///
    /// `source` is the file or archive entry name; a workbook extension
    /// (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`) selects the workbook reader,
    /// anything else is read as delimited text.
    pub fn parse_table(&self, role: Role, source: &str, bytes: &[u8]) -> EngineResult<Table> {
        let header_row = self
            .config
            .sources()
            .sources
            .get(&role)
            .map(|s| s.header_row)
            .unwrap_or(0);
        let (headers, rows) = if is_workbook(source) {
            read_workbook(bytes, header_row)?
        } else {
            read_delimited(bytes, header_row)?
        };
        Ok(normalize_table(&headers, rows, self.config.columns()))
    }

    /// Loads every role from a directory.
    ///
    /// A role's configured file name is tried first; roles without a match
    /// fall back to keyword classification of the directory listing.
    pub fn load_dir(&self, dir: &Path) -> EngineResult<Dataset> {
        let listing = fs::read_dir(dir).map_err(|e| EngineError::SourceRead {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut names: Vec<String> = listing
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();

        let mut resolved = classify_files(names.iter().map(String::as_str), self.config.sources())?;
        for (role, source) in &self.config.sources().sources {
            if let Some(file) = source.file.as_deref().filter(|f| dir.join(f).is_file()) {
                resolved.insert(*role, file.to_string());
            }
        }

        let mut dataset = Dataset::new();
        for role in Role::ALL {
            let Some(file) = resolved.get(&role) else {
                warn!(role = %role, dir = %dir.display(), "Input file not found, treating as empty");
                continue;
            };

            let path = dir.join(file);
            let loaded = fs::read(&path)
                .map_err(|e| EngineError::SourceRead {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
                .and_then(|bytes| self.parse_table(role, file, &bytes));
            self.store(&mut dataset, role, &path.display().to_string(), loaded);
        }

        Ok(dataset)
    }

    /// Loads every role from a zip archive, classifying entries by name.
    pub fn load_archive(&self, archive_path: &Path) -> EngineResult<Dataset> {
        let path_str = archive_path.display().to_string();
        let source_err = |message: String| EngineError::SourceRead {
            path: path_str.clone(),
            message,
        };

        let file = File::open(archive_path).map_err(|e| source_err(e.to_string()))?;
        let mut archive = ZipArchive::new(file).map_err(|e| source_err(e.to_string()))?;

        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let resolved = classify_files(names.iter().map(String::as_str), self.config.sources())?;

        let mut dataset = Dataset::new();
        for role in Role::ALL {
            let Some(entry_name) = resolved.get(&role) else {
                warn!(role = %role, archive = %path_str, "Input file not found, treating as empty");
                continue;
            };

            let mut bytes = Vec::new();
            let loaded = archive
                .by_name(entry_name)
                .map_err(|e| source_err(e.to_string()))
                .and_then(|mut entry| {
                    entry
                        .read_to_end(&mut bytes)
                        .map_err(|e| source_err(e.to_string()))
                })
                .and_then(|_| self.parse_table(role, entry_name, &bytes));
            self.store(&mut dataset, role, entry_name, loaded);
        }

        Ok(dataset)
    }

    fn store(&self, dataset: &mut Dataset, role: Role, source: &str, loaded: EngineResult<Table>) {
        match loaded {
            Ok(table) => {
                info!(role = %role, source = %source, rows = table.len(), "Loaded input table");
                dataset.insert(role, table);
            }
            Err(err) => {
                warn!(role = %role, source = %source, error = %err, "Failed to load input table, treating as empty");
            }
        }
    }
}
