//! Spreadsheet workbook reading.
//!
//! HR exports usually arrive as Excel workbooks. Only the first sheet is read,
//! and every cell is turned into the same text a CSV export would carry, so
//! the rest of the ingest path does not care which format a table came from.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDate};

use crate::error::{EngineError, EngineResult};

use super::loader::RawTable;
use super::values::number_text;

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xlsb", "xls"];

/// Returns true when a file or archive entry name carries a workbook extension.
pub fn is_workbook(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        WORKBOOK_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

fn read_error(message: impl ToString) -> EngineError {
    EngineError::SourceRead {
        path: "<workbook>".to_string(),
        message: message.to_string(),
    }
}

/// Renders an Excel serial as an ISO date, keeping the number when it is out
/// of range.
fn serial_to_iso(serial: f64) -> String {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(serial.trunc() as i64)))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| serial.to_string())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => number_text(*value),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => serial_to_iso(value.as_f64()),
    }
}

/// Reads the first sheet of a workbook whose headers sit on `header_row`.
///
/// `header_row` counts from the top of the sheet, not from the first used
/// cell. Date cells become `YYYY-MM-DD` strings. Whole numbers print without
/// a fraction so IDs match the CSV exports; other numbers use a decimal comma.
pub fn read_workbook(bytes: &[u8], header_row: usize) -> EngineResult<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(read_error)?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok((Vec::new(), Vec::new()));
    };
    let range = range.map_err(read_error)?;

    let first_used_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut records = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

    let Some(skip) = header_row.checked_sub(first_used_row) else {
        // The header row is blank; nothing above the used range to read.
        return Ok((Vec::new(), Vec::new()));
    };
    let Some(headers) = records.nth(skip) else {
        return Ok((Vec::new(), Vec::new()));
    };
    let rows = records
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn workbook_bytes(build: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Vec<u8> {
        let mut workbook = Workbook::new();
        build(workbook.add_worksheet());
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_is_workbook_by_extension() {
        assert!(is_workbook("ATIVOS.xlsx"));
        assert!(is_workbook("bundle/Base dias uteis.XLSX"));
        assert!(is_workbook("legacy.xls"));
        assert!(!is_workbook("ATIVOS.csv"));
        assert!(!is_workbook("README"));
    }

    #[test]
    fn test_read_first_sheet_cells_as_text() {
        let bytes = workbook_bytes(|sheet| {
            sheet.write_string(0, 0, "MATRICULA").unwrap();
            sheet.write_string(0, 1, "DIAS DE FÉRIAS").unwrap();
            sheet.write_number(1, 0, 1007).unwrap();
            sheet.write_number(1, 1, 10.5).unwrap();
        });

        let (headers, rows) = read_workbook(&bytes, 0).unwrap();
        assert_eq!(headers, vec!["MATRICULA", "DIAS DE FÉRIAS"]);
        assert_eq!(rows, vec![vec!["1007".to_string(), "10,5".to_string()]]);
    }

    #[test]
    fn test_date_cells_become_iso() {
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        let bytes = workbook_bytes(|sheet| {
            sheet.write_string(0, 0, "MATRICULA").unwrap();
            sheet.write_string(0, 1, "DATA DEMISSÃO").unwrap();
            sheet.write_number(1, 0, 1004).unwrap();
            let date = ExcelDateTime::from_ymd(2025, 5, 16).unwrap();
            sheet.write_with_format(1, 1, &date, &date_format).unwrap();
        });

        let (_, rows) = read_workbook(&bytes, 0).unwrap();
        assert_eq!(rows[0][1], "2025-05-16");
    }

    #[test]
    fn test_header_row_counts_from_sheet_top() {
        let bytes = workbook_bytes(|sheet| {
            sheet.write_string(0, 0, "Base de dias").unwrap();
            sheet.write_string(1, 0, "SINDICATO").unwrap();
            sheet.write_string(1, 1, "DIAS UTEIS").unwrap();
            sheet.write_string(2, 0, "SINDPD SP").unwrap();
            sheet.write_number(2, 1, 22).unwrap();
        });

        let (headers, rows) = read_workbook(&bytes, 1).unwrap();
        assert_eq!(headers, vec!["SINDICATO", "DIAS UTEIS"]);
        assert_eq!(rows, vec![vec!["SINDPD SP".to_string(), "22".to_string()]]);
    }

    #[test]
    fn test_leading_blank_rows_keep_absolute_header_row() {
        let bytes = workbook_bytes(|sheet| {
            sheet.write_string(1, 0, "MATRICULA").unwrap();
            sheet.write_number(2, 0, 1001).unwrap();
        });

        let (headers, rows) = read_workbook(&bytes, 1).unwrap();
        assert_eq!(headers, vec!["MATRICULA"]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_text_bytes_are_not_a_workbook() {
        let err = read_workbook(b"MATRICULA;CARGO\n1001;ANALISTA\n", 0).unwrap_err();
        assert!(matches!(err, EngineError::SourceRead { .. }));
    }
}
