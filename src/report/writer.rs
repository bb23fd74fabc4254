//! Report writers.
//!
//! The output format follows the file extension: `.xlsx` produces a workbook
//! for the supplier portal, anything else a `;`-separated CSV.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::template::{ReportCell, ReportTable};

const SHEET_NAME: &str = "VR Mensal";

fn write_error(path: &Path, message: impl ToString) -> EngineError {
    EngineError::ReportWrite {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Writes the report, picking the format from the extension of `path`.
pub fn write_report(report: &ReportTable, path: &Path) -> EngineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }

    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));

    if is_xlsx {
        write_xlsx(report, path)?;
    } else {
        write_csv(report, path)?;
    }

    info!(
        path = %path.display(),
        rows = report.rows.len(),
        columns = report.columns.len(),
        "Report written"
    );
    Ok(())
}

/// Writes the report as a `;`-separated CSV with decimal points.
pub fn write_csv(report: &ReportTable, path: &Path) -> EngineResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(|e| write_error(path, e))?;

    writer
        .write_record(&report.columns)
        .map_err(|e| write_error(path, e))?;
    for row in &report.rows {
        writer
            .write_record(row.iter().map(ReportCell::to_text))
            .map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))
}

/// Builds the XLSX workbook bytes for a report.
pub fn render_xlsx(report: &ReportTable) -> Result<Vec<u8>, XlsxError> {
    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(0x4472C4)
        .set_font_color(0xFFFFFF)
        .set_border(FormatBorder::Thin);
    let number = Format::new()
        .set_num_format("#,##0.00")
        .set_border(FormatBorder::Thin);
    let date = Format::new()
        .set_num_format("dd/mm/yyyy")
        .set_border(FormatBorder::Thin);
    let text = Format::new().set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in report.columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_with_format(0, col, name.as_str(), &header)?;
        sheet.set_column_width(col, (name.chars().count() + 4).max(12) as f64)?;
    }

    for (index, row) in report.rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                ReportCell::Empty => {
                    sheet.write_blank(row_num, col, &text)?;
                }
                ReportCell::Text(value) => {
                    sheet.write_with_format(row_num, col, value.as_str(), &text)?;
                }
                ReportCell::Number(value) => {
                    sheet.write_with_format(row_num, col, decimal_to_f64(*value), &number)?;
                }
                ReportCell::Date(value) => {
                    sheet.write_with_format(row_num, col, &excel_date(*value)?, &date)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

/// Writes the report as an XLSX workbook.
pub fn write_xlsx(report: &ReportTable, path: &Path) -> EngineResult<()> {
    let buffer = render_xlsx(report).map_err(|e| write_error(path, e))?;
    std::fs::write(path, buffer).map_err(|e| write_error(path, e))
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime, XlsxError> {
    ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
