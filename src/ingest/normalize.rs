//! Header normalization.
//!
//! Spreadsheet headers arrive with inconsistent case, accents, spacing and
//! punctuation ("Data Demissão ", "DATA_DEMISSAO", "data  demissao"). They are
//! reduced to one normalized form and then resolved to a canonical [`Field`]
//! through the alias table.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::config::ColumnAliases;
use crate::models::{Column, Field, Table};

/// Removes diacritics, keeping the base letters.
///
/// ```
/// use vr_engine::ingest::strip_accents;
///
/// assert_eq!(strip_accents("Férias São Paulo"), "Ferias Sao Paulo");
/// ```
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalizes a raw header.
///
/// Accents are stripped, every run of characters other than ASCII letters and
/// digits becomes a single `_`, leading and trailing `_` are dropped, and the
/// result is uppercased.
///
/// ```
/// use vr_engine::ingest::normalize_header;
///
/// assert_eq!(normalize_header(" Data Demissão "), "DATA_DEMISSAO");
/// assert_eq!(normalize_header("DIAS DE FÉRIAS"), "DIAS_DE_FERIAS");
/// assert_eq!(normalize_header("Título do Cargo"), "TITULO_DO_CARGO");
/// ```
pub fn normalize_header(raw: &str) -> String {
    let plain = strip_accents(raw.trim());
    let mut out = String::with_capacity(plain.len());
    let mut pending_separator = false;

    for c in plain.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_uppercase());
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Resolves a normalized header to a canonical field.
pub fn resolve_field(normalized: &str, aliases: &ColumnAliases) -> Option<Field> {
    // Sorted so the answer does not depend on HashMap iteration order when
    // two fields share an alias.
    let mut matches: Vec<Field> = aliases
        .aliases
        .iter()
        .filter(|(_, names)| names.iter().any(|n| normalize_header(n) == normalized))
        .map(|(field, _)| *field)
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Returns true for headers that carry no column name.
fn is_placeholder(normalized: &str) -> bool {
    normalized.is_empty() || normalized.starts_with("UNNAMED")
}

/// Builds a [`Table`] from raw headers and rows.
///
/// Placeholder columns (blank or `Unnamed: n` headers left by spreadsheet
/// exports) are dropped together with their cells. When two columns resolve
/// to the same field, the first keeps it. Cells are trimmed.
pub fn normalize_table(
    headers: &[String],
    rows: Vec<Vec<String>>,
    aliases: &ColumnAliases,
) -> Table {
    let mut keep = Vec::new();
    let mut columns: Vec<Column> = Vec::new();

    for (idx, raw) in headers.iter().enumerate() {
        let name = normalize_header(raw);
        if is_placeholder(&name) {
            continue;
        }

        let field = resolve_field(&name, aliases)
            .filter(|f| !columns.iter().any(|c| c.field == Some(*f)));

        keep.push(idx);
        columns.push(Column {
            raw: raw.trim().to_string(),
            name,
            field,
        });
    }

    let rows = rows
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&idx| row.get(idx).map(|c| c.trim().to_string()).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    Table::new(columns, rows)
}
