//! # gridbook
//!
//! Convert heterogeneous spreadsheet files into one uniform in-memory
//! workbook suitable for rendering in a grid component. Sixteen input
//! formats across four families are supported: container-based bundles
//! (XLSX, ODS, Apple Numbers), legacy binaries (XLS/BIFF8, Lotus
//! WK1/WK3/WK4), tokenised text (SYLK, DIF, XML-Spreadsheet-2003, HTML
//! tables, DBF), and delimited text (CSV/TSV).
//!
//! Dispatch is purely extension-based; the caller supplies the bytes and
//! the extension hint. Every driver's output passes through the
//! normaliser, so the returned workbook always satisfies the canonical
//! invariants (dense matrices, interned styles, deduplicated borders,
//! sheet-qualified validations).
//!
//! ## Example
//!
//! ```rust
//! use gridbook::{parse_bytes, ParseOptions};
//!
//! let wb = parse_bytes(b"a,b\n1,2\n", "csv", &ParseOptions::default()).unwrap();
//! assert_eq!(wb.worksheets.len(), 1);
//! ```

pub mod prelude;

use std::path::Path;

use thiserror::Error;

// Re-export the uniform model
pub use gridbook_core::{
    cell_name, column_index, column_name, coords_from_cell_name, coords_from_range, normalize,
    CellError, CellMeta, CellValue, Column, ColumnType, Criterion, CssStyle, HorizontalAlignment,
    Media, MediaAnchor, ParseOptions, Row, SheetLock, SheetState, StyleTable, Validation,
    ValidationAction, ValidationKind, Workbook, Worksheet, MAX_COLS, MAX_ROWS,
};

pub use gridbook_formula::{decode_formula, decode_ptg, normalize_ods_formula, r1c1_to_a1};

use gridbook_lotus::LotusReader;
use gridbook_markup::{HtmlTableReader, XmlSpreadsheetReader};
use gridbook_numbers::NumbersReader;
use gridbook_ods::OdsReader;
use gridbook_text::{CsvReader, DbfReader, DifReader, SylkReader};
use gridbook_xls::XlsReader;
use gridbook_xlsx::XlsxReader;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level parse errors.
#[derive(Debug, Error)]
pub enum Error {
    /// No driver is registered for the extension
    #[error("Unsupported extension: {0}")]
    UnsupportedExtension(String),

    /// Null, empty, or unusable input
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    /// XLS driver failure
    #[error("xls: {0}")]
    Xls(#[from] gridbook_xls::XlsError),

    /// XLSX driver failure
    #[error("xlsx: {0}")]
    Xlsx(#[from] gridbook_xlsx::XlsxError),

    /// ODS driver failure
    #[error("ods: {0}")]
    Ods(#[from] gridbook_ods::OdsError),

    /// XML-Spreadsheet or HTML driver failure
    #[error("markup: {0}")]
    Markup(#[from] gridbook_markup::MarkupError),

    /// CSV/DIF/SYLK/DBF driver failure
    #[error("text: {0}")]
    Text(#[from] gridbook_text::TextError),

    /// Lotus driver failure
    #[error("lotus: {0}")]
    Lotus(#[from] gridbook_lotus::LotusError),

    /// Numbers driver failure
    #[error("numbers: {0}")]
    Numbers(#[from] gridbook_numbers::NumbersError),

    /// IO failure while loading input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse a byte buffer with an extension hint.
///
/// The extension selects the driver; `options` carries the recognised
/// per-driver keys. The returned workbook is fully normalised.
pub fn parse_bytes(data: &[u8], extension: &str, options: &ParseOptions) -> Result<Workbook> {
    if data.is_empty() {
        return Err(Error::InputInvalid("empty input".into()));
    }

    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    let mut workbook = match ext.as_str() {
        "xls" => XlsReader::read(data)?,
        "xlsx" | "xlsm" => XlsxReader::read(data)?,
        "ods" => OdsReader::read(data)?,
        "wks" | "wk1" | "wk3" | "wk4" | "123" => LotusReader::read(data)?,
        "csv" => CsvReader::read(data, options, ',')?,
        "tsv" | "tab" | "txt" => CsvReader::read(data, options, '\t')?,
        "xml" => XmlSpreadsheetReader::read(data)?,
        "dif" => DifReader::read(data, options)?,
        "slk" | "sylk" => SylkReader::read(data, options)?,
        "html" | "htm" => HtmlTableReader::read(data, options)?,
        "dbf" => DbfReader::read(data, options)?,
        "numbers" => NumbersReader::read(data)?,
        other => return Err(Error::UnsupportedExtension(other.to_string())),
    };

    normalize(&mut workbook);
    Ok(workbook)
}

/// Parse a file, dispatching on its extension.
pub fn parse_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Workbook> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::InputInvalid(format!("{} has no extension", path.display())))?
        .to_string();

    let data = std::fs::read(path)?;
    parse_bytes(&data, &extension, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_rejected() {
        let err = parse_bytes(b"", "csv", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InputInvalid(_)));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = parse_bytes(b"x", "pdf", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExtension(_)));
    }

    #[test]
    fn test_extension_case_and_dot_tolerated() {
        assert!(parse_bytes(b"a,b\n", ".CSV", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_csv_is_normalised() {
        let options = ParseOptions {
            first_row_as_header: false,
            ..Default::default()
        };
        let wb = parse_bytes(b"a,b,c\n1,2\n", "csv", &options).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.min_dimensions, (3, 2));
        assert!(ws.data.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_tab_formats_use_tab_delimiter() {
        let options = ParseOptions {
            first_row_as_header: false,
            ..Default::default()
        };
        let wb = parse_bytes(b"x\ty\n", "txt", &options).unwrap();
        assert_eq!(
            wb.worksheets[0].value(0, 1),
            &CellValue::Text("y".to_string())
        );
    }
}
