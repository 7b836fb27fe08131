//! # gridbook-core
//!
//! Core data structures for the gridbook spreadsheet-conversion library.
//!
//! This crate provides the uniform workbook representation every format
//! driver produces:
//! - [`Workbook`] / [`Worksheet`] - the document structure
//! - [`CellValue`] - tagged cell values (text, number, bool, error, formula)
//! - [`CellMeta`] - per-cell metadata (format mask, alignment, hyperlink, ...)
//! - [`reference`] - the A1 / (col,row) / letter reference codec
//! - [`StyleTable`] / [`CssStyle`] - style strings and global interning
//! - [`normalize`] - the format-agnostic normalisation pipeline
//!
//! ## Example
//!
//! ```rust
//! use gridbook_core::{normalize, CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.add_worksheet("Sheet1");
//! sheet.set_value(0, 0, CellValue::text("Hello"));
//! sheet.set_value(0, 1, CellValue::Number(42.0));
//! sheet.set_css(0, 0, "font-weight: bold;");
//!
//! normalize(&mut workbook);
//! assert_eq!(workbook.worksheets[0].min_dimensions, (2, 1));
//! assert_eq!(workbook.style.len(), 1);
//! ```

pub mod error;
pub mod media;
pub mod meta;
pub mod normalize;
pub mod options;
pub mod reference;
pub mod style;
pub mod validation;
pub mod value;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use error::{Error, Result};
pub use media::{Media, MediaAnchor};
pub use meta::{CellMeta, Column, ColumnType, HorizontalAlignment, Row, SheetLock, SheetState};
pub use normalize::normalize;
pub use options::ParseOptions;
pub use reference::{
    cell_name, column_index, column_name, coords_from_cell_name, coords_from_range,
    coords_from_range_adjusted, token_identifier, CellAddress, CellRange, RangeCoords,
};
pub use style::{rgb_to_hex, CssStyle, StyleTable};
pub use validation::{Criterion, Validation, ValidationAction, ValidationKind};
pub use value::{CellError, CellValue};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
