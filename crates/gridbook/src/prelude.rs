//! Convenience re-exports for typical consumers.
//!
//! ```rust
//! use gridbook::prelude::*;
//!
//! let wb = parse_bytes(b"x,y\n", "csv", &ParseOptions::default()).unwrap();
//! assert_eq!(wb.worksheets[0].name, "Sheet1");
//! ```

pub use crate::{parse_bytes, parse_file, Error, Result};
pub use gridbook_core::{
    CellError, CellMeta, CellValue, Column, Media, ParseOptions, Row, SheetState, Validation,
    ValidationAction, ValidationKind, Workbook, Worksheet,
};
