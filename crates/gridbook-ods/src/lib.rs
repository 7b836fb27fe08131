//! # gridbook-ods
//!
//! OpenDocument Spreadsheet reading for gridbook: `content.xml` tables
//! with run-length expansion, `styles.xml` style resolution, and frozen
//! panes from `settings.xml`.

pub mod error;
pub mod reader;
pub mod styles;

pub use error::{OdsError, OdsResult};
pub use reader::OdsReader;
