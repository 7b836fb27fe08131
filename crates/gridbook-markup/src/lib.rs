//! # gridbook-markup
//!
//! Shared XML/HTML tree parsing for the markup-based drivers, plus the
//! two drivers that need nothing beyond the tree itself:
//! XML-Spreadsheet-2003 and HTML tables. The XLSX and ODS crates build
//! their archive-aware drivers on the same [`XmlNode`] walker.

pub mod error;
pub mod html;
pub mod tree;
pub mod xmlss;

pub use error::{MarkupError, MarkupResult};
pub use html::HtmlTableReader;
pub use tree::{local_name, XmlNode};
pub use xmlss::XmlSpreadsheetReader;
