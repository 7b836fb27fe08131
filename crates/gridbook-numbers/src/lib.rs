//! # gridbook-numbers
//!
//! Best-effort Apple Numbers extraction. The `.numbers` package is a ZIP
//! holding `Index.zip`, which in turn holds `.iwa` archives: framed,
//! Snappy-compressed protobuf messages whose schemas Apple does not
//! publish. Cell addressing cannot be reconstructed faithfully without
//! those schemas, so this driver sweeps the decompressed messages for
//! length-delimited fields that decode as plausible text, emits them as a
//! coarse one-column grid, and attaches a warning to the workbook.

pub mod error;
pub mod reader;

pub use error::{NumbersError, NumbersResult};
pub use reader::NumbersReader;
