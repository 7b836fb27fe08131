//! # gridbook-xlsx
//!
//! XLSX (Office Open XML) reading for gridbook: archive access, shared
//! strings, the `cellXfs`/`dxfs` style cross-reference, worksheet
//! traversal, and shallow drawing/chart extraction.

pub mod drawings;
pub mod error;
pub mod reader;
pub mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
