//! # gridbook-text
//!
//! Delimited and tokenised text readers for gridbook: CSV/TSV, DIF,
//! SYLK, and DBF, plus the legacy-encoding cascade they share.

pub mod csv;
pub mod dbf;
pub mod dif;
pub mod encoding;
pub mod error;
pub mod sylk;

pub use csv::CsvReader;
pub use dbf::DbfReader;
pub use dif::DifReader;
pub use error::{TextError, TextResult};
pub use sylk::SylkReader;
