//! # gridbook-formula
//!
//! Formula token decoding and dialect translation for gridbook.
//!
//! This crate provides:
//! - [`decode_ptg`] / [`decode_formula`] - reconstruct infix formula text
//!   from BIFF8 reverse-Polish token streams (with shared-formula
//!   relativisation via [`CellContext`])
//! - [`r1c1_to_a1`] - R1C1 reference rewriting for XML-Spreadsheet-2003
//! - [`normalize_ods_formula`] - OpenDocument formula dialect cleanup
//! - the built-in function name and arity tables in [`functions`]
//!
//! Formula *evaluation* is deliberately absent; every decoder here emits
//! text for downstream display.

pub mod error;
pub mod functions;
pub mod ods;
pub mod ptg;
pub mod r1c1;

pub use error::{FormulaError, FormulaResult};
pub use functions::{fixed_arg_count, function_name};
pub use ods::normalize_ods_formula;
pub use ptg::{decode_formula, decode_ptg, is_shared_formula_ref, CellContext};
pub use r1c1::{decode_xml_entities, r1c1_to_a1};
