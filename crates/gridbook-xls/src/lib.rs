//! # gridbook-xls
//!
//! XLS (BIFF8) reading for gridbook: a Compound File Binary container
//! reader, the BIFF8 record engine, XF style resolution, and the driver
//! that assembles a `gridbook_core::Workbook`.

pub mod biff;
pub mod cfb;
pub mod error;
pub mod reader;
pub mod styles;

pub use cfb::CompoundFile;
pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
