//! BIFF8 (Binary Interchange File Format) primitives: byte readers,
//! record constants, record-stream iteration, and string decoding.

pub mod bytes;
pub mod records;
pub mod stream;
pub mod strings;

pub use stream::{parse_bof, read_all_records, BiffRecord};
