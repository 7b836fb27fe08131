//! # gridbook-lotus
//!
//! Lotus 1-2-3 reading for gridbook. WK1 (and the older WKS) files are a
//! flat `[u16 opcode][u16 length][body]` record stream with one-sheet
//! addressing; WK3/WK4 use the same framing with a sheet byte in each
//! cell address. Formula cells carry a calculated result followed by a
//! token stream in Lotus's own bytecode, which is not decoded: consumers
//! receive the calculated value, and the raw token bytes are dropped.

pub mod error;
pub mod reader;

pub use error::{LotusError, LotusResult};
pub use reader::LotusReader;
