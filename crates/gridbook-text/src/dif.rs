//! DIF (Data Interchange Format) reader.
//!
//! DIF is line-oriented: a header section (`TABLE`, `VECTORS`, `TUPLES`)
//! followed by a `DATA` section of two-line chunks. Each chunk's first
//! line is `type,number`; the second line carries the string payload or a
//! validity keyword. Type `-1` lines are directives (`BOT` starts a row,
//! `EOD` ends the stream), type `0` is numeric (the keyword line may turn
//! it into a boolean or error), type `1` is a quoted string.

use gridbook_core::{CellError, CellValue, ParseOptions, Workbook};

use crate::encoding::decode;
use crate::error::{TextError, TextResult};

/// DIF file reader.
pub struct DifReader;

impl DifReader {
    /// Parse a DIF document into a single-worksheet workbook.
    pub fn read(data: &[u8], options: &ParseOptions) -> TextResult<Workbook> {
        let text = decode(data, options.encoding.as_deref())?;
        let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet("Sheet1");

        // Skip the header chunks until the DATA directive.
        let data_start = lines
            .iter()
            .position(|l| l.trim() == "DATA")
            .ok_or_else(|| TextError::Parse("no DATA section found".into()))?;
        let mut pos = data_start + 3; // DATA, "0,0", ""

        let mut row: i64 = -1;
        let mut col: u32 = 0;

        while pos + 1 < lines.len() {
            let header = lines[pos].trim();
            let payload = lines[pos + 1];
            pos += 2;

            let (kind, number) = match header.split_once(',') {
                Some((k, n)) => (k.trim(), n.trim()),
                None => continue,
            };

            match kind {
                "-1" => match payload.trim() {
                    "BOT" => {
                        row += 1;
                        col = 0;
                    }
                    "EOD" => break,
                    other => log::debug!("unknown DIF directive '{other}'"),
                },
                "0" => {
                    if row < 0 {
                        continue;
                    }
                    let value = match payload.trim() {
                        "TRUE" => CellValue::Bool(true),
                        "FALSE" => CellValue::Bool(false),
                        "NA" => CellValue::Error(CellError::Na),
                        "ERROR" => CellValue::Error(CellError::Value),
                        // "V" and anything else: the number stands
                        _ => number
                            .parse::<f64>()
                            .map(CellValue::Number)
                            .unwrap_or(CellValue::Empty),
                    };
                    if !value.is_empty() {
                        ws.set_value(row as u32, col, value);
                    }
                    col += 1;
                }
                "1" => {
                    if row < 0 {
                        continue;
                    }
                    let text = payload.trim();
                    let text = text
                        .strip_prefix('"')
                        .and_then(|t| t.strip_suffix('"'))
                        .unwrap_or(text);
                    if !text.is_empty() {
                        ws.set_value(row as u32, col, CellValue::text(text));
                    }
                    col += 1;
                }
                other => log::debug!("unknown DIF chunk type '{other}'"),
            }
        }

        Ok(workbook)
    }
}
