//! SYLK (Symbolic Link) reader.
//!
//! A SYLK file is a sequence of semicolon-delimited records, one per
//! line: `ID` opens the file, `B` declares the sheet bounds, `C` carries
//! a cell (`;Y` row, `;X` column, `;K` value, `;E` expression), `F`
//! carries formats (`;W` column widths, `;M` row height with `;Y`), and
//! `E` ends the stream. `;;` is an escaped semicolon inside a field.
//! Expressions use R1C1 references and are rewritten to A1.

use gridbook_core::{CellError, CellValue, ParseOptions, Workbook};
use gridbook_formula::r1c1_to_a1;

use crate::encoding::decode;
use crate::error::{TextError, TextResult};

/// SYLK file reader.
pub struct SylkReader;

impl SylkReader {
    /// Parse a SYLK document into a single-worksheet workbook.
    pub fn read(data: &[u8], options: &ParseOptions) -> TextResult<Workbook> {
        let text = decode(data, options.encoding.as_deref())?;
        if !text.starts_with("ID") {
            return Err(TextError::Parse("missing SYLK ID record".into()));
        }

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet("Sheet1");

        // Y/X persist across C records until overridden.
        let mut cur_row = 0u32;
        let mut cur_col = 0u32;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let fields = split_fields(line);
            let Some(record_type) = fields.first().map(String::as_str) else {
                continue;
            };

            match record_type {
                "ID" | "O" | "P" => {}
                "B" => {
                    // Sheet bounds: ;Y row count, ;X column count
                    let mut rows = 0u32;
                    let mut cols = 0u32;
                    for field in &fields[1..] {
                        let (tag, rest) = field.split_at(1.min(field.len()));
                        match tag {
                            "Y" => rows = rest.trim().parse().unwrap_or(0),
                            "X" => cols = rest.trim().parse().unwrap_or(0),
                            _ => {}
                        }
                    }
                    if rows > 0 && cols > 0 {
                        ws.declared_extent = Some((cols, rows));
                    }
                }
                "C" => {
                    let mut value: Option<CellValue> = None;
                    let mut expr: Option<String> = None;

                    for field in &fields[1..] {
                        let (tag, rest) = field.split_at(1.min(field.len()));
                        match tag {
                            "Y" => cur_row = parse_index(rest),
                            "X" => cur_col = parse_index(rest),
                            "K" => value = Some(parse_value(rest)),
                            "E" => expr = Some(rest.to_string()),
                            _ => {}
                        }
                    }

                    if let Some(expr) = expr {
                        let formula = r1c1_to_a1(&expr, cur_row, cur_col);
                        let formula = if formula.starts_with('=') {
                            formula
                        } else {
                            format!("={formula}")
                        };
                        ws.meta_mut(cur_row, cur_col).formula = Some(formula.clone());
                        ws.set_value(cur_row, cur_col, CellValue::Formula(formula));
                    } else if let Some(value) = value {
                        if !value.is_empty() {
                            ws.set_value(cur_row, cur_col, value);
                        }
                    }
                }
                "F" => {
                    let mut row_for_height: Option<u32> = None;
                    for field in &fields[1..] {
                        let (tag, rest) = field.split_at(1.min(field.len()));
                        match tag {
                            "W" => {
                                // W <first> <last> <width-in-chars>
                                let parts: Vec<&str> = rest.split_whitespace().collect();
                                if let [first, last, width] = parts[..] {
                                    let first: u32 = first.parse().unwrap_or(1);
                                    let last: u32 = last.parse().unwrap_or(first);
                                    let chars: f64 = width.parse().unwrap_or(10.0);
                                    for c in first..=last {
                                        ws.set_column_width(
                                            c.saturating_sub(1),
                                            (chars * 7.0).round(),
                                        );
                                    }
                                }
                            }
                            "Y" => row_for_height = Some(parse_index(rest)),
                            "M" => {
                                if let (Some(row), Ok(twips)) =
                                    (row_for_height, rest.parse::<f64>())
                                {
                                    ws.set_row_height(row, (twips / 20.0 * 4.0 / 3.0).round());
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "E" => break,
                other => log::debug!("unknown SYLK record '{other}'"),
            }
        }

        Ok(workbook)
    }
}

/// Split a record on `;`, honouring `;;` escapes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ';' {
            if chars.peek() == Some(&';') {
                chars.next();
                current.push(';');
            } else {
                fields.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

/// SYLK indices are 1-based.
fn parse_index(s: &str) -> u32 {
    s.trim().parse::<u32>().unwrap_or(1).saturating_sub(1)
}

/// A `K` field: quoted text, boolean, error sentinel, or number.
fn parse_value(s: &str) -> CellValue {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return CellValue::text(inner);
    }
    match s {
        "TRUE" => return CellValue::Bool(true),
        "FALSE" => return CellValue::Bool(false),
        _ => {}
    }
    if s.starts_with('#') {
        if let Some(err) = CellError::from_text(s) {
            return CellValue::Error(err);
        }
    }
    s.parse::<f64>()
        .map(CellValue::Number)
        .unwrap_or_else(|_| CellValue::text(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "ID;PWXL;N;E\r\nB;Y3;X3;D0 0 2 2\r\nF;W1 2 12\r\n\
C;Y1;X1;K\"label\"\r\nC;X2;K42\r\nC;Y2;X1;K3.5\r\nC;X2;KTRUE\r\nC;X3;K0;ER1C1*2\r\n\
C;Y3;X1;K\"a;;b\"\r\nE\r\n";

    #[test]
    fn test_cells_and_positions() {
        let wb = SylkReader::read(SAMPLE.as_bytes(), &ParseOptions::default()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(0, 0), &CellValue::text("label"));
        // X2 with persisted Y1
        assert_eq!(ws.value(0, 1), &CellValue::Number(42.0));
        assert_eq!(ws.value(1, 0), &CellValue::Number(3.5));
        assert_eq!(ws.value(1, 1), &CellValue::Bool(true));
    }

    #[test]
    fn test_expression_rewritten_to_a1() {
        let wb = SylkReader::read(SAMPLE.as_bytes(), &ParseOptions::default()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(1, 2), &CellValue::Formula("=$A$1*2".into()));
    }

    #[test]
    fn test_escaped_semicolon() {
        let wb = SylkReader::read(SAMPLE.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(wb.worksheets[0].value(2, 0), &CellValue::text("a;b"));
    }

    #[test]
    fn test_bounds_record_declares_extent() {
        let wb = SylkReader::read(SAMPLE.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(wb.worksheets[0].declared_extent, Some((3, 3)));
    }

    #[test]
    fn test_column_widths() {
        let wb = SylkReader::read(SAMPLE.as_bytes(), &ParseOptions::default()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.columns[&0].width, 84.0);
        assert_eq!(ws.columns[&1].width, 84.0);
    }

    #[test]
    fn test_missing_id() {
        assert!(SylkReader::read(b"C;Y1;X1;K1\n", &ParseOptions::default()).is_err());
    }
}
