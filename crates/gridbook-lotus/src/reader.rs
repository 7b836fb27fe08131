//! Lotus worksheet record-stream parsing.
//!
//! Record framing is `[u16 opcode][u16 length][body]`, beginning with a
//! BOF record (opcode 0) whose body starts with a version word: 0x0404 /
//! 0x0406 for the single-sheet WKS/WK1 family, 0x1000-0x1005 for the
//! WK3/WK4 family with a sheet byte in cell addresses. Unknown records
//! are skipped by length; a record running past the stream ends parsing
//! with whatever was accumulated.

use gridbook_core::{CellValue, HorizontalAlignment, Workbook, Worksheet};

use crate::error::{LotusError, LotusResult};

// WK1 record opcodes
const BOF: u16 = 0x0000;
const EOF: u16 = 0x0001;
const COLW1: u16 = 0x0008;
const INTEGER: u16 = 0x000D;
const NUMBER: u16 = 0x000E;
const LABEL: u16 = 0x000F;
const FORMULA: u16 = 0x0010;

// WK3/WK4 cell opcodes
const LABEL3: u16 = 0x0016;
const NUMBER3: u16 = 0x0017;
const FORMULA3: u16 = 0x0019;

/// Lotus 1-2-3 file reader.
pub struct LotusReader;

impl LotusReader {
    /// Parse a WKS/WK1/WK3/WK4 file from its raw bytes.
    pub fn read(data: &[u8]) -> LotusResult<Workbook> {
        if data.len() < 6 {
            return Err(LotusError::BadSignature("file too short".into()));
        }
        let opcode = u16::from_le_bytes([data[0], data[1]]);
        let version = u16::from_le_bytes([data[4], data[5]]);
        if opcode != BOF {
            return Err(LotusError::BadSignature(format!(
                "first record is 0x{opcode:04X}, not BOF"
            )));
        }

        let multi_sheet = match version {
            0x0404 | 0x0405 | 0x0406 => false,
            0x1000..=0x1005 => true,
            other => {
                return Err(LotusError::BadSignature(format!(
                    "unrecognised version word 0x{other:04X}"
                )))
            }
        };

        let mut workbook = Workbook::new();
        if !multi_sheet {
            workbook.add_worksheet("Sheet1");
        }

        let mut pos = 0usize;
        while pos + 4 <= data.len() {
            let opcode = u16::from_le_bytes([data[pos], data[pos + 1]]);
            let length = u16::from_le_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let body_start = pos + 4;
            if body_start + length > data.len() {
                log::warn!(
                    "record 0x{opcode:04X} at offset {pos} declares {length} bytes \
                     past the stream end; stopping"
                );
                break;
            }
            let body = &data[body_start..body_start + length];
            pos = body_start + length;

            if opcode == EOF {
                break;
            }
            if multi_sheet {
                Self::wk3_record(opcode, body, &mut workbook);
            } else {
                Self::wk1_record(opcode, body, &mut workbook.worksheets[0]);
            }
        }

        if workbook.worksheets.is_empty() {
            workbook.add_worksheet("Sheet1");
        }
        Ok(workbook)
    }

    // ── WK1 ──────────────────────────────────────────────────────────────

    /// WK1 cell bodies open with `[u8 format][u16 col][u16 row]`.
    fn wk1_record(opcode: u16, body: &[u8], ws: &mut Worksheet) {
        match opcode {
            INTEGER if body.len() >= 7 => {
                let (col, row) = wk1_address(body);
                let value = i16::from_le_bytes([body[5], body[6]]) as f64;
                ws.set_value(row, col, CellValue::Number(value));
            }
            NUMBER if body.len() >= 13 => {
                let (col, row) = wk1_address(body);
                let value = f64::from_le_bytes(body[5..13].try_into().unwrap());
                ws.set_value(row, col, CellValue::Number(value));
            }
            LABEL if body.len() > 5 => {
                let (col, row) = wk1_address(body);
                Self::set_label(ws, row, col, &body[5..]);
            }
            FORMULA if body.len() >= 15 => {
                // Calculated result only; the Lotus token stream that
                // follows is left undecoded.
                let (col, row) = wk1_address(body);
                let value = f64::from_le_bytes(body[5..13].try_into().unwrap());
                ws.set_value(row, col, CellValue::Number(value));
            }
            COLW1 if body.len() >= 2 => {
                let col = body[0] as u32;
                let chars = body[1] as f64;
                ws.set_column_width(col, (chars * 7.0).round());
            }
            _ => {}
        }
    }

    // ── WK3 / WK4 ────────────────────────────────────────────────────────

    /// WK3 cell bodies open with `[u16 row][u8 sheet][u8 col]`.
    fn wk3_record(opcode: u16, body: &[u8], workbook: &mut Workbook) {
        match opcode {
            LABEL3 if body.len() > 4 => {
                let (row, sheet, col) = wk3_address(body);
                let ws = Self::sheet_at(workbook, sheet);
                Self::set_label(ws, row, col, &body[4..]);
            }
            NUMBER3 if body.len() >= 12 => {
                let (row, sheet, col) = wk3_address(body);
                let value = f64::from_le_bytes(body[4..12].try_into().unwrap());
                Self::sheet_at(workbook, sheet).set_value(row, col, CellValue::Number(value));
            }
            FORMULA3 if body.len() >= 14 => {
                let (row, sheet, col) = wk3_address(body);
                let value = f64::from_le_bytes(body[4..12].try_into().unwrap());
                Self::sheet_at(workbook, sheet).set_value(row, col, CellValue::Number(value));
            }
            _ => {}
        }
    }

    /// Worksheets are created on demand, named the way Lotus labels them.
    fn sheet_at(workbook: &mut Workbook, sheet: u8) -> &mut Worksheet {
        while workbook.worksheets.len() <= sheet as usize {
            let name = gridbook_core::column_name(workbook.worksheets.len() as u32);
            workbook.add_worksheet(name);
        }
        &mut workbook.worksheets[sheet as usize]
    }

    /// A label's first byte is the alignment prefix (`'` left, `"` right,
    /// `^` centre, `\` fill); the text is NUL-terminated.
    fn set_label(ws: &mut Worksheet, row: u32, col: u32, raw: &[u8]) {
        let (align, text_start) = match raw.first() {
            Some(b'\'') => (Some(HorizontalAlignment::Left), 1),
            Some(b'"') => (Some(HorizontalAlignment::Right), 1),
            Some(b'^') => (Some(HorizontalAlignment::Center), 1),
            Some(b'\\') => (Some(HorizontalAlignment::Fill), 1),
            _ => (None, 0),
        };
        let end = raw[text_start..]
            .iter()
            .position(|&b| b == 0)
            .map(|p| text_start + p)
            .unwrap_or(raw.len());
        let text: String = raw[text_start..end].iter().map(|&b| b as char).collect();

        if let Some(align) = align {
            ws.meta_mut(row, col).align = Some(align);
        }
        if !text.is_empty() {
            ws.set_value(row, col, CellValue::Text(text));
        }
    }
}

fn wk1_address(body: &[u8]) -> (u32, u32) {
    let col = u16::from_le_bytes([body[1], body[2]]) as u32;
    let row = u16::from_le_bytes([body[3], body[4]]) as u32;
    (col, row)
}

fn wk3_address(body: &[u8]) -> (u32, u8, u32) {
    let row = u16::from_le_bytes([body[0], body[1]]) as u32;
    (row, body[2], body[3] as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(opcode: u16, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&opcode.to_le_bytes());
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn wk1_cell_body(col: u16, row: u16, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![0xFF]; // format byte
        body.extend_from_slice(&col.to_le_bytes());
        body.extend_from_slice(&row.to_le_bytes());
        body.extend_from_slice(payload);
        body
    }

    fn wk1_file() -> Vec<u8> {
        let mut out = record(BOF, &0x0406u16.to_le_bytes());
        out.extend(record(COLW1, &[0, 12]));
        out.extend(record(INTEGER, &wk1_cell_body(0, 0, &42i16.to_le_bytes())));
        out.extend(record(NUMBER, &wk1_cell_body(1, 0, &3.75f64.to_le_bytes())));
        out.extend(record(LABEL, &wk1_cell_body(0, 1, b"^centered\0")));
        out.extend(record(LABEL, &wk1_cell_body(1, 1, b"'plain\0")));
        // Formula: result 10.0 + 3 bogus token bytes (undecoded)
        let mut formula = 10.0f64.to_le_bytes().to_vec();
        formula.extend_from_slice(&3u16.to_le_bytes());
        formula.extend_from_slice(&[0x01, 0x02, 0x03]);
        out.extend(record(FORMULA, &wk1_cell_body(2, 1, &formula)));
        out.extend(record(EOF, &[]));
        out
    }

    #[test]
    fn test_wk1_values() {
        let wb = LotusReader::read(&wk1_file()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(0, 0), &CellValue::Number(42.0));
        assert_eq!(ws.value(0, 1), &CellValue::Number(3.75));
        assert_eq!(ws.value(1, 0), &CellValue::text("centered"));
        assert_eq!(ws.value(1, 1), &CellValue::text("plain"));
    }

    #[test]
    fn test_label_prefix_alignment() {
        let wb = LotusReader::read(&wk1_file()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.cells["A2"].align, Some(HorizontalAlignment::Center));
        assert_eq!(ws.cells["B2"].align, Some(HorizontalAlignment::Left));
    }

    #[test]
    fn test_formula_surfaces_calculated_value() {
        let wb = LotusReader::read(&wk1_file()).unwrap();
        assert_eq!(wb.worksheets[0].value(1, 2), &CellValue::Number(10.0));
    }

    #[test]
    fn test_column_width() {
        let wb = LotusReader::read(&wk1_file()).unwrap();
        assert_eq!(wb.worksheets[0].columns[&0].width, 84.0);
    }

    #[test]
    fn test_wk3_multi_sheet() {
        let mut out = record(BOF, &[0x00, 0x10, 0, 0, 0, 0]);
        // LABEL3 on sheet 1, row 0, col 0
        let mut body = vec![0, 0, 1, 0];
        body.extend_from_slice(b"'hello\0");
        out.extend(record(LABEL3, &body));
        // NUMBER3 on sheet 0, row 2, col 1
        let mut body = vec![2, 0, 0, 1];
        body.extend_from_slice(&5.5f64.to_le_bytes());
        out.extend(record(NUMBER3, &body));
        out.extend(record(EOF, &[]));

        let wb = LotusReader::read(&out).unwrap();
        assert_eq!(wb.worksheets.len(), 2);
        assert_eq!(wb.worksheets[0].name, "A");
        assert_eq!(wb.worksheets[1].name, "B");
        assert_eq!(wb.worksheets[1].value(0, 0), &CellValue::text("hello"));
        assert_eq!(wb.worksheets[0].value(2, 1), &CellValue::Number(5.5));
    }

    #[test]
    fn test_truncated_record_stops_gracefully() {
        let mut out = record(BOF, &0x0406u16.to_le_bytes());
        out.extend(record(INTEGER, &wk1_cell_body(0, 0, &7i16.to_le_bytes())));
        // A record that claims 100 bytes with 2 present
        out.extend_from_slice(&NUMBER.to_le_bytes());
        out.extend_from_slice(&100u16.to_le_bytes());
        out.extend_from_slice(&[0xAB, 0xCD]);

        let wb = LotusReader::read(&out).unwrap();
        assert_eq!(wb.worksheets[0].value(0, 0), &CellValue::Number(7.0));
    }

    #[test]
    fn test_rejects_non_lotus() {
        assert!(LotusReader::read(b"not lotus at all").is_err());
    }
}
