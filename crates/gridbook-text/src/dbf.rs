//! DBF (dBASE/xBase) reader.
//!
//! Fixed-layout binary: a 32-byte header (record count, header size,
//! record size, language-driver byte), 32-byte field descriptors up to a
//! 0x0D terminator, then fixed-width records whose first byte flags
//! deletion. Field names become the column titles; character fields run
//! through the encoding cascade.

use gridbook_core::{CellValue, ColumnType, ParseOptions, Workbook};

use crate::encoding::{decode, decode_cascade};
use crate::error::{TextError, TextResult};

/// DBF file reader.
pub struct DbfReader;

#[derive(Debug)]
struct Field {
    name: String,
    field_type: u8,
    length: usize,
}

impl DbfReader {
    /// Parse a DBF file into a single-worksheet workbook.
    pub fn read(data: &[u8], options: &ParseOptions) -> TextResult<Workbook> {
        if data.len() < 33 {
            return Err(TextError::Parse("file too short for a DBF header".into()));
        }

        let record_count = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let header_size = u16::from_le_bytes([data[8], data[9]]) as usize;
        let record_size = u16::from_le_bytes([data[10], data[11]]) as usize;
        // Language driver byte hints at the codepage; the cascade handles
        // the common pages, so it only short-circuits the obvious ones.
        let ldid = data[29];
        let encoding_label = options.encoding.clone().or(match ldid {
            0x01 => Some("cp437".to_string()),
            0x02 => Some("cp850".to_string()),
            0x03 | 0x57 => Some("windows-1252".to_string()),
            _ => None,
        });

        if record_size == 0 || header_size >= data.len() {
            return Err(TextError::Parse(format!(
                "implausible DBF geometry: header {header_size}, record {record_size}"
            )));
        }

        // Field descriptors: 32 bytes each, terminated by 0x0D.
        let mut fields = Vec::new();
        let mut pos = 32;
        while pos + 32 <= header_size && data[pos] != 0x0D {
            let raw = &data[pos..pos + 32];
            let name_end = raw[..11].iter().position(|&b| b == 0).unwrap_or(11);
            fields.push(Field {
                name: String::from_utf8_lossy(&raw[..name_end]).into_owned(),
                field_type: raw[11],
                length: raw[16] as usize,
            });
            pos += 32;
        }
        if fields.is_empty() {
            return Err(TextError::Parse("no field descriptors".into()));
        }

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet("Sheet1");

        for (i, field) in fields.iter().enumerate() {
            ws.set_column_title(i as u32, field.name.clone());
            if matches!(field.field_type, b'N' | b'F') {
                if let Some(col) = ws.columns.get_mut(&(i as u32)) {
                    col.column_type = ColumnType::Numeric;
                }
            }
        }

        let mut row_idx = 0u32;
        let mut offset = header_size;
        for _ in 0..record_count {
            if offset + record_size > data.len() {
                log::warn!("DBF record block truncated after {row_idx} rows");
                break;
            }
            let record = &data[offset..offset + record_size];
            offset += record_size;

            // 0x2A marks a deleted record.
            if record[0] == 0x2A {
                continue;
            }

            let mut field_offset = 1;
            for (i, field) in fields.iter().enumerate() {
                if field_offset + field.length > record.len() {
                    break;
                }
                let raw = &record[field_offset..field_offset + field.length];
                field_offset += field.length;

                let value = Self::field_value(field, raw, encoding_label.as_deref())?;
                if !value.is_empty() {
                    ws.set_value(row_idx, i as u32, value);
                }
            }
            row_idx += 1;
        }

        Ok(workbook)
    }

    fn field_value(field: &Field, raw: &[u8], encoding: Option<&str>) -> TextResult<CellValue> {
        match field.field_type {
            b'N' | b'F' => {
                let text = String::from_utf8_lossy(raw);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(CellValue::Empty);
                }
                Ok(trimmed
                    .parse::<f64>()
                    .map(CellValue::Number)
                    .unwrap_or(CellValue::Empty))
            }
            b'L' => Ok(match raw.first() {
                Some(b'T') | Some(b't') | Some(b'Y') | Some(b'y') => CellValue::Bool(true),
                Some(b'F') | Some(b'f') | Some(b'N') | Some(b'n') => CellValue::Bool(false),
                _ => CellValue::Empty,
            }),
            b'D' => {
                // YYYYMMDD → ISO text
                let text = String::from_utf8_lossy(raw);
                let trimmed = text.trim();
                if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(CellValue::text(format!(
                        "{}-{}-{}",
                        &trimmed[0..4],
                        &trimmed[4..6],
                        &trimmed[6..8]
                    )))
                } else {
                    Ok(CellValue::Empty)
                }
            }
            _ => {
                let decoded = match encoding {
                    Some(label) => decode(raw, Some(label))?,
                    None => decode_cascade(raw),
                };
                let trimmed = decoded.trim();
                if trimmed.is_empty() {
                    Ok(CellValue::Empty)
                } else {
                    Ok(CellValue::text(trimmed))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Build a DBF with C(6) name, N(5) score, L flag, D date fields.
    fn build_dbf(rows: &[(&str, &str, u8, &str)], deleted_mask: &[bool]) -> Vec<u8> {
        let fields: [(&str, u8, u8); 4] = [
            ("NAME", b'C', 6),
            ("SCORE", b'N', 5),
            ("OK", b'L', 1),
            ("WHEN", b'D', 8),
        ];
        let record_size = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();
        let header_size = 32 + fields.len() * 32 + 1;

        let mut out = vec![0u8; 32];
        out[0] = 0x03; // dBASE III without memo
        out[4..8].copy_from_slice(&(rows.len() as u32).to_le_bytes());
        out[8..10].copy_from_slice(&(header_size as u16).to_le_bytes());
        out[10..12].copy_from_slice(&(record_size as u16).to_le_bytes());

        for (name, ftype, len) in fields {
            let mut desc = [0u8; 32];
            desc[..name.len()].copy_from_slice(name.as_bytes());
            desc[11] = ftype;
            desc[16] = len;
            out.extend_from_slice(&desc);
        }
        out.push(0x0D);

        for (i, (name, score, flag, date)) in rows.iter().enumerate() {
            out.push(if deleted_mask.get(i).copied().unwrap_or(false) {
                0x2A
            } else {
                0x20
            });
            out.extend_from_slice(format!("{name:<6}").as_bytes());
            out.extend_from_slice(format!("{score:>5}").as_bytes());
            out.push(*flag);
            out.extend_from_slice(format!("{date:<8}").as_bytes());
        }
        out
    }

    #[test]
    fn test_basic_dbf() {
        let data = build_dbf(
            &[
                ("alice", "12.5", b'T', "20240131"),
                ("bob", "7", b'F', ""),
            ],
            &[false, false],
        );
        let wb = DbfReader::read(&data, &ParseOptions::default()).unwrap();
        let ws = &wb.worksheets[0];

        assert_eq!(ws.columns[&0].title, "NAME");
        assert_eq!(ws.columns[&1].title, "SCORE");
        assert_eq!(ws.columns[&1].column_type, ColumnType::Numeric);

        assert_eq!(ws.value(0, 0), &CellValue::text("alice"));
        assert_eq!(ws.value(0, 1), &CellValue::Number(12.5));
        assert_eq!(ws.value(0, 2), &CellValue::Bool(true));
        assert_eq!(ws.value(0, 3), &CellValue::text("2024-01-31"));
        assert_eq!(ws.value(1, 1), &CellValue::Number(7.0));
    }

    #[test]
    fn test_deleted_records_skipped() {
        let data = build_dbf(
            &[("gone", "1", b'T', ""), ("kept", "2", b'F', "")],
            &[true, false],
        );
        let wb = DbfReader::read(&data, &ParseOptions::default()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(0, 0), &CellValue::text("kept"));
        assert_eq!(ws.data.len(), 1);
    }

    #[test]
    fn test_truncated_file_keeps_prefix() {
        let mut data = build_dbf(
            &[("one", "1", b'T', ""), ("two", "2", b'T', "")],
            &[false, false],
        );
        data.truncate(data.len() - 5);
        let wb = DbfReader::read(&data, &ParseOptions::default()).unwrap();
        assert_eq!(wb.worksheets[0].data.len(), 1);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(DbfReader::read(b"oops", &ParseOptions::default()).is_err());
    }
}
