//! Numbers package traversal and heuristic IWA text extraction.

use std::io::{Cursor, Read};

use gridbook_core::{CellValue, Workbook};
use zip::ZipArchive;

use crate::error::{NumbersError, NumbersResult};

/// Warning attached to every Numbers parse.
const SPECULATIVE_WARNING: &str = "Numbers/IWA extraction is speculative: cell addressing \
cannot be reconstructed without Apple's protobuf schemas; emitting a coarse text grid";

/// Strings shorter than this are almost always identifiers, not content.
const MIN_TEXT_LEN: usize = 2;
/// Strings longer than this are almost always binary blobs.
const MAX_TEXT_LEN: usize = 400;

/// Apple Numbers package reader.
pub struct NumbersReader;

impl NumbersReader {
    /// Parse a `.numbers` package from its raw bytes.
    pub fn read(data: &[u8]) -> NumbersResult<Workbook> {
        let mut package = ZipArchive::new(Cursor::new(data))?;

        let index_bytes = match member_bytes(&mut package, "Index.zip")? {
            Some(bytes) => bytes,
            None => {
                return Err(NumbersError::MissingStream("Index.zip".into()));
            }
        };
        let mut index = ZipArchive::new(Cursor::new(index_bytes.as_slice()))?;

        let mut texts: Vec<String> = Vec::new();
        let names: Vec<String> = index.file_names().map(str::to_string).collect();
        for name in names {
            if !name.ends_with(".iwa") {
                continue;
            }
            if let Some(bytes) = member_bytes(&mut index, &name)? {
                for message in decode_iwa_chunks(&bytes) {
                    sweep_strings(&message, &mut texts);
                }
            }
        }

        let mut workbook = Workbook::new();
        workbook.warn(SPECULATIVE_WARNING);
        let ws = workbook.add_worksheet("Sheet1");
        for (row, text) in texts.into_iter().enumerate() {
            ws.set_value(row as u32, 0, CellValue::Text(text));
        }

        Ok(workbook)
    }
}

/// IWA framing: repeated `[0x00][u24-le length][snappy payload]` chunks.
/// Payloads lacking the standard Snappy length preamble are retried with
/// one prepended. Undecodable chunks are skipped.
fn decode_iwa_chunks(data: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut pos = 0usize;

    while pos + 4 <= data.len() {
        if data[pos] != 0x00 {
            break;
        }
        let len =
            u32::from_le_bytes([data[pos + 1], data[pos + 2], data[pos + 3], 0]) as usize;
        let start = pos + 4;
        if start + len > data.len() {
            break;
        }
        let payload = &data[start..start + len];
        pos = start + len;

        let mut decoder = snap::raw::Decoder::new();
        match decoder.decompress_vec(payload) {
            Ok(message) => out.push(message),
            Err(_) => {
                // iWork writers omit the uncompressed-length varint;
                // guess a generous one and retry.
                let mut framed = Vec::with_capacity(payload.len() + 5);
                let mut remaining = payload.len() * 8;
                loop {
                    let byte = (remaining & 0x7F) as u8;
                    remaining >>= 7;
                    if remaining == 0 {
                        framed.push(byte);
                        break;
                    }
                    framed.push(byte | 0x80);
                }
                framed.extend_from_slice(payload);
                match decoder.decompress_vec(&framed) {
                    Ok(message) => out.push(message),
                    Err(e) => log::debug!("IWA chunk skipped: {e}"),
                }
            }
        }
    }

    out
}

/// Walk a protobuf message heuristically: varint field headers, skipping
/// scalar wire types, collecting length-delimited fields whose bytes are
/// printable UTF-8 of plausible content length.
fn sweep_strings(message: &[u8], out: &mut Vec<String>) {
    let mut pos = 0usize;

    while pos < message.len() {
        let Some((header, consumed)) = read_varint(message, pos) else {
            break;
        };
        pos += consumed;
        let wire_type = (header & 0x07) as u8;

        match wire_type {
            0 => {
                let Some((_, consumed)) = read_varint(message, pos) else {
                    break;
                };
                pos += consumed;
            }
            1 => pos += 8,
            5 => pos += 4,
            2 => {
                let Some((len, consumed)) = read_varint(message, pos) else {
                    break;
                };
                pos += consumed;
                let len = len as usize;
                if pos + len > message.len() {
                    break;
                }
                let field = &message[pos..pos + len];
                pos += len;

                if (MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&len) {
                    if let Ok(text) = std::str::from_utf8(field) {
                        if is_plausible_text(text) {
                            out.push(text.to_string());
                            continue;
                        }
                    }
                }
                // Not text itself: nested messages often hold the strings.
                sweep_strings(field, out);
            }
            _ => break,
        }
    }
}

fn is_plausible_text(text: &str) -> bool {
    let mut letters = 0usize;
    for c in text.chars() {
        if c.is_control() && c != '\n' && c != '\t' {
            return false;
        }
        if c.is_alphanumeric() || c == ' ' {
            letters += 1;
        }
    }
    letters * 2 >= text.chars().count()
}

fn read_varint(data: &[u8], pos: usize) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(pos + consumed)?;
        consumed += 1;
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some((value, consumed));
        }
        shift += 7;
        if shift > 63 {
            return None;
        }
    }
}

fn member_bytes(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> NumbersResult<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Encode a protobuf string field `tag 2, wire type 2`.
    fn pb_string(text: &str) -> Vec<u8> {
        let mut out = vec![(2 << 3) | 2, text.len() as u8];
        out.extend_from_slice(text.as_bytes());
        out
    }

    fn iwa_chunk(message: &[u8]) -> Vec<u8> {
        let compressed = snap::raw::Encoder::new().compress_vec(message).unwrap();
        let mut out = vec![0x00];
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
        out.extend_from_slice(&compressed);
        out
    }

    #[test]
    fn test_varint() {
        assert_eq!(read_varint(&[0x05], 0), Some((5, 1)));
        assert_eq!(read_varint(&[0xAC, 0x02], 0), Some((300, 2)));
        assert_eq!(read_varint(&[], 0), None);
    }

    #[test]
    fn test_sweep_nested_strings() {
        let inner = pb_string("hello world");
        // Outer message: field 1 wire type 2 wrapping the inner message
        let mut outer = vec![(1 << 3) | 2, inner.len() as u8];
        outer.extend_from_slice(&inner);

        let mut texts = Vec::new();
        sweep_strings(&outer, &mut texts);
        assert_eq!(texts, vec!["hello world"]);
    }

    #[test]
    fn test_binary_fields_rejected() {
        let mut message = vec![(1 << 3) | 2, 4];
        message.extend_from_slice(&[0xFE, 0x01, 0x02, 0xFF]);
        let mut texts = Vec::new();
        sweep_strings(&message, &mut texts);
        assert!(texts.is_empty());
    }

    #[test]
    fn test_end_to_end_package() {
        let mut message = pb_string("Quarterly totals");
        message.extend(pb_string("Revenue"));
        let index = zip_bytes(&[("Tables/DataList.iwa", &iwa_chunk(&message))]);
        let package = zip_bytes(&[("Index.zip", &index), ("preview.jpg", b"\xFF\xD8")]);

        let wb = NumbersReader::read(&package).unwrap();
        assert_eq!(wb.warnings.len(), 1);
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(0, 0), &CellValue::text("Quarterly totals"));
        assert_eq!(ws.value(1, 0), &CellValue::text("Revenue"));
    }

    #[test]
    fn test_missing_index() {
        let package = zip_bytes(&[("whatever.txt", b"x")]);
        assert!(matches!(
            NumbersReader::read(&package),
            Err(NumbersError::MissingStream(_))
        ));
    }
}
