//! BIFF8 string decoding.
//!
//! BIFF8 strings carry a character count, an options flag byte
//! (bit 0: clear = compressed 8-bit, set = UTF-16LE), and optionally
//! rich-text runs (bit 3) and East-Asian phonetic data (bit 2). Only the
//! base text is retained here; runs and phonetic payloads are skipped.

use super::bytes::{read_u16, read_u32, read_u8};
use crate::error::{XlsError, XlsResult};

/// Read a "short" string (1-byte length prefix, used in BOUNDSHEET and
/// FONT records).
pub fn read_short_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let char_count = read_u8(data, offset)? as u16;
    let flags = read_u8(data, offset)?;
    read_character_data(data, offset, char_count, flags)
}

/// Read a Unicode string with a 2-byte length prefix (used in SST, LABEL,
/// FORMAT, STRING records).
pub fn read_unicode_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let char_count = read_u16(data, offset)?;
    let flags = read_u8(data, offset)?;

    let is_rich = (flags & 0x08) != 0;
    let has_ext = (flags & 0x04) != 0;

    let run_count = if is_rich { read_u16(data, offset)? } else { 0 };
    let ext_size = if has_ext { read_u32(data, offset)? } else { 0 };

    let text = read_character_data(data, offset, char_count, flags)?;

    // Rich-text runs are 4 bytes each (char pos + font index).
    if is_rich {
        *offset += run_count as usize * 4;
    }
    if has_ext {
        *offset += ext_size as usize;
    }

    Ok(text)
}

/// Read character data given the count and the flags byte.
fn read_character_data(
    data: &[u8],
    offset: &mut usize,
    char_count: u16,
    flags: u8,
) -> XlsResult<String> {
    let count = char_count as usize;
    let is_wide = (flags & 0x01) != 0;

    if is_wide {
        let byte_len = count * 2;
        if *offset + byte_len > data.len() {
            return Err(XlsError::Parse(format!(
                "wide string needs {byte_len} bytes at offset {offset}, have {}",
                data.len() - *offset
            )));
        }
        let mut units = Vec::with_capacity(count);
        for i in 0..count {
            units.push(u16::from_le_bytes([
                data[*offset + i * 2],
                data[*offset + i * 2 + 1],
            ]));
        }
        *offset += byte_len;
        Ok(String::from_utf16_lossy(&units))
    } else {
        if *offset + count > data.len() {
            return Err(XlsError::Parse(format!(
                "compressed string needs {count} bytes at offset {offset}, have {}",
                data.len() - *offset
            )));
        }
        let s = data[*offset..*offset + count]
            .iter()
            .map(|&b| b as char)
            .collect();
        *offset += count;
        Ok(s)
    }
}

/// Parse the shared string table from the SST record body (CONTINUE
/// bodies already merged in).
///
/// Layout: total reference count (u32), unique string count (u32), then
/// the strings. An out-of-payload read terminates parsing and returns
/// what was accumulated.
pub fn parse_sst(data: &[u8]) -> XlsResult<Vec<String>> {
    let mut offset = 0;
    let _total_refs = read_u32(data, &mut offset)?;
    let unique_count = read_u32(data, &mut offset)? as usize;

    let mut strings = Vec::with_capacity(unique_count.min(65_536));
    for i in 0..unique_count {
        match read_unicode_string(data, &mut offset) {
            Ok(s) => strings.push(s),
            Err(e) => {
                log::warn!("SST truncated at string {i}/{unique_count}: {e}");
                break;
            }
        }
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_string() {
        let data = [0x03, 0x00, 0x00, b'A', b'B', b'C'];
        let mut offset = 0;
        assert_eq!(read_unicode_string(&data, &mut offset).unwrap(), "ABC");
        assert_eq!(offset, 6);
    }

    #[test]
    fn test_wide_string() {
        let data = [0x02, 0x00, 0x01, b'H', 0x00, b'i', 0x00];
        let mut offset = 0;
        assert_eq!(read_unicode_string(&data, &mut offset).unwrap(), "Hi");
        assert_eq!(offset, 7);
    }

    #[test]
    fn test_short_string() {
        let data = [0x02, 0x00, b'O', b'K'];
        let mut offset = 0;
        assert_eq!(read_short_string(&data, &mut offset).unwrap(), "OK");
    }

    #[test]
    fn test_rich_runs_skipped() {
        // 2 chars, rich flag, 1 run (4 bytes after the text)
        let data = [
            0x02, 0x00, 0x08, 0x01, 0x00, b'h', b'i', 0xAA, 0xBB, 0xCC, 0xDD,
        ];
        let mut offset = 0;
        assert_eq!(read_unicode_string(&data, &mut offset).unwrap(), "hi");
        assert_eq!(offset, data.len());
    }

    #[test]
    fn test_parse_sst() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'A']);
        buf.extend_from_slice(&[0x02, 0x00, 0x00, b'B', b'C']);

        assert_eq!(parse_sst(&buf).unwrap(), vec!["A", "BC"]);
    }

    #[test]
    fn test_parse_sst_truncated_keeps_prefix() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'A']);
        // Second string claims 40 chars but the payload ends
        buf.extend_from_slice(&[0x28, 0x00, 0x00, b'x']);

        assert_eq!(parse_sst(&buf).unwrap(), vec!["A"]);
    }
}
