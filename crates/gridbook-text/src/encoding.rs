//! Character-set decoding for legacy text formats.
//!
//! CSV/DIF/SYLK/DBF files arrive in whatever single-byte encoding the
//! emitting tool used. Decoding runs a cascade (detected via BOM or valid
//! UTF-8, then cp850, cp437, latin1, utf-8, utf-16le) and scores each
//! candidate by replacement-character count, breaking ties in favour of
//! decodes that produce the spreadsheet glyphs (`°`, `µ`, `±`, `½`, `¼`)
//! these files typically carry.

use encoding_rs::{Encoding, UTF_16LE, UTF_8, WINDOWS_1252};

use crate::error::{TextError, TextResult};

/// High half (0x80-0xFF) of code page 437 (original IBM PC).
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

/// High half of code page 850 (DOS Latin-1).
const CP850_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐', //
    '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤', //
    'ð', 'Ð', 'Ê', 'Ë', 'È', 'ı', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀', //
    'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´', //
    '\u{AD}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■', '\u{A0}',
];

/// Glyphs whose presence suggests a plausible spreadsheet decode.
const SPREADSHEET_GLYPHS: [char; 5] = ['°', 'µ', '±', '½', '¼'];

/// Decode with an explicit encoding label, or run the cascade.
pub fn decode(bytes: &[u8], label: Option<&str>) -> TextResult<String> {
    match label {
        Some(label) => decode_labeled(bytes, label),
        None => Ok(decode_cascade(bytes)),
    }
}

fn decode_labeled(bytes: &[u8], label: &str) -> TextResult<String> {
    match label.to_ascii_lowercase().as_str() {
        "cp850" | "ibm850" => Ok(decode_table(bytes, &CP850_HIGH)),
        "cp437" | "ibm437" => Ok(decode_table(bytes, &CP437_HIGH)),
        "latin1" | "iso-8859-1" => Ok(WINDOWS_1252.decode(bytes).0.into_owned()),
        other => match Encoding::for_label(other.as_bytes()) {
            Some(encoding) => Ok(encoding.decode(bytes).0.into_owned()),
            None => Err(TextError::Encoding(format!("unknown encoding '{label}'"))),
        },
    }
}

/// Run the detection cascade and return the best-scoring decode.
pub fn decode_cascade(bytes: &[u8]) -> String {
    // BOM detection settles it immediately.
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return UTF_8.decode(bytes).0.into_owned();
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return UTF_16LE.decode(bytes).0.into_owned();
    }
    // Clean ASCII/UTF-8 needs no scoring.
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    let candidates: [(&str, String); 5] = [
        ("cp850", decode_table(bytes, &CP850_HIGH)),
        ("cp437", decode_table(bytes, &CP437_HIGH)),
        ("latin1", WINDOWS_1252.decode(bytes).0.into_owned()),
        ("utf-8", UTF_8.decode(bytes).0.into_owned()),
        ("utf-16le", UTF_16LE.decode(bytes).0.into_owned()),
    ];

    let mut best: Option<(i64, String)> = None;
    for (name, decoded) in candidates {
        let replacements = decoded.chars().filter(|&c| c == '\u{FFFD}').count() as i64;
        let glyphs = decoded
            .chars()
            .filter(|c| SPREADSHEET_GLYPHS.contains(c))
            .count() as i64;
        let score = glyphs - replacements * 16;
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            log::debug!("encoding candidate {name}: score {score}");
            best = Some((score, decoded));
        }
    }

    best.map(|(_, s)| s).unwrap_or_default()
}

/// Decode a single-byte encoding with a 128-entry high-half table.
fn decode_table(bytes: &[u8], high: &[char; 128]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                high[(b - 0x80) as usize]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii() {
        assert_eq!(decode(b"a,b,c", None).unwrap(), "a,b,c");
    }

    #[test]
    fn test_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("héllo".as_bytes());
        assert_eq!(decode(&bytes, None).unwrap(), "héllo");
    }

    #[test]
    fn test_utf16le_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hi".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode(&bytes, None).unwrap(), "hi");
    }

    #[test]
    fn test_explicit_labels() {
        // 0xF8 is ° in cp437/cp850, ø in latin1
        assert_eq!(decode(&[0xF8], Some("cp437")).unwrap(), "°");
        assert_eq!(decode(&[0xF8], Some("cp850")).unwrap(), "°");
        assert_eq!(decode(&[0xF8], Some("latin1")).unwrap(), "ø");
        assert_eq!(decode("é".as_bytes(), Some("utf-8")).unwrap(), "é");
        assert!(decode(b"x", Some("klingon")).is_err());
    }

    #[test]
    fn test_cascade_prefers_spreadsheet_glyphs() {
        // "25°C" in cp850; invalid as UTF-8, plausible in several pages;
        // the degree sign tips the score.
        let bytes = [b'2', b'5', 0xF8, b'C'];
        let decoded = decode(&bytes, None).unwrap();
        assert_eq!(decoded, "25°C");
    }

    #[test]
    fn test_cp437_table_spot_checks() {
        assert_eq!(decode_table(&[0x80], &CP437_HIGH), "Ç");
        assert_eq!(decode_table(&[0xE6], &CP437_HIGH), "µ");
        assert_eq!(decode_table(&[0xF1], &CP437_HIGH), "±");
    }

    #[test]
    fn test_cp850_table_spot_checks() {
        assert_eq!(decode_table(&[0x9B], &CP850_HIGH), "ø");
        assert_eq!(decode_table(&[0xE6], &CP850_HIGH), "µ");
        assert_eq!(decode_table(&[0xD0], &CP850_HIGH), "ð");
    }
}
