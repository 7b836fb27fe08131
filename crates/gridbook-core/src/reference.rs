//! Cell reference codec.
//!
//! Pure translators between the three coordinate spaces used throughout the
//! library: column letters (A, Z, AA, ZZ, AAA, ...), zero-based `(col, row)`
//! pairs, and A1 text with optional `$` absolute markers. Sheet-qualified
//! references (`Sheet1!A1`, `'My Sheet'!A1:B2`) are handled here as well.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Convert a zero-based column index to letters (0 = A, 25 = Z, 26 = AA, ...).
pub fn column_name(col: u32) -> String {
    let mut result = String::new();
    let mut n = col + 1; // 1-based for the biased base-26 expansion

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Convert column letters to a zero-based index (A = 0, Z = 25, AA = 26, ...).
///
/// Case-insensitive. Returns `None` for empty or non-alphabetic input.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }

    Some(col - 1)
}

/// Render a zero-based `(col, row)` pair as a plain A1 address.
pub fn cell_name(col: u32, row: u32) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Parse an A1 address into `(col, row)`, either of which may be omitted.
///
/// A pure-column token (`A`, `$C`) yields `(Some(col), None)`; a pure-row
/// token (`7`) yields `(None, Some(row))`. `$` markers are accepted and
/// ignored. Column letters are limited to three characters.
pub fn coords_from_cell_name(name: &str) -> Result<(Option<u32>, Option<u32>)> {
    let s = name.trim();
    if s.is_empty() {
        return Err(Error::InvalidAddress("empty address".into()));
    }

    let bytes = s.as_bytes();
    let mut pos = 0;

    if bytes.get(pos) == Some(&b'$') {
        pos += 1;
    }

    let col_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        pos += 1;
    }
    let letter_count = pos - col_start;
    if letter_count > 3 {
        return Err(Error::InvalidAddress(format!(
            "column letters too long in '{s}'"
        )));
    }

    let col = if letter_count > 0 {
        let c = column_index(&s[col_start..pos])
            .ok_or_else(|| Error::InvalidAddress(format!("bad column letters in '{s}'")))?;
        if c >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(c, MAX_COLS - 1));
        }
        Some(c)
    } else {
        None
    };

    if bytes.get(pos) == Some(&b'$') {
        pos += 1;
    }

    let row_str = &s[pos..];
    let row = if row_str.is_empty() {
        None
    } else {
        let r: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{s}'")))?;
        if r == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{s}'"
            )));
        }
        if r - 1 >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(r - 1, MAX_ROWS - 1));
        }
        Some(r - 1)
    };

    if col.is_none() && row.is_none() {
        return Err(Error::InvalidAddress(format!("no coordinates in '{s}'")));
    }

    Ok((col, row))
}

/// Split an optional sheet qualifier off a reference.
///
/// Returns `(sheet, rest)` where `sheet` is `None` when the reference has no
/// `!`. Quoted sheet names (`'My Sheet'!A1`) are unquoted, with doubled
/// quotes collapsed.
pub fn split_sheet_name(reference: &str) -> (Option<String>, &str) {
    if let Some(stripped) = reference.strip_prefix('\'') {
        // Quoted form: scan for the closing quote, honouring '' escapes.
        let bytes = stripped.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                if bytes.get(i + 1) == Some(&b'!') {
                    let name = stripped[..i].replace("''", "'");
                    return (Some(name), &stripped[i + 2..]);
                }
                break;
            }
            i += 1;
        }
        (None, reference)
    } else if let Some(bang) = reference.find('!') {
        (
            Some(reference[..bang].to_string()),
            &reference[bang + 1..],
        )
    } else {
        (None, reference)
    }
}

/// Quote a sheet name for use in a qualified range when necessary.
pub fn quote_sheet_name(name: &str) -> String {
    let needs_quoting = name.is_empty()
        || name
            .chars()
            .any(|c| !(c.is_alphanumeric() || c == '_' || c == '.'));
    if needs_quoting {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

/// The four corners of a parsed range, components omitted where the source
/// reference omitted them (`A:A`, `1:1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCoords {
    pub c1: Option<u32>,
    pub r1: Option<u32>,
    pub c2: Option<u32>,
    pub r2: Option<u32>,
}

/// Parse a range (with optional `Sheet!` prefix) into its four corners.
///
/// A single-cell reference yields identical start and end corners.
pub fn coords_from_range(range: &str) -> Result<RangeCoords> {
    let (_, rest) = split_sheet_name(range.trim());

    let (first, second) = match rest.split_once(':') {
        Some((a, b)) => {
            if b.contains(':') {
                return Err(Error::InvalidRange(format!("too many ':' in '{range}'")));
            }
            (a, Some(b))
        }
        None => (rest, None),
    };

    let (c1, r1) = coords_from_cell_name(first)?;
    let (c2, r2) = match second {
        Some(s) => coords_from_cell_name(s)?,
        None => (c1, r1),
    };

    Ok(RangeCoords { c1, r1, c2, r2 })
}

/// Parse a range and resolve omitted components against a worksheet extent.
///
/// Omitted start components resolve to `0`; omitted end components resolve
/// to the worksheet extent `(cols, rows)` (exclusive bounds, so the last
/// index is `extent - 1`).
pub fn coords_from_range_adjusted(range: &str, extent: (u32, u32)) -> Result<(u32, u32, u32, u32)> {
    let rc = coords_from_range(range)?;
    let (cols, rows) = extent;
    Ok((
        rc.c1.unwrap_or(0),
        rc.r1.unwrap_or(0),
        rc.c2.unwrap_or(cols.saturating_sub(1)),
        rc.r2.unwrap_or(rows.saturating_sub(1)),
    ))
}

/// Recognise a valid A1 token: a cell or range, optionally sheet-qualified.
///
/// Rejects strings with two `:`, quoted sheet names containing `:`, and
/// column letters exceeding three characters.
pub fn token_identifier(token: &str) -> bool {
    let s = token.trim();
    if s.is_empty() {
        return false;
    }

    let (sheet, rest) = split_sheet_name(s);
    if let Some(name) = &sheet {
        if name.contains(':') {
            return false;
        }
    }
    // An unquoted prefix was split on '!'; a stray quote means the quoted
    // form failed to parse.
    if sheet.is_none() && (rest.contains('!') || rest.starts_with('\'')) {
        return false;
    }

    if rest.matches(':').count() > 1 {
        return false;
    }

    match rest.split_once(':') {
        Some((a, b)) => {
            coords_from_cell_name(a).is_ok() && coords_from_cell_name(b).is_ok()
        }
        None => matches!(coords_from_cell_name(rest), Ok((Some(_), Some(_)))),
    }
}

/// A fully-specified cell address with absolute markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0)
    pub col: u32,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Parse an A1-style address; both components must be present.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();

        let col_absolute = bytes.first() == Some(&b'$');
        let mut pos = usize::from(col_absolute);
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let row_absolute = bytes.get(pos) == Some(&b'$');

        match coords_from_cell_name(trimmed)? {
            (Some(col), Some(row)) => Ok(Self {
                row,
                col,
                row_absolute,
                col_absolute,
            }),
            _ => Err(Error::InvalidAddress(format!(
                "incomplete address '{trimmed}'"
            ))),
        }
    }

    /// Format as an A1-style string.
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();
        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&column_name(self.col));
        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&(self.row + 1).to_string());
        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalised so start is top-left.
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let (start_row, end_row) = if start.row <= end.row {
            (start.row, end.row)
        } else {
            (end.row, start.row)
        };
        let (start_col, end_col) = if start.col <= end.col {
            (start.col, end.col)
        } else {
            (end.col, start.col)
        };

        Self {
            start: CellAddress::new(start_row, start_col),
            end: CellAddress::new(end_row, end_col),
        }
    }

    /// Create a range from row/column indices.
    pub fn from_indices(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Parse an `A1:B10` (or single-cell) range, ignoring a sheet prefix.
    pub fn parse(s: &str) -> Result<Self> {
        let rc = coords_from_range(s)?;
        match (rc.c1, rc.r1, rc.c2, rc.r2) {
            (Some(c1), Some(r1), Some(c2), Some(r2)) => Ok(Self::from_indices(r1, c1, r2, c2)),
            _ => Err(Error::InvalidRange(format!(
                "range '{s}' has open-ended components"
            ))),
        }
    }

    /// Check whether a `(row, col)` pair lies within the range.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start.row && row <= self.end.row && col >= self.start.col && col <= self.end.col
    }

    /// Check whether this range overlaps another.
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Format as an `A1:B10` string (single-cell ranges collapse to `A1`).
    pub fn to_a1_string(&self) -> String {
        if self.start.row == self.end.row && self.start.col == self.end.col {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(1), "B");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
        assert_eq!(column_name(16383), "XFD"); // Max Excel column
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("ZZ"), Some(701));
        assert_eq!(column_index("AAA"), Some(702));
        assert_eq!(column_index("XFD"), Some(16383));

        // Case insensitive
        assert_eq!(column_index("a"), Some(0));
        assert_eq!(column_index("aa"), Some(26));

        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_column_round_trip() {
        for i in 0..10_000 {
            assert_eq!(column_index(&column_name(i)), Some(i));
        }
    }

    #[test]
    fn test_cell_name() {
        assert_eq!(cell_name(0, 0), "A1");
        assert_eq!(cell_name(2, 99), "C100");
        assert_eq!(cell_name(26, 9), "AA10");
    }

    #[test]
    fn test_coords_from_cell_name() {
        assert_eq!(coords_from_cell_name("A1").unwrap(), (Some(0), Some(0)));
        assert_eq!(coords_from_cell_name("$B$2").unwrap(), (Some(1), Some(1)));
        assert_eq!(coords_from_cell_name("AA10").unwrap(), (Some(26), Some(9)));
        // Pure-column and pure-row tokens leave the other side open
        assert_eq!(coords_from_cell_name("C").unwrap(), (Some(2), None));
        assert_eq!(coords_from_cell_name("7").unwrap(), (None, Some(6)));
    }

    #[test]
    fn test_coords_from_cell_name_errors() {
        assert!(coords_from_cell_name("").is_err());
        assert!(coords_from_cell_name("A0").is_err());
        assert!(coords_from_cell_name("AAAA1").is_err()); // four letters
        assert!(coords_from_cell_name("XFE1").is_err()); // beyond max column
    }

    #[test]
    fn test_coords_from_range() {
        let rc = coords_from_range("A1:B2").unwrap();
        assert_eq!(rc.c1, Some(0));
        assert_eq!(rc.r1, Some(0));
        assert_eq!(rc.c2, Some(1));
        assert_eq!(rc.r2, Some(1));

        // Sheet prefix is stripped
        let rc = coords_from_range("Sheet1!C3").unwrap();
        assert_eq!(rc.c1, Some(2));
        assert_eq!(rc.r1, Some(2));
        assert_eq!(rc.c2, Some(2));

        // Whole-column range
        let rc = coords_from_range("A:A").unwrap();
        assert_eq!(rc.c1, Some(0));
        assert_eq!(rc.r1, None);
        assert_eq!(rc.r2, None);
    }

    #[test]
    fn test_coords_from_range_adjusted() {
        assert_eq!(
            coords_from_range_adjusted("A:A", (10, 100)).unwrap(),
            (0, 0, 0, 99)
        );
        assert_eq!(
            coords_from_range_adjusted("2:3", (10, 100)).unwrap(),
            (0, 1, 9, 2)
        );
    }

    #[test]
    fn test_split_sheet_name() {
        assert_eq!(split_sheet_name("A1"), (None, "A1"));
        assert_eq!(
            split_sheet_name("Sheet1!A1"),
            (Some("Sheet1".to_string()), "A1")
        );
        assert_eq!(
            split_sheet_name("'My Sheet'!A1:B2"),
            (Some("My Sheet".to_string()), "A1:B2")
        );
        assert_eq!(
            split_sheet_name("'It''s'!A1"),
            (Some("It's".to_string()), "A1")
        );
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
        assert_eq!(quote_sheet_name("My Sheet"), "'My Sheet'");
        assert_eq!(quote_sheet_name("It's"), "'It''s'");
    }

    #[test]
    fn test_token_identifier() {
        assert!(token_identifier("A1"));
        assert!(token_identifier("$A$1"));
        assert!(token_identifier("A1:B2"));
        assert!(token_identifier("Sheet1!A1"));
        assert!(token_identifier("'My Sheet'!A1:B2"));
        assert!(token_identifier("A:A"));
        assert!(token_identifier("1:3"));

        assert!(!token_identifier(""));
        assert!(!token_identifier("A1:B2:C3")); // two colons
        assert!(!token_identifier("AAAA1")); // four column letters
        assert!(!token_identifier("hello"));
        assert!(!token_identifier("1.5"));
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");

        let addr = CellAddress::parse("$A$1").unwrap();
        assert!(addr.row_absolute);
        assert!(addr.col_absolute);
        assert_eq!(addr.to_string(), "$A$1");
    }

    #[test]
    fn test_cell_range() {
        let range = CellRange::parse("B2:D4").unwrap();
        assert!(range.contains(1, 1));
        assert!(range.contains(3, 3));
        assert!(!range.contains(0, 0));
        assert_eq!(range.to_a1_string(), "B2:D4");

        // Reversed corners are normalised
        let range = CellRange::parse("D4:B2").unwrap();
        assert_eq!(range.to_a1_string(), "B2:D4");

        let single = CellRange::parse("C3").unwrap();
        assert_eq!(single.to_a1_string(), "C3");
    }

    #[test]
    fn test_cell_range_overlaps() {
        let a = CellRange::parse("A1:C3").unwrap();
        let b = CellRange::parse("C3:E5").unwrap();
        let c = CellRange::parse("D4:E5").unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
