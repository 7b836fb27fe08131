//! Delimited text (CSV/TSV) reader.

use gridbook_core::{CellValue, ParseOptions, Workbook};

use crate::encoding::decode;
use crate::error::TextResult;

/// Delimited-text reader.
pub struct CsvReader;

impl CsvReader {
    /// Parse delimited text into a single-worksheet workbook.
    ///
    /// The delimiter defaults to the one in `options`, falling back to
    /// `default_delimiter` (comma for `csv`, tab for `tsv`/`txt`).
    pub fn read(
        data: &[u8],
        options: &ParseOptions,
        default_delimiter: char,
    ) -> TextResult<Workbook> {
        let text = decode(data, options.encoding.as_deref())?;
        let delimiter = options.delimiter.unwrap_or(default_delimiter);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet("Sheet1");

        let mut row_idx = 0u32;
        let mut header_pending = options.first_row_as_header;

        for record in reader.records() {
            let record = record?;

            if header_pending {
                header_pending = false;
                for (col, field) in record.iter().enumerate() {
                    let title = field.trim();
                    if !title.is_empty() {
                        ws.set_column_title(col as u32, title);
                    }
                }
                continue;
            }

            for (col, field) in record.iter().enumerate() {
                let value = detect_type(field);
                if !value.is_empty() {
                    ws.set_value(row_idx, col as u32, value);
                }
            }
            row_idx += 1;
        }

        Ok(workbook)
    }
}

/// Recognise formulas, booleans, and numbers in a field; everything else
/// is text.
fn detect_type(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if trimmed.starts_with('=') {
        return CellValue::Formula(trimmed.to_string());
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {}
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return CellValue::Number(n);
        }
    }
    CellValue::text(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_header() -> ParseOptions {
        ParseOptions {
            first_row_as_header: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_csv() {
        let wb = CsvReader::read(b"a,1,true\nb,2.5,false\n", &no_header(), ',').unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(0, 0), &CellValue::text("a"));
        assert_eq!(ws.value(0, 1), &CellValue::Number(1.0));
        assert_eq!(ws.value(0, 2), &CellValue::Bool(true));
        assert_eq!(ws.value(1, 1), &CellValue::Number(2.5));
    }

    #[test]
    fn test_header_row_becomes_titles() {
        let wb = CsvReader::read(
            b"name,score\nalice,10\n",
            &ParseOptions::default(),
            ',',
        )
        .unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.columns[&0].title, "name");
        assert_eq!(ws.columns[&1].title, "score");
        assert_eq!(ws.value(0, 0), &CellValue::text("alice"));
    }

    #[test]
    fn test_tab_delimiter_default() {
        let wb = CsvReader::read(b"x\ty\n1\t2\n", &no_header(), '\t').unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(0, 1), &CellValue::text("y"));
        assert_eq!(ws.value(1, 0), &CellValue::Number(1.0));
    }

    #[test]
    fn test_explicit_delimiter_option() {
        let options = ParseOptions {
            delimiter: Some(';'),
            first_row_as_header: false,
            ..Default::default()
        };
        let wb = CsvReader::read(b"a;b\n", &options, ',').unwrap();
        assert_eq!(wb.worksheets[0].value(0, 1), &CellValue::text("b"));
    }

    #[test]
    fn test_quoted_fields() {
        let wb = CsvReader::read(b"\"a,b\",\"he said \"\"hi\"\"\"\n", &no_header(), ',').unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.value(0, 0), &CellValue::text("a,b"));
        assert_eq!(ws.value(0, 1), &CellValue::text("he said \"hi\""));
    }

    #[test]
    fn test_formula_detection() {
        let wb = CsvReader::read(b"=SUM(A1:A3),plain\n", &no_header(), ',').unwrap();
        assert_eq!(
            wb.worksheets[0].value(0, 0),
            &CellValue::Formula("=SUM(A1:A3)".into())
        );
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let wb = CsvReader::read(b"a,b,c\n1\n", &no_header(), ',').unwrap();
        assert_eq!(wb.worksheets[0].value(1, 0), &CellValue::Number(1.0));
    }
}
