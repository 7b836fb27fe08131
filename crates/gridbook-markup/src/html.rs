//! HTML table driver.
//!
//! Reads one `<table>` out of an HTML document (selected by
//! `table_index`) into a single-worksheet workbook. `colspan`/`rowspan`
//! become merges, inline `style` attributes are carried verbatim, anchor
//! hrefs become cell hyperlinks, and the first row can feed the column
//! titles instead of the data matrix.

use gridbook_core::{CellValue, Media, MediaAnchor, ParseOptions, Workbook};

use crate::error::{MarkupError, MarkupResult};
use crate::tree::XmlNode;

/// HTML table reader.
pub struct HtmlTableReader;

impl HtmlTableReader {
    /// Parse the table at `options.table_index` from an HTML document.
    pub fn read(data: &[u8], options: &ParseOptions) -> MarkupResult<Workbook> {
        let root = XmlNode::parse_lenient(data)?;

        let tables = if root.is("table") {
            let mut all = vec![&root];
            all.extend(root.find_all("table"));
            all
        } else {
            root.find_all("table")
        };
        let table = tables
            .get(options.table_index)
            .copied()
            .ok_or(MarkupError::MissingTable(options.table_index))?;

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet("Sheet1");

        // Cells blocked out by a rowspan from an earlier row:
        // (row, col) pairs that must be skipped over.
        let mut occupied: Vec<(u32, u32)> = Vec::new();

        let rows = table.find_all("tr");
        let mut out_row = 0u32;
        let mut header_pending = options.first_row_as_header;

        for tr in rows {
            let cells: Vec<&XmlNode> = tr
                .children
                .iter()
                .filter(|c| c.is("td") || c.is("th"))
                .collect();
            if cells.is_empty() {
                continue;
            }

            if header_pending {
                header_pending = false;
                for (i, cell) in cells.iter().enumerate() {
                    let title = cell.text_content().trim().to_string();
                    if !title.is_empty() {
                        ws.set_column_title(i as u32, title);
                    }
                }
                continue;
            }

            let mut out_col = 0u32;
            for cell in cells {
                while occupied.contains(&(out_row, out_col)) {
                    out_col += 1;
                }

                Self::read_cell(cell, ws, out_row, out_col);

                let colspan = attr_u32(cell, "colspan").unwrap_or(1).max(1);
                let rowspan = attr_u32(cell, "rowspan").unwrap_or(1).max(1);
                if colspan > 1 || rowspan > 1 {
                    ws.set_merge(out_row, out_col, colspan, rowspan);
                    for r in out_row..out_row + rowspan {
                        for c in out_col..out_col + colspan {
                            if r != out_row || c != out_col {
                                occupied.push((r, c));
                            }
                        }
                    }
                }

                out_col += colspan;
            }
            out_row += 1;
        }

        Ok(workbook)
    }

    fn read_cell(cell: &XmlNode, ws: &mut gridbook_core::Worksheet, row: u32, col: u32) {
        let text = cell.text_content().trim().to_string();
        if !text.is_empty() {
            ws.set_value(row, col, sniff_value(&text));
        }

        if let Some(style) = cell.attr("style") {
            ws.set_css(row, col, style.trim().to_string());
        } else if let Some(bgcolor) = cell.attr("bgcolor") {
            ws.set_css(row, col, format!("background-color: {bgcolor};"));
        }

        if let Some(anchor) = cell.find_all("a").first() {
            if let Some(href) = anchor.attr("href") {
                ws.meta_mut(row, col).hyperlink = Some(href.to_string());
            }
        }

        for img in cell.find_all("img") {
            if let Some(src) = img.attr("src") {
                ws.media.push(Media::Image {
                    href: src.to_string(),
                    data: None,
                    anchor: MediaAnchor::Cell(gridbook_core::cell_name(col, row)),
                });
            }
        }
    }
}

fn attr_u32(node: &XmlNode, name: &str) -> Option<u32> {
    node.attr(name).and_then(|v| v.trim().parse().ok())
}

/// Recognise numbers and booleans in cell text, in the same spirit as the
/// delimited-text driver.
fn sniff_value(text: &str) -> CellValue {
    match text.to_ascii_lowercase().as_str() {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<f64>() {
        return CellValue::Number(n);
    }
    CellValue::text(text)
}
