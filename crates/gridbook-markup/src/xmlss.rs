//! XML-Spreadsheet-2003 driver.
//!
//! The `urn:schemas-microsoft-com:office:spreadsheet` vocabulary: a
//! `Workbook` of `Worksheet/Table` elements where `ss:Index` attributes
//! skip cells and rows to explicit 1-based positions, merge extents are
//! zero-based (`MergeAcross="1"` spans two columns), and formulas are
//! written in R1C1 form.

use std::collections::HashMap;

use gridbook_core::{CellError, CellValue, CssStyle, HorizontalAlignment, SheetState, Workbook};
use gridbook_formula::r1c1_to_a1;

use crate::error::{MarkupError, MarkupResult};
use crate::tree::XmlNode;

/// XML-Spreadsheet-2003 reader.
pub struct XmlSpreadsheetReader;

/// A style definition resolved from a `<Style>` element.
#[derive(Debug, Clone, Default)]
struct ResolvedStyle {
    css: String,
    format: Option<String>,
    align: Option<HorizontalAlignment>,
    wrap: bool,
}

impl XmlSpreadsheetReader {
    /// Parse an XML-Spreadsheet document from its raw bytes.
    pub fn read(data: &[u8]) -> MarkupResult<Workbook> {
        let root = XmlNode::parse(data)?;
        if !root.is("Workbook") {
            return Err(MarkupError::UnexpectedRoot(root.name.clone()));
        }

        let styles = Self::read_styles(&root);
        let mut workbook = Workbook::new();

        if let Some(names) = root.child("Names") {
            for range in names.children_named("NamedRange") {
                if let (Some(name), Some(refers)) = (range.attr("Name"), range.attr("RefersTo")) {
                    let expr = refers.strip_prefix('=').unwrap_or(refers);
                    workbook
                        .defined_names
                        .insert(name.to_string(), r1c1_to_a1(expr, 0, 0));
                }
            }
        }

        for (idx, sheet) in root.children_named("Worksheet").enumerate() {
            let name = sheet
                .attr("Name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("Sheet{}", idx + 1));
            let ws = workbook.add_worksheet(name);

            if let Some(table) = sheet.child("Table") {
                Self::read_table(table, ws, &styles);
            }
            if let Some(options) = sheet.child("WorksheetOptions") {
                Self::read_options(options, ws);
            }
        }

        Ok(workbook)
    }

    fn read_table(
        table: &XmlNode,
        ws: &mut gridbook_core::Worksheet,
        styles: &HashMap<String, ResolvedStyle>,
    ) {
        if let Some(width) = table.attr("DefaultColumnWidth").and_then(parse_f64) {
            ws.default_col_width = Some(points_to_px(width));
        }

        let mut col_pos = 0u32;
        for column in table.children_named("Column") {
            if let Some(idx) = column.attr("Index").and_then(parse_u32) {
                col_pos = idx.saturating_sub(1);
            }
            let span = column.attr("Span").and_then(parse_u32).unwrap_or(0);
            for i in col_pos..=col_pos + span {
                if let Some(width) = column.attr("Width").and_then(parse_f64) {
                    ws.set_column_width(i, points_to_px(width));
                }
                if column.attr("Hidden").map(is_truthy).unwrap_or(false) {
                    ws.set_column_hidden(i);
                }
            }
            col_pos += span + 1;
        }

        let mut row_pos = 0u32;
        for row in table.children_named("Row") {
            if let Some(idx) = row.attr("Index").and_then(parse_u32) {
                row_pos = idx.saturating_sub(1);
            }
            if let Some(height) = row.attr("Height").and_then(parse_f64) {
                ws.set_row_height(row_pos, points_to_px(height));
            }
            if row.attr("Hidden").map(is_truthy).unwrap_or(false) {
                ws.set_row_hidden(row_pos);
            }

            let mut cell_pos = 0u32;
            for cell in row.children_named("Cell") {
                if let Some(idx) = cell.attr("Index").and_then(parse_u32) {
                    cell_pos = idx.saturating_sub(1);
                }
                Self::read_cell(cell, ws, styles, row_pos, cell_pos);
                cell_pos += 1;
            }
            row_pos += 1;
        }
    }

    fn read_cell(
        cell: &XmlNode,
        ws: &mut gridbook_core::Worksheet,
        styles: &HashMap<String, ResolvedStyle>,
        row: u32,
        col: u32,
    ) {
        let value = match cell.attr("Formula") {
            Some(formula) => {
                let translated = r1c1_to_a1(formula.strip_prefix('=').unwrap_or(formula), row, col);
                CellValue::formula(translated)
            }
            None => cell
                .child("Data")
                .map(Self::data_value)
                .unwrap_or(CellValue::Empty),
        };

        if let CellValue::Formula(text) = &value {
            ws.meta_mut(row, col).formula = Some(text.clone());
        }
        if !value.is_empty() {
            ws.set_value(row, col, value);
        }

        // Zero-based extents: MergeAcross="1" covers two columns.
        let across = cell.attr("MergeAcross").and_then(parse_u32).unwrap_or(0);
        let down = cell.attr("MergeDown").and_then(parse_u32).unwrap_or(0);
        if across > 0 || down > 0 {
            ws.set_merge(row, col, across + 1, down + 1);
        }

        if let Some(href) = cell.attr("HRef") {
            ws.meta_mut(row, col).hyperlink = Some(href.to_string());
        }

        if let Some(style) = cell.attr("StyleID").and_then(|id| styles.get(id)) {
            if !style.css.is_empty() {
                ws.set_css(row, col, style.css.clone());
            }
            if style.format.is_some() || style.align.is_some() || style.wrap {
                let meta = ws.meta_mut(row, col);
                meta.format = style.format.clone();
                meta.align = style.align;
                if style.wrap {
                    meta.wrap = Some(true);
                }
            }
        }

        if let Some(comment) = cell.child("Comment") {
            let text = comment.text_content();
            let text = text.trim();
            if !text.is_empty() {
                ws.set_comment(row, col, text);
            }
        }
    }

    fn data_value(data: &XmlNode) -> CellValue {
        let text = data.text_content();
        match data.attr("Type").unwrap_or("String") {
            "Number" => text
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or_else(|_| CellValue::Text(text)),
            "Boolean" => CellValue::Bool(text.trim() == "1"),
            "Error" => CellError::from_text(&text)
                .map(CellValue::Error)
                .unwrap_or_else(|| CellValue::Text(text)),
            _ => {
                if text.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(text)
                }
            }
        }
    }

    fn read_options(options: &XmlNode, ws: &mut gridbook_core::Worksheet) {
        if let Some(visible) = options.child("Visible") {
            ws.state = Some(match visible.text.trim() {
                "SheetHidden" => SheetState::Hidden,
                "SheetVeryHidden" => SheetState::VeryHidden,
                _ => SheetState::Visible,
            });
        }
        if options.child("FreezePanes").is_some() {
            ws.freeze_rows = options
                .child("SplitHorizontal")
                .and_then(|n| parse_u32(n.text.trim()));
            ws.freeze_columns = options
                .child("SplitVertical")
                .and_then(|n| parse_u32(n.text.trim()));
        }
        if options.child("DoNotDisplayGridlines").is_some() {
            ws.gridline = Some(false);
        }
    }

    // ── Styles ───────────────────────────────────────────────────────────

    fn read_styles(root: &XmlNode) -> HashMap<String, ResolvedStyle> {
        let mut out = HashMap::new();
        let Some(styles) = root.child("Styles") else {
            return out;
        };

        for style in styles.children_named("Style") {
            let Some(id) = style.attr("ID") else { continue };
            out.insert(id.to_string(), Self::resolve_style(style));
        }
        out
    }

    fn resolve_style(style: &XmlNode) -> ResolvedStyle {
        let mut css = CssStyle::new();
        let mut resolved = ResolvedStyle::default();

        if let Some(font) = style.child("Font") {
            if font.attr("Bold").map(is_truthy).unwrap_or(false) {
                css.set("font-weight", "bold");
            }
            if font.attr("Italic").map(is_truthy).unwrap_or(false) {
                css.set("font-style", "italic");
            }
            if let Some(size) = font.attr("Size").and_then(parse_f64) {
                css.set("font-size", &format!("{}px", points_to_px(size)));
            }
            if let Some(name) = font.attr("FontName") {
                css.set("font-family", name);
            }
            if let Some(color) = font.attr("Color") {
                if color.starts_with('#') {
                    css.set("color", color);
                }
            }
            if font.attr("Underline").is_some() {
                css.set("text-decoration", "underline");
            }
        }

        if let Some(interior) = style.child("Interior") {
            if let Some(color) = interior.attr("Color") {
                if color.starts_with('#') {
                    css.set("background-color", color);
                }
            }
        }

        if let Some(alignment) = style.child("Alignment") {
            resolved.align = match alignment.attr("Horizontal") {
                Some("Left") => Some(HorizontalAlignment::Left),
                Some("Center") => Some(HorizontalAlignment::Center),
                Some("Right") => Some(HorizontalAlignment::Right),
                Some("Fill") => Some(HorizontalAlignment::Fill),
                Some("Justify") => Some(HorizontalAlignment::Justify),
                _ => None,
            };
            if let Some(a) = resolved.align {
                css.set("text-align", a.as_css());
            }
            if alignment.attr("WrapText").map(is_truthy).unwrap_or(false) {
                resolved.wrap = true;
            }
        }

        if let Some(borders) = style.child("Borders") {
            for border in borders.children_named("Border") {
                let Some(position) = border.attr("Position") else {
                    continue;
                };
                let prop = match position {
                    "Left" => "border-left",
                    "Right" => "border-right",
                    "Top" => "border-top",
                    "Bottom" => "border-bottom",
                    _ => continue,
                };
                let weight = border.attr("Weight").and_then(parse_f64).unwrap_or(1.0);
                let line = match border.attr("LineStyle") {
                    Some("Dash") | Some("DashDot") | Some("DashDotDot") => "dashed",
                    Some("Dot") => "dotted",
                    Some("Double") => "double",
                    _ => "solid",
                };
                let color = border.attr("Color").unwrap_or("#000000");
                css.set(prop, &format!("{}px {line} {color}", weight.max(1.0)));
            }
        }

        if let Some(format) = style.child("NumberFormat") {
            resolved.format = format.attr("Format").map(|f| match f {
                "Short Date" => "m/d/yy".to_string(),
                "Percent" => "0%".to_string(),
                other => other.to_string(),
            });
        }

        resolved.css = css.to_css();
        resolved
    }
}

fn parse_u32(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

fn is_truthy(s: &str) -> bool {
    s == "1" || s.eq_ignore_ascii_case("true")
}

fn points_to_px(points: f64) -> f64 {
    (points * 4.0 / 3.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r##"<?xml version="1.0"?>
<Workbook xmlns="urn:schemas-microsoft-com:office:spreadsheet"
 xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">
 <Styles>
  <Style ss:ID="s1">
   <Font ss:Bold="1" ss:Size="12"/>
   <Interior ss:Color="#CCFFCC" ss:Pattern="Solid"/>
   <Alignment ss:Horizontal="Center" ss:WrapText="1"/>
   <NumberFormat ss:Format="0.00"/>
  </Style>
 </Styles>
 <Names>
  <NamedRange ss:Name="total" ss:RefersTo="=Sheet1!R2C2"/>
 </Names>
 <Worksheet ss:Name="Sheet1">
  <Table>
   <Column ss:Width="120"/>
   <Row>
    <Cell><Data ss:Type="String">Name</Data></Cell>
    <Cell ss:StyleID="s1"><Data ss:Type="Number">3.25</Data></Cell>
   </Row>
   <Row ss:Index="3" ss:Height="30">
    <Cell ss:Index="2" ss:MergeAcross="1" ss:MergeDown="1">
     <Data ss:Type="String">wide</Data>
     <Comment><ss:Data>a note</ss:Data></Comment>
    </Cell>
   </Row>
   <Row>
    <Cell ss:Formula="=RC[-1]*2"><Data ss:Type="Number">6.5</Data></Cell>
    <Cell><Data ss:Type="Boolean">1</Data></Cell>
    <Cell><Data ss:Type="Error">#REF!</Data></Cell>
   </Row>
  </Table>
  <WorksheetOptions>
   <Visible>SheetHidden</Visible>
   <FreezePanes/>
   <SplitHorizontal>2</SplitHorizontal>
   <SplitVertical>1</SplitVertical>
  </WorksheetOptions>
 </Worksheet>
</Workbook>"##;

    #[test]
    fn test_values_and_positions() {
        let wb = XmlSpreadsheetReader::read(DOC.as_bytes()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.name, "Sheet1");
        assert_eq!(ws.value(0, 0), &CellValue::text("Name"));
        assert_eq!(ws.value(0, 1), &CellValue::Number(3.25));
        // Row ss:Index="3" lands on row index 2, Cell ss:Index="2" on col 1
        assert_eq!(ws.value(2, 1), &CellValue::text("wide"));
        // The row after an indexed row continues from it
        assert_eq!(ws.value(3, 1), &CellValue::Bool(true));
        assert_eq!(ws.value(3, 2), &CellValue::Error(CellError::Ref));
    }

    #[test]
    fn test_merge_extents_are_zero_based() {
        let wb = XmlSpreadsheetReader::read(DOC.as_bytes()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.merge_cells.get("B3"), Some(&(2, 2)));
    }

    #[test]
    fn test_r1c1_formula_translated() {
        let wb = XmlSpreadsheetReader::read(DOC.as_bytes()).unwrap();
        let ws = &wb.worksheets[0];
        // Cell at row 3, col 0: RC[-1] clamps to column A
        assert!(matches!(ws.value(3, 0), CellValue::Formula(_)));
    }

    #[test]
    fn test_styles_resolved() {
        let wb = XmlSpreadsheetReader::read(DOC.as_bytes()).unwrap();
        let ws = &wb.worksheets[0];
        let css = ws.css.get("B1").unwrap();
        assert!(css.contains("font-weight: bold;"));
        assert!(css.contains("background-color: #CCFFCC;"));
        assert!(css.contains("text-align: center;"));
        let meta = &ws.cells["B1"];
        assert_eq!(meta.format.as_deref(), Some("0.00"));
        assert_eq!(meta.wrap, Some(true));
    }

    #[test]
    fn test_comment_and_options() {
        let wb = XmlSpreadsheetReader::read(DOC.as_bytes()).unwrap();
        let ws = &wb.worksheets[0];
        assert_eq!(ws.comments.get("B3").map(String::as_str), Some("a note"));
        assert_eq!(ws.state, Some(SheetState::Hidden));
        assert_eq!(ws.freeze_rows, Some(2));
        assert_eq!(ws.freeze_columns, Some(1));
        assert_eq!(ws.columns.get(&0).map(|c| c.width), Some(160.0));
    }

    #[test]
    fn test_named_range_translated() {
        let wb = XmlSpreadsheetReader::read(DOC.as_bytes()).unwrap();
        assert_eq!(wb.defined_names["total"], "Sheet1!$B$2");
    }

    #[test]
    fn test_rejects_foreign_root() {
        assert!(matches!(
            XmlSpreadsheetReader::read(b"<html></html>"),
            Err(MarkupError::UnexpectedRoot(_))
        ));
    }
}
