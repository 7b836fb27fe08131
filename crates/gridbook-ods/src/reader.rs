//! ODS reader.
//!
//! Walks `content.xml` table by table, honouring the run-length
//! compression attributes (`table:number-columns-repeated`,
//! `table:number-rows-repeated`, `table:number-columns-spanned`), with
//! large empty runs truncated to keep degenerate files from exploding the
//! matrix. Frozen panes come from `settings.xml`, sheet visibility from
//! the table style, and formulas go through the OpenDocument dialect
//! normaliser.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use gridbook_core::{
    CellValue, Criterion, SheetState, Validation, ValidationKind, Workbook, Worksheet,
};
use gridbook_formula::normalize_ods_formula;
use gridbook_markup::XmlNode;
use zip::ZipArchive;

use crate::error::{OdsError, OdsResult};
use crate::styles::OdsStyles;

/// Empty row/column runs beyond this stop being expanded.
const MAX_EMPTY_RUN: u32 = 100;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// ODS file reader.
pub struct OdsReader;

/// A content validation declared in `table:content-validations`.
#[derive(Debug, Clone)]
struct ContentValidation {
    kind: ValidationKind,
    criteria: Option<Criterion>,
    values: Vec<String>,
}

impl OdsReader {
    /// Parse an ODS archive from its raw bytes.
    pub fn read(data: &[u8]) -> OdsResult<Workbook> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        let content = parse_member(&mut archive, "content.xml")?
            .ok_or_else(|| OdsError::MissingStream("content.xml".into()))?;

        let mut styles = OdsStyles::default();
        if let Some(styles_root) = parse_member(&mut archive, "styles.xml")? {
            for container in ["styles", "automatic-styles"] {
                if let Some(c) = styles_root.child(container) {
                    styles.collect(c);
                }
            }
        }
        if let Some(c) = content.child("automatic-styles") {
            styles.collect(c);
        }

        let panes = match parse_member(&mut archive, "settings.xml")? {
            Some(settings) => parse_pane_settings(&settings),
            None => HashMap::new(),
        };

        let mut workbook = Workbook::new();
        let Some(spreadsheet) = content
            .child("body")
            .and_then(|b| b.child("spreadsheet"))
        else {
            return Ok(workbook);
        };

        let validations = spreadsheet
            .child("content-validations")
            .map(parse_content_validations)
            .unwrap_or_default();

        for (idx, table) in spreadsheet.children_named("table").enumerate() {
            let name = table
                .attr("name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("Sheet{}", idx + 1));
            let ws = workbook.add_worksheet(name);

            if let Some(style_name) = table.attr("style-name") {
                if styles.table_display.get(style_name) == Some(&false) {
                    ws.state = Some(SheetState::Hidden);
                }
            }
            if let Some(&(freeze_cols, freeze_rows)) = panes.get(&ws.name) {
                if freeze_cols > 0 {
                    ws.freeze_columns = Some(freeze_cols);
                }
                if freeze_rows > 0 {
                    ws.freeze_rows = Some(freeze_rows);
                }
            }

            Self::read_table(table, ws, &styles, &validations);
        }

        Ok(workbook)
    }

    fn read_table(
        table: &XmlNode,
        ws: &mut Worksheet,
        styles: &OdsStyles,
        validations: &HashMap<String, ContentValidation>,
    ) {
        let mut col_pos = 0u32;
        for column in table.children_named("table-column") {
            let repeat = attr_u32(column, "number-columns-repeated").unwrap_or(1);
            let width = column
                .attr("style-name")
                .and_then(|s| styles.column_widths.get(s))
                .copied();
            let hidden = column.attr("visibility") == Some("collapse");

            let expand = if width.is_none() && !hidden {
                repeat.min(1)
            } else {
                repeat.min(MAX_EMPTY_RUN)
            };
            for i in 0..expand {
                if let Some(w) = width {
                    ws.set_column_width(col_pos + i, w);
                }
                if hidden {
                    ws.set_column_hidden(col_pos + i);
                }
            }
            col_pos += repeat;
        }

        let mut row_pos = 0u32;
        for row in table.children_named("table-row") {
            let repeat = attr_u32(row, "number-rows-repeated").unwrap_or(1);
            let has_content = row
                .children_named("table-cell")
                .any(|c| !c.children.is_empty() || !c.attrs.is_empty());

            let expand = if has_content {
                repeat.min(MAX_EMPTY_RUN)
            } else {
                if repeat > MAX_EMPTY_RUN {
                    log::debug!("empty row run of {repeat} truncated");
                }
                row_pos += repeat;
                continue;
            };

            for i in 0..expand {
                let target = row_pos + i;
                if let Some(height) = row
                    .attr("style-name")
                    .and_then(|s| styles.row_heights.get(s))
                {
                    ws.set_row_height(target, *height);
                }
                if row.attr("visibility") == Some("collapse") {
                    ws.set_row_hidden(target);
                }
                Self::read_row(row, ws, styles, validations, target);
            }
            row_pos += repeat;
        }
    }

    fn read_row(
        row: &XmlNode,
        ws: &mut Worksheet,
        styles: &OdsStyles,
        validations: &HashMap<String, ContentValidation>,
        row_idx: u32,
    ) {
        let mut col_pos = 0u32;
        for cell in &row.children {
            let is_covered = cell.is("covered-table-cell");
            if !cell.is("table-cell") && !is_covered {
                continue;
            }
            let repeat = attr_u32(cell, "number-columns-repeated").unwrap_or(1);
            if is_covered {
                col_pos += repeat;
                continue;
            }

            let is_empty_cell = cell.children.is_empty()
                && cell.attrs.iter().all(|(k, _)| {
                    gridbook_markup::local_name(k) == "number-columns-repeated"
                });
            let expand = if is_empty_cell {
                if repeat > MAX_EMPTY_RUN {
                    log::debug!("empty cell run of {repeat} truncated");
                }
                0
            } else {
                repeat.min(MAX_EMPTY_RUN)
            };

            for i in 0..expand {
                Self::read_cell(cell, ws, styles, validations, row_idx, col_pos + i);
            }
            col_pos += repeat;
        }
    }

    fn read_cell(
        cell: &XmlNode,
        ws: &mut Worksheet,
        styles: &OdsStyles,
        validations: &HashMap<String, ContentValidation>,
        row: u32,
        col: u32,
    ) {
        let value = Self::cell_value(cell);

        if let Some(formula) = cell.attr("formula") {
            let text = normalize_ods_formula(formula);
            ws.meta_mut(row, col).formula = Some(text.clone());
            ws.set_value(row, col, CellValue::Formula(text));
        } else if !value.is_empty() {
            ws.set_value(row, col, value);
        }

        // Percentage/currency value types imply a format mask even
        // without a data style.
        match cell.attr("value-type") {
            Some("percentage") => {
                ws.meta_mut(row, col).format.get_or_insert_with(|| "0%".into());
            }
            Some("currency") => {
                ws.meta_mut(row, col)
                    .format
                    .get_or_insert_with(|| "$#,##0.00".into());
            }
            _ => {}
        }

        let spanned_cols = attr_u32(cell, "number-columns-spanned").unwrap_or(1);
        let spanned_rows = attr_u32(cell, "number-rows-spanned").unwrap_or(1);
        if spanned_cols > 1 || spanned_rows > 1 {
            ws.set_merge(row, col, spanned_cols, spanned_rows);
        }

        if let Some(style) = cell.attr("style-name").and_then(|s| styles.cells.get(s)) {
            if !style.css.is_empty() {
                ws.set_css(row, col, style.css.clone());
            }
            if style.format.is_some() || style.align.is_some() || style.wrap {
                let meta = ws.meta_mut(row, col);
                if meta.format.is_none() {
                    meta.format = style.format.clone();
                }
                meta.align = style.align;
                if style.wrap {
                    meta.wrap = Some(true);
                }
            }
        }

        if let Some(annotation) = cell.child("annotation") {
            let text = paragraphs_text(annotation);
            if !text.is_empty() {
                ws.set_comment(row, col, text);
            }
        }

        // Hyperlinks live on text:a inside the paragraph.
        if let Some(href) = cell
            .find_all("a")
            .first()
            .and_then(|a| a.attr("href"))
        {
            ws.meta_mut(row, col).hyperlink = Some(href.to_string());
        }

        if let Some(validation) = cell
            .attr("content-validation-name")
            .and_then(|name| validations.get(name))
        {
            let mut v = Validation::new(
                gridbook_core::cell_name(col, row),
                validation.kind,
            );
            v.criteria = validation.criteria;
            v.value = validation.values.clone();
            ws.validations.push(v);
        }
    }

    fn cell_value(cell: &XmlNode) -> CellValue {
        match cell.attr("value-type") {
            Some("float") | Some("percentage") | Some("currency") => cell
                .attr("value")
                .and_then(|v| v.parse::<f64>().ok())
                .map(CellValue::Number)
                .unwrap_or(CellValue::Empty),
            Some("boolean") => CellValue::Bool(cell.attr("boolean-value") == Some("true")),
            Some("date") => cell
                .attr("date-value")
                .map(CellValue::text)
                .unwrap_or(CellValue::Empty),
            Some("time") => cell
                .attr("time-value")
                .map(CellValue::text)
                .unwrap_or(CellValue::Empty),
            _ => {
                let text = cell
                    .attr("string-value")
                    .map(str::to_string)
                    .unwrap_or_else(|| paragraphs_text(cell));
                if text.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(text)
                }
            }
        }
    }
}

/// Join the direct `text:p` paragraphs of a node with newlines.
fn paragraphs_text(node: &XmlNode) -> String {
    node.children_named("p")
        .map(|p| p.text_content())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn attr_u32(node: &XmlNode, name: &str) -> Option<u32> {
    node.attr(name).and_then(|v| v.trim().parse().ok())
}

/// Decode `table:content-validation` conditions (a tiny `of:` expression
/// vocabulary) into validation kinds.
fn parse_content_validations(container: &XmlNode) -> HashMap<String, ContentValidation> {
    let mut out = HashMap::new();
    for validation in container.children_named("content-validation") {
        let Some(name) = validation.attr("name") else {
            continue;
        };
        let condition = validation.attr("condition").unwrap_or("");

        let parsed = if let Some(list) = condition
            .find("cell-content-is-in-list(")
            .map(|pos| &condition[pos + "cell-content-is-in-list(".len()..])
        {
            let inner = list.strip_suffix(')').unwrap_or(list);
            ContentValidation {
                kind: ValidationKind::List,
                criteria: None,
                values: inner
                    .split(';')
                    .map(|v| v.trim().trim_matches('"').to_string())
                    .collect(),
            }
        } else if condition.contains("cell-content-is-between(") {
            let inner = condition
                .split_once("cell-content-is-between(")
                .map(|(_, rest)| rest.trim_end_matches(')'))
                .unwrap_or("");
            ContentValidation {
                kind: ValidationKind::Number,
                criteria: Some(Criterion::Between),
                values: inner.split(',').map(|v| v.trim().to_string()).collect(),
            }
        } else if !condition.is_empty() {
            ContentValidation {
                kind: ValidationKind::Formula,
                criteria: None,
                values: vec![condition.to_string()],
            }
        } else {
            continue;
        };

        out.insert(name.to_string(), parsed);
    }
    out
}

/// `settings.xml`: per-table split positions. Returns
/// `table name → (frozen columns, frozen rows)`.
fn parse_pane_settings(settings: &XmlNode) -> HashMap<String, (u32, u32)> {
    let mut out = HashMap::new();

    for entry in settings.find_all("config-item-map-entry") {
        let Some(table_name) = entry.attr("name") else {
            continue;
        };
        let mut h_split = 0u32;
        let mut v_split = 0u32;
        for item in entry.children_named("config-item") {
            match item.attr("name") {
                Some("HorizontalSplitPosition") => {
                    h_split = item.text.trim().parse().unwrap_or(0);
                }
                Some("VerticalSplitPosition") => {
                    v_split = item.text.trim().parse().unwrap_or(0);
                }
                _ => {}
            }
        }
        if h_split > 0 || v_split > 0 {
            out.insert(table_name.to_string(), (h_split, v_split));
        }
    }

    out
}

/// Inflate and parse one archive member; `None` when absent.
fn parse_member(archive: &mut Archive<'_>, name: &str) -> OdsResult<Option<XmlNode>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    XmlNode::parse(&bytes)
        .map(Some)
        .map_err(|source| OdsError::Markup {
            part: name.to_string(),
            source,
        })
}
