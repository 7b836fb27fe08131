//! XLSX reader.
//!
//! Opens the OOXML archive, builds the shared string table and the style
//! cross-reference, then walks each worksheet part: cells, merges,
//! hyperlinks (through the sheet relationships), validations, conditional
//! formats, panes, protection, comments, and drawings.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use gridbook_core::{
    coords_from_range, CellError, CellValue, Criterion, SheetState, SheetLock, Validation,
    ValidationAction, ValidationKind, Workbook, Worksheet,
};
use gridbook_markup::XmlNode;
use zip::ZipArchive;

use crate::drawings;
use crate::error::{XlsxError, XlsxResult};
use crate::styles::{parse_styles, XlsxStyles};

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// XLSX file reader.
pub struct XlsxReader;

impl XlsxReader {
    /// Parse an XLSX archive from its raw bytes.
    pub fn read(data: &[u8]) -> XlsxResult<Workbook> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        let workbook_xml = parse_member(&mut archive, "xl/workbook.xml")?
            .ok_or_else(|| XlsxError::MissingStream("xl/workbook.xml".into()))?;

        let sst = match parse_member(&mut archive, "xl/sharedStrings.xml")? {
            Some(root) => parse_shared_strings(&root),
            None => Vec::new(),
        };
        let styles = match parse_member(&mut archive, "xl/styles.xml")? {
            Some(root) => parse_styles(&root),
            None => XlsxStyles::default(),
        };
        let wb_rels = match parse_member(&mut archive, "xl/_rels/workbook.xml.rels")? {
            Some(root) => parse_rels(&root),
            None => HashMap::new(),
        };

        let mut workbook = Workbook::new();

        if let Some(names) = workbook_xml.child("definedNames") {
            for name in names.children_named("definedName") {
                if let Some(key) = name.attr("name") {
                    workbook
                        .defined_names
                        .insert(key.to_string(), name.text_content());
                }
            }
        }

        let Some(sheets) = workbook_xml.child("sheets") else {
            return Ok(workbook);
        };

        for (idx, sheet) in sheets.children_named("sheet").enumerate() {
            let name = sheet
                .attr("name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("Sheet{}", idx + 1));
            let ws = workbook.add_worksheet(name);

            match sheet.attr("state") {
                Some("hidden") => ws.state = Some(SheetState::Hidden),
                Some("veryHidden") => ws.state = Some(SheetState::VeryHidden),
                _ => {}
            }

            let target = sheet
                .attr("id")
                .and_then(|rid| wb_rels.get(rid))
                .cloned()
                .unwrap_or_else(|| format!("worksheets/sheet{}.xml", idx + 1));
            let sheet_path = resolve_path("xl", &target);

            let Some(sheet_root) = parse_member(&mut archive, &sheet_path)? else {
                log::warn!("worksheet part {sheet_path} missing from archive");
                continue;
            };

            let rels_path = rels_path_for(&sheet_path);
            let sheet_rels = match parse_member(&mut archive, &rels_path)? {
                Some(root) => parse_rels(&root),
                None => HashMap::new(),
            };

            Self::read_worksheet(
                &sheet_root,
                ws,
                &sst,
                &styles,
                &sheet_rels,
                &sheet_path,
                &mut archive,
            )?;
        }

        Ok(workbook)
    }

    #[allow(clippy::too_many_arguments)]
    fn read_worksheet(
        root: &XmlNode,
        ws: &mut Worksheet,
        sst: &[String],
        styles: &XlsxStyles,
        rels: &HashMap<String, String>,
        sheet_path: &str,
        archive: &mut Archive<'_>,
    ) -> XlsxResult<()> {
        // Worksheet extent from the dimension declaration: `(maxCol,
        // maxRow)` floors the squared matrix, and maxCol also caps the
        // `<col>` styling ranges (which may reference up to 16384
        // columns).
        let dimension = root
            .child("dimension")
            .and_then(|d| d.attr("ref"))
            .and_then(|r| coords_from_range(r).ok());
        let max_col = dimension.and_then(|rc| rc.c2);
        if let Some(rc) = dimension {
            if let (Some(c2), Some(r2)) = (rc.c2, rc.r2) {
                ws.declared_extent = Some((c2 + 1, r2 + 1));
            }
        }

        if let Some(view) = root
            .child("sheetViews")
            .and_then(|v| v.child("sheetView"))
        {
            if matches!(view.attr("showGridLines"), Some("0") | Some("false")) {
                ws.gridline = Some(false);
            }
            if let Some(pane) = view.child("pane") {
                if matches!(pane.attr("state"), Some("frozen") | Some("frozenSplit")) {
                    ws.freeze_columns = pane.attr("xSplit").and_then(|v| v.parse().ok());
                    ws.freeze_rows = pane.attr("ySplit").and_then(|v| v.parse().ok());
                }
            }
        }

        if let Some(fmt) = root.child("sheetFormatPr") {
            if let Some(w) = fmt.attr("defaultColWidth").and_then(|v| v.parse::<f64>().ok()) {
                ws.default_col_width = Some((w * 7.0).round());
            }
        }

        if let Some(cols) = root.child("cols") {
            for col in cols.children_named("col") {
                let Some(min) = col.attr("min").and_then(|v| v.parse::<u32>().ok()) else {
                    continue;
                };
                let max = col
                    .attr("max")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(min);
                let max = match max_col {
                    Some(cap) => max.min(cap + 1),
                    None => max.min(min + 1024),
                };
                let width = col.attr("width").and_then(|v| v.parse::<f64>().ok());
                let hidden = matches!(col.attr("hidden"), Some("1") | Some("true"));
                for c in min..=max.max(min) {
                    let idx = c.saturating_sub(1);
                    if let Some(w) = width {
                        ws.set_column_width(idx, (w * 7.0).round());
                    }
                    if hidden {
                        ws.set_column_hidden(idx);
                    }
                }
            }
        }

        if let Some(sheet_data) = root.child("sheetData") {
            let mut row_idx = 0u32;
            for row in sheet_data.children_named("row") {
                if let Some(r) = row.attr("r").and_then(|v| v.parse::<u32>().ok()) {
                    row_idx = r.saturating_sub(1);
                }
                if let Some(ht) = row.attr("ht").and_then(|v| v.parse::<f64>().ok()) {
                    ws.set_row_height(row_idx, (ht * 4.0 / 3.0).round());
                }
                if matches!(row.attr("hidden"), Some("1") | Some("true")) {
                    ws.set_row_hidden(row_idx);
                }

                let mut col_idx = 0u32;
                for cell in row.children_named("c") {
                    if let Some((Some(c), Some(r))) = cell
                        .attr("r")
                        .and_then(|a| gridbook_core::coords_from_cell_name(a).ok())
                    {
                        col_idx = c;
                        row_idx = r;
                    }
                    Self::read_cell(cell, ws, sst, styles, row_idx, col_idx);
                    col_idx += 1;
                }
                row_idx += 1;
            }
        }

        if let Some(merges) = root.child("mergeCells") {
            for merge in merges.children_named("mergeCell") {
                let Some(rc) = merge.attr("ref").and_then(|r| coords_from_range(r).ok()) else {
                    continue;
                };
                if let (Some(c1), Some(r1), Some(c2), Some(r2)) = (rc.c1, rc.r1, rc.c2, rc.r2) {
                    ws.set_merge(r1, c1, c2 - c1 + 1, r2 - r1 + 1);
                }
            }
        }

        if let Some(links) = root.child("hyperlinks") {
            for link in links.children_named("hyperlink") {
                let Some(rc) = link.attr("ref").and_then(|r| coords_from_range(r).ok()) else {
                    continue;
                };
                let (Some(col), Some(row)) = (rc.c1, rc.r1) else {
                    continue;
                };
                let url = link
                    .attr("id")
                    .and_then(|rid| rels.get(rid))
                    .cloned()
                    .or_else(|| link.attr("location").map(str::to_string));
                if let Some(url) = url {
                    ws.meta_mut(row, col).hyperlink = Some(url);
                }
            }
        }

        if let Some(validations) = root.child("dataValidations") {
            for dv in validations.children_named("dataValidation") {
                Self::read_validation(dv, ws);
            }
        }
        for cf in root.children_named("conditionalFormatting") {
            Self::read_conditional_formatting(cf, ws, styles);
        }

        if let Some(protection) = root.child("sheetProtection") {
            if matches!(protection.attr("sheet"), Some("1") | Some("true")) {
                let mut lock = SheetLock {
                    password_hash: protection
                        .attr("password")
                        .or_else(|| protection.attr("hashValue"))
                        .map(str::to_string),
                    protected_ranges: Vec::new(),
                };
                if let Some(ranges) = root.child("protectedRanges") {
                    for range in ranges.children_named("protectedRange") {
                        if let Some(sqref) = range.attr("sqref") {
                            lock.protected_ranges.push(sqref.to_string());
                        }
                    }
                }
                ws.lock = Some(lock);
            }
        }

        // Comments and drawings hang off the sheet relationships.
        for target in rels.values() {
            let path = resolve_path(parent_dir(sheet_path), target);
            if path.contains("comments") {
                if let Some(comments) = parse_member(archive, &path)? {
                    Self::read_comments(&comments, ws);
                }
            } else if path.contains("drawings/") {
                if let Err(e) = drawings::read_drawing(archive, &path, ws) {
                    log::warn!("drawing part {path} skipped: {e}");
                }
            }
        }

        Ok(())
    }

    fn read_cell(
        cell: &XmlNode,
        ws: &mut Worksheet,
        sst: &[String],
        styles: &XlsxStyles,
        row: u32,
        col: u32,
    ) {
        let value_text = cell.child("v").map(XmlNode::text_content);
        let formula_text = cell.child("f").map(XmlNode::text_content);

        // A present, non-empty formula overrides the cached value. Shared
        // formula references with an empty body fall back to the value.
        let value = match formula_text {
            Some(f) if !f.trim().is_empty() => {
                let text = format!("={}", f.trim());
                ws.meta_mut(row, col).formula = Some(text.clone());
                Some(CellValue::Formula(text))
            }
            Some(_) => {
                log::debug!("shared-formula follower at r{row} c{col} keeps its cached value");
                None
            }
            None => None,
        };

        let value = value.or_else(|| {
            let v = value_text.as_deref()?.trim().to_string();
            Some(match cell.attr("t") {
                Some("s") => v
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| sst.get(i))
                    .map(CellValue::text)
                    .unwrap_or(CellValue::Empty),
                Some("b") => CellValue::Bool(v != "0"),
                Some("e") => CellError::from_text(&v)
                    .map(CellValue::Error)
                    .unwrap_or_else(|| CellValue::Text(v)),
                Some("str") => CellValue::Text(v),
                _ => v
                    .parse::<f64>()
                    .map(CellValue::Number)
                    .unwrap_or(CellValue::Text(v)),
            })
        });

        let value = value.or_else(|| {
            // Inline strings carry their text outside <v>
            (cell.attr("t") == Some("inlineStr"))
                .then(|| cell.child("is").map(|is| CellValue::text(is.text_content())))
                .flatten()
        });

        if let Some(value) = value {
            if !value.is_empty() {
                ws.set_value(row, col, value);
            }
        }

        if let Some(style_idx) = cell.attr("s").and_then(|v| v.parse::<usize>().ok()) {
            if let Some(xf) = styles.cell_xfs.get(style_idx) {
                if !xf.css.is_empty() {
                    ws.set_css(row, col, xf.css.clone());
                }
                if xf.format.is_some() || xf.align.is_some() || xf.wrap || !xf.locked {
                    let meta = ws.meta_mut(row, col);
                    meta.format = xf.format.clone();
                    meta.align = xf.align;
                    if xf.wrap {
                        meta.wrap = Some(true);
                    }
                    if !xf.locked {
                        meta.locked = Some(false);
                    }
                }
            }
        }
    }

    fn read_validation(dv: &XmlNode, ws: &mut Worksheet) {
        let kind = match dv.attr("type") {
            Some("whole") | Some("decimal") => ValidationKind::Number,
            Some("list") => ValidationKind::List,
            Some("textLength") => ValidationKind::TextLength,
            Some("date") => ValidationKind::Date,
            Some("time") => ValidationKind::Time,
            Some("custom") => ValidationKind::Formula,
            _ => return,
        };
        let action = match dv.attr("errorStyle") {
            Some("warning") | Some("information") => ValidationAction::Warning,
            _ => ValidationAction::Reject,
        };
        let criteria = dv.attr("operator").and_then(Criterion::from_ooxml).or({
            // The implied default operator for ranged types
            Some(Criterion::Between)
        });

        let mut values = Vec::new();
        for f in ["formula1", "formula2"] {
            if let Some(v) = dv.child(f) {
                let text = v.text_content();
                if !text.is_empty() {
                    values.push(text);
                }
            }
        }

        let Some(sqref) = dv.attr("sqref") else { return };
        for range in sqref.split_whitespace() {
            let mut validation = Validation::new(range, kind);
            validation.action = action;
            validation.criteria = criteria;
            validation.value = values.clone();
            validation.message = dv.attr("error").map(str::to_string);
            ws.validations.push(validation);
        }
    }

    fn read_conditional_formatting(cf: &XmlNode, ws: &mut Worksheet, styles: &XlsxStyles) {
        let Some(sqref) = cf.attr("sqref") else { return };

        for rule in cf.children_named("cfRule") {
            let kind = match rule.attr("type") {
                Some("cellIs") => ValidationKind::Number,
                Some("containsText") => ValidationKind::Text,
                Some("expression") => ValidationKind::Formula,
                Some("dataBar") => ValidationKind::DataBar,
                Some("colorScale") => ValidationKind::ColorScale,
                Some("iconSet") => ValidationKind::IconSet,
                Some("duplicateValues") | Some("uniqueValues") => ValidationKind::NotEmpty,
                _ => continue,
            };

            let format = rule
                .attr("dxfId")
                .and_then(|v| v.parse::<usize>().ok())
                .and_then(|i| styles.dxfs.get(i))
                .cloned()
                .unwrap_or_default();

            let values: Vec<String> = rule
                .children_named("formula")
                .map(XmlNode::text_content)
                .collect();

            for range in sqref.split_whitespace() {
                let mut validation = Validation::format_rule(range, kind, format.clone());
                validation.criteria = rule.attr("operator").and_then(Criterion::from_ooxml);
                validation.value = values.clone();
                ws.validations.push(validation);
            }
        }
    }

    fn read_comments(root: &XmlNode, ws: &mut Worksheet) {
        let Some(list) = root.child("commentList") else {
            return;
        };
        for comment in list.children_named("comment") {
            let Some((Some(col), Some(row))) = comment
                .attr("ref")
                .and_then(|r| gridbook_core::coords_from_cell_name(r).ok())
            else {
                continue;
            };
            let text = comment
                .child("text")
                .map(XmlNode::text_content)
                .unwrap_or_default();
            let text = text.trim();
            if !text.is_empty() {
                ws.set_comment(row, col, text);
            }
        }
    }
}

/// Concatenate an `<si>` entry: a direct `<t>` or the `<r>` rich-text runs.
fn parse_shared_strings(root: &XmlNode) -> Vec<String> {
    root.children_named("si")
        .map(|si| {
            if let Some(t) = si.child("t") {
                t.text_content()
            } else {
                si.children_named("r")
                    .filter_map(|r| r.child("t"))
                    .map(XmlNode::text_content)
                    .collect()
            }
        })
        .collect()
}

/// `Relationship` id → target map.
pub(crate) fn parse_rels(root: &XmlNode) -> HashMap<String, String> {
    root.children_named("Relationship")
        .filter_map(|rel| {
            Some((
                rel.attr("Id")?.to_string(),
                rel.attr("Target")?.to_string(),
            ))
        })
        .collect()
}

/// Inflate and parse one archive member; `None` when absent.
pub(crate) fn parse_member(archive: &mut Archive<'_>, name: &str) -> XlsxResult<Option<XmlNode>> {
    let bytes = match member_bytes(archive, name)? {
        Some(b) => b,
        None => return Ok(None),
    };
    XmlNode::parse(&bytes)
        .map(Some)
        .map_err(|source| XlsxError::Markup {
            part: name.to_string(),
            source,
        })
}

/// Raw bytes of one archive member; `None` when absent.
pub(crate) fn member_bytes(archive: &mut Archive<'_>, name: &str) -> XlsxResult<Option<Vec<u8>>> {
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

/// Resolve a relationship target against a base directory, honouring
/// leading `/` (archive-absolute) and `../` segments.
pub(crate) fn resolve_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// `xl/worksheets/sheet1.xml` → `xl/worksheets/_rels/sheet1.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rfind('/') {
        Some(pos) => format!("{}/_rels/{}.rels", &part[..pos], &part[pos + 1..]),
        None => format!("_rels/{part}.rels"),
    }
}

/// Directory part of an archive path.
pub(crate) fn parent_dir(part: &str) -> &str {
    match part.rfind('/') {
        Some(pos) => &part[..pos],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(
            resolve_path("xl/worksheets", "../drawings/drawing1.xml"),
            "xl/drawings/drawing1.xml"
        );
        assert_eq!(resolve_path("xl/worksheets", "/xl/media/image1.png"), "xl/media/image1.png");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
    }

    #[test]
    fn test_parse_shared_strings_runs() {
        let doc = br#"<sst><si><t>plain</t></si><si><r><t>ri</t></r><r><t>ch</t></r></si></sst>"#;
        let root = XmlNode::parse(doc).unwrap();
        assert_eq!(parse_shared_strings(&root), vec!["plain", "rich"]);
    }
}
