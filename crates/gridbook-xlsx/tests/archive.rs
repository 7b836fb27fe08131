//! End-to-end tests over in-memory XLSX archives.

use std::io::{Cursor, Write};

use gridbook_core::{normalize, CellValue, ValidationAction, ValidationKind};
use gridbook_xlsx::XlsxReader;
use pretty_assertions::assert_eq;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn build_archive(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in members {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

const WORKBOOK: &str = r#"<?xml version="1.0"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
 xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
 <sheets>
  <sheet name="Data" sheetId="1" r:id="rId1"/>
  <sheet name="Secret" sheetId="2" state="hidden" r:id="rId2"/>
 </sheets>
 <definedNames><definedName name="total">Data!$B$1</definedName></definedNames>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
 <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
 <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

const SHARED_STRINGS: &str = r#"<?xml version="1.0"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="1" uniqueCount="1">
 <si><t>hello</t></si>
</sst>"#;

const STYLES: &str = r#"<?xml version="1.0"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
 <fonts count="2"><font><sz val="11"/></font><font><b/><color rgb="FF0000FF"/></font></fonts>
 <fills count="3">
  <fill><patternFill patternType="none"/></fill>
  <fill><patternFill patternType="gray125"/></fill>
  <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/></patternFill></fill>
 </fills>
 <borders count="1"><border/></borders>
 <cellXfs count="2">
  <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  <xf numFmtId="9" fontId="1" fillId="2" borderId="0"/>
 </cellXfs>
 <dxfs count="1">
  <dxf><fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf>
 </dxfs>
</styleSheet>"#;

const SHEET1: &str = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
 xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
 <dimension ref="A1:C2"/>
 <sheetViews>
  <sheetView workbookViewId="0" showGridLines="0">
   <pane xSplit="1" ySplit="2" state="frozen"/>
  </sheetView>
 </sheetViews>
 <cols><col min="1" max="1" width="20" customWidth="1"/></cols>
 <sheetData>
  <row r="1">
   <c r="A1" t="s"><v>0</v></c>
   <c r="B1" s="1"><v>3.14</v></c>
   <c r="C1" t="str"><f>A1&amp;B1</f><v>foo</v></c>
  </row>
 </sheetData>
 <mergeCells count="1"><mergeCell ref="A2:B2"/></mergeCells>
 <conditionalFormatting sqref="B1:B9">
  <cfRule type="cellIs" dxfId="0" priority="1" operator="greaterThan"><formula>3</formula></cfRule>
 </conditionalFormatting>
 <dataValidations count="1">
  <dataValidation type="list" errorStyle="warning" sqref="A1:A5">
   <formula1>"red,green,blue"</formula1>
  </dataValidation>
 </dataValidations>
 <hyperlinks><hyperlink ref="B1" r:id="rId1"/></hyperlinks>
 <sheetProtection sheet="1" password="ABCD"/>
</worksheet>"#;

const SHEET1_RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
 <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

const SHEET2: &str = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
 <sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData>
</worksheet>"#;

/// One row of cells under an `A1:C2` dimension, nothing else: the second
/// row exists only because the declaration says so.
const SHEET_DECLARED: &str = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
 <dimension ref="A1:C2"/>
 <sheetData>
  <row r="1">
   <c r="A1" t="s"><v>0</v></c>
   <c r="B1"><v>3.14</v></c>
   <c r="C1"><f>A1&amp;B1</f><v>foo</v></c>
  </row>
 </sheetData>
</worksheet>"#;

fn fixture() -> Vec<u8> {
    build_archive(&[
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/sharedStrings.xml", SHARED_STRINGS),
        ("xl/styles.xml", STYLES),
        ("xl/worksheets/sheet1.xml", SHEET1),
        ("xl/worksheets/_rels/sheet1.xml.rels", SHEET1_RELS),
        ("xl/worksheets/sheet2.xml", SHEET2),
    ])
}

#[test]
fn reads_cells_and_formula_override() {
    let wb = XlsxReader::read(&fixture()).unwrap();
    let ws = &wb.worksheets[0];
    assert_eq!(ws.name, "Data");
    assert_eq!(ws.value(0, 0), &CellValue::text("hello"));
    assert_eq!(ws.value(0, 1), &CellValue::Number(3.14));
    // The formula overrides the cached "foo" result
    assert_eq!(ws.value(0, 2), &CellValue::Formula("=A1&B1".into()));
    assert_eq!(ws.cells["C1"].formula.as_deref(), Some("=A1&B1"));
}

#[test]
fn dimension_declaration_empty_fills_second_row() {
    // No merges, no styling below row 1: the A1:C2 dimension alone must
    // produce the 3x2 matrix.
    let archive = build_archive(&[
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/sharedStrings.xml", SHARED_STRINGS),
        ("xl/worksheets/sheet1.xml", SHEET_DECLARED),
        ("xl/worksheets/sheet2.xml", SHEET2),
    ]);
    let mut wb = XlsxReader::read(&archive).unwrap();
    normalize(&mut wb);

    let ws = &wb.worksheets[0];
    assert_eq!(ws.min_dimensions, (3, 2));
    assert_eq!(
        ws.data[0],
        vec![
            CellValue::text("hello"),
            CellValue::Number(3.14),
            CellValue::Formula("=A1&B1".into()),
        ]
    );
    assert_eq!(ws.data[1], vec![CellValue::Empty, CellValue::Empty, CellValue::Empty]);
}

#[test]
fn second_row_empty_fills_after_normalise() {
    let mut wb = XlsxReader::read(&fixture()).unwrap();
    normalize(&mut wb);
    let ws = &wb.worksheets[0];
    assert_eq!(ws.min_dimensions, (3, 2));
    assert_eq!(ws.data[1], vec![CellValue::Empty, CellValue::Empty, CellValue::Empty]);
}

#[test]
fn styles_panes_and_gridlines() {
    let wb = XlsxReader::read(&fixture()).unwrap();
    let ws = &wb.worksheets[0];
    let css = ws.css.get("B1").unwrap();
    assert!(css.contains("font-weight: bold;"));
    assert!(css.contains("color: #0000FF;"));
    assert!(css.contains("background-color: #FFFF00;"));
    assert_eq!(ws.cells["B1"].format.as_deref(), Some("0%"));

    assert_eq!(ws.freeze_rows, Some(2));
    assert_eq!(ws.freeze_columns, Some(1));
    assert_eq!(ws.gridline, Some(false));
    assert_eq!(ws.columns[&0].width, 140.0);
}

#[test]
fn merges_hyperlinks_protection() {
    let wb = XlsxReader::read(&fixture()).unwrap();
    let ws = &wb.worksheets[0];
    assert_eq!(ws.merge_cells.get("A2"), Some(&(2, 1)));
    assert_eq!(ws.cells["B1"].hyperlink.as_deref(), Some("https://example.com"));
    assert_eq!(
        ws.lock.as_ref().and_then(|l| l.password_hash.as_deref()),
        Some("ABCD")
    );
}

#[test]
fn validations_unify_into_workbook() {
    let mut wb = XlsxReader::read(&fixture()).unwrap();
    normalize(&mut wb);

    let list = wb
        .validations
        .iter()
        .find(|v| v.kind == ValidationKind::List)
        .expect("list validation");
    assert_eq!(list.range, "Data!A1:A5");
    assert_eq!(list.action, ValidationAction::Warning);
    assert_eq!(list.value, vec!["\"red,green,blue\""]);

    let cf = wb
        .validations
        .iter()
        .find(|v| v.action == ValidationAction::Format)
        .expect("conditional format");
    assert_eq!(cf.range, "Data!B1:B9");
    assert_eq!(
        cf.format.as_ref().unwrap().get("background-color").unwrap(),
        "#FFC7CE"
    );
}

#[test]
fn hidden_sheet_state_and_defined_names() {
    let wb = XlsxReader::read(&fixture()).unwrap();
    assert_eq!(
        wb.worksheets[1].state,
        Some(gridbook_core::SheetState::Hidden)
    );
    assert_eq!(wb.defined_names["total"], "Data!$B$1");
}

#[test]
fn missing_workbook_part_is_reported() {
    let archive = build_archive(&[("foo.txt", "bar")]);
    let err = XlsxReader::read(&archive).unwrap_err();
    assert!(err.to_string().contains("xl/workbook.xml"));
}
