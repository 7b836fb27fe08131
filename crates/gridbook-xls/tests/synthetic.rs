//! End-to-end tests over synthesized XLS files: a hand-built CFB container
//! wrapping a hand-built BIFF8 record stream.

use gridbook_core::{CellValue, SheetState};
use gridbook_xls::XlsReader;
use pretty_assertions::assert_eq;

// ── Fixture builders ─────────────────────────────────────────────────────

const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
const FREESECT: u32 = 0xFFFF_FFFF;
const NOSTREAM: u32 = 0xFFFF_FFFF;

/// Wrap a stream into a minimal 512-byte-sector CFB container with the
/// mini-stream cut-off forced to zero so the stream lives on the FAT.
fn cfb_container(stream_name: &str, content: &[u8]) -> Vec<u8> {
    let sector = 512usize;
    let content_sectors = content.len().div_ceil(sector).max(1);

    let mut fat = vec![FREESECT; sector / 4];
    fat[0] = 0xFFFF_FFFD; // FATSECT
    fat[1] = ENDOFCHAIN; // directory
    for i in 0..content_sectors {
        fat[2 + i] = if i + 1 == content_sectors {
            ENDOFCHAIN
        } else {
            (3 + i) as u32
        };
    }

    let mut header = vec![0u8; sector];
    header[0..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
    header[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
    header[0x1C..0x1E].copy_from_slice(&0xFFFEu16.to_le_bytes());
    header[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
    header[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
    header[0x2C..0x30].copy_from_slice(&1u32.to_le_bytes());
    header[0x30..0x34].copy_from_slice(&1u32.to_le_bytes());
    header[0x38..0x3C].copy_from_slice(&0u32.to_le_bytes()); // mini cutoff: none
    header[0x3C..0x40].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    header[0x44..0x48].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    header[0x4C..0x50].copy_from_slice(&0u32.to_le_bytes());
    for i in 1..109 {
        header[0x4C + i * 4..0x50 + i * 4].copy_from_slice(&FREESECT.to_le_bytes());
    }

    let mut dir = vec![0u8; sector];
    dir_entry(&mut dir[0..128], "Root Entry", 5, NOSTREAM, NOSTREAM, 1, ENDOFCHAIN, 0);
    dir_entry(
        &mut dir[128..256],
        stream_name,
        2,
        NOSTREAM,
        NOSTREAM,
        NOSTREAM,
        2,
        content.len() as u32,
    );

    let mut out = header;
    for entry in &fat {
        out.extend_from_slice(&entry.to_le_bytes());
    }
    out.extend_from_slice(&dir);
    let mut padded = content.to_vec();
    padded.resize(content_sectors * sector, 0);
    out.extend_from_slice(&padded);
    out
}

fn dir_entry(
    raw: &mut [u8],
    name: &str,
    entry_type: u8,
    left: u32,
    right: u32,
    child: u32,
    start_sector: u32,
    size: u32,
) {
    let units: Vec<u16> = name.encode_utf16().collect();
    for (i, u) in units.iter().enumerate() {
        raw[i * 2..i * 2 + 2].copy_from_slice(&u.to_le_bytes());
    }
    raw[64..66].copy_from_slice(&((units.len() as u16 + 1) * 2).to_le_bytes());
    raw[66] = entry_type;
    raw[67] = 1;
    raw[68..72].copy_from_slice(&left.to_le_bytes());
    raw[72..76].copy_from_slice(&right.to_le_bytes());
    raw[76..80].copy_from_slice(&child.to_le_bytes());
    raw[116..120].copy_from_slice(&start_sector.to_le_bytes());
    raw[120..124].copy_from_slice(&size.to_le_bytes());
}

fn record(rt: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&rt.to_le_bytes());
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(body);
    out
}

fn bof(substream_type: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x0600u16.to_le_bytes());
    body.extend_from_slice(&substream_type.to_le_bytes());
    body.extend_from_slice(&[0u8; 12]);
    record(0x0809, &body)
}

fn boundsheet(name: &str, state: u8) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_le_bytes());
    body.push(state);
    body.push(0); // worksheet
    body.push(name.len() as u8);
    body.push(0); // compressed
    body.extend_from_slice(name.as_bytes());
    record(0x0085, &body)
}

fn sst(strings: &[&str]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    body.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for s in strings {
        body.extend_from_slice(&(s.len() as u16).to_le_bytes());
        body.push(0);
        body.extend_from_slice(s.as_bytes());
    }
    record(0x00FC, &body)
}

fn labelsst(row: u16, col: u16, xf: u16, sst_idx: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&xf.to_le_bytes());
    body.extend_from_slice(&sst_idx.to_le_bytes());
    record(0x00FD, &body)
}

fn number(row: u16, col: u16, xf: u16, value: f64) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&xf.to_le_bytes());
    body.extend_from_slice(&value.to_le_bytes());
    record(0x0203, &body)
}

fn rk_cell(row: u16, col: u16, xf: u16, rk: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&xf.to_le_bytes());
    body.extend_from_slice(&rk.to_le_bytes());
    record(0x027E, &body)
}

fn boolerr(row: u16, col: u16, xf: u16, value: u8, is_error: u8) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&xf.to_le_bytes());
    body.push(value);
    body.push(is_error);
    record(0x0205, &body)
}

fn formula(row: u16, col: u16, xf: u16, result: f64, tokens: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&xf.to_le_bytes());
    body.extend_from_slice(&result.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes()); // grbit
    body.extend_from_slice(&0u32.to_le_bytes()); // chn
    body.extend_from_slice(&(tokens.len() as u16).to_le_bytes());
    body.extend_from_slice(tokens);
    record(0x0006, &body)
}

fn shrfmla(first_row: u16, last_row: u16, first_col: u8, last_col: u8, tokens: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&first_row.to_le_bytes());
    body.extend_from_slice(&last_row.to_le_bytes());
    body.push(first_col);
    body.push(last_col);
    body.push(0);
    body.push(2);
    body.extend_from_slice(&(tokens.len() as u16).to_le_bytes());
    body.extend_from_slice(tokens);
    record(0x04BC, &body)
}

fn mergecells(rects: &[(u16, u16, u16, u16)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(rects.len() as u16).to_le_bytes());
    for (fr, lr, fc, lc) in rects {
        body.extend_from_slice(&fr.to_le_bytes());
        body.extend_from_slice(&lr.to_le_bytes());
        body.extend_from_slice(&fc.to_le_bytes());
        body.extend_from_slice(&lc.to_le_bytes());
    }
    record(0x00E5, &body)
}

/// A default-ish 20-byte XF record body (vertical alignment bottom, the
/// way real writers emit it).
fn xf_record(halign: u8, fill_fore: u16, fill_pattern: u8) -> Vec<u8> {
    let mut body = vec![0u8; 20];
    body[4] = 0x01; // locked
    body[6] = (halign & 0x07) | 0x20;
    let border2: u32 = (fill_pattern as u32) << 26;
    body[14..18].copy_from_slice(&border2.to_le_bytes());
    body[18..20].copy_from_slice(&(fill_fore & 0x7F).to_le_bytes());
    record(0x00E0, &body)
}

/// Assemble a complete workbook stream: globals (SST, XFs, two sheets)
/// plus the two worksheet substreams.
fn workbook_stream() -> Vec<u8> {
    let mut stream = Vec::new();

    // Globals
    stream.extend(bof(0x0005));
    stream.extend(sst(&["Alpha", "Beta"]));
    for _ in 0..15 {
        stream.extend(xf_record(0, 0, 0)); // style XFs 0..14
    }
    stream.extend(xf_record(0, 0, 0)); // cell XF 15: default
    stream.extend(xf_record(2, 13, 1)); // cell XF 16: centered, yellow fill
    stream.extend(boundsheet("First", 0));
    stream.extend(boundsheet("Hidden", 1));
    stream.extend(record(0x000A, &[])); // EOF

    // Sheet 1
    stream.extend(bof(0x0010));
    stream.extend(labelsst(0, 0, 15, 0));
    stream.extend(labelsst(0, 1, 16, 1));
    stream.extend(number(1, 0, 15, 3.5));
    stream.extend(rk_cell(1, 1, 15, (42u32 << 2) | 0x02));
    stream.extend(boolerr(2, 0, 15, 1, 0));
    stream.extend(boolerr(2, 1, 15, 0x07, 1));
    // =2+3 with cached result 5
    stream.extend(formula(3, 0, 15, 5.0, &[0x1E, 0x02, 0x00, 0x1E, 0x03, 0x00, 0x03]));
    stream.extend(mergecells(&[(5, 6, 0, 1)]));
    stream.extend(record(0x000A, &[]));

    // Sheet 2 (hidden, with a shared formula over B1:B3)
    stream.extend(bof(0x0010));
    stream.extend(number(0, 0, 15, 1.0));
    stream.extend(number(1, 0, 15, 2.0));
    stream.extend(number(2, 0, 15, 3.0));
    // Three FORMULA cells referencing the shared body (tExp at row 0, col 1)
    let texp = [0x01, 0x00, 0x00, 0x01, 0x00];
    stream.extend(formula(0, 1, 15, 2.0, &texp));
    // Shared body: tRefN(row +0, col -1, both relative) * tInt 2
    let body = [0x2C, 0x00, 0x00, 0xFF, 0xC0, 0x1E, 0x02, 0x00, 0x05];
    stream.extend(shrfmla(0, 2, 1, 1, &body));
    stream.extend(formula(1, 1, 15, 4.0, &texp));
    stream.extend(formula(2, 1, 15, 6.0, &texp));
    stream.extend(record(0x000A, &[]));

    stream
}

// ── Tests ────────────────────────────────────────────────────────────────

#[test]
fn reads_values_from_synthetic_workbook() {
    let file = cfb_container("Workbook", &workbook_stream());
    let wb = XlsReader::read(&file).unwrap();

    assert_eq!(wb.worksheets.len(), 2);
    let ws = &wb.worksheets[0];
    assert_eq!(ws.name, "First");
    assert_eq!(ws.value(0, 0), &CellValue::text("Alpha"));
    assert_eq!(ws.value(0, 1), &CellValue::text("Beta"));
    assert_eq!(ws.value(1, 0), &CellValue::Number(3.5));
    assert_eq!(ws.value(1, 1), &CellValue::Number(42.0));
    assert_eq!(ws.value(2, 0), &CellValue::Bool(true));
    assert!(matches!(ws.value(2, 1), CellValue::Error(_)));
}

#[test]
fn decodes_formula_text() {
    let file = cfb_container("Workbook", &workbook_stream());
    let wb = XlsReader::read(&file).unwrap();

    let ws = &wb.worksheets[0];
    assert_eq!(ws.value(3, 0), &CellValue::Formula("=2+3".into()));
    assert_eq!(ws.cells["A4"].formula.as_deref(), Some("=2+3"));
}

#[test]
fn resolves_shared_formulas_per_target_cell() {
    let file = cfb_container("Workbook", &workbook_stream());
    let wb = XlsReader::read(&file).unwrap();

    let ws = &wb.worksheets[1];
    assert_eq!(ws.value(0, 1), &CellValue::Formula("=A1*2".into()));
    assert_eq!(ws.value(1, 1), &CellValue::Formula("=A2*2".into()));
    assert_eq!(ws.value(2, 1), &CellValue::Formula("=A3*2".into()));
}

#[test]
fn carries_merges_styles_and_visibility() {
    let file = cfb_container("Workbook", &workbook_stream());
    let wb = XlsReader::read(&file).unwrap();

    let ws = &wb.worksheets[0];
    assert_eq!(ws.merge_cells.get("A6"), Some(&(2, 2)));
    let css = ws.css.get("B1").expect("styled cell");
    assert!(css.contains("background-color: #FFFF00;"));
    assert!(css.contains("text-align: center;"));

    assert_eq!(wb.worksheets[0].state, None);
    assert_eq!(wb.worksheets[1].state, Some(SheetState::Hidden));
}

#[test]
fn book_stream_name_also_accepted() {
    let file = cfb_container("Book", &workbook_stream());
    assert!(XlsReader::read(&file).is_ok());
}

#[test]
fn missing_workbook_stream_is_reported() {
    let file = cfb_container("SomethingElse", b"not a workbook");
    let err = XlsReader::read(&file).unwrap_err();
    assert!(err.to_string().contains("Workbook"));
}

#[test]
fn normalised_output_satisfies_dimensions() {
    let file = cfb_container("Workbook", &workbook_stream());
    let mut wb = XlsReader::read(&file).unwrap();
    gridbook_core::normalize(&mut wb);

    let ws = &wb.worksheets[0];
    // Merge at A6:B7 pushes the extent to 7 rows
    assert_eq!(ws.min_dimensions, (2, 7));
    assert!(ws.data.iter().all(|row| row.len() == 2));
    // Interned style index in range
    for idx in ws.style.values() {
        assert!((*idx as usize) < wb.style.len());
    }
}
