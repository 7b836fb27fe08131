//! XLS (BIFF8) reader.
//!
//! Opens the CFB container, extracts the `Workbook` (or legacy `Book`)
//! stream, parses the BIFF8 record sequence, and populates a
//! `gridbook_core::Workbook`. Workbook-level records (SST, styles, fonts,
//! formats, BOUNDSHEET directory) precede the per-worksheet substreams;
//! worksheet boundaries are the BOF records with sub-type 0x0010.

use gridbook_core::{CellError, CellValue, SheetState, Workbook, Worksheet};
use gridbook_formula::{decode_ptg, is_shared_formula_ref, CellContext};

use crate::biff::bytes::{read_f64, read_rk, read_u16, read_u32};
use crate::biff::records;
use crate::biff::strings::{parse_sst, read_short_string, read_unicode_string};
use crate::biff::{parse_bof, read_all_records, BiffRecord};
use crate::cfb::CompoundFile;
use crate::error::{XlsError, XlsResult};
use crate::styles::{self, ResolvedXf, StyleContext};

/// XLS file reader.
pub struct XlsReader;

/// Worksheet directory entry parsed from BOUNDSHEET.
#[derive(Debug)]
struct SheetInfo {
    /// Visibility state byte: 0 visible, 1 hidden, 2 very hidden
    state: u8,
    /// 0 = worksheet, 2 = chart, 6 = macro
    sheet_type: u8,
    name: String,
}

/// A FORMULA cell held until the record stream is fully consumed, so
/// shared-formula bodies seen later can be linked in.
#[derive(Debug)]
struct PendingFormula {
    row: u32,
    col: u32,
    tokens: Vec<u8>,
    result: FormulaCache,
}

/// Calculated result carried by a FORMULA record.
#[derive(Debug)]
enum FormulaCache {
    Number(f64),
    Bool(bool),
    Error(CellError),
    Text(String),
    /// Result sentinel announced a STRING record that never arrived
    Missing,
}

impl FormulaCache {
    fn to_value(&self) -> CellValue {
        match self {
            FormulaCache::Number(n) => CellValue::Number(*n),
            FormulaCache::Bool(b) => CellValue::Bool(*b),
            FormulaCache::Error(e) => CellValue::Error(*e),
            FormulaCache::Text(s) => CellValue::Text(s.clone()),
            FormulaCache::Missing => CellValue::Empty,
        }
    }
}

/// A SHRFMLA body with its bounding rectangle.
#[derive(Debug)]
struct SharedFormula {
    first_row: u32,
    last_row: u32,
    first_col: u32,
    last_col: u32,
    tokens: Vec<u8>,
}

impl XlsReader {
    /// Parse an XLS file from its raw bytes.
    pub fn read(data: &[u8]) -> XlsResult<Workbook> {
        let cfb = CompoundFile::open(data)?;
        let stream = if cfb.exists("Workbook") {
            cfb.find_stream("Workbook")?
        } else if cfb.exists("Book") {
            cfb.find_stream("Book")?
        } else {
            return Err(XlsError::MissingStream("Workbook".into()));
        };

        let all_records = read_all_records(&stream);

        // ── Workbook globals ─────────────────────────────────────────────
        let mut sst: Vec<String> = Vec::new();
        let mut sheets: Vec<SheetInfo> = Vec::new();
        let mut style_ctx = StyleContext::new();
        let mut in_globals = false;
        let mut globals_end = 0usize;

        for (idx, rec) in all_records.iter().enumerate() {
            match rec.record_type {
                records::BOF => {
                    if let Some((version, dt)) = parse_bof(&rec.data) {
                        if dt == records::BOF_WORKBOOK_GLOBALS {
                            if version != records::BIFF8_VERSION {
                                return Err(XlsError::UnsupportedVersion(format!(
                                    "expected BIFF8 (0x0600), got 0x{version:04X}"
                                )));
                            }
                            in_globals = true;
                        }
                    }
                }
                records::EOF if in_globals => {
                    globals_end = idx;
                    break;
                }
                records::SST if in_globals => {
                    sst = parse_sst(&rec.data)?;
                }
                records::BOUNDSHEET if in_globals => {
                    sheets.push(Self::parse_boundsheet(&rec.data)?);
                }
                records::FONT if in_globals => {
                    if let Ok(font) = styles::parse_font(&rec.data) {
                        style_ctx.fonts.push(font);
                    }
                }
                records::FORMAT if in_globals => {
                    if let Ok((id, code)) = styles::parse_format(&rec.data) {
                        style_ctx.formats.insert(id, code);
                    }
                }
                records::XF if in_globals => {
                    if let Ok(xf) = styles::parse_xf(&rec.data) {
                        style_ctx.xfs.push(xf);
                    }
                }
                records::PALETTE if in_globals => {
                    let _ = styles::apply_palette(&rec.data, &mut style_ctx.palette);
                }
                _ => {}
            }
        }

        if !in_globals {
            return Err(XlsError::MalformedContainer(
                "no workbook globals BOF found".into(),
            ));
        }

        let style_table = style_ctx.build_style_table();

        // ── Worksheet substreams ─────────────────────────────────────────
        let mut workbook = Workbook::new();
        let groups = Self::split_substreams(&all_records[globals_end + 1..]);

        for (biff_idx, info) in sheets.iter().enumerate() {
            if info.sheet_type != 0 {
                continue;
            }
            let ws = workbook.add_worksheet(&info.name);
            if info.state != 0 {
                ws.state = Some(SheetState::from_biff_state(info.state));
            }

            if let Some((subtype, group)) = groups.get(biff_idx) {
                if *subtype == records::BOF_WORKSHEET {
                    Self::parse_sheet(group, ws, &sst, &style_table);
                }
            }
        }

        Ok(workbook)
    }

    /// Parse a BOUNDSHEET record body.
    fn parse_boundsheet(data: &[u8]) -> XlsResult<SheetInfo> {
        let mut off = 0;
        let _bof_offset = read_u32(data, &mut off)?;
        let state = *data.get(off).unwrap_or(&0);
        let sheet_type = *data.get(off + 1).unwrap_or(&0);
        off += 2;
        let name = read_short_string(data, &mut off)?;

        Ok(SheetInfo {
            state,
            sheet_type,
            name,
        })
    }

    /// Group the records after the globals into per-substream slices,
    /// tagged with the substream's BOF sub-type.
    fn split_substreams(records_after: &[BiffRecord]) -> Vec<(u16, Vec<&BiffRecord>)> {
        let mut groups: Vec<(u16, Vec<&BiffRecord>)> = Vec::new();
        let mut current: Option<(u16, Vec<&BiffRecord>)> = None;
        let mut depth = 0i32;

        for rec in records_after {
            match rec.record_type {
                records::BOF => {
                    if depth == 0 {
                        let subtype = parse_bof(&rec.data).map(|(_, dt)| dt).unwrap_or(0);
                        current = Some((subtype, Vec::new()));
                    }
                    depth += 1;
                }
                records::EOF => {
                    depth -= 1;
                    if depth <= 0 {
                        depth = 0;
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                    }
                }
                _ => {
                    if let Some((_, ref mut group)) = current {
                        group.push(rec);
                    }
                }
            }
        }
        // An unterminated substream still contributes what it had.
        if let Some(group) = current.take() {
            groups.push(group);
        }

        groups
    }

    /// Parse one worksheet substream's records into the worksheet.
    fn parse_sheet(
        group: &[&BiffRecord],
        ws: &mut Worksheet,
        sst: &[String],
        xfs: &[ResolvedXf],
    ) {
        let mut formulas: Vec<PendingFormula> = Vec::new();
        let mut shared: Vec<SharedFormula> = Vec::new();
        let mut awaiting_string: Option<usize> = None;
        let mut txo_texts: Vec<String> = Vec::new();
        let mut notes: Vec<(u32, u32)> = Vec::new();

        for rec in group {
            let result = match rec.record_type {
                records::LABELSST => Self::parse_labelsst(&rec.data, ws, sst, xfs),
                records::LABEL => Self::parse_label(&rec.data, ws, xfs),
                records::NUMBER => Self::parse_number(&rec.data, ws, xfs),
                records::RK => Self::parse_rk(&rec.data, ws, xfs),
                records::MULRK => Self::parse_mulrk(&rec.data, ws, xfs),
                records::BLANK => Self::parse_blank(&rec.data, ws, xfs),
                records::MULBLANK => Self::parse_mulblank(&rec.data, ws, xfs),
                records::BOOLERR => Self::parse_boolerr(&rec.data, ws, xfs),
                records::FORMULA => {
                    match Self::parse_formula(&rec.data, ws, xfs) {
                        Ok(pending) => {
                            if matches!(pending.result, FormulaCache::Missing) {
                                awaiting_string = Some(formulas.len());
                            }
                            formulas.push(pending);
                        }
                        Err(e) => log::warn!("malformed FORMULA record skipped: {e}"),
                    }
                    Ok(())
                }
                records::STRING => {
                    if let Some(idx) = awaiting_string.take() {
                        let mut off = 0;
                        if let Ok(text) = read_unicode_string(&rec.data, &mut off) {
                            formulas[idx].result = FormulaCache::Text(text);
                        }
                    }
                    Ok(())
                }
                records::SHRFMLA => {
                    match Self::parse_shrfmla(&rec.data) {
                        Ok(sf) => shared.push(sf),
                        Err(e) => log::warn!("malformed SHRFMLA record skipped: {e}"),
                    }
                    Ok(())
                }
                records::MERGECELLS => Self::parse_mergecells(&rec.data, ws),
                records::ROW => Self::parse_row(&rec.data, ws),
                records::COLINFO => Self::parse_colinfo(&rec.data, ws),
                records::HLINK => Self::parse_hlink(&rec.data, ws),
                records::NOTE => {
                    let mut off = 0;
                    if let (Ok(row), Ok(col)) =
                        (read_u16(&rec.data, &mut off), read_u16(&rec.data, &mut off))
                    {
                        notes.push((row as u32, col as u32));
                    }
                    Ok(())
                }
                records::TXO => {
                    if let Some(text) = Self::parse_txo(&rec.data) {
                        txo_texts.push(text);
                    }
                    Ok(())
                }
                _ => Ok(()),
            };

            if let Err(e) = result {
                log::warn!(
                    "record 0x{:04X} at offset {} skipped: {e}",
                    rec.record_type,
                    rec.stream_offset
                );
            }
            if rec.record_type != records::FORMULA && rec.record_type != records::STRING {
                awaiting_string = None;
            }
        }

        // Comments: NOTE records pair with TXO text objects in stream order.
        for ((row, col), text) in notes.into_iter().zip(txo_texts) {
            ws.set_comment(row, col, text);
        }

        Self::resolve_formulas(formulas, &shared, ws);
    }

    /// Second pass: link `tExp`-marked formula cells to the SHRFMLA body
    /// covering them, then decode every formula to text. A cell whose
    /// shared body cannot be found keeps its literal calculated result.
    fn resolve_formulas(formulas: Vec<PendingFormula>, shared: &[SharedFormula], ws: &mut Worksheet) {
        for pending in formulas {
            let PendingFormula {
                row,
                col,
                tokens,
                result,
            } = pending;

            let decoded = if is_shared_formula_ref(&tokens) {
                let body = shared.iter().find(|sf| {
                    row >= sf.first_row
                        && row <= sf.last_row
                        && col >= sf.first_col
                        && col <= sf.last_col
                });
                match body {
                    Some(sf) => {
                        let ctx = CellContext {
                            target_row: row,
                            target_col: col,
                            base_row: sf.first_row,
                            base_col: sf.first_col,
                        };
                        decode_ptg(&sf.tokens, Some(&ctx))
                    }
                    None => String::new(),
                }
            } else {
                decode_ptg(&tokens, None)
            };

            if decoded.is_empty() {
                ws.set_value(row, col, result.to_value());
            } else {
                let text = format!("={decoded}");
                ws.set_value(row, col, CellValue::Formula(text.clone()));
                ws.meta_mut(row, col).formula = Some(text);
            }
        }
    }

    // ── Style application ────────────────────────────────────────────────

    fn apply_xf(ws: &mut Worksheet, row: u32, col: u32, xf_idx: u16, xfs: &[ResolvedXf]) {
        let Some(xf) = xfs.get(xf_idx as usize) else {
            return;
        };
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

    // ── Cell records ─────────────────────────────────────────────────────

    /// LABELSST: row(2) + col(2) + xf(2) + sst_index(4)
    fn parse_labelsst(
        data: &[u8],
        ws: &mut Worksheet,
        sst: &[String],
        xfs: &[ResolvedXf],
    ) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)? as u32;
        let xf_idx = read_u16(data, &mut off)?;
        let sst_idx = read_u32(data, &mut off)? as usize;

        if let Some(s) = sst.get(sst_idx) {
            ws.set_value(row, col, CellValue::text(s));
        } else {
            log::warn!("LABELSST references missing SST entry {sst_idx}");
        }
        Self::apply_xf(ws, row, col, xf_idx, xfs);
        Ok(())
    }

    /// LABEL: row(2) + col(2) + xf(2) + inline unicode string
    fn parse_label(data: &[u8], ws: &mut Worksheet, xfs: &[ResolvedXf]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)? as u32;
        let xf_idx = read_u16(data, &mut off)?;
        let text = read_unicode_string(data, &mut off)?;

        ws.set_value(row, col, CellValue::Text(text));
        Self::apply_xf(ws, row, col, xf_idx, xfs);
        Ok(())
    }

    /// NUMBER: row(2) + col(2) + xf(2) + f64(8)
    fn parse_number(data: &[u8], ws: &mut Worksheet, xfs: &[ResolvedXf]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)? as u32;
        let xf_idx = read_u16(data, &mut off)?;
        let value = read_f64(data, &mut off)?;

        ws.set_value(row, col, CellValue::Number(value));
        Self::apply_xf(ws, row, col, xf_idx, xfs);
        Ok(())
    }

    /// RK: row(2) + col(2) + xf(2) + packed number(4)
    fn parse_rk(data: &[u8], ws: &mut Worksheet, xfs: &[ResolvedXf]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)? as u32;
        let xf_idx = read_u16(data, &mut off)?;
        let value = read_rk(data, &mut off)?;

        ws.set_value(row, col, CellValue::Number(value));
        Self::apply_xf(ws, row, col, xf_idx, xfs);
        Ok(())
    }

    /// MULRK: row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
    fn parse_mulrk(data: &[u8], ws: &mut Worksheet, xfs: &[ResolvedXf]) -> XlsResult<()> {
        if data.len() < 6 {
            return Err(XlsError::Parse("MULRK record too short".into()));
        }
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let first_col = read_u16(data, &mut off)? as u32;
        let last_col = u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]]) as u32;
        let runs_end = data.len() - 2;

        let mut col = first_col;
        while off + 6 <= runs_end && col <= last_col {
            let xf_idx = read_u16(data, &mut off)?;
            let value = read_rk(data, &mut off)?;
            ws.set_value(row, col, CellValue::Number(value));
            Self::apply_xf(ws, row, col, xf_idx, xfs);
            col += 1;
        }
        Ok(())
    }

    /// BLANK: row(2) + col(2) + xf(2), an empty cell that carries style.
    fn parse_blank(data: &[u8], ws: &mut Worksheet, xfs: &[ResolvedXf]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)? as u32;
        let xf_idx = read_u16(data, &mut off)?;
        Self::apply_xf(ws, row, col, xf_idx, xfs);
        Ok(())
    }

    /// MULBLANK: row(2) + first_col(2) + [xf(2)]* + last_col(2)
    fn parse_mulblank(data: &[u8], ws: &mut Worksheet, xfs: &[ResolvedXf]) -> XlsResult<()> {
        if data.len() < 6 {
            return Err(XlsError::Parse("MULBLANK record too short".into()));
        }
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let first_col = read_u16(data, &mut off)? as u32;
        let last_col = u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]]) as u32;
        let xfs_end = data.len() - 2;

        let mut col = first_col;
        while off + 2 <= xfs_end && col <= last_col {
            let xf_idx = read_u16(data, &mut off)?;
            Self::apply_xf(ws, row, col, xf_idx, xfs);
            col += 1;
        }
        Ok(())
    }

    /// BOOLERR: row(2) + col(2) + xf(2) + value(1) + is_error(1)
    fn parse_boolerr(data: &[u8], ws: &mut Worksheet, xfs: &[ResolvedXf]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)? as u32;
        let xf_idx = read_u16(data, &mut off)?;
        let value = *data.get(off).unwrap_or(&0);
        let is_error = *data.get(off + 1).unwrap_or(&0);

        let cell = if is_error != 0 {
            CellValue::Error(CellError::from_biff_code(value))
        } else {
            CellValue::Bool(value != 0)
        };
        ws.set_value(row, col, cell);
        Self::apply_xf(ws, row, col, xf_idx, xfs);
        Ok(())
    }

    /// FORMULA: row(2) + col(2) + xf(2) + result(8) + grbit(2) + chn(4) +
    /// token_length(2) + tokens
    ///
    /// When the result's last two bytes are both 0xFF the first byte
    /// selects the real type: 0 = string (in the following STRING record),
    /// 1 = boolean, 2 = error, 3 = empty. Otherwise the 8 bytes are an
    /// IEEE double.
    fn parse_formula(
        data: &[u8],
        ws: &mut Worksheet,
        xfs: &[ResolvedXf],
    ) -> XlsResult<PendingFormula> {
        if data.len() < 22 {
            return Err(XlsError::Parse("FORMULA record too short".into()));
        }

        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)? as u32;
        let xf_idx = read_u16(data, &mut off)?;

        let result_bytes: [u8; 8] = data[off..off + 8].try_into().unwrap();
        off += 8;
        let _grbit = read_u16(data, &mut off)?;
        let _chn = read_u32(data, &mut off)?;
        let token_len = read_u16(data, &mut off)? as usize;
        let tokens = data
            .get(off..off + token_len)
            .unwrap_or(&data[off.min(data.len())..])
            .to_vec();

        let result = if result_bytes[6] == 0xFF && result_bytes[7] == 0xFF {
            match result_bytes[0] {
                0x00 => FormulaCache::Missing,
                0x01 => FormulaCache::Bool(result_bytes[2] != 0),
                0x02 => FormulaCache::Error(CellError::from_biff_code(result_bytes[2])),
                _ => FormulaCache::Missing,
            }
        } else {
            FormulaCache::Number(f64::from_le_bytes(result_bytes))
        };

        Self::apply_xf(ws, row, col, xf_idx, xfs);

        Ok(PendingFormula {
            row,
            col,
            tokens,
            result,
        })
    }

    /// SHRFMLA: first_row(2) + last_row(2) + first_col(1) + last_col(1) +
    /// reserved(1) + use_count(1) + token_length(2) + tokens
    fn parse_shrfmla(data: &[u8]) -> XlsResult<SharedFormula> {
        if data.len() < 10 {
            return Err(XlsError::Parse("SHRFMLA record too short".into()));
        }
        let mut off = 0;
        let first_row = read_u16(data, &mut off)? as u32;
        let last_row = read_u16(data, &mut off)? as u32;
        let first_col = data[off] as u32;
        let last_col = data[off + 1] as u32;
        off += 4; // cols + reserved + use count
        let token_len = read_u16(data, &mut off)? as usize;
        let tokens = data
            .get(off..off + token_len)
            .ok_or_else(|| XlsError::Parse("SHRFMLA tokens truncated".into()))?
            .to_vec();

        Ok(SharedFormula {
            first_row,
            last_row,
            first_col,
            last_col,
            tokens,
        })
    }

    // ── Structural records ───────────────────────────────────────────────

    /// MERGECELLS: count(2) + [first_row, last_row, first_col, last_col]×
    fn parse_mergecells(data: &[u8], ws: &mut Worksheet) -> XlsResult<()> {
        let mut off = 0;
        let count = read_u16(data, &mut off)? as usize;

        for _ in 0..count {
            if off + 8 > data.len() {
                break;
            }
            let first_row = read_u16(data, &mut off)? as u32;
            let last_row = read_u16(data, &mut off)? as u32;
            let first_col = read_u16(data, &mut off)? as u32;
            let last_col = read_u16(data, &mut off)? as u32;

            ws.set_merge(
                first_row,
                first_col,
                last_col - first_col + 1,
                last_row - first_row + 1,
            );
        }
        Ok(())
    }

    /// ROW: row(2) + col span(4) + height in twentieths of a point(2) +
    /// reserved(4) + options(4, bit 5 = hidden, bit 6 = custom height)
    fn parse_row(data: &[u8], ws: &mut Worksheet) -> XlsResult<()> {
        if data.len() < 8 {
            return Ok(());
        }
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let _first_col = read_u16(data, &mut off)?;
        let _last_col_plus1 = read_u16(data, &mut off)?;
        let raw_height = read_u16(data, &mut off)?;

        if data.len() >= 16 {
            let mut opt_off = 12;
            let options = read_u32(data, &mut opt_off)?;
            if options & 0x20 != 0 {
                ws.set_row_hidden(row);
            }
            if options & 0x40 != 0 {
                let points = (raw_height & 0x7FFF) as f64 / 20.0;
                if points > 0.0 {
                    ws.set_row_height(row, (points * 4.0 / 3.0).round());
                }
            }
        }
        Ok(())
    }

    /// COLINFO: first_col(2) + last_col(2) + width in 1/256 chars(2) +
    /// xf(2) + options(2, bit 0 = hidden)
    fn parse_colinfo(data: &[u8], ws: &mut Worksheet) -> XlsResult<()> {
        if data.len() < 10 {
            return Ok(());
        }
        let mut off = 0;
        let first_col = read_u16(data, &mut off)? as u32;
        let last_col = read_u16(data, &mut off)? as u32;
        let raw_width = read_u16(data, &mut off)?;
        let _xf = read_u16(data, &mut off)?;
        let options = read_u16(data, &mut off)?;

        let hidden = options & 0x0001 != 0;
        let px = (raw_width as f64 / 256.0 * 7.0).round();
        for col in first_col..=last_col.min(first_col + 16_384) {
            if px > 0.0 {
                ws.set_column_width(col, px);
            }
            if hidden {
                ws.set_column_hidden(col);
            }
        }
        Ok(())
    }

    /// HLINK: cell range(8) + class id(16) + stream version(4) + flags(4),
    /// then optional display string and the URL moniker. Only URL monikers
    /// are resolved; file and UNC links are skipped.
    fn parse_hlink(data: &[u8], ws: &mut Worksheet) -> XlsResult<()> {
        /// URL moniker class id.
        const URL_MONIKER: [u8; 16] = [
            0xE0, 0xC9, 0xEA, 0x79, 0xF9, 0xBA, 0xCE, 0x11, 0x8C, 0x82, 0x00, 0xAA, 0x00, 0x4B,
            0xA9, 0x0B,
        ];

        let mut off = 0;
        let first_row = read_u16(data, &mut off)? as u32;
        let _last_row = read_u16(data, &mut off)?;
        let first_col = read_u16(data, &mut off)? as u32;
        let _last_col = read_u16(data, &mut off)?;
        off += 16; // class id
        let _version = read_u32(data, &mut off)?;
        let flags = read_u32(data, &mut off)?;

        // Display name: u32 char count (incl. terminator) + UTF-16 chars
        if flags & 0x10 != 0 {
            let cch = read_u32(data, &mut off)? as usize;
            off += cch * 2;
        }
        // Target frame
        if flags & 0x80 != 0 {
            let cch = read_u32(data, &mut off)? as usize;
            off += cch * 2;
        }

        if flags & 0x01 == 0 || off + 16 > data.len() {
            return Ok(());
        }

        let moniker: [u8; 16] = data[off..off + 16].try_into().unwrap();
        off += 16;
        if moniker != URL_MONIKER {
            log::debug!("non-URL hyperlink moniker skipped");
            return Ok(());
        }

        let byte_count = read_u32(data, &mut off)? as usize;
        if off + byte_count > data.len() {
            return Err(XlsError::Parse("HLINK URL truncated".into()));
        }
        let units: Vec<u16> = data[off..off + byte_count]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        let url = String::from_utf16_lossy(&units)
            .trim_end_matches('\0')
            .to_string();

        if !url.is_empty() {
            ws.meta_mut(first_row, first_col).hyperlink = Some(url);
        }
        Ok(())
    }

    /// TXO: 18-byte header (text length at offset 10), then the merged
    /// continuation data: an options byte followed by the characters.
    fn parse_txo(data: &[u8]) -> Option<String> {
        if data.len() < 19 {
            return None;
        }
        let cch = u16::from_le_bytes([data[10], data[11]]) as usize;
        if cch == 0 {
            return None;
        }
        let wide = data[18] & 0x01 != 0;
        let text_start = 19;

        if wide {
            let end = (text_start + cch * 2).min(data.len());
            let units: Vec<u16> = data[text_start..end]
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            Some(String::from_utf16_lossy(&units))
        } else {
            let end = (text_start + cch).min(data.len());
            Some(data[text_start..end].iter().map(|&b| b as char).collect())
        }
    }
}
