//! The normalisation pipeline.
//!
//! Takes the "raw" workbook a format driver produced and refines it into
//! the canonical form:
//!
//! 1. address canonicalisation (plain A1 keys, invalid keys dropped),
//! 2. `min_dimensions` computation and dense matrix fill,
//! 3. merge-region blanking (covered cells carry the empty value),
//! 4. border deduplication between adjacent cells (looking past merges),
//! 5. style-string interning into the workbook-global table,
//! 6. validation unification (`Sheet!`-qualified, lifted to the workbook).
//!
//! The pipeline is idempotent: running it on an already-normalised
//! workbook changes nothing.

use ahash::AHashMap;

use crate::reference::{cell_name, coords_from_cell_name, quote_sheet_name, CellRange};
use crate::style::{CssStyle, StyleTable};
use crate::validation::Validation;
use crate::value::CellValue;
use crate::workbook::Workbook;
use crate::worksheet::Worksheet;

/// Normalise a workbook in place.
pub fn normalize(workbook: &mut Workbook) {
    let mut styles = StyleTable::from_vec(std::mem::take(&mut workbook.style));
    let mut validations = std::mem::take(&mut workbook.validations);

    for ws in &mut workbook.worksheets {
        canonicalize_addresses(ws);

        let (cols, rows) = ws.written_extent();
        ws.min_dimensions = (cols, rows);
        square_matrix(ws, cols, rows);

        blank_merged_regions(ws);
        dedupe_borders(ws);
        intern_styles(ws, &mut styles);
        lift_validations(ws, &mut validations);

        ws.cells.retain(|_, meta| !meta.is_empty());
    }

    workbook.style = styles.into_vec();
    workbook.validations = validations;
}

/// Re-render every map key as plain A1 (no `$`), dropping keys that do not
/// parse to a complete in-bounds address.
fn canonicalize_addresses(ws: &mut Worksheet) {
    fn rekey<V>(map: &mut AHashMap<String, V>) {
        let keys: Vec<String> = map.keys().cloned().collect();
        for key in keys {
            match coords_from_cell_name(&key) {
                Ok((Some(col), Some(row))) => {
                    let canonical = cell_name(col, row);
                    if canonical != key {
                        if let Some(value) = map.remove(&key) {
                            map.insert(canonical, value);
                        }
                    }
                }
                _ => {
                    log::warn!("dropping entry with unparsable address '{key}'");
                    map.remove(&key);
                }
            }
        }
    }

    rekey(&mut ws.css);
    rekey(&mut ws.style);
    rekey(&mut ws.cells);
    rekey(&mut ws.comments);
    rekey(&mut ws.merge_cells);
}

/// Fill the data matrix with empty cells up to `(cols, rows)`.
fn square_matrix(ws: &mut Worksheet, cols: u32, rows: u32) {
    ws.data.resize_with(rows as usize, Vec::new);
    for row in &mut ws.data {
        row.resize(cols as usize, CellValue::Empty);
    }
}

/// Blank out every cell covered by a merge except its top-left corner, and
/// drop merges that overlap an earlier one.
fn blank_merged_regions(ws: &mut Worksheet) {
    let mut merges: Vec<(u32, u32, u32, u32)> = Vec::with_capacity(ws.merge_cells.len());
    let mut ordered: Vec<(String, (u32, u32))> = ws
        .merge_cells
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    ordered.sort_by_key(|(addr, _)| {
        coords_from_cell_name(addr)
            .ok()
            .and_then(|(c, r)| Some((r?, c?)))
            .unwrap_or((u32::MAX, u32::MAX))
    });

    let mut kept: Vec<(u32, u32, u32, u32)> = Vec::new();
    for (addr, (colspan, rowspan)) in ordered {
        let Ok((Some(col), Some(row))) = coords_from_cell_name(&addr) else {
            continue;
        };
        let range = CellRange::from_indices(row, col, row + rowspan - 1, col + colspan - 1);
        let overlap = kept.iter().any(|&(r1, c1, r2, c2)| {
            range.overlaps(&CellRange::from_indices(r1, c1, r2, c2))
        });
        if overlap {
            log::warn!("dropping merge {addr} overlapping an earlier region");
            ws.merge_cells.remove(&addr);
            continue;
        }
        kept.push((range.start.row, range.start.col, range.end.row, range.end.col));
        merges.push((row, col, rowspan, colspan));
    }

    for (row, col, rowspan, colspan) in merges {
        for r in row..row + rowspan {
            for c in col..col + colspan {
                if r == row && c == col {
                    continue;
                }
                ws.set_value(r, c, CellValue::Empty);
            }
        }
    }
}

/// Remove the left border of a cell whose left-hand neighbour already draws
/// the shared edge, and likewise the top border under a bottom border.
/// Merged cells are treated as a single block: the "right neighbour" of a
/// merge sits past its full column span, one for each spanned row.
fn dedupe_borders(ws: &mut Worksheet) {
    // Coordinates of every styled cell, row-major for determinism.
    let mut styled: Vec<(u32, u32)> = ws
        .css
        .keys()
        .filter_map(|addr| match coords_from_cell_name(addr) {
            Ok((Some(c), Some(r))) => Some((r, c)),
            _ => None,
        })
        .collect();
    styled.sort_unstable();

    for (row, col) in styled {
        let addr = cell_name(col, row);
        let (colspan, rowspan) = ws.merge_cells.get(&addr).copied().unwrap_or((1, 1));

        let has_right = ws
            .css
            .get(&addr)
            .map(|css| css.contains("border-right:"))
            .unwrap_or(false);
        if has_right {
            for j in 0..rowspan {
                strip_border(ws, row + j, col + colspan, "border-left");
            }
        }

        let has_bottom = ws
            .css
            .get(&addr)
            .map(|css| css.contains("border-bottom:"))
            .unwrap_or(false);
        if has_bottom {
            for i in 0..colspan {
                strip_border(ws, row + rowspan, col + i, "border-top");
            }
        }
    }
}

fn strip_border(ws: &mut Worksheet, row: u32, col: u32, prop: &str) {
    let addr = cell_name(col, row);
    let Some(css) = ws.css.get(&addr) else { return };
    if !css.contains(prop) {
        return;
    }
    let mut style = CssStyle::parse(css);
    style.remove(prop);
    if style.is_empty() {
        ws.css.remove(&addr);
    } else {
        ws.css.insert(addr, style.to_css());
    }
}

/// Move the worksheet's raw CSS strings into the global table, leaving
/// integer indices behind. Row-major traversal keeps index assignment
/// stable for a given file.
fn intern_styles(ws: &mut Worksheet, styles: &mut StyleTable) {
    let mut entries: Vec<(String, String)> = ws.css.drain().collect();
    entries.sort_by_key(|(addr, _)| {
        coords_from_cell_name(addr)
            .ok()
            .and_then(|(c, r)| Some((r?, c?)))
            .unwrap_or((u32::MAX, u32::MAX))
    });

    for (addr, css) in entries {
        let idx = styles.intern(&css);
        ws.style.insert(addr, idx);
    }
}

/// Qualify validation ranges with the worksheet name and lift them to the
/// workbook-level sequence.
fn lift_validations(ws: &mut Worksheet, out: &mut Vec<Validation>) {
    let sheet = quote_sheet_name(&ws.name);
    for mut validation in ws.validations.drain(..) {
        if !validation.range.contains('!') {
            validation.range = format!("{sheet}!{}", validation.range);
        }
        out.push(validation);
    }
}
