//! Worksheet type

use ahash::AHashMap;
use std::collections::BTreeMap;

use crate::media::Media;
use crate::meta::{CellMeta, Column, Row, SheetLock, SheetState};
use crate::reference::cell_name;
use crate::validation::Validation;
use crate::value::CellValue;

/// A single sheet of the uniform workbook.
///
/// Drivers populate the public fields directly or through the setter
/// helpers; the normaliser then squares the `data` matrix to
/// `min_dimensions`, interns `css` into the workbook style table (filling
/// `style`), and lifts `validations` to the workbook level. All address
/// maps are keyed by plain A1 text (`B7`).
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Worksheet {
    /// Sheet name
    #[cfg_attr(feature = "serde", serde(rename = "worksheetName"))]
    pub name: String,
    /// Dense cell matrix, `min_dimensions.1` rows of `min_dimensions.0` cells
    pub data: Vec<Vec<CellValue>>,
    /// Column properties by zero-based index
    pub columns: BTreeMap<u32, Column>,
    /// Row properties by zero-based index
    pub rows: BTreeMap<u32, Row>,
    /// Cell metadata by A1 address
    pub cells: AHashMap<String, CellMeta>,
    /// Raw CSS style strings by A1 address (driver stage; drained by the
    /// normaliser)
    #[cfg_attr(feature = "serde", serde(skip))]
    pub css: AHashMap<String, String>,
    /// Interned style indices by A1 address (filled by the normaliser)
    pub style: AHashMap<String, u32>,
    /// Merge extents `(colspan, rowspan)` by top-left A1 address
    pub merge_cells: AHashMap<String, (u32, u32)>,
    /// Comment text by A1 address
    pub comments: AHashMap<String, String>,
    /// `(cols, rows)` extent of the squared matrix
    pub min_dimensions: (u32, u32),
    /// `(cols, rows)` floor declared by the source format (XLSX
    /// `dimension/ref`, SYLK `B` record); the squared matrix covers at
    /// least this much even where nothing was written
    #[cfg_attr(feature = "serde", serde(skip))]
    pub declared_extent: Option<(u32, u32)>,
    /// Visibility, when not plainly visible
    #[cfg_attr(feature = "serde", serde(rename = "worksheetState"))]
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub state: Option<SheetState>,
    /// Frozen-pane row count
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub freeze_rows: Option<u32>,
    /// Frozen-pane column count
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub freeze_columns: Option<u32>,
    /// Grid-line visibility flag
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub gridline: Option<bool>,
    /// Protection descriptor
    #[cfg_attr(feature = "serde", serde(rename = "locked"))]
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub lock: Option<SheetLock>,
    /// Default column width in pixels
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub default_col_width: Option<f64>,
    /// Images, shapes, and chart descriptors
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub media: Vec<Media>,
    /// Driver-stage validations (lifted to the workbook by the normaliser)
    #[cfg_attr(feature = "serde", serde(skip))]
    pub validations: Vec<Validation>,
}

impl Worksheet {
    /// Create an empty worksheet with the given name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set a cell value, growing the matrix as needed.
    ///
    /// Last writer wins for repeated `(row, col)` targets.
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        let r = row as usize;
        let c = col as usize;
        if self.data.len() <= r {
            self.data.resize_with(r + 1, Vec::new);
        }
        let row_vec = &mut self.data[r];
        if row_vec.len() <= c {
            row_vec.resize(c + 1, CellValue::Empty);
        }
        row_vec[c] = value;
    }

    /// Get a cell value (Empty outside the written area).
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.data
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .unwrap_or(&EMPTY)
    }

    /// Attach a raw CSS style string to a cell.
    pub fn set_css(&mut self, row: u32, col: u32, css: impl Into<String>) {
        let css = css.into();
        if !css.is_empty() {
            self.css.insert(cell_name(col, row), css);
        }
    }

    /// Mutable access to a cell's metadata entry, creating it on demand.
    pub fn meta_mut(&mut self, row: u32, col: u32) -> &mut CellMeta {
        self.cells.entry(cell_name(col, row)).or_default()
    }

    /// Record a merged region with its `(colspan, rowspan)` extent.
    ///
    /// Extents of `(1, 1)` or less are ignored.
    pub fn set_merge(&mut self, row: u32, col: u32, colspan: u32, rowspan: u32) {
        if colspan <= 1 && rowspan <= 1 {
            return;
        }
        self.merge_cells
            .insert(cell_name(col, row), (colspan.max(1), rowspan.max(1)));
    }

    /// Attach a comment to a cell.
    pub fn set_comment(&mut self, row: u32, col: u32, text: impl Into<String>) {
        self.comments.insert(cell_name(col, row), text.into());
    }

    /// Set a row's pixel height.
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.rows
            .entry(row)
            .or_insert_with(|| Row::with_height(height))
            .height = height;
    }

    /// Hide a row.
    pub fn set_row_hidden(&mut self, row: u32) {
        self.rows
            .entry(row)
            .or_insert_with(|| Row::with_height(20.0))
            .visible = Some(false);
    }

    /// Set a column's pixel width.
    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.columns
            .entry(col)
            .or_insert_with(|| Column::new(col))
            .width = width;
    }

    /// Hide a column.
    pub fn set_column_hidden(&mut self, col: u32) {
        self.columns
            .entry(col)
            .or_insert_with(|| Column::new(col))
            .visible = Some(false);
    }

    /// Set a column's header title.
    pub fn set_column_title(&mut self, col: u32, title: impl Into<String>) {
        self.columns
            .entry(col)
            .or_insert_with(|| Column::new(col))
            .title = title.into();
    }

    /// The extent `(cols, rows)` covering written cells, metadata, the
    /// bottom-right corner of every merge, and the declared extent.
    pub fn written_extent(&self) -> (u32, u32) {
        let mut max_col: i64 = -1;
        let mut max_row: i64 = self.data.len() as i64 - 1;

        if let Some((cols, rows)) = self.declared_extent {
            max_col = max_col.max(cols as i64 - 1);
            max_row = max_row.max(rows as i64 - 1);
        }

        for row_vec in &self.data {
            if !row_vec.is_empty() {
                max_col = max_col.max(row_vec.len() as i64 - 1);
            }
        }

        let mut consider = |addr: &str| {
            if let Ok((Some(c), Some(r))) = crate::reference::coords_from_cell_name(addr) {
                max_col = max_col.max(c as i64);
                max_row = max_row.max(r as i64);
            }
        };
        for addr in self.css.keys() {
            consider(addr);
        }
        for addr in self.cells.keys() {
            consider(addr);
        }
        for addr in self.comments.keys() {
            consider(addr);
        }
        for (addr, (colspan, rowspan)) in &self.merge_cells {
            if let Ok((Some(c), Some(r))) = crate::reference::coords_from_cell_name(addr) {
                max_col = max_col.max(c as i64 + *colspan as i64 - 1);
                max_row = max_row.max(r as i64 + *rowspan as i64 - 1);
            }
        }

        ((max_col + 1) as u32, (max_row + 1) as u32)
    }
}
