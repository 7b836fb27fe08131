//! Per-cell metadata and row/column properties.

use crate::reference::column_name;

/// Structured metadata overlaid on a cell, keyed by A1 address in the
/// worksheet's `cells` map.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CellMeta {
    /// Number-format mask (e.g. `0.00%`, `m/d/yy`)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub format: Option<String>,
    /// Horizontal alignment
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub align: Option<HorizontalAlignment>,
    /// Text wrap flag
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub wrap: Option<bool>,
    /// Formula text (duplicated from the cell value for structured access)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub formula: Option<String>,
    /// Hyperlink URL attached to the cell
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub hyperlink: Option<String>,
    /// Cell lock flag (meaningful when the sheet is protected)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub locked: Option<bool>,
}

impl CellMeta {
    /// True when no field is set (entries like this are dropped on
    /// normalisation).
    pub fn is_empty(&self) -> bool {
        self.format.is_none()
            && self.align.is_none()
            && self.wrap.is_none()
            && self.formula.is_none()
            && self.hyperlink.is_none()
            && self.locked.is_none()
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
    Fill,
    Justify,
}

impl HorizontalAlignment {
    /// CSS `text-align` value.
    pub fn as_css(&self) -> &'static str {
        match self {
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Fill => "left",
            HorizontalAlignment::Justify => "justify",
        }
    }
}

/// Column type hint for grid consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColumnType {
    #[default]
    Text,
    Numeric,
    Checkbox,
}

/// Column properties.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Column {
    /// Width in pixels
    pub width: f64,
    /// Header title (defaults to the column letters)
    pub title: String,
    /// Type hint
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub column_type: ColumnType,
    /// Set to `Some(false)` for hidden columns
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub visible: Option<bool>,
}

impl Column {
    /// Default column width in pixels.
    pub const DEFAULT_WIDTH: f64 = 100.0;

    /// Create a column with the default title for `index`.
    pub fn new(index: u32) -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            title: column_name(index),
            column_type: ColumnType::Text,
            visible: None,
        }
    }

    /// Create a column with an explicit pixel width.
    pub fn with_width(index: u32, width: f64) -> Self {
        Self {
            width,
            ..Self::new(index)
        }
    }
}

/// Row properties.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Row {
    /// Height in pixels
    pub height: f64,
    /// Set to `Some(false)` for hidden rows
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub visible: Option<bool>,
}

impl Row {
    /// Create a row with an explicit pixel height.
    pub fn with_height(height: f64) -> Self {
        Self {
            height,
            visible: None,
        }
    }
}

/// Worksheet visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

impl SheetState {
    /// Decode the BOUNDSHEET state byte (0 visible, 1 hidden, 2 very hidden).
    pub fn from_biff_state(state: u8) -> Self {
        match state {
            1 => SheetState::Hidden,
            2 => SheetState::VeryHidden,
            _ => SheetState::Visible,
        }
    }
}

/// Worksheet protection descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SheetLock {
    /// Password hash as carried by the source file (never a plain password)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub password_hash: Option<String>,
    /// Ranges exempted from the lock (XLSX `protectedRanges`)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub protected_ranges: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_default_title() {
        assert_eq!(Column::new(0).title, "A");
        assert_eq!(Column::new(27).title, "AB");
    }

    #[test]
    fn test_cell_meta_is_empty() {
        assert!(CellMeta::default().is_empty());
        let meta = CellMeta {
            hyperlink: Some("https://example.com".into()),
            ..Default::default()
        };
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_sheet_state_from_biff() {
        assert_eq!(SheetState::from_biff_state(0), SheetState::Visible);
        assert_eq!(SheetState::from_biff_state(1), SheetState::Hidden);
        assert_eq!(SheetState::from_biff_state(2), SheetState::VeryHidden);
        assert_eq!(SheetState::from_biff_state(9), SheetState::Visible);
    }
}
