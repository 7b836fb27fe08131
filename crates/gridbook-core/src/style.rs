//! Style strings and the workbook-global interning table.
//!
//! Styles travel through the pipeline as opaque CSS-like strings
//! (`font-size: 12px; color: #FF0000;`). Drivers build them with
//! [`CssStyle`]; the normaliser deduplicates them into the workbook's
//! [`StyleTable`] so worksheets reference them by integer index.

use ahash::AHashMap;

/// An ordered property list behind a CSS-like style string.
///
/// Property order is preserved so that a parse/render round trip is
/// byte-stable, which the normaliser relies on when it rewrites borders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CssStyle {
    props: Vec<(String, String)>,
}

impl CssStyle {
    /// Create an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `prop: value; prop: value;` string.
    ///
    /// Malformed declarations (no `:`) are skipped.
    pub fn parse(css: &str) -> Self {
        let mut style = Self::new();
        for decl in css.split(';') {
            let decl = decl.trim();
            if decl.is_empty() {
                continue;
            }
            if let Some((prop, value)) = decl.split_once(':') {
                style.set(prop.trim(), value.trim());
            }
        }
        style
    }

    /// Set a property, replacing any existing declaration of the same name.
    pub fn set(&mut self, prop: &str, value: &str) -> &mut Self {
        if let Some(entry) = self.props.iter_mut().find(|(p, _)| p == prop) {
            entry.1 = value.to_string();
        } else {
            self.props.push((prop.to_string(), value.to_string()));
        }
        self
    }

    /// Get a property value.
    pub fn get(&self, prop: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v.as_str())
    }

    /// Remove a property; returns true when it was present.
    pub fn remove(&mut self, prop: &str) -> bool {
        let before = self.props.len();
        self.props.retain(|(p, _)| p != prop);
        self.props.len() != before
    }

    /// Whether the property is declared.
    pub fn contains(&self, prop: &str) -> bool {
        self.props.iter().any(|(p, _)| p == prop)
    }

    /// Whether any property is declared.
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Iterate over `(property, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Render as a `prop: value; prop: value;` string.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (prop, value) in &self.props {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(prop);
            out.push_str(": ");
            out.push_str(value);
            out.push(';');
        }
        out
    }
}

impl std::fmt::Display for CssStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_css())
    }
}

/// Render an RGB triple as `#RRGGBB`.
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Workbook-global style string table with deduplication.
///
/// Files typically have many cells sharing the same style. The table
/// ensures each unique style string is stored once; cells reference
/// styles by index. Insertion order defines index assignment.
#[derive(Debug, Default)]
pub struct StyleTable {
    /// All unique style strings
    entries: Vec<String>,
    /// Fast lookup for deduplication
    index_map: AHashMap<String, u32>,
}

impl StyleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create an entry for a style string, returning its index.
    pub fn intern(&mut self, css: &str) -> u32 {
        if let Some(&idx) = self.index_map.get(css) {
            return idx;
        }
        let idx = self.entries.len() as u32;
        self.index_map.insert(css.to_string(), idx);
        self.entries.push(css.to_string());
        idx
    }

    /// Get a style string by index.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }

    /// Number of unique styles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no styles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the table, returning the ordered style strings.
    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }

    /// Rebuild a table from an existing ordered style list.
    pub fn from_vec(entries: Vec<String>) -> Self {
        let index_map = entries
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u32))
            .collect();
        Self { entries, index_map }
    }
}
