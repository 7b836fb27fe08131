//! Workbook type

use std::collections::BTreeMap;

use crate::validation::Validation;
use crate::worksheet::Worksheet;

/// The uniform workbook: what every format driver produces and the
/// normaliser refines.
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Workbook {
    /// Ordered worksheets
    pub worksheets: Vec<Worksheet>,
    /// Interned style strings; worksheet `style` maps index into this table
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub style: Vec<String>,
    /// Defined names → reference expressions
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "BTreeMap::is_empty", default))]
    pub defined_names: BTreeMap<String, String>,
    /// Workbook-level validations (with `Sheet!`-qualified ranges)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub validations: Vec<Validation>,
    /// Non-fatal anomalies encountered while parsing
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub warnings: Vec<String>,
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worksheet and return a mutable reference to it.
    pub fn add_worksheet(&mut self, name: impl Into<String>) -> &mut Worksheet {
        self.worksheets.push(Worksheet::new(name));
        self.worksheets.last_mut().unwrap()
    }

    /// Look up a worksheet by name.
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name == name)
    }

    /// Record a non-fatal anomaly.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}
