//! Data validation and conditional-format rules.
//!
//! Drivers collect validations per worksheet; the normaliser qualifies
//! their ranges with the worksheet name and lifts them into a single
//! workbook-level sequence. Conditional formats travel in the same shape
//! with [`ValidationAction::Format`] and a CSS-like format record.

use std::collections::BTreeMap;

/// A validation (or conditional-format) rule over a range.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Validation {
    /// Fully-qualified range (`Sheet1!A1:B2`); drivers may leave it
    /// unqualified and the normaliser adds the sheet prefix.
    pub range: String,
    /// What is being constrained or highlighted
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: ValidationKind,
    /// What happens on violation (or, for conditional formats, on match)
    pub action: ValidationAction,
    /// Comparison criterion, where the kind uses one
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub criteria: Option<Criterion>,
    /// Operand values (one for simple comparisons, two for between, the
    /// list entries for list validations)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub value: Vec<String>,
    /// CSS-like format record, present when `action` is `Format`
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub format: Option<BTreeMap<String, String>>,
    /// Prompt/error text to surface to the user, when the source carried one
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub message: Option<String>,
}

impl Validation {
    /// Create a rule with the given range and kind; everything else default.
    pub fn new(range: impl Into<String>, kind: ValidationKind) -> Self {
        Self {
            range: range.into(),
            kind,
            action: ValidationAction::Reject,
            criteria: None,
            value: Vec::new(),
            format: None,
            message: None,
        }
    }

    /// Create a conditional-format rule carrying a style record.
    pub fn format_rule(
        range: impl Into<String>,
        kind: ValidationKind,
        format: BTreeMap<String, String>,
    ) -> Self {
        Self {
            range: range.into(),
            kind,
            action: ValidationAction::Format,
            criteria: None,
            value: Vec::new(),
            format: Some(format),
            message: None,
        }
    }
}

/// Validation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ValidationKind {
    Number,
    List,
    TextLength,
    Date,
    Time,
    Formula,
    Text,
    Empty,
    NotEmpty,
    /// Conditional-format only: data bar
    DataBar,
    /// Conditional-format only: colour scale
    ColorScale,
    /// Conditional-format only: icon set
    IconSet,
}

/// What the rule does when it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ValidationAction {
    /// Refuse the entry (error alert)
    Reject,
    /// Accept with a warning
    Warning,
    /// Apply the attached format record (conditional formatting)
    Format,
}

/// Comparison criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Equal,
    #[cfg_attr(feature = "serde", serde(rename = "!="))]
    NotEqual,
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Less,
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Greater,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    LessOrEqual,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    GreaterOrEqual,
    #[cfg_attr(feature = "serde", serde(rename = "between"))]
    Between,
    #[cfg_attr(feature = "serde", serde(rename = "not between"))]
    NotBetween,
    #[cfg_attr(feature = "serde", serde(rename = "contains"))]
    Contains,
    #[cfg_attr(feature = "serde", serde(rename = "not contains"))]
    NotContains,
    #[cfg_attr(feature = "serde", serde(rename = "begins with"))]
    BeginsWith,
    #[cfg_attr(feature = "serde", serde(rename = "ends with"))]
    EndsWith,
}

impl Criterion {
    /// Decode the OOXML `operator` attribute used by both `dataValidation`
    /// and `cfRule` elements.
    pub fn from_ooxml(op: &str) -> Option<Self> {
        match op {
            "equal" => Some(Criterion::Equal),
            "notEqual" => Some(Criterion::NotEqual),
            "lessThan" => Some(Criterion::Less),
            "greaterThan" => Some(Criterion::Greater),
            "lessThanOrEqual" => Some(Criterion::LessOrEqual),
            "greaterThanOrEqual" => Some(Criterion::GreaterOrEqual),
            "between" => Some(Criterion::Between),
            "notBetween" => Some(Criterion::NotBetween),
            "containsText" => Some(Criterion::Contains),
            "notContains" | "notContainsText" => Some(Criterion::NotContains),
            "beginsWith" => Some(Criterion::BeginsWith),
            "endsWith" => Some(Criterion::EndsWith),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_from_ooxml() {
        assert_eq!(Criterion::from_ooxml("between"), Some(Criterion::Between));
        assert_eq!(
            Criterion::from_ooxml("greaterThanOrEqual"),
            Some(Criterion::GreaterOrEqual)
        );
        assert_eq!(Criterion::from_ooxml("bogus"), None);
    }

    #[test]
    fn test_format_rule() {
        let mut fmt = BTreeMap::new();
        fmt.insert("background-color".to_string(), "#FFCCCC".to_string());
        let rule = Validation::format_rule("A1:A5", ValidationKind::Number, fmt);
        assert_eq!(rule.action, ValidationAction::Format);
        assert!(rule.format.is_some());
    }
}
