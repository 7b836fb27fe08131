//! R1C1 → A1 reference rewriting.
//!
//! XML-Spreadsheet-2003 stores formulas in R1C1 form (`=RC[1]*R2C1`).
//! Given the cell a formula lives in, every `R...C...` occurrence is
//! rewritten to A1 notation: bracketed or empty components are relative
//! offsets from that cell (rendered without `$`), bare numbers are
//! absolute 1-based coordinates (rendered with `$`).

use gridbook_core::column_name;
use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;

static R1C1: Lazy<Regex> = lazy_regex!(r"^R(\[-?\d+\]|\d+)?C(\[-?\d+\]|\d+)?");

/// Decode the five XML entities that may appear in attribute-carried
/// formulas before any reference matching.
pub fn decode_xml_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// One R1C1 component: relative offset or absolute 1-based coordinate.
enum Component {
    Relative(i64),
    Absolute(i64),
}

fn parse_component(text: Option<&str>) -> Component {
    match text {
        None | Some("") => Component::Relative(0),
        Some(t) if t.starts_with('[') => {
            let inner = &t[1..t.len() - 1];
            Component::Relative(inner.parse().unwrap_or(0))
        }
        Some(t) => Component::Absolute(t.parse().unwrap_or(1)),
    }
}

/// Translate every R1C1 reference in `formula` against the target cell
/// `(row, col)` (zero-based). Text inside double-quoted string literals
/// is left untouched.
pub fn r1c1_to_a1(formula: &str, row: u32, col: u32) -> String {
    let decoded = decode_xml_entities(formula);

    // Split on string literals so "RC" inside quotes survives.
    let mut out = String::with_capacity(decoded.len());
    for (i, segment) in decoded.split('"').enumerate() {
        if i > 0 {
            out.push('"');
        }
        if i % 2 == 1 {
            out.push_str(segment);
            continue;
        }
        out.push_str(&translate_segment(segment, row, col));
    }
    out
}

fn translate_segment(segment: &str, row: u32, col: u32) -> String {
    let bytes = segment.as_bytes();
    let mut out = String::with_capacity(segment.len());
    let mut i = 0;

    while i < bytes.len() {
        let is_boundary = i == 0 || {
            let prev = bytes[i - 1];
            !(prev.is_ascii_alphanumeric() || prev == b'_' || prev == b'.')
        };

        if bytes[i] == b'R' && is_boundary {
            if let Some(caps) = R1C1.captures(&segment[i..]) {
                let matched = caps.get(0).unwrap();
                let after = bytes.get(i + matched.end());
                // A following letter or digit means this was an identifier
                // prefix, not a reference.
                if !after.map(|b| b.is_ascii_alphanumeric()).unwrap_or(false) {
                    out.push_str(&render_reference(&caps, row, col));
                    i += matched.end();
                    continue;
                }
            }
        }

        let ch_len = segment[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        out.push_str(&segment[i..i + ch_len]);
        i += ch_len;
    }

    out
}

fn render_reference(caps: &regex::Captures<'_>, row: u32, col: u32) -> String {
    let row_part = parse_component(caps.get(1).map(|m| m.as_str()));
    let col_part = parse_component(caps.get(2).map(|m| m.as_str()));

    let (row_text, row_abs) = match row_part {
        Component::Relative(offset) => {
            let r = (row as i64 + offset).max(0);
            ((r + 1).to_string(), false)
        }
        Component::Absolute(n) => (n.max(1).to_string(), true),
    };
    let (col_idx, col_abs) = match col_part {
        Component::Relative(offset) => ((col as i64 + offset).max(0), false),
        Component::Absolute(n) => (n.max(1) - 1, true),
    };

    let mut text = String::new();
    if col_abs {
        text.push('$');
    }
    text.push_str(&column_name(col_idx as u32));
    if row_abs {
        text.push('$');
    }
    text.push_str(&row_text);
    text
}
