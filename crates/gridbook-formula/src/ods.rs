//! OpenDocument formula normalisation.
//!
//! ODS stores formulas as `of:=SUM([.A1:.B2];2)`: an `of:` dialect prefix,
//! bracketed references with `.`-prefixed cell parts (and `Sheet.` prefixes
//! for cross-sheet references), and `;` argument separators. This module
//! rewrites them to the plain A1 dialect the rest of the pipeline uses.

use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;

use crate::r1c1::decode_xml_entities;

static BRACKET_REF: Lazy<Regex> = lazy_regex!(r"\[([^\]]+)\]");

/// Normalise one ODS formula into A1 dialect (keeps the leading `=`).
pub fn normalize_ods_formula(formula: &str) -> String {
    let mut text = formula.trim().to_string();
    for prefix in ["of:", "ooow:", "msoxl:"] {
        if let Some(stripped) = text.strip_prefix(prefix) {
            text = stripped.to_string();
            break;
        }
    }
    let text = decode_xml_entities(&text);

    let replaced = BRACKET_REF.replace_all(&text, |caps: &regex::Captures<'_>| {
        rewrite_bracket_ref(&caps[1])
    });

    // Argument separators: `;` becomes `,` outside string literals.
    let mut out = String::with_capacity(replaced.len());
    for (i, segment) in replaced.split('"').enumerate() {
        if i > 0 {
            out.push('"');
        }
        if i % 2 == 1 {
            out.push_str(segment);
        } else {
            out.push_str(&segment.replace(';', ","));
        }
    }
    out
}

/// Rewrite the inside of one `[...]` reference: `.A1` → `A1`,
/// `Sheet2.B3` → `Sheet2!B3`, range halves joined back with `:`.
fn rewrite_bracket_ref(inner: &str) -> String {
    inner
        .split(':')
        .map(|part| {
            let part = part.trim();
            if let Some(stripped) = part.strip_prefix('.') {
                stripped.to_string()
            } else if let Some(dot) = part.find('.') {
                let (sheet, cell) = part.split_at(dot);
                format!("{sheet}!{}", &cell[1..])
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(":")
}
