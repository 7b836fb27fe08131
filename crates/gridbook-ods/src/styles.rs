//! ODS style resolution.
//!
//! `style:style` elements (from `content.xml` automatic styles and
//! `styles.xml` named styles) resolve by family: table-cell styles become
//! CSS strings plus metadata bits, column/row styles carry widths and
//! heights, and table styles carry sheet visibility. A cell style may
//! link a data style (`number:*-style`) which is reduced to a coarse
//! format mask.

use std::collections::HashMap;

use gridbook_core::{CssStyle, HorizontalAlignment};
use gridbook_markup::XmlNode;

/// A resolved table-cell style.
#[derive(Debug, Clone, Default)]
pub struct CellStyle {
    pub css: String,
    pub format: Option<String>,
    pub align: Option<HorizontalAlignment>,
    pub wrap: bool,
}

/// Styles collected from one document.
#[derive(Debug, Default)]
pub struct OdsStyles {
    pub cells: HashMap<String, CellStyle>,
    /// Column style name → width in pixels
    pub column_widths: HashMap<String, f64>,
    /// Row style name → height in pixels
    pub row_heights: HashMap<String, f64>,
    /// Table style name → display flag
    pub table_display: HashMap<String, bool>,
}

impl OdsStyles {
    /// Fold the `style:style` and `number:*-style` elements of one style
    /// container (`office:automatic-styles` or `office:styles`) into the
    /// collection.
    pub fn collect(&mut self, container: &XmlNode) {
        let mut data_styles: HashMap<String, String> = HashMap::new();
        for node in &container.children {
            let local = gridbook_markup::local_name(&node.name);
            if let Some(kind) = local.strip_suffix("-style") {
                if let Some(name) = node.attr("name") {
                    data_styles.insert(name.to_string(), data_style_format(kind, node));
                }
            }
        }

        for style in container.children_named("style") {
            let Some(name) = style.attr("name") else {
                continue;
            };
            match style.attr("family") {
                Some("table-cell") => {
                    let mut cell = resolve_cell_style(style);
                    if let Some(data) = style.attr("data-style-name") {
                        if cell.format.is_none() {
                            cell.format = data_styles.get(data).cloned();
                        }
                    }
                    self.cells.insert(name.to_string(), cell);
                }
                Some("table-column") => {
                    if let Some(width) = style
                        .child("table-column-properties")
                        .and_then(|p| p.attr("column-width"))
                        .and_then(length_to_px)
                    {
                        self.column_widths.insert(name.to_string(), width);
                    }
                }
                Some("table-row") => {
                    if let Some(height) = style
                        .child("table-row-properties")
                        .and_then(|p| p.attr("row-height"))
                        .and_then(length_to_px)
                    {
                        self.row_heights.insert(name.to_string(), height);
                    }
                }
                Some("table") => {
                    let display = style
                        .child("table-properties")
                        .and_then(|p| p.attr("display"))
                        .map(|v| v != "false")
                        .unwrap_or(true);
                    self.table_display.insert(name.to_string(), display);
                }
                _ => {}
            }
        }
    }
}

fn resolve_cell_style(style: &XmlNode) -> CellStyle {
    let mut css = CssStyle::new();
    let mut out = CellStyle::default();

    if let Some(text) = style.child("text-properties") {
        if text.attr("font-weight") == Some("bold") {
            css.set("font-weight", "bold");
        }
        if text.attr("font-style") == Some("italic") {
            css.set("font-style", "italic");
        }
        if let Some(size) = text.attr("font-size").and_then(length_to_px) {
            css.set("font-size", &format!("{size}px"));
        }
        if let Some(name) = text.attr("font-name").or_else(|| text.attr("font-family")) {
            css.set("font-family", name);
        }
        if let Some(color) = text.attr("color") {
            if color.starts_with('#') {
                css.set("color", color);
            }
        }
        match text.attr("text-line-through-style") {
            Some("none") | None => {
                if let Some(u) = text.attr("text-underline-style") {
                    if u != "none" {
                        css.set("text-decoration", "underline");
                    }
                }
            }
            Some(_) => {
                css.set("text-decoration", "line-through");
            }
        }
    }

    if let Some(cell) = style.child("table-cell-properties") {
        if let Some(bg) = cell.attr("background-color") {
            if bg.starts_with('#') {
                css.set("background-color", bg);
            }
        }
        if cell.attr("wrap-option") == Some("wrap") {
            out.wrap = true;
        }
        // fo:border covers all four edges; specific edges override.
        if let Some(all) = cell.attr("border").and_then(border_to_css) {
            for prop in ["border-left", "border-right", "border-top", "border-bottom"] {
                css.set(prop, &all);
            }
        }
        for (attr, prop) in [
            ("border-left", "border-left"),
            ("border-right", "border-right"),
            ("border-top", "border-top"),
            ("border-bottom", "border-bottom"),
        ] {
            if let Some(edge) = cell.attr(attr).and_then(border_to_css) {
                css.set(prop, &edge);
            }
        }
        if let Some(valign) = cell.attr("vertical-align") {
            match valign {
                "top" => {
                    css.set("vertical-align", "top");
                }
                "middle" => {
                    css.set("vertical-align", "middle");
                }
                _ => {}
            }
        }
    }

    if let Some(para) = style.child("paragraph-properties") {
        out.align = match para.attr("text-align") {
            Some("start") | Some("left") => Some(HorizontalAlignment::Left),
            Some("center") => Some(HorizontalAlignment::Center),
            Some("end") | Some("right") => Some(HorizontalAlignment::Right),
            Some("justify") => Some(HorizontalAlignment::Justify),
            _ => None,
        };
        if let Some(a) = out.align {
            css.set("text-align", a.as_css());
        }
    }

    out.css = css.to_css();
    out
}

/// Reduce a `number:*-style` definition to a coarse format mask.
fn data_style_format(kind: &str, node: &XmlNode) -> String {
    match kind {
        "percentage" => {
            let decimals = node
                .child("number")
                .and_then(|n| n.attr("decimal-places"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            if decimals > 0 {
                format!("0.{}%", "0".repeat(decimals))
            } else {
                "0%".to_string()
            }
        }
        "currency" => "$#,##0.00".to_string(),
        "date" => "m/d/yy".to_string(),
        "time" => "h:mm:ss".to_string(),
        _ => {
            let number = node.child("number");
            let decimals = number
                .and_then(|n| n.attr("decimal-places"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            let grouping = number
                .and_then(|n| n.attr("grouping"))
                .map(|v| v == "true")
                .unwrap_or(false);
            let int_part = if grouping { "#,##0" } else { "0" };
            if decimals > 0 {
                format!("{int_part}.{}", "0".repeat(decimals))
            } else {
                int_part.to_string()
            }
        }
    }
}

/// `0.5pt solid #000000` → `1px solid #000000`; `none` yields nothing.
fn border_to_css(value: &str) -> Option<String> {
    let mut parts = value.split_whitespace();
    let width = parts.next()?;
    if width == "none" {
        return None;
    }
    let line = parts.next().unwrap_or("solid");
    let color = parts.next().unwrap_or("#000000");
    let px = length_to_px(width).unwrap_or(1.0).max(1.0);
    let line = match line {
        "dashed" => "dashed",
        "dotted" => "dotted",
        "double" => "double",
        _ => "solid",
    };
    Some(format!("{px}px {line} {color}"))
}

/// Parse a CSS-like length (`2.258cm`, `0.8in`, `12pt`, `64px`) to pixels.
pub fn length_to_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let split = value.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(value.len());
    let number: f64 = value[..split].parse().ok()?;
    let px = match &value[split..] {
        "cm" => number * 96.0 / 2.54,
        "mm" => number * 96.0 / 25.4,
        "in" => number * 96.0,
        "pt" => number * 4.0 / 3.0,
        "pc" => number * 16.0,
        "" | "px" => number,
        _ => return None,
    };
    Some(px.round())
}
