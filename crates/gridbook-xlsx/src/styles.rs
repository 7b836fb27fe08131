//! `xl/styles.xml` parsing.
//!
//! Builds the cell style cross-reference: `cellXfs` entries resolve
//! through the font/fill/border pools into CSS strings plus the
//! structured bits (number format, alignment, wrap, lock) cells pick up
//! by style index. Differential formats (`dxfs`) resolve into the
//! CSS-like maps conditional-format rules attach to.

use std::collections::BTreeMap;
use std::collections::HashMap;

use gridbook_core::{CssStyle, HorizontalAlignment};
use gridbook_markup::XmlNode;

/// One `cellXfs` entry resolved for cell consumption.
#[derive(Debug, Clone, Default)]
pub struct ResolvedXf {
    pub css: String,
    pub format: Option<String>,
    pub align: Option<HorizontalAlignment>,
    pub wrap: bool,
    pub locked: bool,
}

/// Everything the worksheet walker needs from `styles.xml`.
#[derive(Debug, Default)]
pub struct XlsxStyles {
    pub cell_xfs: Vec<ResolvedXf>,
    /// Differential formats for conditional formatting, by `dxfId`
    pub dxfs: Vec<BTreeMap<String, String>>,
}

/// Well-known built-in number formats (the same table every producer
/// hard-codes; custom ids live in `numFmts`).
fn builtin_format(id: u32) -> Option<&'static str> {
    Some(match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0_);(#,##0)",
        38 => "#,##0_);[Red](#,##0)",
        39 => "#,##0.00_);(#,##0.00)",
        40 => "#,##0.00_);[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

#[derive(Debug, Clone, Default)]
struct Font {
    size: Option<f64>,
    name: Option<String>,
    bold: bool,
    italic: bool,
    strike: bool,
    underline: bool,
    color: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Border {
    left: Option<String>,
    right: Option<String>,
    top: Option<String>,
    bottom: Option<String>,
}

/// Parse `styles.xml` (absent parts yield an empty default).
pub fn parse_styles(root: &XmlNode) -> XlsxStyles {
    let num_fmts: HashMap<u32, String> = root
        .child("numFmts")
        .map(|fmts| {
            fmts.children_named("numFmt")
                .filter_map(|f| {
                    Some((
                        f.attr("numFmtId")?.parse().ok()?,
                        f.attr("formatCode")?.to_string(),
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    let fonts: Vec<Font> = root
        .child("fonts")
        .map(|fs| fs.children_named("font").map(parse_font).collect())
        .unwrap_or_default();

    let fills: Vec<Option<String>> = root
        .child("fills")
        .map(|fs| fs.children_named("fill").map(parse_fill).collect())
        .unwrap_or_default();

    let borders: Vec<Border> = root
        .child("borders")
        .map(|bs| bs.children_named("border").map(parse_border).collect())
        .unwrap_or_default();

    let cell_xfs = root
        .child("cellXfs")
        .map(|xfs| {
            xfs.children_named("xf")
                .map(|xf| resolve_xf(xf, &fonts, &fills, &borders, &num_fmts))
                .collect()
        })
        .unwrap_or_default();

    let dxfs = root
        .child("dxfs")
        .map(|ds| ds.children_named("dxf").map(parse_dxf).collect())
        .unwrap_or_default();

    XlsxStyles { cell_xfs, dxfs }
}

fn resolve_xf(
    xf: &XmlNode,
    fonts: &[Font],
    fills: &[Option<String>],
    borders: &[Border],
    num_fmts: &HashMap<u32, String>,
) -> ResolvedXf {
    let mut css = CssStyle::new();
    let mut resolved = ResolvedXf {
        locked: true,
        ..Default::default()
    };

    let font_id: usize = xf.attr("fontId").and_then(|v| v.parse().ok()).unwrap_or(0);
    if let Some(font) = fonts.get(font_id) {
        if let Some(size) = font.size {
            css.set("font-size", &format!("{}px", (size * 4.0 / 3.0).round()));
        }
        if let Some(name) = &font.name {
            css.set("font-family", name);
        }
        if font.bold {
            css.set("font-weight", "bold");
        }
        if font.italic {
            css.set("font-style", "italic");
        }
        if font.strike {
            css.set("text-decoration", "line-through");
        } else if font.underline {
            css.set("text-decoration", "underline");
        }
        if let Some(color) = &font.color {
            css.set("color", color);
        }
    }

    let fill_id: usize = xf.attr("fillId").and_then(|v| v.parse().ok()).unwrap_or(0);
    if let Some(Some(color)) = fills.get(fill_id) {
        css.set("background-color", color);
    }

    let border_id: usize = xf
        .attr("borderId")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    if let Some(border) = borders.get(border_id) {
        for (prop, edge) in [
            ("border-left", &border.left),
            ("border-right", &border.right),
            ("border-top", &border.top),
            ("border-bottom", &border.bottom),
        ] {
            if let Some(edge) = edge {
                css.set(prop, edge);
            }
        }
    }

    if let Some(alignment) = xf.child("alignment") {
        resolved.align = match alignment.attr("horizontal") {
            Some("left") => Some(HorizontalAlignment::Left),
            Some("center") | Some("centerContinuous") => Some(HorizontalAlignment::Center),
            Some("right") => Some(HorizontalAlignment::Right),
            Some("fill") => Some(HorizontalAlignment::Fill),
            Some("justify") | Some("distributed") => Some(HorizontalAlignment::Justify),
            _ => None,
        };
        if let Some(a) = resolved.align {
            css.set("text-align", a.as_css());
        }
        match alignment.attr("vertical") {
            Some("top") => {
                css.set("vertical-align", "top");
            }
            Some("center") => {
                css.set("vertical-align", "middle");
            }
            _ => {}
        }
        if alignment.attr("wrapText") == Some("1") || alignment.attr("wrapText") == Some("true") {
            resolved.wrap = true;
        }
    }

    if let Some(protection) = xf.child("protection") {
        if protection.attr("locked") == Some("0") || protection.attr("locked") == Some("false") {
            resolved.locked = false;
        }
    }

    let fmt_id: u32 = xf
        .attr("numFmtId")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    if fmt_id != 0 {
        resolved.format = num_fmts
            .get(&fmt_id)
            .cloned()
            .or_else(|| builtin_format(fmt_id).map(str::to_string));
    }

    resolved.css = css.to_css();
    resolved
}

fn parse_font(font: &XmlNode) -> Font {
    Font {
        size: font
            .child("sz")
            .and_then(|n| n.attr("val"))
            .and_then(|v| v.parse().ok()),
        name: font
            .child("name")
            .and_then(|n| n.attr("val"))
            .map(str::to_string),
        bold: flag_element(font, "b"),
        italic: flag_element(font, "i"),
        strike: flag_element(font, "strike"),
        underline: flag_element(font, "u"),
        color: font.child("color").and_then(argb_to_hex),
    }
}

/// Presence of `<b/>` (or `val != 0`) means the flag is on.
fn flag_element(parent: &XmlNode, name: &str) -> bool {
    match parent.child(name) {
        Some(el) => !matches!(el.attr("val"), Some("0") | Some("false")),
        None => false,
    }
}

/// Solid pattern fills resolve to their foreground colour.
fn parse_fill(fill: &XmlNode) -> Option<String> {
    let pattern = fill.child("patternFill")?;
    if pattern.attr("patternType") != Some("solid") {
        return None;
    }
    pattern.child("fgColor").and_then(argb_to_hex)
}

fn parse_border(border: &XmlNode) -> Border {
    let edge = |name: &str| -> Option<String> {
        let el = border.child(name)?;
        let style = el.attr("style")?;
        let (width, line) = match style {
            "thin" | "hair" => ("1px", "solid"),
            "medium" => ("2px", "solid"),
            "thick" => ("3px", "solid"),
            "double" => ("3px", "double"),
            "dashed" | "mediumDashed" | "slantDashDot" => ("1px", "dashed"),
            "dotted" | "dashDot" | "dashDotDot" | "mediumDashDot" | "mediumDashDotDot" => {
                ("1px", "dotted")
            }
            _ => ("1px", "solid"),
        };
        let color = el
            .child("color")
            .and_then(argb_to_hex)
            .unwrap_or_else(|| "#000000".to_string());
        Some(format!("{width} {line} {color}"))
    };

    Border {
        left: edge("left"),
        right: edge("right"),
        top: edge("top"),
        bottom: edge("bottom"),
    }
}

/// Differential format (`dxf`) → CSS-like map for conditional formats.
fn parse_dxf(dxf: &XmlNode) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    if let Some(font) = dxf.child("font") {
        if flag_element(font, "b") {
            map.insert("font-weight".into(), "bold".into());
        }
        if flag_element(font, "i") {
            map.insert("font-style".into(), "italic".into());
        }
        if let Some(color) = font.child("color").and_then(argb_to_hex) {
            map.insert("color".into(), color);
        }
    }
    if let Some(fill) = dxf.child("fill") {
        // dxf fills use bgColor for the solid colour
        let color = fill
            .child("patternFill")
            .and_then(|p| p.child("bgColor").or_else(|| p.child("fgColor")))
            .and_then(argb_to_hex);
        if let Some(color) = color {
            map.insert("background-color".into(), color);
        }
    }

    map
}

/// `FFRRGGBB` (or `RRGGBB`) rgb attribute → `#RRGGBB`. Theme and indexed
/// colours are not resolved.
fn argb_to_hex(color: &XmlNode) -> Option<String> {
    let rgb = color.attr("rgb")?;
    let hex = if rgb.len() == 8 { &rgb[2..] } else { rgb };
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_ascii_uppercase()))
    } else {
        None
    }
}
