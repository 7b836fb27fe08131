//! BIFF8 style record parsing.
//!
//! FONT, FORMAT, XF, and PALETTE records from the workbook globals stream
//! are collected into a [`StyleContext`] and resolved into per-XF style
//! strings plus the structured cell-metadata bits (number format mask,
//! alignment, wrap, lock) that cells pick up by XF index.

use std::collections::HashMap;

use gridbook_core::{rgb_to_hex, CssStyle, HorizontalAlignment};

use crate::biff::bytes::{read_u16, read_u32};
use crate::biff::strings::{read_short_string, read_unicode_string};
use crate::error::{XlsError, XlsResult};

// ============================================================================
// Default BIFF8 color palette (56 entries, indices 8-63)
// ============================================================================

/// The standard BIFF8 colour palette. Workbook colour indices 8-63 map to
/// entries 0-55; a PALETTE record can override individual entries.
pub(crate) const DEFAULT_PALETTE: [(u8, u8, u8); 56] = [
    (0, 0, 0),       //  8: Black
    (255, 255, 255), //  9: White
    (255, 0, 0),     // 10: Red
    (0, 255, 0),     // 11: Bright Green
    (0, 0, 255),     // 12: Blue
    (255, 255, 0),   // 13: Yellow
    (255, 0, 255),   // 14: Pink
    (0, 255, 255),   // 15: Turquoise
    (128, 0, 0),     // 16: Dark Red
    (0, 128, 0),     // 17: Green
    (0, 0, 128),     // 18: Dark Blue
    (128, 128, 0),   // 19: Dark Yellow
    (128, 0, 128),   // 20: Violet
    (0, 128, 128),   // 21: Teal
    (192, 192, 192), // 22: Silver
    (128, 128, 128), // 23: Gray
    (153, 153, 255), // 24: Periwinkle
    (153, 51, 102),  // 25: Plum
    (255, 255, 204), // 26: Ivory
    (204, 255, 255), // 27: Light Turquoise
    (102, 0, 102),   // 28: Dark Purple
    (255, 128, 128), // 29: Coral
    (0, 102, 204),   // 30: Ocean Blue
    (204, 204, 255), // 31: Ice Blue
    (0, 0, 128),     // 32: Dark Blue (dup)
    (255, 0, 255),   // 33: Pink (dup)
    (255, 255, 0),   // 34: Yellow (dup)
    (0, 255, 255),   // 35: Turquoise (dup)
    (128, 0, 128),   // 36: Violet (dup)
    (128, 0, 0),     // 37: Dark Red (dup)
    (0, 128, 128),   // 38: Teal (dup)
    (0, 0, 255),     // 39: Blue (dup)
    (0, 204, 255),   // 40: Sky Blue
    (204, 255, 255), // 41: Light Turquoise (dup)
    (204, 255, 204), // 42: Light Green
    (255, 255, 153), // 43: Light Yellow
    (153, 204, 255), // 44: Pale Blue
    (255, 153, 204), // 45: Rose
    (204, 153, 255), // 46: Lavender
    (255, 204, 153), // 47: Tan
    (51, 102, 255),  // 48: Light Blue
    (51, 204, 204),  // 49: Aqua
    (153, 204, 0),   // 50: Lime
    (255, 204, 0),   // 51: Gold
    (255, 153, 0),   // 52: Light Orange
    (255, 102, 0),   // 53: Orange
    (102, 102, 153), // 54: Blue-Gray
    (150, 150, 150), // 55: 40% Gray
    (0, 51, 102),    // 56: Dark Teal
    (51, 153, 102),  // 57: Sea Green
    (0, 51, 0),      // 58: Dark Green
    (51, 51, 0),     // 59: Olive Green
    (153, 51, 0),    // 60: Brown
    (153, 51, 51),   // 61: Dark Rose
    (51, 51, 153),   // 62: Indigo
    (51, 51, 51),    // 63: 80% Gray
];

/// Canonical format codes for the well-known built-in number format
/// indices (0-49). Indices 23-36 are locale-reserved and absent.
pub(crate) fn builtin_format_code(id: u16) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "$#,##0_);($#,##0)",
        6 => "$#,##0_);[Red]($#,##0)",
        7 => "$#,##0.00_);($#,##0.00)",
        8 => "$#,##0.00_);[Red]($#,##0.00)",
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
        41 => "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)",
        42 => "_($* #,##0_);_($* (#,##0);_($* \"-\"_);_(@_)",
        43 => "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)",
        44 => "_($* #,##0.00_);_($* (#,##0.00);_($* \"-\"??_);_(@_)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

// ============================================================================
// Intermediate BIFF types
// ============================================================================

/// Parsed FONT record data.
///
/// The weight field is deliberately not read: BIFF-emitted weights are
/// unreliable in the wild, so bold never originates here.
#[derive(Debug, Clone)]
pub(crate) struct BiffFont {
    /// Font height in twips (1/20 of a point)
    pub height_twips: u16,
    pub italic: bool,
    pub strikeout: bool,
    /// Palette colour index
    pub color_index: u16,
    pub name: String,
}

/// Parsed XF record data (20 bytes in BIFF8).
#[derive(Debug, Clone, Default)]
pub(crate) struct BiffXf {
    pub font_index: u16,
    pub format_index: u16,
    pub locked: bool,
    // Alignment
    pub hor_align: u8,
    pub vert_align: u8,
    pub wrap_text: bool,
    // Borders: line style codes in 4-bit nibbles
    pub border_left: u8,
    pub border_right: u8,
    pub border_top: u8,
    pub border_bottom: u8,
    // Border colour indices
    pub icv_left: u16,
    pub icv_right: u16,
    pub icv_top: u16,
    pub icv_bottom: u16,
    // Fill
    pub fill_pattern: u8,
    pub icv_fore: u16,
    pub icv_back: u16,
}

/// One XF resolved for cell consumption.
#[derive(Debug, Clone, Default)]
pub struct ResolvedXf {
    /// CSS style string ("" when the XF adds nothing visual)
    pub css: String,
    /// Number format mask
    pub format: Option<String>,
    /// Horizontal alignment for the metadata map
    pub align: Option<HorizontalAlignment>,
    /// Wrap flag
    pub wrap: bool,
    /// Lock flag
    pub locked: bool,
}

/// All style state collected from the workbook globals stream.
pub(crate) struct StyleContext {
    pub fonts: Vec<BiffFont>,
    pub formats: HashMap<u16, String>,
    pub xfs: Vec<BiffXf>,
    pub palette: [(u8, u8, u8); 56],
}

impl StyleContext {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            formats: HashMap::new(),
            xfs: Vec::new(),
            palette: DEFAULT_PALETTE,
        }
    }

    /// Resolve every XF into its cell-facing form.
    pub fn build_style_table(&self) -> Vec<ResolvedXf> {
        self.xfs.iter().map(|xf| self.resolve_xf(xf)).collect()
    }

    fn resolve_xf(&self, xf: &BiffXf) -> ResolvedXf {
        let mut css = CssStyle::new();

        // Font
        if let Some(font) = self.font_for(xf.font_index) {
            if font.height_twips > 0 {
                let px = (font.height_twips as f64 / 20.0 * 4.0 / 3.0).round();
                css.set("font-size", &format!("{px}px"));
            }
            if !font.name.is_empty() {
                css.set("font-family", &font.name);
            }
            if font.italic {
                css.set("font-style", "italic");
            }
            if font.strikeout {
                css.set("text-decoration", "line-through");
            }
            if let Some(color) = self.resolve_color(font.color_index) {
                css.set("color", &color);
            }
        }

        // Fill: solid pattern paints the foreground colour, other
        // patterns approximate with the pattern background.
        if xf.fill_pattern == 1 {
            if let Some(color) = self.resolve_color(xf.icv_fore) {
                css.set("background-color", &color);
            }
        } else if xf.fill_pattern > 1 {
            if let Some(color) = self.resolve_color(xf.icv_back) {
                css.set("background-color", &color);
            }
        }

        // Alignment
        let align = match xf.hor_align {
            1 => Some(HorizontalAlignment::Left),
            2 | 6 => Some(HorizontalAlignment::Center),
            3 => Some(HorizontalAlignment::Right),
            4 => Some(HorizontalAlignment::Fill),
            5 | 7 => Some(HorizontalAlignment::Justify),
            _ => None,
        };
        if let Some(a) = align {
            css.set("text-align", a.as_css());
        }
        match xf.vert_align {
            0 => {
                css.set("vertical-align", "top");
            }
            1 => {
                css.set("vertical-align", "middle");
            }
            _ => {}
        }

        // Borders
        for (prop, code, icv) in [
            ("border-left", xf.border_left, xf.icv_left),
            ("border-right", xf.border_right, xf.icv_right),
            ("border-top", xf.border_top, xf.icv_top),
            ("border-bottom", xf.border_bottom, xf.icv_bottom),
        ] {
            if let Some(line) = border_css(code) {
                let color = self
                    .resolve_color(icv)
                    .unwrap_or_else(|| "#000000".to_string());
                css.set(prop, &format!("{line} {color}"));
            }
        }

        let format = if xf.format_index == 0 {
            None
        } else if let Some(code) = self.formats.get(&xf.format_index) {
            Some(code.clone())
        } else {
            builtin_format_code(xf.format_index).map(str::to_string)
        };

        ResolvedXf {
            css: css.to_css(),
            format,
            align,
            wrap: xf.wrap_text,
            locked: xf.locked,
        }
    }

    fn font_for(&self, font_index: u16) -> Option<&BiffFont> {
        // BIFF8 quirk: font index 4 does not exist in the file; indices
        // above it are shifted down by one.
        let actual = if font_index >= 5 {
            (font_index - 1) as usize
        } else {
            font_index as usize
        };
        self.fonts.get(actual)
    }

    /// Resolve a colour index to `#RRGGBB`; indices at or above 64 are
    /// "automatic" and yield no colour.
    pub(crate) fn resolve_color(&self, icv: u16) -> Option<String> {
        match icv {
            8..=63 => {
                let (r, g, b) = self.palette[(icv - 8) as usize];
                Some(rgb_to_hex(r, g, b))
            }
            // EGA indices 0-7 mirror palette entries 8-15
            0..=7 => {
                let (r, g, b) = self.palette[icv as usize];
                Some(rgb_to_hex(r, g, b))
            }
            _ => None,
        }
    }
}

/// Map a BIFF border line code (0-13) to CSS width/style.
fn border_css(code: u8) -> Option<&'static str> {
    Some(match code {
        1 => "1px solid",
        2 => "2px solid",
        3 => "1px dashed",
        4 => "1px dotted",
        5 => "3px solid",
        6 => "3px double",
        7 => "1px dotted",
        8 => "2px dashed",
        9 => "1px dashed",
        10 => "2px dashed",
        11 => "1px dotted",
        12 => "2px dotted",
        13 => "2px dashed",
        _ => return None,
    })
}

// ============================================================================
// Record parsers
// ============================================================================

/// Parse a FONT record (0x0031).
///
/// Layout:
///   0  u16  dyHeight   - font height in twips
///   2  u16  grbit      - bit 1 = italic, bit 3 = strikeout
///   4  u16  icv        - colour index
///   6  u16  bls        - weight (not consulted)
///   8  u16  sss        - super/subscript
///  10  u8   uls        - underline type
///  11  u8   bFamily
///  12  u8   bCharSet
///  13  u8   reserved
///  14  ...  font name  - short string
pub(crate) fn parse_font(data: &[u8]) -> XlsResult<BiffFont> {
    if data.len() < 15 {
        return Err(XlsError::Parse("FONT record too short".into()));
    }

    let mut off = 0;
    let height = read_u16(data, &mut off)?;
    let grbit = read_u16(data, &mut off)?;
    let icv = read_u16(data, &mut off)?;
    let _bls = read_u16(data, &mut off)?;
    let _sss = read_u16(data, &mut off)?;
    off += 4; // uls, bFamily, bCharSet, reserved

    let name = if off < data.len() {
        read_short_string(data, &mut off).unwrap_or_default()
    } else {
        String::new()
    };

    Ok(BiffFont {
        height_twips: height,
        italic: (grbit & 0x0002) != 0,
        strikeout: (grbit & 0x0008) != 0,
        color_index: icv,
        name,
    })
}

/// Parse a FORMAT record (0x041E): format index + code string.
pub(crate) fn parse_format(data: &[u8]) -> XlsResult<(u16, String)> {
    let mut off = 0;
    let ifmt = read_u16(data, &mut off)?;
    let code = read_unicode_string(data, &mut off)?;
    Ok((ifmt, code))
}

/// Parse an XF record (0x00E0, 20 bytes in BIFF8).
///
/// Layout:
///   0   u16  ifnt          - font index
///   2   u16  ifmt          - format index
///   4   u16  type/protect  - bit 0 locked, bit 2 style XF
///   6   u8   alignment1    - bits 0-2 halign, bit 3 wrap, bits 4-6 valign
///   7   u8   trot          - rotation (ignored)
///   8   u8   alignment2    - indent/shrink/reading order (ignored)
///   9   u8   used attributes (ignored)
///  10   u32  border line styles + left/right colours
///  14   u32  top/bottom/diag colours + fill pattern (bits 26-31)
///  18   u16  fill colours: foreground low 7 bits, background next 7
pub(crate) fn parse_xf(data: &[u8]) -> XlsResult<BiffXf> {
    if data.len() < 20 {
        return Err(XlsError::Parse(format!(
            "XF record too short: {} bytes (expected 20)",
            data.len()
        )));
    }

    let mut off = 0;
    let ifnt = read_u16(data, &mut off)?;
    let ifmt = read_u16(data, &mut off)?;
    let type_prot = read_u16(data, &mut off)?;

    let align1 = data[off];
    off += 3; // rotation + alignment2
    let _used = data[off];
    off += 1;

    let border1 = read_u32(data, &mut off)?;
    let border2 = read_u32(data, &mut off)?;
    let fill_colors = read_u16(data, &mut off)?;

    Ok(BiffXf {
        font_index: ifnt,
        format_index: ifmt,
        locked: (type_prot & 0x0001) != 0,
        hor_align: align1 & 0x07,
        wrap_text: (align1 & 0x08) != 0,
        vert_align: (align1 >> 4) & 0x07,
        border_left: (border1 & 0x0F) as u8,
        border_right: ((border1 >> 4) & 0x0F) as u8,
        border_top: ((border1 >> 8) & 0x0F) as u8,
        border_bottom: ((border1 >> 12) & 0x0F) as u8,
        icv_left: ((border1 >> 16) & 0x7F) as u16,
        icv_right: ((border1 >> 23) & 0x7F) as u16,
        icv_top: (border2 & 0x7F) as u16,
        icv_bottom: ((border2 >> 7) & 0x7F) as u16,
        fill_pattern: ((border2 >> 26) & 0x3F) as u8,
        icv_fore: fill_colors & 0x7F,
        icv_back: (fill_colors >> 7) & 0x7F,
    })
}

/// Apply a PALETTE record (0x0092): colour count + 4-byte RGBx entries.
pub(crate) fn apply_palette(data: &[u8], palette: &mut [(u8, u8, u8); 56]) -> XlsResult<()> {
    let mut off = 0;
    let count = read_u16(data, &mut off)? as usize;

    for entry in palette.iter_mut().take(count.min(56)) {
        if off + 4 > data.len() {
            break;
        }
        *entry = (data[off], data[off + 1], data[off + 2]);
        off += 4;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font_record(height: u16, grbit: u16, icv: u16, name: &str) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&grbit.to_le_bytes());
        data.extend_from_slice(&icv.to_le_bytes());
        data.extend_from_slice(&400u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.push(name.len() as u8);
        data.push(0x00);
        data.extend_from_slice(name.as_bytes());
        data
    }

    #[test]
    fn test_parse_font_basic() {
        let font = parse_font(&font_record(220, 0, 0x7FFF, "Arial")).unwrap();
        assert_eq!(font.height_twips, 220);
        assert!(!font.italic);
        assert!(!font.strikeout);
        assert_eq!(font.color_index, 0x7FFF);
        assert_eq!(font.name, "Arial");
    }

    #[test]
    fn test_parse_font_flags() {
        let font = parse_font(&font_record(240, 0x000A, 10, "")).unwrap();
        assert!(font.italic);
        assert!(font.strikeout);
        assert_eq!(font.color_index, 10);
    }

    #[test]
    fn test_bold_weight_not_consulted() {
        // Weight 700 in the record, yet nothing in the resolved CSS says bold.
        let mut ctx = StyleContext::new();
        let mut rec = font_record(200, 0, 0x7FFF, "X");
        rec[6..8].copy_from_slice(&700u16.to_le_bytes());
        ctx.fonts.push(parse_font(&rec).unwrap());
        ctx.xfs.push(BiffXf::default());

        let resolved = &ctx.build_style_table()[0];
        assert!(!resolved.css.contains("bold"));
    }

    #[test]
    fn test_parse_xf_alignment_and_borders() {
        let mut data = [0u8; 20];
        // halign = center (2), wrap bit, valign = centre (1 << 4)
        data[6] = 0x02 | 0x08 | 0x10;
        // border1: left style 1, right style 2, left colour 8 (black)
        let border1: u32 = 1 | (2 << 4) | (8 << 16) | (8 << 23);
        data[10..14].copy_from_slice(&border1.to_le_bytes());
        // border2: top colour 8, bottom colour 8, fill pattern 1 (solid)
        let border2: u32 = 8 | (8 << 7) | (1 << 26);
        data[14..18].copy_from_slice(&border2.to_le_bytes());
        // fill: fore colour 10 (red)
        let fill: u16 = 10 | (9 << 7);
        data[18..20].copy_from_slice(&fill.to_le_bytes());

        let xf = parse_xf(&data).unwrap();
        assert_eq!(xf.hor_align, 2);
        assert!(xf.wrap_text);
        assert_eq!(xf.vert_align, 1);
        assert_eq!(xf.border_left, 1);
        assert_eq!(xf.border_right, 2);
        assert_eq!(xf.icv_left, 8);
        assert_eq!(xf.fill_pattern, 1);
        assert_eq!(xf.icv_fore, 10);
        assert_eq!(xf.icv_back, 9);
    }

    #[test]
    fn test_resolved_css() {
        let mut ctx = StyleContext::new();
        ctx.fonts.push(BiffFont {
            height_twips: 200, // 10pt -> 13px
            italic: true,
            strikeout: false,
            color_index: 10,
            name: "Arial".into(),
        });
        let mut xf = BiffXf {
            font_index: 0,
            hor_align: 3,
            fill_pattern: 1,
            icv_fore: 13, // yellow
            border_right: 1,
            icv_right: 8,
            ..Default::default()
        };
        xf.wrap_text = true;
        ctx.xfs.push(xf);

        let resolved = &ctx.build_style_table()[0];
        assert!(resolved.css.contains("font-size: 13px;"));
        assert!(resolved.css.contains("font-style: italic;"));
        assert!(resolved.css.contains("color: #FF0000;"));
        assert!(resolved.css.contains("background-color: #FFFF00;"));
        assert!(resolved.css.contains("text-align: right;"));
        assert!(resolved.css.contains("border-right: 1px solid #000000;"));
        assert!(resolved.wrap);
        assert_eq!(resolved.align, Some(HorizontalAlignment::Right));
    }

    #[test]
    fn test_resolve_color() {
        let ctx = StyleContext::new();
        assert_eq!(ctx.resolve_color(8).as_deref(), Some("#000000"));
        assert_eq!(ctx.resolve_color(10).as_deref(), Some("#FF0000"));
        assert_eq!(ctx.resolve_color(63).as_deref(), Some("#333333"));
        // Automatic indices carry no colour
        assert_eq!(ctx.resolve_color(64), None);
        assert_eq!(ctx.resolve_color(0x7FFF), None);
    }

    #[test]
    fn test_font_index_4_skipped() {
        let mut ctx = StyleContext::new();
        for i in 0..5u16 {
            ctx.fonts.push(BiffFont {
                height_twips: 200,
                italic: false,
                strikeout: false,
                color_index: 0x7FFF,
                name: format!("Font{i}"),
            });
        }
        assert_eq!(ctx.font_for(0).unwrap().name, "Font0");
        assert_eq!(ctx.font_for(3).unwrap().name, "Font3");
        assert_eq!(ctx.font_for(5).unwrap().name, "Font4");
        assert!(ctx.font_for(6).is_none());
    }

    #[test]
    fn test_number_format_resolution() {
        let mut ctx = StyleContext::new();
        ctx.formats.insert(164, "yyyy-mm-dd".into());
        ctx.xfs.push(BiffXf {
            format_index: 14,
            ..Default::default()
        });
        ctx.xfs.push(BiffXf {
            format_index: 164,
            ..Default::default()
        });
        ctx.xfs.push(BiffXf::default());

        let table = ctx.build_style_table();
        assert_eq!(table[0].format.as_deref(), Some("m/d/yy"));
        assert_eq!(table[1].format.as_deref(), Some("yyyy-mm-dd"));
        assert_eq!(table[2].format, None);
    }

    #[test]
    fn test_apply_palette() {
        let mut palette = DEFAULT_PALETTE;
        let mut data = Vec::new();
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0x00]);
        data.extend_from_slice(&[0x11, 0x22, 0x33, 0x00]);

        apply_palette(&data, &mut palette).unwrap();
        assert_eq!(palette[0], (0xAA, 0xBB, 0xCC));
        assert_eq!(palette[1], (0x11, 0x22, 0x33));
        assert_eq!(palette[2], DEFAULT_PALETTE[2]);
    }

    #[test]
    fn test_builtin_format_codes() {
        assert_eq!(builtin_format_code(0), Some("General"));
        assert_eq!(builtin_format_code(2), Some("0.00"));
        assert_eq!(builtin_format_code(9), Some("0%"));
        assert_eq!(builtin_format_code(14), Some("m/d/yy"));
        assert_eq!(builtin_format_code(49), Some("@"));
        assert_eq!(builtin_format_code(25), None);
        assert_eq!(builtin_format_code(50), None);
    }
}
