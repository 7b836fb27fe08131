//! Shallow drawing-part traversal: images, shapes, and chart descriptors.
//!
//! Geometry is reduced to an anchor (cell or pixel box); chart parts are
//! read only for their type, title, and series/categories ranges.

use gridbook_core::{cell_name, Media, MediaAnchor, Worksheet};
use gridbook_markup::XmlNode;
use std::collections::HashMap;
use std::io::Cursor;

use crate::error::XlsxResult;
use crate::reader::{member_bytes, parse_member, parse_rels, parent_dir, rels_path_for, resolve_path};

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

/// EMUs per pixel at 96 DPI.
const EMU_PER_PX: f64 = 9525.0;

/// Read one drawing part into the worksheet's media list.
pub fn read_drawing(archive: &mut Archive<'_>, path: &str, ws: &mut Worksheet) -> XlsxResult<()> {
    let Some(root) = parse_member(archive, path)? else {
        return Ok(());
    };
    let rels = match parse_member(archive, &rels_path_for(path))? {
        Some(r) => parse_rels(&r),
        None => HashMap::new(),
    };
    let base = parent_dir(path).to_string();

    for anchor_node in root.children.iter().filter(|n| {
        n.is("twoCellAnchor") || n.is("oneCellAnchor") || n.is("absoluteAnchor")
    }) {
        let anchor = read_anchor(anchor_node);

        for pic in anchor_node.find_all("pic") {
            if let Some(media) = read_picture(archive, pic, &rels, &base, anchor.clone())? {
                ws.media.push(media);
            }
        }
        for sp in anchor_node.find_all("sp") {
            ws.media.push(read_shape(sp, anchor.clone()));
        }
        for frame in anchor_node.find_all("graphicFrame") {
            if let Some(media) = read_chart_frame(archive, frame, &rels, &base, anchor.clone())? {
                ws.media.push(media);
            }
        }
    }

    Ok(())
}

fn read_anchor(node: &XmlNode) -> MediaAnchor {
    if let Some(from) = node.child("from") {
        let col = from
            .child("col")
            .and_then(|n| n.text.trim().parse().ok())
            .unwrap_or(0);
        let row = from
            .child("row")
            .and_then(|n| n.text.trim().parse().ok())
            .unwrap_or(0);
        return MediaAnchor::Cell(cell_name(col, row));
    }
    if let Some(pos) = node.child("pos") {
        let emu = |attr: &str| -> f64 {
            pos.attr(attr)
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let ext = node.child("ext");
        let dim = |attr: &str| -> f64 {
            ext.and_then(|e| e.attr(attr))
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        return MediaAnchor::PixelBox {
            x: (emu("x") / EMU_PER_PX).round(),
            y: (emu("y") / EMU_PER_PX).round(),
            width: (dim("cx") / EMU_PER_PX).round(),
            height: (dim("cy") / EMU_PER_PX).round(),
        };
    }
    MediaAnchor::default()
}

fn read_picture(
    archive: &mut Archive<'_>,
    pic: &XmlNode,
    rels: &HashMap<String, String>,
    base: &str,
    anchor: MediaAnchor,
) -> XlsxResult<Option<Media>> {
    let Some(embed) = pic
        .find_all("blip")
        .first()
        .and_then(|blip| blip.attr("embed"))
    else {
        return Ok(None);
    };
    let Some(target) = rels.get(embed) else {
        return Ok(None);
    };
    let media_path = resolve_path(base, target);
    let data = member_bytes(archive, &media_path)?;

    Ok(Some(Media::Image {
        href: media_path,
        data,
        anchor,
    }))
}

fn read_shape(sp: &XmlNode, anchor: MediaAnchor) -> Media {
    let kind = sp
        .find_all("prstGeom")
        .first()
        .and_then(|g| g.attr("prst"))
        .unwrap_or("rect")
        .to_string();

    let text: String = sp
        .find_all("t")
        .iter()
        .map(|t| t.text_content())
        .collect::<Vec<_>>()
        .join("");

    let fill = sp
        .find_all("solidFill")
        .first()
        .and_then(|f| f.find_all("srgbClr").first().and_then(|c| c.attr("val")))
        .map(|v| format!("#{v}"));

    Media::Shape {
        shape_kind: kind,
        text: if text.is_empty() { None } else { Some(text) },
        fill,
        outline: None,
        anchor,
    }
}

fn read_chart_frame(
    archive: &mut Archive<'_>,
    frame: &XmlNode,
    rels: &HashMap<String, String>,
    base: &str,
    anchor: MediaAnchor,
) -> XlsxResult<Option<Media>> {
    let Some(rid) = frame.find_all("chart").first().and_then(|c| c.attr("id")) else {
        return Ok(None);
    };
    let Some(target) = rels.get(rid) else {
        return Ok(None);
    };
    let chart_path = resolve_path(base, target);
    let Some(chart) = parse_member(archive, &chart_path)? else {
        return Ok(None);
    };

    let chart_type = chart
        .find_all("plotArea")
        .first()
        .and_then(|pa| {
            pa.children
                .iter()
                .find(|c| gridbook_markup::local_name(&c.name).ends_with("Chart"))
        })
        .map(|c| {
            gridbook_markup::local_name(&c.name)
                .trim_end_matches("Chart")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string());

    let title = chart.find_all("title").first().map(|t| {
        t.find_all("t")
            .iter()
            .map(|n| n.text_content())
            .collect::<String>()
    });
    let title = title.filter(|t| !t.is_empty());

    let mut series = Vec::new();
    let mut categories = None;
    for ser in chart.find_all("ser") {
        if let Some(val_ref) = ser
            .child("val")
            .and_then(|v| v.child("numRef"))
            .and_then(|r| r.child("f"))
        {
            series.push(val_ref.text_content());
        }
        if categories.is_none() {
            categories = ser
                .child("cat")
                .and_then(|c| c.child("strRef").or_else(|| c.child("numRef")))
                .and_then(|r| r.child("f"))
                .map(|f| f.text_content());
        }
    }

    Ok(Some(Media::Chart {
        chart_type,
        series,
        categories,
        title,
        anchor,
    }))
}
