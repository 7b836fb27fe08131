//! Embedded media: images, shapes, and chart descriptors.
//!
//! Geometry fidelity is not a goal; anchors are either a cell address or
//! a raw pixel box, whichever the source format provides more directly.

/// Where a media object is pinned on the sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum MediaAnchor {
    /// Anchored at a cell (A1 address)
    Cell(String),
    /// Anchored by an absolute pixel box
    PixelBox { x: f64, y: f64, width: f64, height: f64 },
}

impl Default for MediaAnchor {
    fn default() -> Self {
        MediaAnchor::Cell("A1".to_string())
    }
}

/// A media object attached to a worksheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "kind"))]
pub enum Media {
    /// An embedded or linked image
    Image {
        /// Archive-internal path or external URL
        href: String,
        /// Raw image bytes when embedded
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        data: Option<Vec<u8>>,
        anchor: MediaAnchor,
    },
    /// A drawn shape
    Shape {
        /// Preset geometry name (`rect`, `ellipse`, ...)
        shape_kind: String,
        /// Text inside the shape, if any
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        text: Option<String>,
        /// Fill colour (`#RRGGBB`)
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        fill: Option<String>,
        /// Outline colour (`#RRGGBB`)
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        outline: Option<String>,
        anchor: MediaAnchor,
    },
    /// A chart descriptor (type and source ranges only)
    Chart {
        /// Chart type (`bar`, `line`, `pie`, ...)
        chart_type: String,
        /// Per-series value ranges
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
        series: Vec<String>,
        /// Categories range
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        categories: Option<String>,
        /// Chart title
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        title: Option<String>,
        anchor: MediaAnchor,
    },
}
