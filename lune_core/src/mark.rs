// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained marks: the drawable output of chart components.

extern crate alloc;

use alloc::string::String;

use kurbo::{BezPath, Point, Rect, Shape};
use peniko::Brush;

/// Stable identifier of a mark across draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId(pub u64);

impl MarkId {
    /// Wraps a raw id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Id of the mark for data row `row` within the group starting at `base`.
    pub const fn for_row(base: u64, row: usize) -> Self {
        Self(base + row as u64)
    }
}

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAnchor {
    /// Text starts at the anchor.
    Start,
    /// Text is centred on the anchor.
    #[default]
    Middle,
    /// Text ends at the anchor.
    End,
}

/// Vertical text baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    /// Anchor is on the vertical middle of the text.
    #[default]
    Middle,
    /// Anchor is on the alphabetic baseline.
    Alphabetic,
    /// Anchor is on the hanging baseline.
    Hanging,
    /// Anchor is on the ideographic baseline.
    Ideographic,
}

/// A filled rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct RectMark {
    /// Geometry.
    pub rect: Rect,
    /// Fill paint.
    pub fill: Brush,
}

/// A single line of unshaped text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextMark {
    /// Anchor position.
    pub pos: Point,
    /// Content.
    pub text: String,
    /// Font size.
    pub font_size: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Horizontal anchor.
    pub anchor: TextAnchor,
    /// Vertical baseline.
    pub baseline: TextBaseline,
    /// Fill paint.
    pub fill: Brush,
}

/// A filled and optionally stroked path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathMark {
    /// Geometry.
    pub path: BezPath,
    /// Fill paint.
    pub fill: Brush,
    /// Stroke paint.
    pub stroke: Brush,
    /// Stroke width; `0.0` means no stroke.
    pub stroke_width: f64,
}

/// What a mark draws.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkPayload {
    /// Rectangle.
    Rect(RectMark),
    /// Text.
    Text(TextMark),
    /// Path.
    Path(PathMark),
}

impl MarkPayload {
    /// Geometric bounds, if they can be known without text measurement.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(r.rect),
            Self::Text(_) => None,
            Self::Path(p) if p.path.elements().is_empty() => None,
            Self::Path(p) => Some(p.path.bounding_box().inflate(
                p.stroke_width / 2.0,
                p.stroke_width / 2.0,
            )),
        }
    }
}

/// One retained mark.
#[derive(Clone, Debug, PartialEq)]
pub struct Mark {
    /// Stable id.
    pub id: MarkId,
    /// Paint order; higher draws on top.
    pub z_index: i32,
    /// Content.
    pub payload: MarkPayload,
}

impl Mark {
    /// Creates a mark at z-index 0.
    pub fn new(id: MarkId, payload: MarkPayload) -> Self {
        Self {
            id,
            z_index: 0,
            payload,
        }
    }

    /// Sets the paint order.
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Circle;

    use super::*;

    #[test]
    fn path_bounds_include_stroke() {
        let payload = MarkPayload::Path(PathMark {
            path: Circle::new((0.0, 0.0), 10.0).to_path(0.1),
            fill: Brush::default(),
            stroke: Brush::default(),
            stroke_width: 2.0,
        });
        let b = payload.bounds().unwrap();
        assert!((b.x0 + 11.0).abs() < 1e-6 && (b.x1 - 11.0).abs() < 1e-6, "{b:?}");
    }

    #[test]
    fn row_ids_are_offsets() {
        assert_eq!(MarkId::for_row(1000, 3), MarkId::from_raw(1003));
    }
}
