// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Legends: one swatch and label per item, stacked or in a single row.
//!
//! A [`Legend`] is arranged at an origin into a [`PlacedLegend`], which owns the item
//! rectangles. The placed legend produces marks and answers hit tests, so pointer input over
//! an item can be routed back to the chart row it stands for.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use lune_core::{Mark, MarkId, MarkPayload, PathMark, TextAnchor, TextBaseline, TextMark};
use peniko::color::palette::css;
use peniko::{Brush, Color};

use crate::measure::TextMeasurer;
use crate::symbol::Symbol;
use crate::z_order;

/// Offset between a legend's swatch ids and label ids.
pub const LEGEND_LABEL_ID_OFFSET: u64 = 1000;

/// One legend entry.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendItem {
    /// Text next to the swatch.
    pub label: String,
    /// Swatch paint.
    pub fill: Brush,
    /// Swatch shape.
    pub symbol: Symbol,
    /// Chart row the item stands for, if any.
    pub index: Option<usize>,
}

impl LegendItem {
    /// A square swatch of a single color, not tied to a row.
    pub fn solid(label: impl Into<String>, color: Color) -> Self {
        Self {
            label: label.into(),
            fill: Brush::Solid(color),
            symbol: Symbol::Square,
            index: None,
        }
    }

    /// Sets the swatch shape.
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = symbol;
        self
    }

    /// Ties the item to a chart row.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Direction items are laid out in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegendLayout {
    /// One item per line.
    #[default]
    Vertical,
    /// All items on one line.
    Horizontal,
}

/// An unplaced legend.
#[derive(Clone, Debug)]
pub struct Legend {
    id_base: u64,
    items: Vec<LegendItem>,
    layout: LegendLayout,
    swatch_size: f64,
    label_gap: f64,
    item_spacing: f64,
    font_size: f64,
    text_fill: Brush,
}

impl Legend {
    /// A vertical legend over `items`. Swatch ids start at `id_base`.
    pub fn new(id_base: u64, items: Vec<LegendItem>) -> Self {
        Self {
            id_base,
            items,
            layout: LegendLayout::Vertical,
            swatch_size: 10.0,
            label_gap: 6.0,
            item_spacing: 6.0,
            font_size: 10.0,
            text_fill: css::BLACK.into(),
        }
    }

    /// Sets the layout direction.
    pub fn with_layout(mut self, layout: LegendLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the swatch size.
    pub fn with_swatch_size(mut self, swatch_size: f64) -> Self {
        self.swatch_size = swatch_size.max(0.0);
        self
    }

    /// Sets the gap between consecutive items.
    pub fn with_item_spacing(mut self, item_spacing: f64) -> Self {
        self.item_spacing = item_spacing.max(0.0);
        self
    }

    /// Sets the label font size.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the label paint.
    pub fn with_text_fill(mut self, text_fill: impl Into<Brush>) -> Self {
        self.text_fill = text_fill.into();
        self
    }

    /// Items in display order.
    pub fn items(&self) -> &[LegendItem] {
        &self.items
    }

    /// Size the legend takes once arranged.
    pub fn measure(&self, measurer: &impl TextMeasurer) -> Size {
        self.arrange(Point::ZERO, measurer).bounds().size()
    }

    /// Places the legend with its top-left corner at `origin`.
    pub fn arrange(&self, origin: Point, measurer: &impl TextMeasurer) -> PlacedLegend {
        let line_height = self.swatch_size.max(self.font_size);
        let mut cursor = origin;
        let mut entries = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let text = measurer.measure(&item.label, self.font_size);
            let width = self.swatch_size + self.label_gap + text.width;
            let height = line_height.max(text.height);
            let swatch_y = cursor.y + (height - self.swatch_size) * 0.5;
            entries.push(PlacedItem {
                item: item.clone(),
                area: Rect::new(cursor.x, cursor.y, cursor.x + width, cursor.y + height),
                swatch: Rect::new(
                    cursor.x,
                    swatch_y,
                    cursor.x + self.swatch_size,
                    swatch_y + self.swatch_size,
                ),
                label: Point::new(
                    cursor.x + self.swatch_size + self.label_gap,
                    cursor.y + height * 0.5,
                ),
            });
            match self.layout {
                LegendLayout::Vertical => cursor.y += height + self.item_spacing,
                LegendLayout::Horizontal => cursor.x += width + self.item_spacing,
            }
        }
        let bounds = entries
            .iter()
            .map(|e| e.area)
            .reduce(|a, b| a.union(b))
            .unwrap_or_else(|| Rect::from_origin_size(origin, Size::ZERO));
        PlacedLegend {
            id_base: self.id_base,
            font_size: self.font_size,
            text_fill: self.text_fill.clone(),
            entries,
            bounds,
        }
    }
}

#[derive(Clone, Debug)]
struct PlacedItem {
    item: LegendItem,
    area: Rect,
    swatch: Rect,
    label: Point,
}

/// A legend placed at a fixed position.
#[derive(Clone, Debug)]
pub struct PlacedLegend {
    id_base: u64,
    font_size: f64,
    text_fill: Brush,
    entries: Vec<PlacedItem>,
    bounds: Rect,
}

impl PlacedLegend {
    /// Union of all item areas.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The item under `pos`, if any.
    pub fn item_at(&self, pos: Point) -> Option<&LegendItem> {
        self.entries
            .iter()
            .find(|e| e.area.contains(pos))
            .map(|e| &e.item)
    }

    /// Swatch and label marks. Swatch `i` has id `id_base + i`; its label is offset by
    /// [`LEGEND_LABEL_ID_OFFSET`].
    pub fn marks(&self) -> Vec<Mark> {
        let mut out = Vec::with_capacity(self.entries.len() * 2);
        for (offset, entry) in (0_u64..).zip(&self.entries) {
            let centre = entry.swatch.center();
            let size = entry.swatch.width();
            let swatch = MarkPayload::Path(PathMark {
                path: entry.item.symbol.path(centre.x, centre.y, size),
                fill: entry.item.fill.clone(),
                stroke: Brush::Solid(Color::TRANSPARENT),
                stroke_width: 0.0,
            });
            out.push(
                Mark::new(MarkId::from_raw(self.id_base + offset), swatch)
                    .with_z_index(z_order::LEGEND_SWATCHES),
            );
            let label = MarkPayload::Text(TextMark {
                pos: entry.label,
                text: entry.item.label.clone(),
                font_size: self.font_size,
                angle: 0.0,
                anchor: TextAnchor::Start,
                baseline: TextBaseline::Middle,
                fill: self.text_fill.clone(),
            });
            out.push(
                Mark::new(
                    MarkId::from_raw(self.id_base + LEGEND_LABEL_ID_OFFSET + offset),
                    label,
                )
                .with_z_index(z_order::LEGEND_LABELS),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;
    use crate::measure::HeuristicTextMeasurer;

    fn items() -> Vec<LegendItem> {
        vec![
            LegendItem::solid("A", css::RED).with_index(0),
            LegendItem::solid("BBBB", css::GREEN)
                .with_symbol(Symbol::Circle)
                .with_index(1),
            LegendItem::solid("CC", css::BLUE).with_index(2),
        ]
    }

    #[test]
    fn layout_direction_changes_the_shape() {
        let measurer = HeuristicTextMeasurer::default();
        let tall = Legend::new(1, items()).measure(&measurer);
        let wide = Legend::new(1, items())
            .with_layout(LegendLayout::Horizontal)
            .measure(&measurer);
        assert!(wide.width > tall.width, "{tall:?} {wide:?}");
        assert!(wide.height < tall.height, "{tall:?} {wide:?}");
    }

    #[test]
    fn marks_have_stable_ids() {
        let measurer = HeuristicTextMeasurer::default();
        let placed = Legend::new(500, items()).arrange(Point::new(10.0, 20.0), &measurer);
        let marks = placed.marks();
        assert_eq!(marks.len(), 6, "swatch and label per item");
        assert_eq!(marks[0].id, MarkId(500));
        assert_eq!(marks[1].id, MarkId(1500));
        assert_eq!(marks[4].id, MarkId(502));
        assert_eq!(marks[0].z_index, z_order::LEGEND_SWATCHES);
        assert_eq!(marks[1].z_index, z_order::LEGEND_LABELS);

        let b = placed.bounds();
        assert_eq!((b.x0, b.y0), (10.0, 20.0));
    }

    #[test]
    fn hit_test_finds_the_item_row() {
        let legend = Legend::new(0, items())
            .with_font_size(10.0)
            .with_item_spacing(4.0);
        let placed = legend.arrange(Point::ZERO, &HeuristicTextMeasurer::default());
        // Lines are 10 tall with 4 between them: the second item spans y 14..24.
        let hit = placed.item_at(Point::new(3.0, 18.0));
        assert_eq!(hit.and_then(|item| item.index), Some(1));
        assert!(placed.item_at(Point::new(3.0, 12.0)).is_none(), "gap between items");
        assert!(placed.item_at(Point::new(200.0, 5.0)).is_none(), "right of the labels");
    }

    #[test]
    fn empty_legend_has_empty_bounds() {
        let measurer = HeuristicTextMeasurer::default();
        let placed = Legend::new(0, Vec::new()).arrange(Point::new(5.0, 6.0), &measurer);
        assert_eq!(placed.bounds(), Rect::new(5.0, 6.0, 5.0, 6.0));
        assert!(placed.marks().is_empty());
    }
}
