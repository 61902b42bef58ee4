// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A draggable divider between two panes.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Point, Rect};
use lune_core::{
    Consistency, ConsistencyState, Cursor, CursorHost, Drawable, InteractionSession,
    Invalidatable, LayerId, Mark, MarkId, MarkPayload, RectMark, Signal, Visual,
};
use peniko::color::palette::css;
use peniko::{Brush, Color};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::z_order;

/// States a [`Splitter`] supports on top of the visual base.
pub const SPLITTER_STATES: ConsistencyState =
    ConsistencyState::POSITION.union(ConsistencyState::APPEARANCE);

const LINE_ID_OFFSET: u64 = 0;
const DRAG_AREA_ID_OFFSET: u64 = 1;
const PREVIEW_ID_OFFSET: u64 = 2;

/// Orientation of the divider line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitterLayout {
    /// A vertical line; panes sit left and right.
    #[default]
    Vertical,
    /// A horizontal line; panes sit above and below.
    Horizontal,
}

/// A divider whose position is a ratio of its bounds.
///
/// Pixel limits keep the divider away from either edge. Dragging goes through
/// [`Splitter::begin_drag`], which owns the cursor override for the duration of the drag.
#[derive(Debug)]
pub struct Splitter {
    visual: Visual,
    id_base: u64,
    layout: SplitterLayout,
    position: f64,
    thickness: f64,
    drag_area_length: f64,
    start_limit: f64,
    end_limit: f64,
    fill: Brush,
    drag_area_fill: Brush,
    drag_preview_fill: Brush,
    drag_preview: Option<f64>,
    marks: Vec<Mark>,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Splitter {
    /// Creates a vertical splitter in the middle of its bounds.
    pub fn new() -> Self {
        Self {
            visual: Visual::new(SPLITTER_STATES, Signal::NONE),
            id_base: 0,
            layout: SplitterLayout::Vertical,
            position: 0.5,
            thickness: 1.0,
            drag_area_length: 3.0,
            start_limit: 0.0,
            end_limit: 0.0,
            fill: Brush::Solid(Color::from_rgb8(0xca, 0xd7, 0xe0)),
            drag_area_fill: Brush::Solid(Color::TRANSPARENT),
            drag_preview_fill: Brush::Solid(css::BLACK.with_alpha(0.3)),
            drag_preview: None,
            marks: Vec::new(),
        }
    }

    /// Sets the base of generated mark ids.
    pub fn with_id_base(mut self, id_base: u64) -> Self {
        self.id_base = id_base;
        self
    }

    /// Sets the orientation.
    pub fn with_layout(mut self, layout: SplitterLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the target layer.
    pub fn with_container(mut self, container: LayerId) -> Self {
        self.visual.set_container(Some(container));
        self
    }

    /// Sets the pixel bounds.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.visual.set_bounds(bounds);
        self
    }

    /// Orientation.
    pub fn layout(&self) -> SplitterLayout {
        self.layout
    }

    /// Changes the orientation.
    pub fn set_layout(&mut self, layout: SplitterLayout) {
        if self.layout != layout {
            self.layout = layout;
            self.visual.invalidate(
                ConsistencyState::POSITION,
                Signal::BOUNDS_CHANGED | Signal::NEEDS_REDRAW,
            );
        }
    }

    /// Position as a ratio of the bounds along the split axis.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Moves the divider. The ratio is clamped to `[0, 1]` and to the pixel limits.
    pub fn set_position(&mut self, position: f64) {
        if position.is_nan() {
            return;
        }
        let position = self.clamp_position(position);
        if self.position != position {
            self.position = position;
            self.visual.invalidate(
                ConsistencyState::POSITION,
                Signal::BOUNDS_CHANGED | Signal::NEEDS_REDRAW,
            );
        }
    }

    /// Line thickness in pixels.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Changes the line thickness.
    pub fn set_thickness(&mut self, thickness: f64) {
        let thickness = thickness.max(0.0);
        if self.thickness != thickness {
            self.thickness = thickness;
            self.visual
                .invalidate(ConsistencyState::POSITION, Signal::NEEDS_REDRAW);
        }
    }

    /// Extra grab margin on each side of the line, in pixels.
    pub fn drag_area_length(&self) -> f64 {
        self.drag_area_length
    }

    /// Changes the grab margin.
    pub fn set_drag_area_length(&mut self, length: f64) {
        let length = length.max(0.0);
        if self.drag_area_length != length {
            self.drag_area_length = length;
            self.visual
                .invalidate(ConsistencyState::POSITION, Signal::NEEDS_REDRAW);
        }
    }

    /// Minimum size of the start and end panes, in pixels.
    pub fn limits(&self) -> (f64, f64) {
        (self.start_limit, self.end_limit)
    }

    /// Changes the minimum pane sizes and re-clamps the position.
    pub fn set_limits(&mut self, start: f64, end: f64) {
        self.start_limit = start.max(0.0);
        self.end_limit = end.max(0.0);
        self.set_position(self.position);
    }

    /// Line paint.
    pub fn fill(&self) -> &Brush {
        &self.fill
    }

    /// Changes the line paint.
    pub fn set_fill(&mut self, fill: impl Into<Brush>) {
        let fill = fill.into();
        if self.fill != fill {
            self.fill = fill;
            self.visual
                .invalidate(ConsistencyState::APPEARANCE, Signal::NEEDS_REDRAW);
        }
    }

    /// Changes the grab area paint.
    pub fn set_drag_area_fill(&mut self, fill: impl Into<Brush>) {
        let fill = fill.into();
        if self.drag_area_fill != fill {
            self.drag_area_fill = fill;
            self.visual
                .invalidate(ConsistencyState::APPEARANCE, Signal::NEEDS_REDRAW);
        }
    }

    /// Changes the drag preview paint.
    pub fn set_drag_preview_fill(&mut self, fill: impl Into<Brush>) {
        self.drag_preview_fill = fill.into();
        self.visual
            .invalidate(ConsistencyState::APPEARANCE, Signal::NEEDS_REDRAW);
    }

    /// Whether the splitter is drawn.
    pub fn enabled(&self) -> bool {
        self.visual.enabled()
    }

    /// Enables or disables the splitter.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.visual.set_enabled(enabled);
    }

    /// Changes the paint order.
    pub fn set_z_index(&mut self, z_index: i32) {
        self.visual.set_z_index(z_index);
    }

    /// Changes the target layer.
    pub fn set_container(&mut self, container: Option<LayerId>) {
        self.visual.set_container(container);
    }

    /// Pixel bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.visual.bounds()
    }

    /// Changes the pixel bounds. The position is re-clamped on the next draw.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.visual.set_bounds(bounds);
    }

    fn axis(&self, bounds: Rect) -> (f64, f64) {
        match self.layout {
            SplitterLayout::Vertical => (bounds.x0, bounds.width()),
            SplitterLayout::Horizontal => (bounds.y0, bounds.height()),
        }
    }

    fn clamp_position(&self, position: f64) -> f64 {
        let mut lo = 0.0;
        let mut hi = 1.0;
        if let Some(bounds) = self.visual.bounds() {
            let (_, size) = self.axis(bounds);
            if size > 0.0 {
                let start = self.start_limit.min(size);
                let end = self.end_limit.min(size - start);
                lo = start / size;
                hi = (size - end) / size;
            }
        }
        position.clamp(lo, hi)
    }

    /// Split coordinate in pixels for `ratio`.
    fn split_at(&self, bounds: Rect, ratio: f64) -> f64 {
        let (origin, size) = self.axis(bounds);
        origin + size * ratio
    }

    /// Bounds of the pane before the divider (left or top).
    pub fn start_bounds(&self) -> Option<Rect> {
        let b = self.visual.bounds()?;
        let at = self.split_at(b, self.position);
        Some(match self.layout {
            SplitterLayout::Vertical => Rect::new(b.x0, b.y0, at, b.y1),
            SplitterLayout::Horizontal => Rect::new(b.x0, b.y0, b.x1, at),
        })
    }

    /// Bounds of the pane after the divider (right or bottom).
    pub fn end_bounds(&self) -> Option<Rect> {
        let b = self.visual.bounds()?;
        let at = self.split_at(b, self.position);
        Some(match self.layout {
            SplitterLayout::Vertical => Rect::new(at, b.y0, b.x1, b.y1),
            SplitterLayout::Horizontal => Rect::new(b.x0, at, b.x1, b.y1),
        })
    }

    /// A band of `half_width` on each side of the split coordinate `at`.
    fn band(&self, bounds: Rect, at: f64, half_width: f64) -> Rect {
        match self.layout {
            SplitterLayout::Vertical => {
                Rect::new(at - half_width, bounds.y0, at + half_width, bounds.y1)
            }
            SplitterLayout::Horizontal => {
                Rect::new(bounds.x0, at - half_width, bounds.x1, at + half_width)
            }
        }
    }

    /// Area that starts a drag when pressed.
    pub fn drag_area(&self) -> Option<Rect> {
        let bounds = self.visual.bounds()?;
        let at = self.split_at(bounds, self.position);
        Some(self.band(bounds, at, self.thickness * 0.5 + self.drag_area_length))
    }

    /// Whether `pos` is inside the drag area.
    pub fn hit_test(&self, pos: Point) -> bool {
        self.visual.enabled() && self.drag_area().is_some_and(|area| area.contains(pos))
    }

    /// Current marks, shifted by the splitter's z-index.
    pub fn marks(&self) -> Vec<Mark> {
        let shift = self.visual.z_index().saturating_mul(z_order::COMPONENT_STRIDE);
        self.marks
            .iter()
            .cloned()
            .map(|mut mark| {
                mark.z_index = mark.z_index.saturating_add(shift);
                mark
            })
            .collect()
    }

    fn rebuild_marks(&mut self, bounds: Rect) {
        let at = self.split_at(bounds, self.drag_preview.unwrap_or(self.position));
        let line = self.band(bounds, at, self.thickness * 0.5);
        let drag_area = self.band(bounds, at, self.thickness * 0.5 + self.drag_area_length);

        self.marks.clear();
        self.marks.push(
            Mark::new(
                MarkId::from_raw(self.id_base + DRAG_AREA_ID_OFFSET),
                MarkPayload::Rect(RectMark {
                    rect: drag_area,
                    fill: self.drag_area_fill.clone(),
                }),
            )
            .with_z_index(z_order::SPLITTER_DRAG_AREA),
        );
        self.marks.push(
            Mark::new(
                MarkId::from_raw(self.id_base + LINE_ID_OFFSET),
                MarkPayload::Rect(RectMark {
                    rect: line,
                    fill: self.fill.clone(),
                }),
            )
            .with_z_index(z_order::SPLITTER),
        );
        if let Some(preview) = self.drag_preview {
            let from = self.split_at(bounds, self.position);
            let to = self.split_at(bounds, preview);
            let (lo, hi) = (from.min(to), from.max(to));
            let rect = match self.layout {
                SplitterLayout::Vertical => Rect::new(lo, bounds.y0, hi, bounds.y1),
                SplitterLayout::Horizontal => Rect::new(bounds.x0, lo, bounds.x1, hi),
            };
            self.marks.push(
                Mark::new(
                    MarkId::from_raw(self.id_base + PREVIEW_ID_OFFSET),
                    MarkPayload::Rect(RectMark {
                        rect,
                        fill: self.drag_preview_fill.clone(),
                    }),
                )
                .with_z_index(z_order::SPLITTER),
            );
        }
    }

    /// Starts a drag, showing a resize cursor on `host` until the drag ends.
    pub fn begin_drag<'s, 'h, H: CursorHost + ?Sized>(
        &'s mut self,
        host: &'h mut H,
    ) -> SplitterDrag<'s, 'h, H> {
        let cursor = match self.layout {
            SplitterLayout::Vertical => Cursor::ColResize,
            SplitterLayout::Horizontal => Cursor::RowResize,
        };
        log::debug!("splitter: drag started at {}", self.position);
        SplitterDrag {
            session: InteractionSession::begin(host, cursor),
            splitter: self,
        }
    }

    fn set_drag_preview(&mut self, preview: Option<f64>) {
        if self.drag_preview != preview {
            self.drag_preview = preview;
            self.visual
                .invalidate(ConsistencyState::APPEARANCE, Signal::NEEDS_REDRAW);
        }
    }
}

impl Invalidatable for Splitter {
    fn consistency(&self) -> &Consistency {
        self.visual.consistency()
    }

    fn consistency_mut(&mut self) -> &mut Consistency {
        self.visual.consistency_mut()
    }
}

impl Drawable for Splitter {
    fn draw(&mut self) -> bool {
        let mut removed = false;
        if !self.visual.check_drawing_needed(|| removed = true) {
            if removed {
                self.remove();
            }
            return false;
        }
        let Some(bounds) = self.visual.bounds() else {
            log::warn!("splitter: draw skipped, bounds are not set");
            return false;
        };
        if self
            .visual
            .has_invalidation_state(ConsistencyState::BOUNDS | ConsistencyState::POSITION)
        {
            // New bounds can move the limits.
            let clamped = self.clamp_position(self.position);
            if clamped != self.position {
                self.position = clamped;
                self.visual
                    .consistency_mut()
                    .dispatch_signal(Signal::BOUNDS_CHANGED);
            }
        }
        self.rebuild_marks(bounds);
        self.visual.mark_consistent(ConsistencyState::ALL);
        true
    }

    fn remove(&mut self) {
        self.marks.clear();
        self.visual
            .invalidate(ConsistencyState::APPEARANCE, Signal::NONE);
    }
}

/// An active splitter drag.
///
/// The cursor override is released when the drag is finished, cancelled or dropped.
#[derive(Debug)]
pub struct SplitterDrag<'s, 'h, H: CursorHost + ?Sized> {
    session: InteractionSession<'h, H>,
    splitter: &'s mut Splitter,
}

impl<H: CursorHost + ?Sized> SplitterDrag<'_, '_, H> {
    /// Ratio the pointer position `pos` maps to, clamped to the limits.
    fn ratio_at(&self, pos: Point) -> Option<f64> {
        let bounds = self.splitter.visual.bounds()?;
        let (origin, size) = self.splitter.axis(bounds);
        if size <= 0.0 {
            return None;
        }
        let coord = match self.splitter.layout {
            SplitterLayout::Vertical => pos.x,
            SplitterLayout::Horizontal => pos.y,
        };
        Some(self.splitter.clamp_position((coord - origin) / size))
    }

    /// Moves the drag preview to `pos`. The position itself is unchanged until
    /// [`SplitterDrag::finish`].
    pub fn drag_to(&mut self, pos: Point) {
        let preview = self.ratio_at(pos);
        self.splitter.set_drag_preview(preview);
    }

    /// Previewed position, if the pointer has moved.
    pub fn preview(&self) -> Option<f64> {
        self.splitter.drag_preview
    }

    /// The splitter being dragged.
    pub fn splitter(&self) -> &Splitter {
        self.splitter
    }

    /// Commits the previewed position, rounded to four decimals, and restores the cursor.
    pub fn finish(self) -> f64 {
        if let Some(preview) = self.splitter.drag_preview {
            let rounded = (preview * 10_000.0).round() / 10_000.0;
            self.splitter.set_drag_preview(None);
            self.splitter.set_position(rounded);
            log::debug!("splitter: drag finished at {}", self.splitter.position);
        }
        let position = self.splitter.position;
        self.session.finish();
        position
    }

    /// Drops the preview and restores the cursor.
    pub fn cancel(self) {
        self.splitter.set_drag_preview(None);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use lune_core::SignalInbox;

    use super::*;

    #[derive(Default)]
    struct Host {
        cursor: Cursor,
        changes: usize,
    }

    impl CursorHost for Host {
        fn cursor(&self) -> Cursor {
            self.cursor
        }

        fn set_cursor(&mut self, cursor: Cursor) {
            self.cursor = cursor;
            self.changes += 1;
        }
    }

    fn splitter() -> Splitter {
        Splitter::new()
            .with_container(LayerId(1))
            .with_bounds(Rect::new(0.0, 0.0, 200.0, 100.0))
    }

    #[test]
    fn position_is_clamped_to_limits() {
        let mut s = splitter();
        s.set_limits(50.0, 20.0);
        s.set_position(0.1);
        assert_eq!(s.position(), 0.25);
        s.set_position(1.0);
        assert_eq!(s.position(), 0.9);
        s.set_position(f64::NAN);
        assert_eq!(s.position(), 0.9);
    }

    #[test]
    fn position_change_signals_bounds() {
        let mut s = splitter();
        assert!(s.draw());
        let inbox = SignalInbox::new();
        s.listen_signals(inbox.listener());

        s.set_position(0.3);
        assert!(inbox.take().contains(Signal::BOUNDS_CHANGED | Signal::NEEDS_REDRAW));
        assert!(s.has_invalidation_state(ConsistencyState::POSITION));

        s.set_position(0.3);
        assert!(inbox.peek().is_empty());
    }

    #[test]
    fn panes_split_at_position() {
        let mut s = splitter();
        s.set_position(0.25);
        assert_eq!(s.start_bounds(), Some(Rect::new(0.0, 0.0, 50.0, 100.0)));
        assert_eq!(s.end_bounds(), Some(Rect::new(50.0, 0.0, 200.0, 100.0)));

        s.set_layout(SplitterLayout::Horizontal);
        assert_eq!(s.start_bounds(), Some(Rect::new(0.0, 0.0, 200.0, 25.0)));
    }

    #[test]
    fn draw_emits_line_and_drag_area() {
        let mut s = splitter();
        assert!(s.draw());
        let marks = s.marks();
        assert_eq!(marks.len(), 2);
        let MarkPayload::Rect(line) = &marks[1].payload else {
            panic!("expected a rect");
        };
        assert_eq!(line.rect, Rect::new(99.5, 0.0, 100.5, 100.0));
        assert_eq!(marks[1].z_index, z_order::SPLITTER);
        assert_eq!(marks[0].z_index, z_order::SPLITTER_DRAG_AREA);
        assert!(s.hit_test(Point::new(102.0, 50.0)));
        assert!(!s.hit_test(Point::new(110.0, 50.0)));
        assert!(!s.draw(), "nothing changed");
    }

    #[test]
    fn drag_restores_cursor_and_commits_rounded_position() {
        let mut s = splitter();
        let mut host = Host {
            cursor: Cursor::Pointer,
            changes: 0,
        };
        {
            let mut drag = s.begin_drag(&mut host);
            drag.drag_to(Point::new(123.45678, 10.0));
            assert_eq!(drag.preview(), Some(123.45678 / 200.0));
            assert_eq!(drag.splitter().position(), 0.5, "preview only");
            assert_eq!(drag.finish(), 0.6173);
        }
        assert_eq!(host.cursor, Cursor::Pointer);
        assert_eq!(host.changes, 2);
        assert_eq!(s.position(), 0.6173);
    }

    #[test]
    fn cancelled_drag_keeps_position() {
        let mut s = splitter().with_layout(SplitterLayout::Horizontal);
        let mut host = Host::default();
        let mut drag = s.begin_drag(&mut host);
        assert_eq!(drag.session.previous(), Cursor::Default);
        drag.drag_to(Point::new(0.0, 80.0));
        drag.cancel();
        assert_eq!(host.cursor, Cursor::Default);
        assert_eq!(s.position(), 0.5);
        assert!(s.draw());
        assert_eq!(s.marks().len(), 2, "no preview after cancel");
    }
}
