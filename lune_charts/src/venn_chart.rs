// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Venn chart component.
//!
//! Draw passes run their phases in a fixed order: container, data calculation, geometry
//! (bounds), appearance, labels, markers, per-point state updates, legend. Each phase runs
//! only while its consistency flag is dirty, so redraw cost follows what changed.

extern crate alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};
use kurbo::{BezPath, Circle, Point, Rect};
use lune_core::resolve::{Resolution, ResolveLevel, first_present};
use lune_core::{
    Consistency, ConsistencyState, Drawable, Invalidatable, InteractivityState, LayerId,
    ListenerKey, Mark, MarkId, MarkPayload, PathMark, PointChange, PointSelector, PointState,
    PointStateful, Signal, SignalInbox, TextAnchor, TextBaseline, TextMark, Visual,
    clarify_state, is_state_contains,
};
use lune_venn::{
    DEFAULT_ORIENTATION, IntersectionStats, LayoutParams, OrientationOrder, SetReflection,
    Solution, TextCentre, compute_text_centres, contained_in_circles, intersection_area,
    normalize_solution, region_path, scale_solution, venn,
};
use peniko::color::palette::css;
use peniko::{Brush, Color};
use smallvec::SmallVec;

use crate::data::{SetNames, SharedDataSet, VennRow};
use crate::format::FormatContext;
use crate::hatch::hatch_path;
use crate::intersections::Intersections;
use crate::legend::LegendItem;
use crate::palette::{ColorPalette, HatchFillPalette, MarkerPalette, blend_colors};
use crate::settings::{
    HatchChoice, HatchFill, LabelFormat, LabelSettings, StateSettings, StatefulSettings,
    StrokeStyle,
};
use crate::symbol::Symbol;
use crate::z_order;

/// Reflections must be recomputed from the data.
pub const VENN_DATA: ConsistencyState = ConsistencyState::component(0);
/// Region labels must be rebuilt.
pub const VENN_LABELS: ConsistencyState = ConsistencyState::component(1);
/// Region fills, outlines and hatches must be rebuilt.
pub const VENN_APPEARANCE: ConsistencyState = ConsistencyState::component(2);
/// Region markers must be rebuilt.
pub const VENN_MARKERS: ConsistencyState = ConsistencyState::component(3);

/// States a [`VennChart`] supports on top of the visual base.
pub const VENN_STATES: ConsistencyState = VENN_DATA
    .union(VENN_LABELS)
    .union(VENN_APPEARANCE)
    .union(VENN_MARKERS)
    .union(ConsistencyState::LEGEND)
    .union(ConsistencyState::HOVER)
    .union(ConsistencyState::PALETTE)
    .union(ConsistencyState::HATCH_FILL_PALETTE)
    .union(ConsistencyState::MARKER_PALETTE);

/// Signals a [`VennChart`] raises on top of the visual base.
pub const VENN_SIGNALS: Signal = Signal::NEEDS_RECALCULATION
    .union(Signal::DATA_CHANGED)
    .union(Signal::NEED_UPDATE_LEGEND);

/// Smallest id range reserved per mark kind; larger data sets widen it to the row count.
pub const MIN_MARK_ID_STRIDE: u64 = 10_000;

/// The marks a chart emits for each row, in id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VennMarkKind {
    /// Region fill.
    Region = 0,
    /// Hatch overlay.
    Hatch = 1,
    /// Region label.
    Label = 2,
    /// Region marker.
    Marker = 3,
}

const PATH_TOLERANCE: f64 = 0.1;
const DEFAULT_LABEL_FONT_SIZE: f64 = 13.0;
const DEFAULT_MARKER_SIZE: f64 = 10.0;

/// How pointer hover affects points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoverMode {
    /// The region under the pointer is hovered.
    #[default]
    Single,
    /// Hover is ignored.
    Disabled,
}

/// How clicks select points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Selection is ignored.
    Disabled,
    /// At most one point is selected.
    SingleSelect,
    /// Shift-clicks add to the selection.
    #[default]
    MultiSelect,
}

/// Counts of the work performed by draw passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Data calculations (reflections and layout).
    pub calculations: u32,
    /// Geometry passes (scaling, region paths, text centres).
    pub geometry_passes: u32,
    /// Full appearance passes.
    pub appearance_passes: u32,
    /// Full label passes.
    pub label_passes: u32,
    /// Full marker passes.
    pub marker_passes: u32,
    /// Points re-applied after a state change.
    pub point_updates: u32,
    /// Legend item rebuilds.
    pub legend_builds: u32,
}

#[derive(Clone, Debug)]
struct RowInfo {
    row: VennRow,
    sets: SetNames,
    missing: bool,
    // Position among the sorted reflections; drives palette defaults.
    slot: usize,
    parents: SmallVec<[usize; 4]>,
}

impl RowInfo {
    fn is_intersection(&self) -> bool {
        self.sets.len() > 1
    }
}

#[derive(Clone, Debug)]
struct Region {
    circles: SmallVec<[Circle; 4]>,
    path: BezPath,
    centre: TextCentre,
}

#[derive(Clone, Debug, Default)]
struct RowMarks {
    region: Option<Mark>,
    hatch: Option<Mark>,
    label: Option<Mark>,
    marker: Option<Mark>,
}

/// An area-proportional Venn diagram.
///
/// Rows come from a [`SharedDataSet`]; each row is a set (one name) or an intersection
/// (several names). Rows that cannot be drawn are flagged missing and skipped: malformed set
/// keys, non-positive values, duplicates, and intersections naming a set without its own row.
#[derive(Debug)]
pub struct VennChart {
    visual: Visual,
    id_base: u64,
    data: Option<SharedDataSet>,
    data_listener: Option<ListenerKey>,
    data_inbox: SignalInbox,
    data_separator: String,
    padding: f64,
    layout: LayoutParams,
    orientation: f64,
    orientation_order: OrientationOrder,
    settings: StatefulSettings,
    intersections: Intersections,
    palette: ColorPalette,
    hatch_fill_palette: HatchFillPalette,
    marker_palette: MarkerPalette,
    hover_mode: HoverMode,
    selection_mode: SelectionMode,
    interactivity: InteractivityState,
    rows: Vec<RowInfo>,
    reflections: Vec<SetReflection>,
    solution: Option<Solution>,
    regions: Vec<Option<Region>>,
    marks: Vec<RowMarks>,
    pending_points: Vec<usize>,
    legend_items: Vec<LegendItem>,
    stats: DrawStats,
}

impl Default for VennChart {
    fn default() -> Self {
        Self::new()
    }
}

impl VennChart {
    /// Creates a chart without data, container or bounds.
    pub fn new() -> Self {
        Self {
            visual: Visual::new(VENN_STATES, VENN_SIGNALS),
            id_base: 0,
            data: None,
            data_listener: None,
            data_inbox: SignalInbox::new(),
            data_separator: String::from("&"),
            padding: 0.0,
            layout: LayoutParams::default(),
            orientation: DEFAULT_ORIENTATION,
            orientation_order: OrientationOrder::default(),
            settings: StatefulSettings::chart_defaults(),
            intersections: Intersections::new(),
            palette: ColorPalette::default(),
            hatch_fill_palette: HatchFillPalette::default(),
            marker_palette: MarkerPalette::default(),
            hover_mode: HoverMode::default(),
            selection_mode: SelectionMode::default(),
            interactivity: InteractivityState::new(0),
            rows: Vec::new(),
            reflections: Vec::new(),
            solution: None,
            regions: Vec::new(),
            marks: Vec::new(),
            pending_points: Vec::new(),
            legend_items: Vec::new(),
            stats: DrawStats::default(),
        }
    }

    /// Sets the base of every generated mark id.
    pub fn with_id_base(mut self, id_base: u64) -> Self {
        self.id_base = id_base;
        self
    }

    /// Id of the `kind` mark of `row`.
    ///
    /// Each kind owns a range of at least [`MIN_MARK_ID_STRIDE`] ids, widened to the row count,
    /// so kinds never share ids.
    pub fn mark_id(&self, kind: VennMarkKind, row: usize) -> MarkId {
        let rows = u64::try_from(self.rows.len()).unwrap_or(u64::MAX);
        let stride = rows.max(MIN_MARK_ID_STRIDE);
        MarkId::for_row(self.id_base + kind as u64 * stride, row)
    }

    /// Attaches a data set.
    pub fn with_data(mut self, data: SharedDataSet) -> Self {
        self.set_data(Some(data));
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

    /// Sets the separator splitting joined set keys.
    pub fn with_data_separator(mut self, separator: impl Into<String>) -> Self {
        self.data_separator = separator.into();
        self
    }

    /// Sets the padding kept around the diagram inside the bounds.
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the solver options.
    pub fn with_layout_params(mut self, layout: LayoutParams) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the canonical orientation of the layout.
    pub fn with_orientation(mut self, angle: f64, order: OrientationOrder) -> Self {
        self.orientation = angle;
        self.orientation_order = order;
        self
    }

    /// Sets the region palette.
    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Sets the chart-level settings.
    pub fn with_settings(mut self, settings: StatefulSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the selection behavior.
    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    // --- Configuration ---

    /// The attached data set.
    pub fn data(&self) -> Option<&SharedDataSet> {
        self.data.as_ref()
    }

    /// Attaches (or detaches) a data set.
    pub fn set_data(&mut self, data: Option<SharedDataSet>) {
        self.detach_data();
        if let Some(data) = &data {
            let key = data.borrow_mut().listen_signals(self.data_inbox.listener());
            self.data_listener = Some(key);
        }
        self.data = data;
        self.data_inbox.take();
        self.visual.invalidate(
            VENN_DATA | ConsistencyState::BOUNDS | ConsistencyState::LEGEND,
            Signal::NEEDS_REDRAW | Signal::DATA_CHANGED | Signal::NEEDS_RECALCULATION,
        );
    }

    fn detach_data(&mut self) {
        if let (Some(data), Some(key)) = (&self.data, self.data_listener.take()) {
            match data.try_borrow_mut() {
                Ok(mut data) => {
                    data.unlisten_signals(key);
                }
                Err(_) => log::warn!("venn: data set is borrowed, listener left attached"),
            }
        }
    }

    /// Separator splitting joined set keys.
    pub fn data_separator(&self) -> &str {
        &self.data_separator
    }

    /// Changes the separator splitting joined set keys.
    pub fn set_data_separator(&mut self, separator: impl Into<String>) {
        let separator = separator.into();
        if self.data_separator != separator {
            self.data_separator = separator;
            self.visual.invalidate(
                VENN_DATA,
                Signal::NEEDS_REDRAW | Signal::NEEDS_RECALCULATION,
            );
        }
    }

    /// Padding kept around the diagram.
    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Changes the padding kept around the diagram.
    pub fn set_padding(&mut self, padding: f64) {
        if self.padding != padding {
            self.padding = padding;
            self.visual
                .invalidate(ConsistencyState::BOUNDS, Signal::NEEDS_REDRAW);
        }
    }

    /// Solver options.
    pub fn layout_params(&self) -> &LayoutParams {
        &self.layout
    }

    /// Changes the solver options.
    pub fn set_layout_params(&mut self, layout: LayoutParams) {
        if self.layout != layout {
            self.layout = layout;
            self.visual.invalidate(
                VENN_DATA,
                Signal::NEEDS_REDRAW | Signal::NEEDS_RECALCULATION,
            );
        }
    }

    /// Changes the canonical orientation.
    pub fn set_orientation(&mut self, angle: f64, order: OrientationOrder) {
        if self.orientation != angle || self.orientation_order != order {
            self.orientation = angle;
            self.orientation_order = order;
            self.visual.invalidate(
                VENN_DATA,
                Signal::NEEDS_REDRAW | Signal::NEEDS_RECALCULATION,
            );
        }
    }

    /// Chart-level settings.
    pub fn settings(&self) -> &StatefulSettings {
        &self.settings
    }

    /// Replaces the normal settings.
    pub fn set_normal(&mut self, settings: StateSettings) {
        self.set_state_settings(PointState::NORMAL, settings);
    }

    /// Replaces the hovered settings.
    pub fn set_hovered(&mut self, settings: StateSettings) {
        self.set_state_settings(PointState::HOVER, settings);
    }

    /// Replaces the selected settings.
    pub fn set_selected(&mut self, settings: StateSettings) {
        self.set_state_settings(PointState::SELECT, settings);
    }

    /// Replaces the settings of `state`, invalidating only the affected phases.
    pub fn set_state_settings(&mut self, state: PointState, settings: StateSettings) {
        let slot = self.settings.state_mut(state);
        let diff = slot.diff(&settings);
        *slot = settings;

        let normal = state.is_normal();
        let mut dirty = ConsistencyState::NONE;
        let mut signal = Signal::NONE;
        if diff.appearance {
            dirty |= VENN_APPEARANCE;
        }
        if diff.labels {
            dirty |= VENN_LABELS;
        }
        if diff.markers {
            dirty |= VENN_MARKERS;
        }
        if normal && (diff.appearance || diff.markers) {
            dirty |= ConsistencyState::LEGEND;
            signal |= Signal::NEED_UPDATE_LEGEND;
        }
        self.visual.invalidate(dirty, signal | Signal::NEEDS_REDRAW);
    }

    /// Intersection-only settings.
    pub fn intersections(&self) -> &Intersections {
        &self.intersections
    }

    /// Changes the intersection settings through `f`.
    pub fn update_intersections(&mut self, f: impl FnOnce(&mut Intersections)) {
        f(&mut self.intersections);
        let signal = self.intersections.consistency_mut().take_signals();
        self.intersections_invalidated(signal);
    }

    fn intersections_invalidated(&mut self, signal: Signal) {
        if signal.is_empty() {
            return;
        }
        let mut state = ConsistencyState::NONE;
        if signal.intersects(Signal::NEEDS_REDRAW_LABELS) {
            state |= VENN_LABELS;
        }
        if signal.intersects(Signal::NEEDS_UPDATE_MARKERS) {
            state |= VENN_MARKERS;
        }
        if signal.intersects(Signal::NEEDS_REDRAW_APPEARANCE) {
            state |= VENN_APPEARANCE;
        }
        let mut out = Signal::NEEDS_REDRAW;
        if signal.intersects(Signal::NEED_UPDATE_LEGEND) {
            state |= ConsistencyState::LEGEND;
            out |= Signal::NEED_UPDATE_LEGEND;
        }
        self.visual.invalidate(state, out);
    }

    /// Region palette.
    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Replaces the region palette.
    pub fn set_palette(&mut self, palette: ColorPalette) {
        if self.palette != palette {
            self.palette = palette;
            self.visual.invalidate(
                ConsistencyState::PALETTE
                    | VENN_APPEARANCE
                    | VENN_MARKERS
                    | ConsistencyState::LEGEND,
                Signal::NEEDS_REDRAW | Signal::NEED_UPDATE_LEGEND,
            );
        }
    }

    /// Hatch palette.
    pub fn hatch_fill_palette(&self) -> &HatchFillPalette {
        &self.hatch_fill_palette
    }

    /// Replaces the hatch palette.
    pub fn set_hatch_fill_palette(&mut self, palette: HatchFillPalette) {
        if self.hatch_fill_palette != palette {
            self.hatch_fill_palette = palette;
            self.visual.invalidate(
                ConsistencyState::HATCH_FILL_PALETTE | VENN_APPEARANCE,
                Signal::NEEDS_REDRAW,
            );
        }
    }

    /// Marker palette.
    pub fn marker_palette(&self) -> &MarkerPalette {
        &self.marker_palette
    }

    /// Replaces the marker palette.
    pub fn set_marker_palette(&mut self, palette: MarkerPalette) {
        if self.marker_palette != palette {
            self.marker_palette = palette;
            self.visual.invalidate(
                ConsistencyState::MARKER_PALETTE | VENN_MARKERS | ConsistencyState::LEGEND,
                Signal::NEEDS_REDRAW | Signal::NEED_UPDATE_LEGEND,
            );
        }
    }

    /// Hover behavior.
    pub fn hover_mode(&self) -> HoverMode {
        self.hover_mode
    }

    /// Changes the hover behavior.
    pub fn set_hover_mode(&mut self, mode: HoverMode) {
        self.hover_mode = mode;
    }

    /// Selection behavior.
    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Changes the selection behavior.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
    }

    /// Whether the chart is drawn.
    pub fn enabled(&self) -> bool {
        self.visual.enabled()
    }

    /// Enables or disables the chart.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.visual.set_enabled(enabled);
    }

    /// Paint order.
    pub fn z_index(&self) -> i32 {
        self.visual.z_index()
    }

    /// Changes the paint order.
    pub fn set_z_index(&mut self, z_index: i32) {
        self.visual.set_z_index(z_index);
    }

    /// Target layer.
    pub fn container(&self) -> Option<LayerId> {
        self.visual.container()
    }

    /// Changes the target layer.
    pub fn set_container(&mut self, container: Option<LayerId>) {
        self.visual.set_container(container);
    }

    /// Pixel bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.visual.bounds()
    }

    /// Changes the pixel bounds.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.visual.set_bounds(bounds);
    }

    // --- Results ---

    /// Whether there are no rows at all.
    pub fn is_no_data(&self) -> bool {
        self.data.as_ref().is_none_or(|data| data.borrow().is_empty())
    }

    /// Whether the row at `index` was skipped by the last calculation.
    pub fn is_missing(&self, index: usize) -> bool {
        self.rows.get(index).is_some_and(|info| info.missing)
    }

    /// Reflections of the last calculation, sorted by set count.
    pub fn reflections(&self) -> &[SetReflection] {
        &self.reflections
    }

    /// Normalized layout of the last calculation.
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Outline of the region drawn for row `index`, in pixels.
    pub fn region_path(&self, index: usize) -> Option<&BezPath> {
        self.drawable_region(index).map(|region| &region.path)
    }

    /// Label anchor of row `index`, in pixels.
    pub fn text_centre(&self, index: usize) -> Option<Point> {
        self.drawable_region(index)
            .filter(|region| !region.centre.disjoint)
            .map(|region| region.centre.point)
    }

    /// Work counters.
    pub fn draw_stats(&self) -> DrawStats {
        self.stats
    }

    /// Legend items, rebuilt by draw passes.
    pub fn legend_items(&self) -> &[LegendItem] {
        &self.legend_items
    }

    /// Current marks, shifted by the chart's z-index.
    pub fn marks(&self) -> Vec<Mark> {
        let shift = self.visual.z_index().saturating_mul(z_order::COMPONENT_STRIDE);
        self.marks
            .iter()
            .flat_map(|m| [&m.region, &m.hatch, &m.label, &m.marker])
            .flatten()
            .map(|mark| {
                let mut mark = mark.clone();
                mark.z_index = mark.z_index.saturating_add(shift);
                mark
            })
            .collect()
    }

    /// Values available to label formats for row `index`.
    pub fn format_context(&self, index: usize) -> Option<FormatContext> {
        let info = self.rows.get(index)?;
        let x = info.row.x.display(&self.data_separator);
        Some(FormatContext {
            index,
            name: info.row.name.clone().unwrap_or_else(|| x.clone()),
            x,
            value: info.row.value,
            is_intersection: info.is_intersection(),
            selected_points_sum: self.selected_points_sum(),
        })
    }

    fn selected_points_sum(&self) -> f64 {
        self.interactivity
            .indices_with_state(PointState::SELECT)
            .into_iter()
            .filter_map(|i| self.rows.get(i))
            .map(|info| info.row.value)
            .fold(0.0, |sum, value| sum + value)
    }

    // --- Calculation ---

    fn pending_data_state(&self) -> ConsistencyState {
        if self.data_inbox.peek().intersects(Signal::DATA_CHANGED) {
            VENN_DATA | ConsistencyState::LEGEND
        } else {
            ConsistencyState::NONE
        }
    }

    /// Folds data set notifications into the chart's own invalidation.
    pub fn pull_data_signals(&mut self) {
        if self.data_inbox.take().intersects(Signal::DATA_CHANGED) {
            self.visual.invalidate(
                VENN_DATA | ConsistencyState::LEGEND,
                Signal::NEEDS_REDRAW | Signal::DATA_CHANGED | Signal::NEEDS_RECALCULATION,
            );
        }
    }

    /// Rebuilds reflections and the normalized layout if the data changed.
    pub fn calculate(&mut self) {
        self.pull_data_signals();
        if !self.visual.has_invalidation_state(VENN_DATA) {
            return;
        }
        self.stats.calculations += 1;

        let rows = match &self.data {
            Some(data) => data.borrow().rows().to_vec(),
            None => Vec::new(),
        };
        self.interactivity.set_row_count(rows.len());
        let mut infos = analyze_rows(rows, &self.data_separator);

        let mut reflections: Vec<SetReflection> = infos
            .iter()
            .enumerate()
            .filter(|(_, info)| !info.missing)
            .map(|(i, info)| {
                SetReflection::new(info.sets.iter().cloned(), info.row.value).with_source_index(i)
            })
            .collect();
        // Stable: rows with the same set count keep their data order.
        reflections.sort_by_key(|r| r.sets.len());
        for (slot, reflection) in reflections.iter().enumerate() {
            if let Some(i) = reflection.source_index {
                infos[i].slot = slot;
            }
        }

        self.solution = if reflections.is_empty() {
            None
        } else {
            let raw = venn(&reflections, &self.layout);
            Some(normalize_solution(
                &raw,
                self.orientation,
                self.orientation_order,
            ))
        };
        log::debug!(
            "venn: calculated {} reflections from {} rows",
            reflections.len(),
            infos.len()
        );

        let len = infos.len();
        self.rows = infos;
        self.reflections = reflections;
        self.regions = vec![None; len];
        self.marks = vec![RowMarks::default(); len];
        self.pending_points.clear();

        self.visual.mark_consistent(VENN_DATA);
        self.visual.invalidate(
            ConsistencyState::BOUNDS
                | VENN_APPEARANCE
                | VENN_LABELS
                | VENN_MARKERS
                | ConsistencyState::LEGEND,
            Signal::NONE,
        );
    }

    // --- Drawing ---

    /// Runs every dirty content phase for `bounds`, skipping the enabled and container
    /// checks of [`Drawable::draw`].
    pub fn draw_content(&mut self, bounds: Rect) {
        self.visual.set_bounds(bounds);
        self.calculate();

        if self.visual.has_invalidation_state(ConsistencyState::BOUNDS) {
            log::trace!("venn: geometry pass");
            self.layout_regions(bounds);
            self.stats.geometry_passes += 1;
            self.visual.mark_consistent(ConsistencyState::BOUNDS);
            self.visual.invalidate(
                VENN_APPEARANCE | VENN_LABELS | VENN_MARKERS,
                Signal::NONE,
            );
        }

        let full_appearance = self.visual.has_invalidation_state(
            VENN_APPEARANCE | ConsistencyState::PALETTE | ConsistencyState::HATCH_FILL_PALETTE,
        );
        if full_appearance {
            log::trace!("venn: appearance pass");
            for row in 0..self.rows.len() {
                self.apply_appearance(row);
            }
            self.stats.appearance_passes += 1;
            self.visual.mark_consistent(
                VENN_APPEARANCE | ConsistencyState::PALETTE | ConsistencyState::HATCH_FILL_PALETTE,
            );
        }

        let full_labels = self.visual.has_invalidation_state(VENN_LABELS);
        if full_labels {
            log::trace!("venn: label pass");
            for row in 0..self.rows.len() {
                self.marks[row].label = self.build_label(row);
            }
            self.stats.label_passes += 1;
            self.visual.mark_consistent(VENN_LABELS);
        }

        let full_markers = self
            .visual
            .has_invalidation_state(VENN_MARKERS | ConsistencyState::MARKER_PALETTE);
        if full_markers {
            log::trace!("venn: marker pass");
            for row in 0..self.rows.len() {
                self.marks[row].marker = self.build_marker(row);
            }
            self.stats.marker_passes += 1;
            self.visual
                .mark_consistent(VENN_MARKERS | ConsistencyState::MARKER_PALETTE);
        }

        if self.visual.has_invalidation_state(ConsistencyState::HOVER) {
            let pending = core::mem::take(&mut self.pending_points);
            // A selection-dependent label changes on every row, not only the touched ones.
            let relabel_all = !full_labels && self.labels_read_selection();
            if relabel_all {
                for row in 0..self.rows.len() {
                    self.marks[row].label = self.build_label(row);
                }
            }
            let labels_done = full_labels || relabel_all;
            if !(full_appearance && labels_done && full_markers) {
                let len = self.rows.len();
                for row in pending.into_iter().filter(|&row| row < len) {
                    if !full_appearance {
                        self.apply_appearance(row);
                    }
                    if !labels_done {
                        self.marks[row].label = self.build_label(row);
                    }
                    if !full_markers {
                        self.marks[row].marker = self.build_marker(row);
                    }
                    self.stats.point_updates += 1;
                }
            }
            self.visual.mark_consistent(ConsistencyState::HOVER);
        }

        if self.visual.has_invalidation_state(ConsistencyState::LEGEND) {
            self.legend_items = self.build_legend_items();
            self.stats.legend_builds += 1;
            self.visual.mark_consistent(ConsistencyState::LEGEND);
        }

        if self.visual.has_invalidation_state(ConsistencyState::Z_INDEX) {
            // Marks pick up the z-index in `marks`.
            self.visual.mark_consistent(ConsistencyState::Z_INDEX);
        }
    }

    fn layout_regions(&mut self, bounds: Rect) {
        for region in &mut self.regions {
            *region = None;
        }
        let Some(solution) = &self.solution else {
            return;
        };
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            log::debug!("venn: empty bounds {bounds:?}, nothing to lay out");
            return;
        }

        let mut scaled = scale_solution(solution, bounds.width(), bounds.height(), self.padding);
        let origin = bounds.origin().to_vec2();
        scaled.map_circles(|_, c| Circle::new(c.center + origin, c.radius));
        let centres = compute_text_centres(&scaled, &self.reflections);

        for (reflection, centre) in self.reflections.iter().zip(centres) {
            let Some(row) = reflection.source_index else {
                continue;
            };
            let Some(circles) = scaled.circles_for(reflection.sets.iter().map(String::as_str))
            else {
                continue;
            };
            let mut stats = IntersectionStats::default();
            intersection_area(&circles, Some(&mut stats));
            self.regions[row] = Some(Region {
                path: region_path(&stats.arcs, PATH_TOLERANCE),
                circles: circles.into_iter().collect(),
                centre,
            });
        }
    }

    fn drawable_region(&self, row: usize) -> Option<&Region> {
        if self.rows.get(row)?.missing {
            return None;
        }
        self.regions
            .get(row)?
            .as_ref()
            .filter(|region| !region.path.elements().is_empty())
    }

    fn effective_state(&self, row: usize) -> PointState {
        self.interactivity.point_state(row) | self.interactivity.series_state()
    }

    /// Point, then intersection and chart settings of `state`, then the same levels for
    /// the normal state.
    fn resolve_setting<T>(
        &self,
        row: usize,
        state: PointState,
        get: impl Fn(&StateSettings) -> Option<T>,
    ) -> Option<T> {
        let info = &self.rows[row];
        let intersection = info.is_intersection();
        let point = &info.row.settings;
        let is_normal = clarify_state(state).is_normal();
        let state_level = if is_normal {
            ResolveLevel::Normal
        } else {
            ResolveLevel::State
        };

        let mut chain = Resolution::new().with(ResolveLevel::Point, get(point.state(state)));
        if intersection {
            chain = chain.with(state_level, get(self.intersections.state(state)));
        }
        chain = chain.with(state_level, get(self.settings.state(state)));
        if !is_normal {
            chain = chain.with(ResolveLevel::Point, get(&point.normal));
            if intersection {
                chain = chain.with(
                    ResolveLevel::Normal,
                    get(&self.intersections.settings().normal),
                );
            }
            chain = chain.with(ResolveLevel::Normal, get(&self.settings.normal));
        }
        chain.resolve().map(|resolved| resolved.value)
    }

    /// Point state then point normal, then intersection, then chart.
    fn resolve_label<T>(
        &self,
        row: usize,
        state: PointState,
        get: impl Fn(&LabelSettings) -> Option<T>,
    ) -> Option<T> {
        let info = &self.rows[row];
        let point = &info.row.settings;
        let mut levels: SmallVec<[&StateSettings; 6]> = SmallVec::new();
        levels.push(point.state(state));
        levels.push(&point.normal);
        if info.is_intersection() {
            levels.push(self.intersections.state(state));
            levels.push(&self.intersections.settings().normal);
        }
        levels.push(self.settings.state(state));
        levels.push(&self.settings.normal);
        first_present(levels.into_iter().map(|s| get(&s.labels)))
    }

    /// Region color before opacity. Intersections blend their parents' normal colors.
    fn base_color(&self, row: usize, state: PointState) -> Color {
        if let Some(color) = self.resolve_setting(row, state, |s| s.fill) {
            return color;
        }
        let info = &self.rows[row];
        if info.is_intersection() {
            let parents: SmallVec<[Color; 4]> = info
                .parents
                .iter()
                .map(|&p| self.base_color(p, PointState::NORMAL))
                .collect();
            blend_colors(&parents)
        } else {
            self.palette.item_at(info.slot).unwrap_or(css::BLACK)
        }
    }

    fn fill_color(&self, row: usize, state: PointState) -> Color {
        let opacity = self
            .resolve_setting(row, state, |s| s.fill_opacity)
            .unwrap_or(1.0);
        self.base_color(row, state).multiply_alpha(opacity as f32)
    }

    fn apply_appearance(&mut self, row: usize) {
        let Some(region) = self.drawable_region(row) else {
            self.marks[row].region = None;
            self.marks[row].hatch = None;
            return;
        };
        let info = &self.rows[row];
        let state = self.effective_state(row);
        let fill = self.fill_color(row, state);
        let stroke = self
            .resolve_setting(row, state, |s| s.stroke.clone())
            .unwrap_or_else(|| StrokeStyle::solid(fill.with_alpha(1.0), 1.0));
        let z = region_z(info.sets.len());

        let region_mark = Mark::new(
            self.mark_id(VennMarkKind::Region, row),
            MarkPayload::Path(PathMark {
                path: region.path.clone(),
                fill: Brush::Solid(fill),
                stroke: stroke.brush,
                stroke_width: stroke.stroke_width,
            }),
        )
        .with_z_index(z);

        let hatch = match self.resolve_setting(row, state, |s| s.hatch_fill.clone()) {
            Some(HatchChoice::Fill(hatch)) => Some(hatch),
            Some(HatchChoice::Palette) => self
                .hatch_fill_palette
                .item_at(info.slot)
                .map(HatchFill::new),
            Some(HatchChoice::Disabled) | None => None,
        };
        let hatch_mark = hatch.and_then(|hatch| {
            let path = hatch_path(&hatch, &region.circles);
            if path.elements().is_empty() {
                return None;
            }
            Some(
                Mark::new(
                    self.mark_id(VennMarkKind::Hatch, row),
                    MarkPayload::Path(PathMark {
                        path,
                        fill: Brush::Solid(Color::TRANSPARENT),
                        stroke: Brush::Solid(hatch.color),
                        stroke_width: hatch.thickness,
                    }),
                )
                .with_z_index(z + z_order::VENN_HATCH_OFFSET),
            )
        });

        let marks = &mut self.marks[row];
        marks.region = Some(region_mark);
        marks.hatch = hatch_mark;
    }

    fn label_format(&self, row: usize, state: PointState) -> LabelFormat {
        self.resolve_label(row, state, |l| l.format.clone())
            .unwrap_or(LabelFormat::Name)
    }

    fn labels_read_selection(&self) -> bool {
        (0..self.rows.len())
            .any(|row| self.label_format(row, self.effective_state(row)).reads_selection())
    }

    fn build_label(&self, row: usize) -> Option<Mark> {
        let region = self.drawable_region(row)?;
        if region.centre.disjoint {
            return None;
        }
        let state = self.effective_state(row);
        if !self.resolve_label(row, state, |l| l.enabled).unwrap_or(true) {
            return None;
        }
        let text = self.format_context(row)?.format(&self.label_format(row, state));
        let font_size = self
            .resolve_label(row, state, |l| l.font_size)
            .unwrap_or(DEFAULT_LABEL_FONT_SIZE);
        let fill = self
            .resolve_label(row, state, |l| l.fill)
            .unwrap_or(css::BLACK);

        Some(
            Mark::new(
                self.mark_id(VennMarkKind::Label, row),
                MarkPayload::Text(TextMark {
                    pos: region.centre.point,
                    text,
                    font_size,
                    angle: 0.0,
                    anchor: TextAnchor::Middle,
                    baseline: TextBaseline::Middle,
                    fill: Brush::Solid(fill),
                }),
            )
            .with_z_index(z_order::VENN_LABELS),
        )
    }

    fn marker_symbol(&self, row: usize, state: PointState) -> Symbol {
        self.resolve_setting(row, state, |s| s.markers.symbol)
            .or_else(|| self.marker_palette.item_at(self.rows[row].slot))
            .unwrap_or(Symbol::Circle)
    }

    fn build_marker(&self, row: usize) -> Option<Mark> {
        let region = self.drawable_region(row)?;
        if region.centre.disjoint {
            return None;
        }
        let state = self.effective_state(row);
        if !self
            .resolve_setting(row, state, |s| s.markers.enabled)
            .unwrap_or(false)
        {
            return None;
        }
        let symbol = self.marker_symbol(row, state);
        let size = self
            .resolve_setting(row, state, |s| s.markers.size)
            .unwrap_or(DEFAULT_MARKER_SIZE);
        let fill = self
            .resolve_setting(row, state, |s| s.markers.fill)
            .unwrap_or_else(|| self.base_color(row, PointState::NORMAL).with_alpha(1.0));
        let p = region.centre.point;

        Some(
            Mark::new(
                self.mark_id(VennMarkKind::Marker, row),
                MarkPayload::Path(PathMark {
                    path: symbol.path(p.x, p.y, size),
                    fill: Brush::Solid(fill),
                    stroke: Brush::Solid(Color::TRANSPARENT),
                    stroke_width: 0.0,
                }),
            )
            .with_z_index(z_order::VENN_MARKERS),
        )
    }

    fn build_legend_items(&self) -> Vec<LegendItem> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, info)| !info.missing && !info.is_intersection())
            .map(|(i, info)| {
                let label = info
                    .row
                    .name
                    .clone()
                    .unwrap_or_else(|| info.row.x.display(&self.data_separator));
                let markers = self
                    .resolve_setting(i, PointState::NORMAL, |s| s.markers.enabled)
                    .unwrap_or(false);
                let symbol = if markers {
                    self.marker_symbol(i, PointState::NORMAL)
                } else {
                    Symbol::Square
                };
                LegendItem {
                    label,
                    fill: Brush::Solid(self.fill_color(i, PointState::NORMAL)),
                    symbol,
                    index: Some(i),
                }
            })
            .collect()
    }

    // --- Interactivity ---

    /// Row whose region contains `pos`; the region of the most sets wins.
    pub fn point_at(&self, pos: Point) -> Option<usize> {
        (0..self.regions.len())
            .filter_map(|i| self.drawable_region(i).map(|region| (i, region)))
            .filter(|(_, region)| contained_in_circles(pos, &region.circles))
            .max_by(|(a, ra), (b, rb)| {
                ra.circles
                    .len()
                    .cmp(&rb.circles.len())
                    .then_with(|| b.cmp(a))
            })
            .map(|(i, _)| i)
    }

    fn targets(&self, selector: PointSelector<'_>) -> Vec<usize> {
        let mut out: Vec<usize> = match selector {
            PointSelector::Index(i) => vec![i],
            PointSelector::Indices(indices) => indices.to_vec(),
            PointSelector::AllRows => (0..self.rows.len()).collect(),
            PointSelector::AllStored => self
                .interactivity
                .indices_with_state(PointState::HOVER | PointState::SELECT),
        };
        out.retain(|&i| self.rows.get(i).is_some_and(|info| !info.missing));
        out.sort_unstable();
        out.dedup();
        out
    }

    fn interactive(&mut self) -> bool {
        if !self.visual.enabled() {
            return false;
        }
        self.calculate();
        true
    }

    fn series_changed(&mut self, before: PointState) {
        if self.interactivity.series_state() != before {
            self.visual.invalidate(
                VENN_APPEARANCE | VENN_LABELS | VENN_MARKERS,
                Signal::NEEDS_REDRAW,
            );
        }
    }

    /// Hovers `points`, unhovering every other point.
    pub fn hover<'a>(&mut self, points: impl Into<PointSelector<'a>>) {
        if self.hover_mode == HoverMode::Disabled || !self.interactive() {
            return;
        }
        let targets = self.targets(points.into());
        let stale: Vec<usize> = self
            .interactivity
            .indices_with_state(PointState::HOVER)
            .into_iter()
            .filter(|i| !targets.contains(i))
            .collect();
        let mut changes = self
            .interactivity
            .remove_point_state(PointState::HOVER, PointSelector::Indices(&stale));
        changes.extend(
            self.interactivity
                .add_point_state(PointState::HOVER, PointSelector::Indices(&targets)),
        );
        self.apply_point_changes(&changes);
    }

    /// Hovers the whole series.
    pub fn hover_series(&mut self) {
        if self.hover_mode == HoverMode::Disabled || !self.interactive() {
            return;
        }
        let before = self.interactivity.series_state();
        let changes = self.interactivity.set_series_state(PointState::HOVER);
        self.apply_point_changes(&changes);
        self.series_changed(before);
    }

    /// Removes hover from every point and from the series.
    pub fn unhover(&mut self) {
        if !self.visual.enabled() {
            return;
        }
        let series = self.interactivity.series_state();
        if !self.interactivity.has_point_state(PointState::HOVER)
            && !is_state_contains(series, PointState::HOVER)
        {
            return;
        }
        let mut changes = self
            .interactivity
            .remove_point_state(PointState::HOVER, PointSelector::AllStored);
        changes.extend(self.interactivity.remove_series_state(PointState::HOVER));
        self.apply_point_changes(&changes);
        self.series_changed(series);
    }

    /// Selects `points`, clearing their hover.
    ///
    /// Without `shift` (or in single-select mode) every other point is unselected first.
    pub fn select<'a>(&mut self, points: impl Into<PointSelector<'a>>, shift: bool) {
        if self.selection_mode == SelectionMode::Disabled || !self.interactive() {
            return;
        }
        let mut targets = self.targets(points.into());
        let additive = shift && self.selection_mode == SelectionMode::MultiSelect;
        if self.selection_mode == SelectionMode::SingleSelect {
            targets.truncate(1);
        }
        let mut changes = Vec::new();
        if !additive {
            let stale: Vec<usize> = self
                .interactivity
                .indices_with_state(PointState::SELECT)
                .into_iter()
                .filter(|i| !targets.contains(i))
                .collect();
            changes = self
                .interactivity
                .remove_point_state(PointState::SELECT, PointSelector::Indices(&stale));
        }
        changes.extend(self.interactivity.set_point_state(
            PointState::SELECT,
            PointSelector::Indices(&targets),
            Some(PointState::HOVER),
        ));
        self.apply_point_changes(&changes);
    }

    /// Selects the whole series.
    pub fn select_series(&mut self) {
        if self.selection_mode == SelectionMode::Disabled || !self.interactive() {
            return;
        }
        let before = self.interactivity.series_state();
        let changes = self.interactivity.set_series_state(PointState::SELECT);
        self.apply_point_changes(&changes);
        self.series_changed(before);
    }

    /// Removes selection from every point and from the series.
    pub fn unselect(&mut self) {
        if !self.visual.enabled() {
            return;
        }
        let before = self.interactivity.series_state();
        let mut changes = self
            .interactivity
            .remove_point_state(PointState::SELECT, PointSelector::AllStored);
        changes.extend(self.interactivity.remove_series_state(PointState::SELECT));
        self.apply_point_changes(&changes);
        self.series_changed(before);
    }

    /// Pointer moved to `pos`: hovers the region under it, or unhovers.
    pub fn handle_pointer_move(&mut self, pos: Point) {
        match self.point_at(pos) {
            Some(i) => self.hover(i),
            None => self.unhover(),
        }
    }

    /// Pointer pressed at `pos`: selects the region under it. A plain click on empty space
    /// clears the selection.
    pub fn handle_pointer_down(&mut self, pos: Point, shift: bool) {
        match self.point_at(pos) {
            Some(i) => self.select(i, shift),
            None if !shift => self.unselect(),
            None => {}
        }
    }
}

impl Drop for VennChart {
    fn drop(&mut self) {
        self.detach_data();
    }
}

impl Invalidatable for VennChart {
    fn consistency(&self) -> &Consistency {
        self.visual.consistency()
    }

    fn consistency_mut(&mut self) -> &mut Consistency {
        self.visual.consistency_mut()
    }

    fn has_invalidation_state(&self, state: ConsistencyState) -> bool {
        self.visual.has_invalidation_state(state) || self.pending_data_state().intersects(state)
    }

    fn is_consistent(&self) -> bool {
        self.visual.is_consistent() && self.pending_data_state().is_empty()
    }
}

impl Drawable for VennChart {
    fn draw(&mut self) -> bool {
        self.pull_data_signals();
        let mut removed = false;
        if !self.visual.check_drawing_needed(|| removed = true) {
            if removed {
                self.remove();
            }
            return false;
        }
        let Some(bounds) = self.visual.bounds() else {
            log::warn!("venn: draw skipped, bounds are not set");
            return false;
        };
        if self.visual.has_invalidation_state(ConsistencyState::CONTAINER) {
            self.visual.mark_consistent(ConsistencyState::CONTAINER);
        }
        self.draw_content(bounds);
        true
    }

    fn remove(&mut self) {
        for marks in &mut self.marks {
            *marks = RowMarks::default();
        }
        // Rebuild on re-enable.
        self.visual.invalidate(
            VENN_APPEARANCE | VENN_LABELS | VENN_MARKERS,
            Signal::NONE,
        );
    }
}

impl PointStateful for VennChart {
    fn interactivity(&self) -> &InteractivityState {
        &self.interactivity
    }

    fn interactivity_mut(&mut self) -> &mut InteractivityState {
        &mut self.interactivity
    }

    fn apply_point_changes(&mut self, changes: &[PointChange]) {
        if changes.is_empty() {
            return;
        }
        for &(row, _) in changes {
            if !self.pending_points.contains(&row) {
                self.pending_points.push(row);
            }
        }
        self.visual
            .invalidate(ConsistencyState::HOVER, Signal::NEEDS_REDRAW);
    }
}

fn region_z(set_count: usize) -> i32 {
    let step = i32::try_from(set_count.saturating_sub(1))
        .unwrap_or(i32::MAX)
        .saturating_mul(2);
    z_order::VENN_REGIONS + step.min(z_order::VENN_REGIONS_MAX)
}

/// Parses every row and flags the ones that cannot be drawn.
fn analyze_rows(rows: Vec<VennRow>, separator: &str) -> Vec<RowInfo> {
    let mut infos: Vec<RowInfo> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let (sets, missing) = match row.x.parse(separator) {
                Ok(sets) => {
                    let valid = row.value.is_finite() && row.value > 0.0;
                    if !valid {
                        log::warn!("venn: row {i} skipped, value {} is not positive", row.value);
                    }
                    (sets, !valid)
                }
                Err(err) => {
                    log::warn!("venn: row {i} skipped, {err}");
                    (SetNames::new(), true)
                }
            };
            RowInfo {
                row,
                sets,
                missing,
                slot: 0,
                parents: SmallVec::new(),
            }
        })
        .collect();

    let mut singles: HashMap<String, usize> = HashMap::new();
    for (i, info) in infos.iter_mut().enumerate() {
        if info.missing || info.sets.len() != 1 {
            continue;
        }
        match singles.entry(info.sets[0].clone()) {
            Entry::Occupied(first) => {
                log::warn!(
                    "venn: row {i} skipped, set {:?} is already defined by row {}",
                    first.key(),
                    first.get()
                );
                info.missing = true;
            }
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
        }
    }

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    for (i, info) in infos.iter_mut().enumerate() {
        if info.missing || info.sets.len() < 2 {
            continue;
        }
        let parents: Option<SmallVec<[usize; 4]>> = info
            .sets
            .iter()
            .map(|name| singles.get(name.as_str()).copied())
            .collect();
        let Some(parents) = parents else {
            log::warn!(
                "venn: row {i} skipped, {:?} names a set without its own row",
                info.sets.as_slice()
            );
            info.missing = true;
            continue;
        };
        let mut key: Vec<String> = info.sets.to_vec();
        key.sort_unstable();
        key.dedup();
        if key.len() != info.sets.len() || !seen.insert(key) {
            log::warn!(
                "venn: row {i} skipped, intersection {:?} is repeated",
                info.sets.as_slice()
            );
            info.missing = true;
            continue;
        }
        info.parents = parents;
    }
    infos
}
