// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Z-order conventions for chart-generated marks.
//!
//! Marks carry an explicit `z_index`. Renderers should sort by `(z_index, MarkId)` for a
//! deterministic tie-break. A component's own z-index shifts all of its marks by
//! [`COMPONENT_STRIDE`] per step.

/// Distance between the mark layers of two consecutive component z-indexes.
pub const COMPONENT_STRIDE: i32 = 1000;

/// Venn circle fills. Intersections stack above their parents, two steps per extra set.
pub const VENN_REGIONS: i32 = 0;
/// Hatch patterns sit one step above the region they fill.
pub const VENN_HATCH_OFFSET: i32 = 1;
/// Highest region layer; deeper intersections share it.
pub const VENN_REGIONS_MAX: i32 = 18;

/// Venn markers.
pub const VENN_MARKERS: i32 = 20;
/// Venn labels.
pub const VENN_LABELS: i32 = 40;

/// Legend swatches.
pub const LEGEND_SWATCHES: i32 = 60;
/// Legend labels.
pub const LEGEND_LABELS: i32 = 70;

/// Splitter drag area.
pub const SPLITTER_DRAG_AREA: i32 = 80;
/// Splitter line.
pub const SPLITTER: i32 = 90;
