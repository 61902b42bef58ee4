// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chart components that generate `lune_core` marks.
//!
//! - **Venn chart**: area-proportional circles laid out by `lune_venn`, with per-region
//!   appearance, hatch fills, labels and markers, hover and selection, and legend items.
//!   Redraws only repeat the phases whose consistency flags are dirty.
//! - **Data sets**: rows shared between charts, with change notification.
//! - **Settings**: normal/hovered/selected settings resolved from point, intersection and
//!   chart levels, plus color, hatch and marker palettes.
//! - **Legends**: swatch and label marks for a list of items, with hit testing.
//! - **Splitter**: a draggable divider whose drag owns the cursor override.
//!
//! Text shaping is out of scope; text marks store unshaped strings and legends take a
//! [`TextMeasurer`] for rough sizing.

#![no_std]

extern crate alloc;

mod data;
#[cfg(not(feature = "std"))]
mod float;
mod format;
mod hatch;
mod intersections;
mod legend;
mod measure;
mod palette;
mod settings;
mod splitter;
mod symbol;
mod venn_chart;
#[cfg(test)]
mod venn_tests;
pub mod z_order;

pub use data::{DataError, DataSet, SetKey, SetNames, SharedDataSet, VennRow};
pub use format::FormatContext;
pub use intersections::{INTERSECTIONS_SIGNALS, Intersections};
pub use legend::{LEGEND_LABEL_ID_OFFSET, Legend, LegendItem, LegendLayout, PlacedLegend};
pub use measure::{HeuristicTextMeasurer, TextMeasurer};
pub use palette::{ColorPalette, HatchFillPalette, MarkerPalette, Palette, blend_colors};
pub use settings::{
    HatchChoice, HatchFill, HatchKind, LabelFormat, LabelSettings, MarkerSettings,
    StateSettings, StatefulSettings, StrokeStyle,
};
pub use splitter::{SPLITTER_STATES, Splitter, SplitterDrag, SplitterLayout};
pub use symbol::Symbol;
pub use venn_chart::{
    DrawStats, HoverMode, MIN_MARK_ID_STRIDE, SelectionMode, VENN_APPEARANCE, VENN_DATA,
    VENN_LABELS, VENN_MARKERS, VENN_SIGNALS, VENN_STATES, VennChart, VennMarkKind,
};
