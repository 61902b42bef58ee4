// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Settings applied to intersection regions only.

use lune_core::{Consistency, ConsistencyState, Invalidatable, PointState, Signal};

use crate::settings::{StateSettings, StatefulSettings};

/// Signals an [`Intersections`] object can raise.
pub const INTERSECTIONS_SIGNALS: Signal = Signal::NEEDS_REDRAW
    .union(Signal::NEEDS_REDRAW_LABELS)
    .union(Signal::NEEDS_UPDATE_MARKERS)
    .union(Signal::NEEDS_REDRAW_APPEARANCE)
    .union(Signal::NEED_UPDATE_LEGEND);

/// Appearance, label and marker settings that take precedence over the chart settings for
/// regions of two or more sets.
///
/// Owned by a chart; changes are reported as signals the chart translates into its own
/// invalidation.
#[derive(Debug)]
pub struct Intersections {
    consistency: Consistency,
    settings: StatefulSettings,
}

impl Default for Intersections {
    fn default() -> Self {
        Self::new()
    }
}

impl Intersections {
    /// Creates empty settings; everything falls through to the chart.
    pub fn new() -> Self {
        Self {
            consistency: Consistency::new(ConsistencyState::NONE, INTERSECTIONS_SIGNALS),
            settings: StatefulSettings::default(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &StatefulSettings {
        &self.settings
    }

    /// Settings for a point state.
    pub fn state(&self, state: PointState) -> &StateSettings {
        self.settings.state(state)
    }

    /// Replaces the normal settings.
    pub fn set_normal(&mut self, settings: StateSettings) {
        self.set_state(PointState::NORMAL, settings);
    }

    /// Replaces the hovered settings.
    pub fn set_hovered(&mut self, settings: StateSettings) {
        self.set_state(PointState::HOVER, settings);
    }

    /// Replaces the selected settings.
    pub fn set_selected(&mut self, settings: StateSettings) {
        self.set_state(PointState::SELECT, settings);
    }

    /// Replaces the settings of `state`, signalling what changed.
    pub fn set_state(&mut self, state: PointState, settings: StateSettings) {
        let slot = self.settings.state_mut(state);
        let diff = slot.diff(&settings);
        *slot = settings;

        let normal = state.is_normal();
        let mut signal = Signal::NONE;
        if diff.appearance {
            signal |= Signal::NEEDS_REDRAW_APPEARANCE;
            if normal {
                signal |= Signal::NEED_UPDATE_LEGEND;
            }
        }
        if diff.labels {
            signal |= Signal::NEEDS_REDRAW_LABELS;
        }
        if diff.markers {
            signal |= Signal::NEEDS_UPDATE_MARKERS;
            if normal {
                signal |= Signal::NEED_UPDATE_LEGEND;
            }
        }
        if !signal.is_empty() {
            self.consistency.dispatch_signal(signal | Signal::NEEDS_REDRAW);
        }
    }
}

impl Invalidatable for Intersections {
    fn consistency(&self) -> &Consistency {
        &self.consistency
    }

    fn consistency_mut(&mut self) -> &mut Consistency {
        &mut self.consistency
    }
}
