// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Base state shared by every drawable component.

use kurbo::Rect;

use crate::consistency::{ConsistencyState, Signal};
use crate::invalidation::{Consistency, Invalidatable};

/// Identifier of a target layer a component draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

/// States every [`Visual`] supports.
pub const VISUAL_STATES: ConsistencyState = ConsistencyState::ENABLED
    .union(ConsistencyState::CONTAINER)
    .union(ConsistencyState::Z_INDEX)
    .union(ConsistencyState::BOUNDS);

/// Signals every [`Visual`] supports.
pub const VISUAL_SIGNALS: Signal = Signal::NEEDS_REDRAW
    .union(Signal::BOUNDS_CHANGED)
    .union(Signal::ENABLED_STATE_CHANGED)
    .union(Signal::Z_INDEX_STATE_CHANGED);

/// Enabled flag, paint order, target layer and bounds, with their invalidation rules.
///
/// While disabled, signals are suspended so that settings changed in the meantime are
/// reported once, on re-enable.
#[derive(Debug)]
pub struct Visual {
    consistency: Consistency,
    enabled: bool,
    z_index: i32,
    container: Option<LayerId>,
    bounds: Option<Rect>,
}

impl Visual {
    /// Creates an enabled visual. `states` and `signals` are added to the base sets.
    pub fn new(states: ConsistencyState, signals: Signal) -> Self {
        Self {
            consistency: Consistency::new(VISUAL_STATES | states, VISUAL_SIGNALS | signals),
            enabled: true,
            z_index: 0,
            container: None,
            bounds: None,
        }
    }

    /// Sets the initial paint order.
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Sets the initial target layer.
    pub fn with_container(mut self, container: LayerId) -> Self {
        self.container = Some(container);
        self
    }

    /// Whether the component is drawn.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the component.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.consistency.resume_signals(true);
            self.consistency.invalidate(
                ConsistencyState::ENABLED,
                Signal::NEEDS_REDRAW | Signal::BOUNDS_CHANGED | Signal::ENABLED_STATE_CHANGED,
            );
        } else {
            self.consistency.invalidate(
                ConsistencyState::ENABLED,
                Signal::NEEDS_REDRAW | Signal::BOUNDS_CHANGED | Signal::ENABLED_STATE_CHANGED,
            );
            self.consistency.suspend_signals();
        }
    }

    /// Paint order.
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Sets the paint order.
    pub fn set_z_index(&mut self, z_index: i32) {
        if self.z_index != z_index {
            self.z_index = z_index;
            self.consistency.invalidate(
                ConsistencyState::Z_INDEX,
                Signal::NEEDS_REDRAW | Signal::Z_INDEX_STATE_CHANGED,
            );
        }
    }

    /// Target layer.
    pub fn container(&self) -> Option<LayerId> {
        self.container
    }

    /// Sets the target layer.
    pub fn set_container(&mut self, container: Option<LayerId>) {
        if self.container != container {
            self.container = container;
            self.consistency.invalidate(
                ConsistencyState::CONTAINER | ConsistencyState::BOUNDS,
                Signal::NEEDS_REDRAW,
            );
        }
    }

    /// Pixel bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Sets the pixel bounds.
    pub fn set_bounds(&mut self, bounds: Rect) {
        if self.bounds != Some(bounds) {
            self.bounds = Some(bounds);
            self.consistency.invalidate(
                ConsistencyState::BOUNDS,
                Signal::NEEDS_REDRAW | Signal::BOUNDS_CHANGED,
            );
        }
    }

    /// Decides whether a draw pass has work to do.
    ///
    /// A disabled component calls `remove` once after being disabled and then stays idle. A
    /// component with no container keeps `CONTAINER` dirty and does not draw.
    pub fn check_drawing_needed(&mut self, remove: impl FnOnce()) -> bool {
        if self.consistency.is_consistent() {
            return false;
        }
        if !self.enabled {
            if self.consistency.has_invalidation_state(ConsistencyState::ENABLED) {
                remove();
                self.consistency.mark_consistent(ConsistencyState::ENABLED);
                // Re-attach on the next enabled draw.
                self.consistency
                    .invalidate(ConsistencyState::CONTAINER, Signal::NONE);
            }
            return false;
        }
        if self.container.is_none() {
            log::warn!("draw skipped: component has no container");
            return false;
        }
        self.consistency.mark_consistent(ConsistencyState::ENABLED);
        true
    }
}

impl Invalidatable for Visual {
    fn consistency(&self) -> &Consistency {
        &self.consistency
    }

    fn consistency_mut(&mut self) -> &mut Consistency {
        &mut self.consistency
    }
}

/// Components that render retained output from their dirty state.
pub trait Drawable: Invalidatable {
    /// Redoes the work for every dirty state. Returns `false` if nothing was drawn.
    fn draw(&mut self) -> bool;

    /// Drops all output. The default implementation has nothing to drop.
    fn remove(&mut self) {}
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;
    use crate::invalidation::SignalInbox;

    fn clean_visual() -> (Visual, SignalInbox) {
        let mut v = Visual::new(ConsistencyState::NONE, Signal::NONE).with_container(LayerId(1));
        v.mark_consistent(ConsistencyState::ALL);
        let inbox = SignalInbox::new();
        v.listen_signals(inbox.listener());
        (v, inbox)
    }

    #[test]
    fn first_draw_needs_everything() {
        let mut v = Visual::new(ConsistencyState::NONE, Signal::NONE).with_container(LayerId(0));
        assert!(v.has_invalidation_state(VISUAL_STATES));
        assert!(v.check_drawing_needed(|| {}));
        assert!(!v.has_invalidation_state(ConsistencyState::ENABLED));
    }

    #[test]
    fn setters_invalidate_their_flags() {
        let (mut v, inbox) = clean_visual();
        v.set_z_index(3);
        assert!(v.has_invalidation_state(ConsistencyState::Z_INDEX));
        assert!(inbox.take().contains(Signal::Z_INDEX_STATE_CHANGED));

        v.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(v.has_invalidation_state(ConsistencyState::BOUNDS));
        assert!(inbox.take().contains(Signal::BOUNDS_CHANGED));

        // Same value: nothing happens.
        v.mark_consistent(ConsistencyState::ALL);
        v.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(v.is_consistent());
        assert!(inbox.take().is_empty());
    }

    #[test]
    fn disabling_removes_once_and_defers_signals() {
        let (mut v, inbox) = clean_visual();
        let removed = Rc::new(Cell::new(0));

        v.set_enabled(false);
        assert!(inbox.take().contains(Signal::ENABLED_STATE_CHANGED));
        let r = removed.clone();
        assert!(!v.check_drawing_needed(move || r.set(r.get() + 1)));
        let r = removed.clone();
        assert!(!v.check_drawing_needed(move || r.set(r.get() + 1)));
        assert_eq!(removed.get(), 1);

        v.set_z_index(5);
        assert!(inbox.peek().is_empty(), "signals are held while disabled");

        v.set_enabled(true);
        let signal = inbox.take();
        assert!(signal.contains(Signal::Z_INDEX_STATE_CHANGED));
        assert!(v.check_drawing_needed(|| {}));
    }

    #[test]
    fn missing_container_keeps_it_dirty() {
        let mut v = Visual::new(ConsistencyState::NONE, Signal::NONE);
        assert!(!v.check_drawing_needed(|| {}));
        assert!(v.has_invalidation_state(ConsistencyState::CONTAINER));

        v.set_container(Some(LayerId(2)));
        assert!(v.check_drawing_needed(|| {}));
    }
}
