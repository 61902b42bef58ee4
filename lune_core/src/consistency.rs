// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-flag and signal bitmasks.
//!
//! Both types are plain `u32` newtypes. Flags are independent: setting or clearing one never
//! touches another.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

macro_rules! bit_set {
    ($ty:ident) => {
        impl $ty {
            /// No bits.
            pub const NONE: Self = Self(0);
            /// Every bit.
            pub const ALL: Self = Self(u32::MAX);

            /// Builds a value from raw bits.
            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }

            /// Raw bits.
            pub const fn bits(self) -> u32 {
                self.0
            }

            /// Whether no bit is set.
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Whether every bit of `other` is set in `self`.
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Whether `self` and `other` share at least one bit.
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// Union.
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// `self` without the bits of `other`.
            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }
        }

        impl BitOr for $ty {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $ty {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $ty {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl BitAndAssign for $ty {
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0;
            }
        }

        impl Not for $ty {
            type Output = Self;

            fn not(self) -> Self {
                Self(!self.0)
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(", stringify!($ty))?;
                let mut rest = self.0;
                let mut first = true;
                for &(name, bits) in Self::NAMES {
                    if bits != 0 && rest & bits == bits {
                        if !first {
                            f.write_str(" | ")?;
                        }
                        f.write_str(name)?;
                        rest &= !bits;
                        first = false;
                    }
                }
                if rest != 0 {
                    if !first {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{rest:#x}")?;
                }
                f.write_str(")")
            }
        }
    };
}

/// Dirty flags of a visual component.
///
/// A flag is set by any mutator whose change affects a drawing phase and is cleared only by
/// the draw pass that redid the corresponding work.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConsistencyState(u32);

bit_set!(ConsistencyState);

impl ConsistencyState {
    /// Enabled state changed.
    pub const ENABLED: Self = Self(1 << 0);
    /// Container (target layer) changed.
    pub const CONTAINER: Self = Self(1 << 1);
    /// Paint order changed.
    pub const Z_INDEX: Self = Self(1 << 2);
    /// Colors, strokes or hatches need reapplying.
    pub const APPEARANCE: Self = Self(1 << 3);
    /// Pixel bounds changed; geometry needs recomputing.
    pub const BOUNDS: Self = Self(1 << 4);
    /// Background needs redrawing.
    pub const BACKGROUND: Self = Self(1 << 5);
    /// Input data changed.
    pub const DATA: Self = Self(1 << 6);
    /// Title needs redrawing.
    pub const TITLE: Self = Self(1 << 7);
    /// Fill palette changed.
    pub const PALETTE: Self = Self(1 << 8);
    /// Markers need redrawing.
    pub const MARKERS: Self = Self(1 << 9);
    /// Labels need redrawing.
    pub const LABELS: Self = Self(1 << 10);
    /// Legend items changed.
    pub const LEGEND: Self = Self(1 << 11);
    /// Position changed without a size change.
    pub const POSITION: Self = Self(1 << 12);
    /// Hover state needs reapplying.
    pub const HOVER: Self = Self(1 << 13);
    /// Chart-level labels changed.
    pub const CHART_LABELS: Self = Self(1 << 14);
    /// Hatch fill palette changed.
    pub const HATCH_FILL_PALETTE: Self = Self(1 << 15);
    /// Marker palette changed.
    pub const MARKER_PALETTE: Self = Self(1 << 16);

    const COMPONENT_SHIFT: u32 = 20;

    /// Number of bits reserved for component-specific flags.
    pub const COMPONENT_BITS: u32 = 32 - Self::COMPONENT_SHIFT;

    /// A component-specific flag.
    ///
    /// Different component types may reuse the same component bits for unrelated meanings;
    /// they never collide with the shared flags above.
    pub const fn component(bit: u32) -> Self {
        assert!(bit < Self::COMPONENT_BITS, "component flag out of range");
        Self(1 << (Self::COMPONENT_SHIFT + bit))
    }

    const NAMES: &'static [(&'static str, u32)] = &[
        ("ENABLED", Self::ENABLED.0),
        ("CONTAINER", Self::CONTAINER.0),
        ("Z_INDEX", Self::Z_INDEX.0),
        ("APPEARANCE", Self::APPEARANCE.0),
        ("BOUNDS", Self::BOUNDS.0),
        ("BACKGROUND", Self::BACKGROUND.0),
        ("DATA", Self::DATA.0),
        ("TITLE", Self::TITLE.0),
        ("PALETTE", Self::PALETTE.0),
        ("MARKERS", Self::MARKERS.0),
        ("LABELS", Self::LABELS.0),
        ("LEGEND", Self::LEGEND.0),
        ("POSITION", Self::POSITION.0),
        ("HOVER", Self::HOVER.0),
        ("CHART_LABELS", Self::CHART_LABELS.0),
        ("HATCH_FILL_PALETTE", Self::HATCH_FILL_PALETTE.0),
        ("MARKER_PALETTE", Self::MARKER_PALETTE.0),
    ];
}

/// Outward notifications describing what changed, independent of dirty-flag bookkeeping.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signal(u32);

bit_set!(Signal);

impl Signal {
    /// The listener should redraw.
    pub const NEEDS_REDRAW: Self = Self(1 << 0);
    /// Settings need to be reapplied.
    pub const NEEDS_REAPPLICATION: Self = Self(1 << 1);
    /// Derived values need recomputing.
    pub const NEEDS_RECALCULATION: Self = Self(1 << 2);
    /// Bounds changed.
    pub const BOUNDS_CHANGED: Self = Self(1 << 3);
    /// Data changed.
    pub const DATA_CHANGED: Self = Self(1 << 4);
    /// Per-row annotations changed.
    pub const META_CHANGED: Self = Self(1 << 5);
    /// Legend items need rebuilding.
    pub const NEED_UPDATE_LEGEND: Self = Self(1 << 6);
    /// Labels need redrawing.
    pub const NEEDS_REDRAW_LABELS: Self = Self(1 << 12);
    /// Appearance needs reapplying.
    pub const NEEDS_REDRAW_APPEARANCE: Self = Self(1 << 13);
    /// Tooltip content changed.
    pub const NEEDS_UPDATE_TOOLTIP: Self = Self(1 << 14);
    /// Enabled state changed.
    pub const ENABLED_STATE_CHANGED: Self = Self(1 << 15);
    /// Paint order changed.
    pub const Z_INDEX_STATE_CHANGED: Self = Self(1 << 16);
    /// Markers need redrawing.
    pub const NEEDS_UPDATE_MARKERS: Self = Self(1 << 18);

    const NAMES: &'static [(&'static str, u32)] = &[
        ("NEEDS_REDRAW", Self::NEEDS_REDRAW.0),
        ("NEEDS_REAPPLICATION", Self::NEEDS_REAPPLICATION.0),
        ("NEEDS_RECALCULATION", Self::NEEDS_RECALCULATION.0),
        ("BOUNDS_CHANGED", Self::BOUNDS_CHANGED.0),
        ("DATA_CHANGED", Self::DATA_CHANGED.0),
        ("META_CHANGED", Self::META_CHANGED.0),
        ("NEED_UPDATE_LEGEND", Self::NEED_UPDATE_LEGEND.0),
        ("NEEDS_REDRAW_LABELS", Self::NEEDS_REDRAW_LABELS.0),
        ("NEEDS_REDRAW_APPEARANCE", Self::NEEDS_REDRAW_APPEARANCE.0),
        ("NEEDS_UPDATE_TOOLTIP", Self::NEEDS_UPDATE_TOOLTIP.0),
        ("ENABLED_STATE_CHANGED", Self::ENABLED_STATE_CHANGED.0),
        ("Z_INDEX_STATE_CHANGED", Self::Z_INDEX_STATE_CHANGED.0),
        ("NEEDS_UPDATE_MARKERS", Self::NEEDS_UPDATE_MARKERS.0),
    ];
}

/// One dispatched signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalEvent {
    /// What changed.
    pub signal: Signal,
}

impl SignalEvent {
    /// Whether any of `signal`'s bits were dispatched.
    pub fn has_signal(&self, signal: Signal) -> bool {
        self.signal.intersects(signal)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;

    use super::*;

    #[test]
    fn component_bits_do_not_overlap_shared_flags() {
        let shared = ConsistencyState::ENABLED
            | ConsistencyState::CONTAINER
            | ConsistencyState::Z_INDEX
            | ConsistencyState::APPEARANCE
            | ConsistencyState::BOUNDS
            | ConsistencyState::BACKGROUND
            | ConsistencyState::DATA
            | ConsistencyState::TITLE
            | ConsistencyState::PALETTE
            | ConsistencyState::MARKERS
            | ConsistencyState::LABELS
            | ConsistencyState::LEGEND
            | ConsistencyState::POSITION
            | ConsistencyState::HOVER
            | ConsistencyState::CHART_LABELS
            | ConsistencyState::HATCH_FILL_PALETTE
            | ConsistencyState::MARKER_PALETTE;
        for bit in 0..ConsistencyState::COMPONENT_BITS {
            assert!(!shared.intersects(ConsistencyState::component(bit)), "bit {bit}");
        }
    }

    #[test]
    fn set_operations() {
        let a = ConsistencyState::DATA | ConsistencyState::BOUNDS;
        assert!(a.contains(ConsistencyState::DATA));
        assert!(!a.contains(ConsistencyState::DATA | ConsistencyState::LABELS));
        assert!(a.intersects(ConsistencyState::DATA | ConsistencyState::LABELS));
        assert_eq!(a.difference(ConsistencyState::DATA), ConsistencyState::BOUNDS);
        assert_eq!(a & !ConsistencyState::BOUNDS, ConsistencyState::DATA);
    }

    #[test]
    fn debug_lists_flag_names() {
        let s = format!("{:?}", Signal::NEEDS_REDRAW | Signal::BOUNDS_CHANGED);
        assert_eq!(s, "Signal(NEEDS_REDRAW | BOUNDS_CHANGED)");
        let s = format!("{:?}", ConsistencyState::component(0));
        assert_eq!(s, "ConsistencyState(0x100000)");
    }
}
