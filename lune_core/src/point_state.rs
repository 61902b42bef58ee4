// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-point interactive state (normal, hovered, selected).

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Interactive state of one data point. Bits combine: a point can be hovered and selected.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointState(u8);

impl PointState {
    /// No special state.
    pub const NORMAL: Self = Self(0);
    /// Under the pointer.
    pub const HOVER: Self = Self(1);
    /// Selected.
    pub const SELECT: Self = Self(2);

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether this is [`PointState::NORMAL`].
    pub const fn is_normal(self) -> bool {
        self.0 == 0
    }

    const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for PointState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PointState {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PointState {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for PointState {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for PointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("NORMAL"),
            1 => f.write_str("HOVER"),
            2 => f.write_str("SELECT"),
            3 => f.write_str("SELECT | HOVER"),
            other => write!(f, "PointState({other:#x})"),
        }
    }
}

/// Whether `compound` contains `state`.
///
/// `NORMAL` has no bits, so it is only contained in `NORMAL` itself.
pub fn is_state_contains(compound: PointState, state: PointState) -> bool {
    if state.is_normal() {
        compound.is_normal()
    } else {
        (compound & state) != PointState::NORMAL
    }
}

/// Collapses a mixed state to the one that wins visually: `SELECT` over `HOVER`.
pub fn clarify_state(state: PointState) -> PointState {
    let bits = state.0 & (PointState::HOVER.0 | PointState::SELECT.0);
    PointState(bits.min(PointState::SELECT.0))
}

/// Which points a state mutation applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointSelector<'a> {
    /// One point.
    Index(usize),
    /// Several points.
    Indices(&'a [usize]),
    /// Every row currently in the data.
    AllRows,
    /// Every point that currently has a non-normal state.
    AllStored,
}

impl From<usize> for PointSelector<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a [usize]> for PointSelector<'a> {
    fn from(indices: &'a [usize]) -> Self {
        Self::Indices(indices)
    }
}

/// One point whose state changed, with its new state.
pub type PointChange = (usize, PointState);

/// Sparse point states plus a series-level state.
///
/// Points without an entry are `NORMAL`. Mutators return the points whose state actually
/// changed, so the owner can re-apply just those visuals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractivityState {
    row_count: usize,
    // Sorted by index; never holds NORMAL.
    points: Vec<(usize, PointState)>,
    series_state: PointState,
}

impl InteractivityState {
    /// Creates an empty state for `row_count` rows.
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            ..Self::default()
        }
    }

    /// Number of addressable rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Changes the number of rows. States of rows past the end are dropped.
    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.points.retain(|&(i, _)| i < row_count);
    }

    /// State of the point at `index`, `NORMAL` if it has none.
    pub fn point_state(&self, index: usize) -> PointState {
        match self.points.binary_search_by_key(&index, |&(i, _)| i) {
            Ok(pos) => self.points[pos].1,
            Err(_) => PointState::NORMAL,
        }
    }

    /// Series-level state.
    pub fn series_state(&self) -> PointState {
        self.series_state
    }

    /// Indices of the points that have any bit of `state`, ascending.
    pub fn indices_with_state(&self, state: PointState) -> Vec<usize> {
        self.points
            .iter()
            .filter(|&&(_, s)| (s & state) != PointState::NORMAL)
            .map(|&(i, _)| i)
            .collect()
    }

    /// Whether at least one point has any bit of `state`.
    pub fn has_point_state(&self, state: PointState) -> bool {
        self.points
            .iter()
            .any(|&(_, s)| (s & state) != PointState::NORMAL)
    }

    /// Adds `state` to the selected points.
    pub fn add_point_state<'a>(
        &mut self,
        state: PointState,
        selector: impl Into<PointSelector<'a>>,
    ) -> Vec<PointChange> {
        if state.is_normal() {
            return Vec::new();
        }
        let targets = self.resolve(selector.into());
        self.update(&targets, |old| old | state)
    }

    /// Removes `state` from the selected points.
    pub fn remove_point_state<'a>(
        &mut self,
        state: PointState,
        selector: impl Into<PointSelector<'a>>,
    ) -> Vec<PointChange> {
        let targets = self.resolve(selector.into());
        self.update(&targets, |old| old.without(state))
    }

    /// Clears `clear` from the selected points, then adds `state`.
    ///
    /// Without `clear`, setting `NORMAL` resets the points and any other state is added to
    /// what they already have.
    pub fn set_point_state<'a>(
        &mut self,
        state: PointState,
        selector: impl Into<PointSelector<'a>>,
        clear: Option<PointState>,
    ) -> Vec<PointChange> {
        let targets = self.resolve(selector.into());
        match clear {
            Some(clear) => self.update(&targets, |old| old.without(clear) | state),
            None if state.is_normal() => self.update(&targets, |_| PointState::NORMAL),
            None => self.update(&targets, |old| old | state),
        }
    }

    /// Moves the whole series into `state`.
    ///
    /// Hovering (or resetting) the series clears point hovers; selecting it clears point hovers
    /// and selections. A selected series keeps its state until `SELECT` is removed.
    pub fn set_series_state(&mut self, state: PointState) -> Vec<PointChange> {
        if is_state_contains(self.series_state, state) {
            return Vec::new();
        }
        let strip = if state == PointState::SELECT {
            PointState::SELECT | PointState::HOVER
        } else {
            PointState::HOVER
        };
        let changes = self.strip_all(strip);
        if !is_state_contains(self.series_state, PointState::SELECT) {
            self.series_state = state;
        }
        changes
    }

    /// Adds `state` at the series level, clearing it from individual points.
    pub fn add_series_state(&mut self, state: PointState) -> Vec<PointChange> {
        if state.is_normal() || is_state_contains(self.series_state, state) {
            return Vec::new();
        }
        let changes = self.strip_all(state);
        self.series_state |= state;
        changes
    }

    /// Removes `state` from the series and from every point.
    pub fn remove_series_state(&mut self, state: PointState) -> Vec<PointChange> {
        let changes = self.strip_all(state);
        self.series_state = self.series_state.without(state);
        changes
    }

    fn strip_all(&mut self, state: PointState) -> Vec<PointChange> {
        let targets: Vec<usize> = self.points.iter().map(|&(i, _)| i).collect();
        self.update(&targets, |old| old.without(state))
    }

    fn resolve(&self, selector: PointSelector<'_>) -> Vec<usize> {
        match selector {
            PointSelector::Index(i) if i < self.row_count => alloc::vec![i],
            PointSelector::Index(_) => Vec::new(),
            PointSelector::Indices(indices) => {
                let mut out: Vec<usize> = indices
                    .iter()
                    .copied()
                    .filter(|&i| i < self.row_count)
                    .collect();
                out.sort_unstable();
                out.dedup();
                out
            }
            PointSelector::AllRows => (0..self.row_count).collect(),
            PointSelector::AllStored => self.points.iter().map(|&(i, _)| i).collect(),
        }
    }

    fn update(
        &mut self,
        targets: &[usize],
        mut f: impl FnMut(PointState) -> PointState,
    ) -> Vec<PointChange> {
        let mut changes = Vec::new();
        for &index in targets {
            let slot = self.points.binary_search_by_key(&index, |&(i, _)| i);
            let old = match slot {
                Ok(pos) => self.points[pos].1,
                Err(_) => PointState::NORMAL,
            };
            let new = f(old);
            if new == old {
                continue;
            }
            match (slot, new.is_normal()) {
                (Ok(pos), true) => {
                    self.points.remove(pos);
                }
                (Ok(pos), false) => self.points[pos].1 = new,
                (Err(pos), _) => self.points.insert(pos, (index, new)),
            }
            changes.push((index, new));
        }
        changes
    }
}

/// Components whose points carry interactive state.
pub trait PointStateful {
    /// The component's point states.
    fn interactivity(&self) -> &InteractivityState;

    /// Mutable access to the component's point states.
    fn interactivity_mut(&mut self) -> &mut InteractivityState;

    /// Reacts to points whose state changed, typically by invalidating their appearance.
    fn apply_point_changes(&mut self, changes: &[PointChange]);

    /// State of the point at `index`.
    fn point_state(&self, index: usize) -> PointState {
        self.interactivity().point_state(index)
    }

    /// See [`InteractivityState::add_point_state`].
    fn add_point_state<'a>(&mut self, state: PointState, selector: impl Into<PointSelector<'a>>)
    where
        Self: Sized,
    {
        let changes = self.interactivity_mut().add_point_state(state, selector);
        self.apply_point_changes(&changes);
    }

    /// See [`InteractivityState::remove_point_state`].
    fn remove_point_state<'a>(
        &mut self,
        state: PointState,
        selector: impl Into<PointSelector<'a>>,
    ) where
        Self: Sized,
    {
        let changes = self.interactivity_mut().remove_point_state(state, selector);
        self.apply_point_changes(&changes);
    }

    /// See [`InteractivityState::set_point_state`].
    fn set_point_state<'a>(
        &mut self,
        state: PointState,
        selector: impl Into<PointSelector<'a>>,
        clear: Option<PointState>,
    ) where
        Self: Sized,
    {
        let changes = self
            .interactivity_mut()
            .set_point_state(state, selector, clear);
        self.apply_point_changes(&changes);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn unseen_points_are_normal() {
        let s = InteractivityState::new(10);
        assert_eq!(s.point_state(3), PointState::NORMAL);
        assert_eq!(s.point_state(100), PointState::NORMAL);
    }

    #[test]
    fn select_demotes_hover() {
        let mut s = InteractivityState::new(10);
        s.add_point_state(PointState::HOVER, PointSelector::Index(3));
        assert_eq!(s.point_state(3), PointState::HOVER);

        let changes = s.set_point_state(
            PointState::SELECT,
            PointSelector::Index(3),
            Some(PointState::HOVER),
        );
        assert_eq!(changes, vec![(3, PointState::SELECT)]);
        assert_eq!(s.point_state(3), PointState::SELECT);
        assert_eq!(s.point_state(4), PointState::NORMAL);
    }

    #[test]
    fn set_without_clear_adds() {
        let mut s = InteractivityState::new(5);
        s.add_point_state(PointState::HOVER, PointSelector::Index(1));
        s.set_point_state(PointState::SELECT, PointSelector::Index(1), None);
        assert_eq!(s.point_state(1), PointState::SELECT | PointState::HOVER);
        s.set_point_state(PointState::NORMAL, PointSelector::Index(1), None);
        assert_eq!(s.point_state(1), PointState::NORMAL);
    }

    #[test]
    fn reverse_lookup_and_removal() {
        let mut s = InteractivityState::new(10);
        s.add_point_state(PointState::HOVER, PointSelector::Indices(&[5, 1, 7]));
        s.add_point_state(PointState::SELECT, PointSelector::Index(7));
        assert_eq!(s.indices_with_state(PointState::HOVER), vec![1, 5, 7]);
        assert_eq!(s.indices_with_state(PointState::SELECT), vec![7]);

        let changes = s.remove_point_state(PointState::HOVER, PointSelector::AllStored);
        assert_eq!(
            changes,
            vec![
                (1, PointState::NORMAL),
                (5, PointState::NORMAL),
                (7, PointState::SELECT)
            ]
        );
        assert!(!s.has_point_state(PointState::HOVER));
        assert!(s.has_point_state(PointState::SELECT));
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut s = InteractivityState::new(3);
        let changes = s.add_point_state(PointState::HOVER, PointSelector::Indices(&[1, 3, 9]));
        // Rows 3 and 9 do not exist.
        assert_eq!(changes, vec![(1, PointState::HOVER)]);
        assert!(s.add_point_state(PointState::HOVER, PointSelector::Index(3)).is_empty());
    }

    #[test]
    fn unchanged_points_report_nothing() {
        let mut s = InteractivityState::new(3);
        s.add_point_state(PointState::HOVER, PointSelector::Index(0));
        assert!(s.add_point_state(PointState::HOVER, PointSelector::Index(0)).is_empty());
        assert!(s.remove_point_state(PointState::SELECT, PointSelector::Index(0)).is_empty());
    }

    #[test]
    fn shrinking_rows_drops_states() {
        let mut s = InteractivityState::new(5);
        s.add_point_state(PointState::SELECT, PointSelector::AllRows);
        s.set_row_count(2);
        assert_eq!(s.indices_with_state(PointState::SELECT), vec![0, 1]);
    }

    #[test]
    fn series_state_rules() {
        let mut s = InteractivityState::new(4);
        s.add_point_state(PointState::HOVER, PointSelector::Index(0));
        s.add_point_state(PointState::SELECT | PointState::HOVER, PointSelector::Index(1));

        let changes = s.set_series_state(PointState::HOVER);
        assert_eq!(
            changes,
            vec![(0, PointState::NORMAL), (1, PointState::SELECT)]
        );
        assert_eq!(s.series_state(), PointState::HOVER);

        s.set_series_state(PointState::SELECT);
        assert_eq!(s.series_state(), PointState::SELECT);
        assert!(!s.has_point_state(PointState::SELECT));

        // A selected series ignores hover until SELECT is removed.
        s.set_series_state(PointState::HOVER);
        assert_eq!(s.series_state(), PointState::SELECT);
        s.remove_series_state(PointState::SELECT);
        assert_eq!(s.series_state(), PointState::NORMAL);

        s.add_series_state(PointState::HOVER);
        s.add_series_state(PointState::SELECT);
        assert_eq!(s.series_state(), PointState::SELECT | PointState::HOVER);
    }

    #[test]
    fn contains_and_clarify() {
        assert!(is_state_contains(PointState::NORMAL, PointState::NORMAL));
        assert!(!is_state_contains(PointState::HOVER, PointState::NORMAL));
        assert!(!is_state_contains(PointState::NORMAL, PointState::HOVER));
        assert!(is_state_contains(
            PointState::SELECT | PointState::HOVER,
            PointState::HOVER
        ));

        assert_eq!(clarify_state(PointState::NORMAL), PointState::NORMAL);
        assert_eq!(clarify_state(PointState::HOVER), PointState::HOVER);
        assert_eq!(
            clarify_state(PointState::SELECT | PointState::HOVER),
            PointState::SELECT
        );
    }
}
