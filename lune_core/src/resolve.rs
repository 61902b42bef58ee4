// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered fallback chains for settings.
//!
//! A setting can be given on a single point, on the state the point is in (hovered or
//! selected), on the normal state, or fall back to a default. A [`Resolution`] lists the
//! candidates in priority order and picks the first one that is present.

use smallvec::SmallVec;

/// Where a resolved value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolveLevel {
    /// Set on the data row itself.
    Point,
    /// Set on the hovered or selected state settings.
    State,
    /// Set on the normal state settings.
    Normal,
    /// Palette or built-in default.
    Default,
}

/// A value together with the level that provided it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved<T> {
    /// The value.
    pub value: T,
    /// The level that provided it.
    pub level: ResolveLevel,
}

/// An ordered list of optional candidates.
#[derive(Clone, Debug)]
pub struct Resolution<T> {
    candidates: SmallVec<[(ResolveLevel, Option<T>); 4]>,
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self {
            candidates: SmallVec::new(),
        }
    }
}

impl<T> Resolution<T> {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate with lower priority than every candidate before it.
    pub fn with(mut self, level: ResolveLevel, value: Option<T>) -> Self {
        self.candidates.push((level, value));
        self
    }

    /// The first present candidate.
    pub fn resolve(self) -> Option<Resolved<T>> {
        self.candidates
            .into_iter()
            .find_map(|(level, value)| value.map(|value| Resolved { value, level }))
    }

    /// The first present candidate's value, or `fallback`.
    pub fn resolve_or(self, fallback: T) -> T {
        self.resolve().map_or(fallback, |r| r.value)
    }
}

/// The first present value in `candidates`.
pub fn first_present<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}
