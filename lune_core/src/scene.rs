// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained mark store producing enter/update/exit diffs.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::mark::{Mark, MarkId, MarkPayload};

/// A change between two consecutive ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkDiff {
    /// A new mark.
    Enter {
        /// Mark id.
        id: MarkId,
        /// Paint order.
        z_index: i32,
        /// Content.
        new: Box<MarkPayload>,
    },
    /// An existing mark with different content or paint order.
    Update {
        /// Mark id.
        id: MarkId,
        /// Previous paint order.
        old_z_index: i32,
        /// New paint order.
        new_z_index: i32,
        /// Previous content.
        old: Box<MarkPayload>,
        /// New content.
        new: Box<MarkPayload>,
    },
    /// A mark that is no longer produced.
    Exit {
        /// Mark id.
        id: MarkId,
        /// Last content.
        old: Box<MarkPayload>,
    },
}

impl MarkDiff {
    /// The id this diff is about.
    pub fn id(&self) -> MarkId {
        match self {
            Self::Enter { id, .. } | Self::Update { id, .. } | Self::Exit { id, .. } => *id,
        }
    }
}

/// The marks of the previous tick.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    marks: HashMap<MarkId, (i32, MarkPayload)>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained marks.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Whether the scene holds no marks.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Retained mark by id.
    pub fn get(&self, id: MarkId) -> Option<(i32, &MarkPayload)> {
        self.marks.get(&id).map(|(z, p)| (*z, p))
    }

    /// Replaces the retained marks with `marks` and returns what changed, ordered by id.
    ///
    /// Identical marks produce no diff. If an id repeats, the last mark wins.
    pub fn tick(&mut self, marks: impl IntoIterator<Item = Mark>) -> Vec<MarkDiff> {
        let mut diffs = Vec::new();
        let mut seen = HashSet::new();
        let mut next = HashMap::new();
        for mark in marks {
            seen.insert(mark.id);
            next.insert(mark.id, (mark.z_index, mark.payload));
        }

        for (id, (z_index, payload)) in &next {
            match self.marks.get(id) {
                None => diffs.push(MarkDiff::Enter {
                    id: *id,
                    z_index: *z_index,
                    new: Box::new(payload.clone()),
                }),
                Some((old_z, old)) if old_z != z_index || old != payload => {
                    diffs.push(MarkDiff::Update {
                        id: *id,
                        old_z_index: *old_z,
                        new_z_index: *z_index,
                        old: Box::new(old.clone()),
                        new: Box::new(payload.clone()),
                    });
                }
                Some(_) => {}
            }
        }
        for (id, (_, old)) in self.marks.drain() {
            if !seen.contains(&id) {
                diffs.push(MarkDiff::Exit {
                    id,
                    old: Box::new(old),
                });
            }
        }

        self.marks = next;
        diffs.sort_by_key(MarkDiff::id);
        diffs
    }

    /// Drops every mark, returning exit diffs ordered by id.
    pub fn clear(&mut self) -> Vec<MarkDiff> {
        self.tick(core::iter::empty())
    }
}
