// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named circle layouts produced by the solver.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Circle, Rect};

/// Solved circles keyed by set name.
///
/// Iteration order is insertion order, so two solutions built from the same input compare and
/// iterate identically.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    entries: Vec<(String, Circle)>,
    index: HashMap<String, usize>,
}

impl Solution {
    /// Creates an empty solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the circle for `name`.
    ///
    /// Replacing keeps the original position in iteration order.
    pub fn insert(&mut self, name: impl Into<String>, circle: Circle) {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            self.entries[i].1 = circle;
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, circle));
        }
    }

    /// Returns the circle for `name`.
    pub fn get(&self, name: &str) -> Option<&Circle> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Returns the position of `name` in iteration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of circles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no circles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, circle)` pairs in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Circle)> + '_ {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Iterates circles in insertion order.
    pub fn circles(&self) -> impl ExactSizeIterator<Item = &Circle> + '_ {
        self.entries.iter().map(|(_, c)| c)
    }

    /// Applies `f` to every circle in place.
    pub fn map_circles(&mut self, mut f: impl FnMut(&str, Circle) -> Circle) {
        for (name, circle) in &mut self.entries {
            *circle = f(name, *circle);
        }
    }

    /// Looks up the circles for a list of set names, or `None` if any name is unknown.
    pub fn circles_for<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Option<Vec<Circle>> {
        names.into_iter().map(|n| self.get(n).copied()).collect()
    }

    /// Union of the circles' bounding boxes, or `None` when empty.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.circles()
            .map(|c| {
                Rect::new(
                    c.center.x - c.radius,
                    c.center.y - c.radius,
                    c.center.x + c.radius,
                    c.center.y + c.radius,
                )
            })
            .reduce(|a, b| a.union(b))
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<S: Into<String>> FromIterator<(S, Circle)> for Solution {
    fn from_iter<T: IntoIterator<Item = (S, Circle)>>(iter: T) -> Self {
        let mut out = Self::new();
        for (name, circle) in iter {
            out.insert(name, circle);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn insertion_order_is_preserved_on_replace() {
        let mut s = Solution::new();
        s.insert("B", Circle::new((0.0, 0.0), 1.0));
        s.insert("A", Circle::new((1.0, 0.0), 1.0));
        s.insert("B", Circle::new((5.0, 5.0), 2.0));
        let names: Vec<_> = s.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(s.get("B").map(|c| c.radius), Some(2.0));
        assert_eq!(s.position("A"), Some(1));
    }

    #[test]
    fn bounding_box_covers_all_circles() {
        let s: Solution = [
            ("A", Circle::new((0.0, 0.0), 1.0)),
            ("B", Circle::new((3.0, 1.0), 2.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(s.bounding_box(), Some(Rect::new(-1.0, -1.0, 5.0, 3.0)));
        assert_eq!(Solution::new().bounding_box(), None);
    }

    #[test]
    fn circles_for_requires_every_name() {
        let s: Solution = [("A", Circle::new((0.0, 0.0), 1.0))].into_iter().collect();
        assert!(s.circles_for(["A"]).is_some());
        assert!(s.circles_for(["A", "Z"]).is_none());
    }
}
