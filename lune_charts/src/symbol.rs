// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Symbol shapes for markers and legend icons.

use kurbo::{BezPath, Circle, Shape};

/// Marker and legend icon shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A square (axis-aligned).
    Square,
    /// A circle.
    Circle,
    /// A square rotated by 45 degrees.
    Diamond,
    /// A triangle pointing up.
    TriangleUp,
    /// A triangle pointing down.
    TriangleDown,
    /// A plus-shaped cross.
    Cross,
}

impl Symbol {
    /// Returns a path for this symbol centered at `cx, cy`, using `size` as the diameter/side.
    pub fn path(self, cx: f64, cy: f64, size: f64) -> BezPath {
        let half = size * 0.5;
        match self {
            Self::Square => polygon(&[
                (cx - half, cy - half),
                (cx + half, cy - half),
                (cx + half, cy + half),
                (cx - half, cy + half),
            ]),
            Self::Circle => {
                // Flattening tolerance for symbol-sized circles.
                let tolerance = 0.1;
                Circle::new((cx, cy), half).path_elements(tolerance).collect()
            }
            Self::Diamond => polygon(&[
                (cx, cy - half),
                (cx + half, cy),
                (cx, cy + half),
                (cx - half, cy),
            ]),
            Self::TriangleUp => polygon(&[
                (cx, cy - half),
                (cx + half, cy + half),
                (cx - half, cy + half),
            ]),
            Self::TriangleDown => polygon(&[
                (cx - half, cy - half),
                (cx + half, cy - half),
                (cx, cy + half),
            ]),
            Self::Cross => {
                let arm = size / 6.0;
                polygon(&[
                    (cx - arm, cy - half),
                    (cx + arm, cy - half),
                    (cx + arm, cy - arm),
                    (cx + half, cy - arm),
                    (cx + half, cy + arm),
                    (cx + arm, cy + arm),
                    (cx + arm, cy + half),
                    (cx - arm, cy + half),
                    (cx - arm, cy + arm),
                    (cx - half, cy + arm),
                    (cx - half, cy - arm),
                    (cx - arm, cy - arm),
                ])
            }
        }
    }
}

fn polygon(points: &[(f64, f64)]) -> BezPath {
    let mut p = BezPath::new();
    let mut iter = points.iter();
    if let Some(&first) = iter.next() {
        p.move_to(first);
        for &pt in iter {
            p.line_to(pt);
        }
        p.close_path();
    }
    p
}
