// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical orientation and viewport scaling of a solved layout.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::PI;

use kurbo::{Circle, Point, Rect, Vec2};

use crate::geometry::DELTA;
use crate::solution::Solution;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Default orientation angle: the second circle sits to the right of the first.
pub const DEFAULT_ORIENTATION: f64 = PI / 2.0;

/// Which circle anchors the orientation of a cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrientationOrder {
    /// Largest circle first.
    #[default]
    ByRadius,
    /// Lexicographically smallest set name first.
    BySetName,
}

fn circle_bounds(c: &Circle) -> Rect {
    Rect::new(
        c.center.x - c.radius,
        c.center.y - c.radius,
        c.center.x + c.radius,
        c.center.y + c.radius,
    )
}

fn bounding_box<'a>(circles: impl IntoIterator<Item = &'a Circle>) -> Rect {
    circles
        .into_iter()
        .map(circle_bounds)
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
}

/// Groups circles into clusters of transitively overlapping circles.
///
/// Each cluster lists indices into `circles`; clusters are ordered by their first member.
pub fn disjoint_clusters(circles: &[Circle]) -> Vec<Vec<usize>> {
    fn find(parent: &mut [usize], i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut i = i;
        while parent[i] != root {
            let next = parent[i];
            parent[i] = root;
            i = next;
        }
        root
    }

    let mut parent: Vec<usize> = (0..circles.len()).collect();
    for i in 0..circles.len() {
        for j in i + 1..circles.len() {
            let max_distance = circles[i].radius + circles[j].radius;
            if circles[i].center.distance(circles[j].center) + DELTA < max_distance {
                let root = find(&mut parent, j);
                parent[root] = find(&mut parent, i);
            }
        }
    }

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut slot_of_root = vec![usize::MAX; circles.len()];
    for i in 0..circles.len() {
        let root = find(&mut parent, i);
        if slot_of_root[root] == usize::MAX {
            slot_of_root[root] = clusters.len();
            clusters.push(Vec::new());
        }
        clusters[slot_of_root[root]].push(i);
    }
    clusters
}

/// Translates, rotates and possibly mirrors one cluster in place.
///
/// The anchor circle moves to the origin, the second circle is rotated onto `orientation`,
/// and the third is mirrored onto a fixed side of that axis.
fn orientate(members: &mut [(usize, &str, Circle)], orientation: f64, order: OrientationOrder) {
    match order {
        OrientationOrder::ByRadius => {
            members.sort_by(|a, b| b.2.radius.total_cmp(&a.2.radius));
        }
        OrientationOrder::BySetName => members.sort_by(|a, b| a.1.cmp(b.1)),
    }

    let Some(&(_, _, anchor)) = members.first() else {
        return;
    };
    let shift = anchor.center.to_vec2();
    for m in members.iter_mut() {
        m.2.center -= shift;
    }

    if members.len() > 1 {
        let second = members[1].2.center;
        let rotation = second.x.atan2(second.y) - orientation;
        let (s, c) = (rotation.sin(), rotation.cos());
        for m in members.iter_mut() {
            let Point { x, y } = m.2.center;
            m.2.center = Point::new(c * x - s * y, s * x + c * y);
        }
    }

    if members.len() > 2 {
        let third = members[2].2.center;
        let mut angle = third.x.atan2(third.y) - orientation;
        while angle < 0.0 {
            angle += 2.0 * PI;
        }
        while angle > 2.0 * PI {
            angle -= 2.0 * PI;
        }
        if angle > PI {
            let second = members[1].2.center;
            let slope = second.y / (1e-10 + second.x);
            for m in members.iter_mut() {
                let Point { x, y } = m.2.center;
                let d = (x + slope * y) / (1.0 + slope * slope);
                m.2.center = Point::new(2.0 * d - x, 2.0 * d * slope - y);
            }
        }
    }
}

/// Puts a raw layout into canonical position.
///
/// Disjoint clusters are oriented independently and packed around the largest one (to the
/// right, below, then diagonally), and the result is centred on the origin. The returned
/// solution keeps the input's name order.
pub fn normalize_solution(
    solution: &Solution,
    orientation: f64,
    order: OrientationOrder,
) -> Solution {
    let circles: Vec<Circle> = solution.circles().copied().collect();
    let names: Vec<&str> = solution.iter().map(|(n, _)| n).collect();
    if circles.is_empty() {
        return Solution::new();
    }

    struct Cluster<'a> {
        members: Vec<(usize, &'a str, Circle)>,
        bounds: Rect,
    }

    let mut clusters: Vec<Cluster<'_>> = disjoint_clusters(&circles)
        .into_iter()
        .map(|indices| {
            let mut members: Vec<_> = indices
                .into_iter()
                .map(|i| (i, names[i], circles[i]))
                .collect();
            orientate(&mut members, orientation, order);
            let bounds = bounding_box(members.iter().map(|m| &m.2));
            Cluster { members, bounds }
        })
        .collect();
    clusters.sort_by(|a, b| b.bounds.area().total_cmp(&a.bounds.area()));

    let mut placed: Vec<(usize, Circle)> =
        clusters[0].members.iter().map(|m| (m.0, m.2)).collect();
    let mut return_bounds = clusters[0].bounds;
    let spacing = return_bounds.width() / 50.0;

    let place = |cluster: &Cluster<'_>,
                 right: bool,
                 bottom: bool,
                 rb: Rect,
                 placed: &mut Vec<(usize, Circle)>| {
        let b = cluster.bounds;
        let x_offset = if right {
            rb.x1 - b.x0 + spacing
        } else {
            let centring = b.width() / 2.0 - rb.width() / 2.0;
            rb.x1 - b.x1 + centring.min(0.0)
        };
        let y_offset = if bottom {
            rb.y1 - b.y0 + spacing
        } else {
            let centring = b.height() / 2.0 - rb.height() / 2.0;
            rb.y1 - b.y1 + centring.min(0.0)
        };
        let offset = Vec2::new(x_offset, y_offset);
        for m in &cluster.members {
            placed.push((m.0, Circle::new(m.2.center + offset, m.2.radius)));
        }
    };

    for group in clusters[1..].chunks(3) {
        let sides = [(true, false), (false, true), (true, true)];
        for (cluster, (right, bottom)) in group.iter().zip(sides) {
            place(cluster, right, bottom, return_bounds, &mut placed);
        }
        return_bounds = bounding_box(placed.iter().map(|(_, c)| c));
    }

    let centre = bounding_box(placed.iter().map(|(_, c)| c)).center().to_vec2();
    let mut out = vec![Circle::new(Point::ZERO, 0.0); circles.len()];
    for (i, c) in placed {
        out[i] = Circle::new(c.center - centre, c.radius);
    }
    names.into_iter().zip(out).collect()
}

/// Maps a solution into a `width` x `height` viewport with `padding` on every side.
///
/// Scaling is uniform, so circles stay circles; the layout is centred along the axis with
/// spare room.
pub fn scale_solution(solution: &Solution, width: f64, height: f64, padding: f64) -> Solution {
    let Some(bounds) = solution.bounding_box() else {
        return Solution::new();
    };
    let width = width - 2.0 * padding;
    let height = height - 2.0 * padding;

    let x_scaling = width / bounds.width();
    let y_scaling = height / bounds.height();
    let mut scaling = x_scaling.min(y_scaling);
    if !scaling.is_finite() || scaling < 0.0 {
        scaling = 0.0;
    }
    let x_offset = (width - bounds.width() * scaling) / 2.0;
    let y_offset = (height - bounds.height() * scaling) / 2.0;

    let mut scaled = solution.clone();
    scaled.map_circles(|_, c| {
        Circle::new(
            (
                padding + x_offset + (c.center.x - bounds.x0) * scaling,
                padding + y_offset + (c.center.y - bounds.y0) * scaling,
            ),
            c.radius * scaling,
        )
    });
    scaled
}
