// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circle overlap geometry.
//!
//! Everything in here is a pure function of its inputs. Circles are plain
//! [`kurbo::Circle`] values in an abstract plane; callers decide whether that plane is the
//! solver's unit space or pixel space.
//!
//! Angles measured around a circle follow the convention `atan2(dx, dy)` (note the swapped
//! arguments), which is what the boundary-arc ordering below relies on.

extern crate alloc;

use alloc::vec::Vec;
use core::f64::consts::PI;

use kurbo::{Arc, BezPath, Circle, Point, Shape, SvgArc, Vec2};
use smallvec::SmallVec;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Tolerance used for containment and degeneracy checks.
pub const DELTA: f64 = 1e-10;

/// A point where two circles cross, tagged with the indices of both circles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionPoint {
    /// Position of the crossing.
    pub point: Point,
    /// Indices (into the input slice) of the two circles that cross here.
    pub parents: [usize; 2],
}

/// One circular arc on the boundary of an intersection region.
///
/// The arc runs from `p2` to `p1` along `circle` in the positive-angle direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryArc {
    /// The circle this arc belongs to.
    pub circle: Circle,
    /// Index of `circle` in the input slice.
    pub circle_index: usize,
    /// Arc end point.
    pub p1: Point,
    /// Arc start point.
    pub p2: Point,
    /// Segment height: distance from the chord midpoint to the arc midpoint.
    pub width: f64,
}

impl BoundaryArc {
    /// Whether the arc spans more than half of its circle.
    pub fn is_large(&self) -> bool {
        self.width > self.circle.radius
    }

    /// Angular span of the arc in radians.
    pub fn sweep_angle(&self) -> f64 {
        let r = self.circle.radius;
        if r <= 0.0 {
            return 0.0;
        }
        let half_chord = 0.5 * self.p1.distance(self.p2);
        let half = (half_chord / r).clamp(-1.0, 1.0);
        // asin via atan2 keeps us inside the float helper set.
        let small = 2.0 * half.atan2((1.0 - half * half).max(0.0).sqrt());
        if self.is_large() { 2.0 * PI - small } else { small }
    }
}

/// Side outputs of [`intersection_area`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntersectionStats {
    /// Total area (`arc_area + polygon_area`).
    pub area: f64,
    /// Sum of the circular segment areas.
    pub arc_area: f64,
    /// Area of the polygon spanned by the inner intersection points.
    pub polygon_area: f64,
    /// Ordered boundary arcs of the region, suitable for rendering.
    pub arcs: Vec<BoundaryArc>,
    /// Pairwise crossings that lie inside every circle.
    pub inner_points: Vec<IntersectionPoint>,
    /// All pairwise crossings.
    pub intersection_points: Vec<IntersectionPoint>,
}

/// Euclidean distance between two circle centres.
pub fn distance(a: &Circle, b: &Circle) -> f64 {
    a.center.distance(b.center)
}

/// Area of the lens formed by two circles whose centres are `d` apart.
///
/// Disjoint circles give `0`; a circle fully contained in the other gives the area of the
/// smaller one.
pub fn circle_overlap(d: f64, r1: f64, r2: f64) -> f64 {
    if d >= r1 + r2 {
        return 0.0;
    }
    if d <= (r1 - r2).abs() {
        let r = r1.min(r2);
        return PI * r * r;
    }
    let w1 = r1 - (d * d - r2 * r2 + r1 * r1) / (2.0 * d);
    let w2 = r2 - (d * d - r1 * r1 + r2 * r2) / (2.0 * d);
    circle_area(r1, w1) + circle_area(r2, w2)
}

fn circle_integral(r: f64, x: f64) -> f64 {
    let y = (r * r - x * x).max(0.0).sqrt();
    x * y + r * r * x.atan2(y)
}

/// Area of the segment of a circle of radius `r` cut at height `width` from its edge.
pub fn circle_area(r: f64, width: f64) -> f64 {
    circle_integral(r, width - r) - circle_integral(r, -r)
}

/// Crossing points of two circles.
///
/// Tangent, coincident, disjoint and nested circles produce no points.
pub fn circle_circle_intersection(a: &Circle, b: &Circle) -> SmallVec<[Point; 2]> {
    let d = distance(a, b);
    let r1 = a.radius;
    let r2 = b.radius;
    let mut out = SmallVec::new();
    if d >= r1 + r2 || d <= (r1 - r2).abs() {
        return out;
    }

    let along = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - along * along).max(0.0).sqrt();
    let delta = b.center - a.center;
    let x0 = a.center.x + along * delta.x / d;
    let y0 = a.center.y + along * delta.y / d;
    let rx = -delta.y * (h / d);
    let ry = -delta.x * (h / d);

    out.push(Point::new(x0 + rx, y0 - ry));
    out.push(Point::new(x0 - rx, y0 + ry));
    out
}

/// Whether `point` lies inside (or on) every circle.
pub fn contained_in_circles(point: Point, circles: &[Circle]) -> bool {
    circles
        .iter()
        .all(|c| point.distance(c.center) <= c.radius + DELTA)
}

/// Every pairwise crossing of `circles`.
pub fn intersection_points(circles: &[Circle]) -> Vec<IntersectionPoint> {
    let mut out = Vec::new();
    for i in 0..circles.len() {
        for j in i + 1..circles.len() {
            for point in circle_circle_intersection(&circles[i], &circles[j]) {
                out.push(IntersectionPoint {
                    point,
                    parents: [i, j],
                });
            }
        }
    }
    out
}

/// Arithmetic mean of a set of points.
pub fn centroid(points: impl IntoIterator<Item = Point>) -> Point {
    let mut sum = Vec2::ZERO;
    let mut n = 0_usize;
    for p in points {
        sum += p.to_vec2();
        n += 1;
    }
    if n == 0 {
        return Point::ZERO;
    }
    (sum / n as f64).to_point()
}

fn around(p: Point, center: Point) -> f64 {
    (p.x - center.x).atan2(p.y - center.y)
}

/// Area of the region shared by all `circles`.
///
/// A single circle yields its own area. When `stats` is provided it receives the ordered
/// boundary arcs of the region, so callers can render the region without a second pass.
pub fn intersection_area(circles: &[Circle], stats: Option<&mut IntersectionStats>) -> f64 {
    let all_points = intersection_points(circles);
    let mut inner: Vec<IntersectionPoint> = all_points
        .iter()
        .copied()
        .filter(|p| contained_in_circles(p.point, circles))
        .collect();

    let mut arc_area = 0.0;
    let mut polygon_area = 0.0;
    let mut arcs = Vec::new();

    if inner.len() > 1 {
        let center = centroid(inner.iter().map(|p| p.point));
        inner.sort_by(|a, b| around(b.point, center).total_cmp(&around(a.point, center)));

        let mut p2 = inner[inner.len() - 1];
        for &p1 in &inner {
            polygon_area += (p2.point.x + p1.point.x) * (p1.point.y - p2.point.y);

            let mid = p1.point.midpoint(p2.point);
            let mut best: Option<BoundaryArc> = None;
            for &index in &p1.parents {
                if !p2.parents.contains(&index) {
                    continue;
                }
                let circle = circles[index];
                let a1 = around(p1.point, circle.center);
                let a2 = around(p2.point, circle.center);
                let mut angle_diff = a2 - a1;
                if angle_diff < 0.0 {
                    angle_diff += 2.0 * PI;
                }
                let a = a2 - angle_diff / 2.0;
                let on_arc = Point::new(
                    circle.center.x + circle.radius * a.sin(),
                    circle.center.y + circle.radius * a.cos(),
                );
                let width = mid.distance(on_arc);
                if best.is_none_or(|arc| arc.width > width) {
                    best = Some(BoundaryArc {
                        circle,
                        circle_index: index,
                        p1: p1.point,
                        p2: p2.point,
                        width,
                    });
                }
            }

            if let Some(arc) = best {
                arc_area += circle_area(arc.circle.radius, arc.width);
                arcs.push(arc);
                p2 = p1;
            }
        }
    } else if let Some((smallest_index, smallest)) = circles
        .iter()
        .copied()
        .enumerate()
        .reduce(|acc, c| if c.1.radius < acc.1.radius { c } else { acc })
    {
        let disjoint = circles
            .iter()
            .any(|c| distance(c, &smallest) > (smallest.radius - c.radius).abs());
        if !disjoint {
            arc_area = smallest.radius * smallest.radius * PI;
            let top = Point::new(smallest.center.x, smallest.center.y + smallest.radius);
            arcs.push(BoundaryArc {
                circle: smallest,
                circle_index: smallest_index,
                p1: top,
                p2: Point::new(top.x - DELTA, top.y),
                width: smallest.radius * 2.0,
            });
        }
    }

    polygon_area /= 2.0;
    let area = arc_area + polygon_area;
    if let Some(stats) = stats {
        *stats = IntersectionStats {
            area,
            arc_area,
            polygon_area,
            arcs,
            inner_points: inner,
            intersection_points: all_points,
        };
    }
    area
}

/// Builds a closed path tracing the boundary arcs produced by [`intersection_area`].
///
/// `tolerance` is the curve flattening tolerance used when converting arcs to Béziers.
/// An empty arc list yields an empty path.
pub fn region_path(arcs: &[BoundaryArc], tolerance: f64) -> BezPath {
    match arcs {
        [] => BezPath::new(),
        [only] => only.circle.path_elements(tolerance).collect(),
        [first, ..] => {
            let mut path = BezPath::new();
            path.move_to(first.p2);
            let mut from = first.p2;
            for arc in arcs {
                let svg = SvgArc {
                    from,
                    to: arc.p1,
                    radii: Vec2::new(arc.circle.radius, arc.circle.radius),
                    x_rotation: 0.0,
                    large_arc: arc.is_large(),
                    sweep: true,
                };
                match Arc::from_svg_arc(&svg) {
                    Some(kurbo_arc) => {
                        for el in kurbo_arc.append_iter(tolerance) {
                            path.push(el);
                        }
                    }
                    None => path.line_to(arc.p1),
                }
                from = arc.p1;
            }
            path.close_path();
            path
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn single_circle_area_is_exact() {
        let c = Circle::new((3.0, -2.0), 2.5);
        let mut stats = IntersectionStats::default();
        let area = intersection_area(&[c], Some(&mut stats));
        assert_eq!(area, PI * 2.5 * 2.5);
        assert_eq!(stats.arcs.len(), 1, "a lone circle is one full arc");
        assert_eq!(stats.arcs[0].circle, c);
    }

    #[test]
    fn overlap_is_symmetric() {
        for &(d, r1, r2) in &[(0.5, 1.0, 2.0), (1.2, 0.7, 1.1), (3.0, 2.0, 1.5), (0.0, 1.0, 1.0)] {
            assert_eq!(
                circle_overlap(d, r1, r2),
                circle_overlap(d, r2, r1),
                "d={d} r1={r1} r2={r2}"
            );
        }
    }

    #[test]
    fn overlap_boundaries() {
        assert_eq!(circle_overlap(3.0, 1.0, 2.0), 0.0);
        assert_eq!(circle_overlap(5.0, 1.0, 2.0), 0.0);
        assert_eq!(circle_overlap(1.0, 1.0, 2.0), PI);
        assert_eq!(circle_overlap(0.2, 3.0, 1.5), PI * 1.5 * 1.5);
    }

    #[test]
    fn lens_area_matches_two_circle_formula() {
        let a = Circle::new((0.0, 0.0), 1.0);
        let b = Circle::new((1.0, 0.0), 1.0);
        let expected = circle_overlap(1.0, 1.0, 1.0);
        // Closed form for two unit circles at distance 1: 2π/3 - √3/2.
        assert!(close(expected, 2.0 * PI / 3.0 - 3_f64.sqrt() / 2.0, 1e-12));

        let mut stats = IntersectionStats::default();
        let area = intersection_area(&[a, b], Some(&mut stats));
        assert!(close(area, expected, 1e-9), "{area} vs {expected}");
        assert_eq!(stats.arcs.len(), 2);
        assert_eq!(stats.inner_points.len(), 2);
    }

    #[test]
    fn disjoint_circles_have_no_region() {
        let a = Circle::new((0.0, 0.0), 1.0);
        let b = Circle::new((5.0, 0.0), 1.0);
        let mut stats = IntersectionStats::default();
        assert_eq!(intersection_area(&[a, b], Some(&mut stats)), 0.0);
        assert!(stats.arcs.is_empty());
        assert!(region_path(&stats.arcs, 0.1).elements().is_empty());
    }

    #[test]
    fn nested_circles_give_smallest_area() {
        let big = Circle::new((0.0, 0.0), 5.0);
        let small = Circle::new((1.0, 1.0), 1.0);
        let mut stats = IntersectionStats::default();
        let area = intersection_area(&[big, small], Some(&mut stats));
        assert!(close(area, PI, 1e-12));
        assert_eq!(stats.arcs.len(), 1);
        assert_eq!(stats.arcs[0].circle_index, 1);
    }

    #[test]
    fn triple_overlap_is_smaller_than_each_pair() {
        let circles = vec![
            Circle::new((0.0, 0.0), 1.0),
            Circle::new((1.0, 0.0), 1.0),
            Circle::new((0.5, 0.8), 1.0),
        ];
        let triple = intersection_area(&circles, None);
        assert!(triple > 0.0);
        for i in 0..3 {
            for j in i + 1..3 {
                let pair = intersection_area(&[circles[i], circles[j]], None);
                assert!(triple < pair, "triple {triple} >= pair {pair}");
            }
        }
    }

    #[test]
    fn lens_path_stays_inside_both_circles() {
        let a = Circle::new((0.0, 0.0), 1.0);
        let b = Circle::new((1.0, 0.0), 1.0);
        let mut stats = IntersectionStats::default();
        intersection_area(&[a, b], Some(&mut stats));
        let bbox = region_path(&stats.arcs, 0.01).bounding_box();
        assert!(bbox.x0 >= -1e-6 && bbox.x1 <= 1.0 + 1e-6, "{bbox:?}");
        assert!(close(bbox.y0, -(0.75_f64.sqrt()), 1e-3), "{bbox:?}");
        assert!(close(bbox.y1, 0.75_f64.sqrt(), 1e-3), "{bbox:?}");
    }

    #[test]
    fn arc_sweep_angles_cover_the_lens() {
        let a = Circle::new((0.0, 0.0), 1.0);
        let b = Circle::new((1.0, 0.0), 1.0);
        let mut stats = IntersectionStats::default();
        intersection_area(&[a, b], Some(&mut stats));
        for arc in &stats.arcs {
            assert!(close(arc.sweep_angle(), 2.0 * PI / 3.0, 1e-9), "{arc:?}");
            assert!(!arc.is_large());
        }
    }
}
