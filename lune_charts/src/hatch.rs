// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hatch line generation clipped to a circle intersection.

use core::f64::consts::FRAC_1_SQRT_2;

use kurbo::{BezPath, Circle, Rect, Vec2};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::settings::{HatchFill, HatchKind};

// Guards against pathological spacing on huge regions.
const MAX_LINES: usize = 4096;

fn directions(kind: HatchKind) -> &'static [Vec2] {
    const H: Vec2 = Vec2::new(1.0, 0.0);
    const V: Vec2 = Vec2::new(0.0, 1.0);
    const FWD: Vec2 = Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2);
    const BWD: Vec2 = Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
    match kind {
        HatchKind::Horizontal => &[H],
        HatchKind::Vertical => &[V],
        HatchKind::ForwardDiagonal => &[FWD],
        HatchKind::BackwardDiagonal => &[BWD],
        HatchKind::Cross => &[H, V],
        HatchKind::DiagonalCross => &[FWD, BWD],
    }
}

/// Hatch segments covering the region inside every circle of `circles`.
///
/// Lines are anchored at the scene origin so neighbouring regions line up.
pub(crate) fn hatch_path(fill: &HatchFill, circles: &[Circle]) -> BezPath {
    let mut path = BezPath::new();
    if fill.spacing.is_nan() || fill.spacing <= 0.0 {
        return path;
    }
    let Some(bounds) = circles
        .iter()
        .map(|c| Rect::from_center_size(c.center, (2.0 * c.radius, 2.0 * c.radius)))
        .reduce(|a, b| a.intersect(b))
    else {
        return path;
    };
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return path;
    }

    let mut emitted = 0;
    for &dir in directions(fill.kind) {
        let normal = Vec2::new(-dir.y, dir.x);
        let corners = [
            Vec2::new(bounds.x0, bounds.y0),
            Vec2::new(bounds.x1, bounds.y0),
            Vec2::new(bounds.x0, bounds.y1),
            Vec2::new(bounds.x1, bounds.y1),
        ];
        let (lo, hi) = corners.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            let d = c.dot(normal);
            (lo.min(d), hi.max(d))
        });
        let first = (lo / fill.spacing).ceil() as i64;
        let last = (hi / fill.spacing).floor() as i64;
        for k in first..=last {
            if emitted >= MAX_LINES {
                log::warn!("hatch: line budget exhausted, pattern truncated");
                return path;
            }
            let origin = normal * (k as f64 * fill.spacing);
            if let Some((t0, t1)) = clip_line(origin, dir, circles) {
                path.move_to((origin + dir * t0).to_point());
                path.line_to((origin + dir * t1).to_point());
                emitted += 1;
            }
        }
    }
    path
}

/// Parameter interval of `origin + t * dir` that lies inside every circle.
fn clip_line(origin: Vec2, dir: Vec2, circles: &[Circle]) -> Option<(f64, f64)> {
    let mut t0 = f64::NEG_INFINITY;
    let mut t1 = f64::INFINITY;
    for c in circles {
        let q = origin - c.center.to_vec2();
        let b = q.dot(dir);
        let disc = b * b - (q.hypot2() - c.radius * c.radius);
        if disc <= 0.0 {
            return None;
        }
        let root = disc.sqrt();
        t0 = t0.max(-b - root);
        t1 = t1.min(-b + root);
        if t1 <= t0 {
            return None;
        }
    }
    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use kurbo::{PathEl, Point};

    use super::*;

    fn segments(path: &BezPath) -> alloc::vec::Vec<(Point, Point)> {
        let mut out = alloc::vec::Vec::new();
        let mut start = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => start = p,
                PathEl::LineTo(p) => out.push((start, p)),
                _ => panic!("hatch paths only contain lines"),
            }
        }
        out
    }

    #[test]
    fn horizontal_lines_stay_inside_the_lens() {
        let circles = [
            Circle::new((0.0, 0.0), 10.0),
            Circle::new((12.0, 0.0), 10.0),
        ];
        let fill = HatchFill::new(HatchKind::Horizontal).with_spacing(2.0);
        let segs = segments(&hatch_path(&fill, &circles));
        assert!(!segs.is_empty(), "the lens is hatched");
        for (a, b) in segs {
            assert!((a.y - b.y).abs() < 1e-9, "horizontal");
            for p in [a, b] {
                for c in &circles {
                    assert!(
                        p.distance(c.center) <= c.radius + 1e-6,
                        "{p:?} outside {c:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn disjoint_circles_produce_nothing() {
        let circles = [
            Circle::new((0.0, 0.0), 5.0),
            Circle::new((20.0, 0.0), 5.0),
        ];
        let fill = HatchFill::new(HatchKind::Cross);
        assert!(hatch_path(&fill, &circles).elements().is_empty());
        assert!(
            hatch_path(&fill.clone().with_spacing(0.0), &circles[..1])
                .elements()
                .is_empty(),
            "zero spacing draws nothing"
        );
    }
}
