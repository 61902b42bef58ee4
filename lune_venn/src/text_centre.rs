// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label anchors for Venn regions.
//!
//! A region is described by the circles it lies inside (`interior`) and the circles it must
//! stay out of (`exterior`). Its anchor is the point with the largest margin to every relevant
//! circle boundary.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Circle, Point};

use crate::geometry::{IntersectionStats, centroid, intersection_area};
use crate::layout::SetReflection;
use crate::optimize::{NelderMeadParams, nelder_mead};
use crate::solution::Solution;

/// Where a region's label goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextCentre {
    /// Anchor point.
    pub point: Point,
    /// The region has no area on screen; `point` is a placeholder and should not be drawn.
    pub disjoint: bool,
}

impl TextCentre {
    const DISJOINT: Self = Self {
        point: Point::new(0.0, -1000.0),
        disjoint: true,
    };

    fn at(point: Point) -> Self {
        Self {
            point,
            disjoint: false,
        }
    }
}

/// Smallest signed distance from `point` to the region boundary.
///
/// Positive inside the region (inside every `interior` circle and outside every `exterior`
/// one), negative outside.
pub fn circle_margin(point: Point, interior: &[Circle], exterior: &[Circle]) -> f64 {
    let inside = interior.iter().map(|c| c.radius - c.center.distance(point));
    let outside = exterior.iter().map(|c| c.center.distance(point) - c.radius);
    inside.chain(outside).fold(f64::INFINITY, f64::min)
}

/// For each circle, the indices of the circles that fully contain it.
pub fn containing_circles(circles: &[Circle]) -> Vec<Vec<usize>> {
    let mut out = alloc::vec![Vec::new(); circles.len()];
    for i in 0..circles.len() {
        let a = circles[i];
        for j in i + 1..circles.len() {
            let b = circles[j];
            let d = a.center.distance(b.center);
            if d + b.radius <= a.radius + 1e-10 {
                out[j].push(i);
            } else if d + a.radius <= b.radius + 1e-10 {
                out[i].push(j);
            }
        }
    }
    out
}

/// Anchor for the region inside all of `interior` and outside all of `exterior`.
pub fn compute_text_centre(interior: &[Circle], exterior: &[Circle]) -> TextCentre {
    let Some(first) = interior.first() else {
        return TextCentre::DISJOINT;
    };

    let mut initial = first.center;
    let mut margin = circle_margin(initial, interior, exterior);
    for c in interior {
        let half = c.radius / 2.0;
        let seeds = [
            c.center,
            Point::new(c.center.x + half, c.center.y),
            Point::new(c.center.x - half, c.center.y),
            Point::new(c.center.x, c.center.y + half),
            Point::new(c.center.x, c.center.y - half),
        ];
        for p in seeds {
            let m = circle_margin(p, interior, exterior);
            if m >= margin {
                initial = p;
                margin = m;
            }
        }
    }

    let best = nelder_mead(
        |p| -circle_margin(Point::new(p[0], p[1]), interior, exterior),
        &[initial.x, initial.y],
        &NelderMeadParams::default()
            .with_max_iterations(500)
            .with_convergence(1e-10),
    );
    let point = Point::new(best.x[0], best.x[1]);

    let valid = interior.iter().all(|c| c.center.distance(point) <= c.radius)
        && exterior.iter().all(|c| c.center.distance(point) >= c.radius);
    if valid {
        return TextCentre::at(point);
    }

    if let [only] = interior {
        return TextCentre::at(only.center);
    }
    let mut stats = IntersectionStats::default();
    intersection_area(interior, Some(&mut stats));
    match stats.arcs.as_slice() {
        [] => TextCentre::DISJOINT,
        [arc] => TextCentre::at(arc.circle.center),
        _ if !exterior.is_empty() => compute_text_centre(interior, &[]),
        arcs => TextCentre::at(centroid(arcs.iter().map(|a| a.p1))),
    }
}

/// Anchors for every reflection, in the same order as `reflections`.
///
/// Circles that contain one of a region's sets are not treated as exterior for that region.
/// A reflection naming a set missing from `solution` gets a disjoint anchor.
pub fn compute_text_centres(solution: &Solution, reflections: &[SetReflection]) -> Vec<TextCentre> {
    let circles: Vec<Circle> = solution.circles().copied().collect();
    let containing = containing_circles(&circles);

    reflections
        .iter()
        .map(|reflection| {
            let mut members = Vec::with_capacity(reflection.sets.len());
            for name in &reflection.sets {
                let Some(i) = solution.position(name) else {
                    log::warn!("venn: no circle for set {name:?}");
                    return TextCentre::DISJOINT;
                };
                members.push(i);
            }

            let mut interior = Vec::new();
            let mut exterior = Vec::new();
            for (i, circle) in circles.iter().enumerate() {
                if members.contains(&i) {
                    interior.push(*circle);
                } else if !members.iter().any(|&m| containing[m].contains(&i)) {
                    exterior.push(*circle);
                }
            }

            let centre = compute_text_centre(&interior, &exterior);
            if centre.disjoint && reflection.size > 0.0 {
                let label: Vec<&str> = reflection.sets.iter().map(String::as_str).collect();
                log::warn!("venn: area {label:?} is not represented on screen");
            }
            centre
        })
        .collect()
}
