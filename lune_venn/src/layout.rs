// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Area-proportional circle layout.
//!
//! Given the sizes of a handful of sets and of their intersections, [`venn`] places one circle
//! per set so that pairwise and higher-order overlaps approximate the requested areas.
//! Radii are fixed by the set sizes; only centres move.
//!
//! The solver runs in three stages:
//! 1. every unspecified pair of sets gets an explicit zero-size intersection,
//! 2. an initial layout is produced greedily (or by constrained MDS for larger inputs),
//! 3. Nelder–Mead refines all centres against the weighted squared overlap error.
//!
//! Input is canonicalized first, so any permutation of the same reflections produces an
//! identical [`Solution`].

extern crate alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::f64::consts::PI;

use hashbrown::{HashMap, HashSet};
use kurbo::{Circle, Point};
use smallvec::SmallVec;

use crate::geometry::{DELTA, circle_circle_intersection, circle_overlap, intersection_area};
use crate::optimize::{
    BisectParams, ConjugateGradientParams, GradientPoint, NelderMeadParams, bisect,
    conjugate_gradient, nelder_mead,
};
use crate::solution::Solution;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// One solver input: a set (one name) or an intersection (several names) with a target size.
#[derive(Clone, Debug, PartialEq)]
pub struct SetReflection {
    /// Set names. One name is a base circle; more names request an intersection.
    pub sets: SmallVec<[String; 2]>,
    /// Target area.
    pub size: f64,
    /// Loss weight of this reflection.
    pub weight: f64,
    /// Index of the data row this reflection came from.
    pub source_index: Option<usize>,
}

impl SetReflection {
    /// Creates a reflection with unit weight and no source row.
    pub fn new<S: Into<String>>(sets: impl IntoIterator<Item = S>, size: f64) -> Self {
        Self {
            sets: sets.into_iter().map(Into::into).collect(),
            size,
            weight: 1.0,
            source_index: None,
        }
    }

    /// Sets the loss weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the originating row.
    pub fn with_source_index(mut self, index: usize) -> Self {
        self.source_index = Some(index);
        self
    }

    /// Whether this reflection describes a single set.
    pub fn is_single(&self) -> bool {
        self.sets.len() == 1
    }

    fn sorted_names(&self) -> SmallVec<[&str; 4]> {
        let mut names: SmallVec<[&str; 4]> = self.sets.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// How the solver seeds circle positions before refinement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitialLayout {
    /// Greedy, switching to constrained MDS for 8+ areas when that scores better.
    #[default]
    Best,
    /// Place sets one at a time, most overlapped first.
    Greedy,
    /// Multidimensional scaling on the target pair distances.
    ConstrainedMds,
}

/// Solver options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    /// Nelder–Mead iteration cap for the refinement stage.
    pub max_iterations: usize,
    /// Number of constrained-MDS starting points.
    pub restarts: usize,
    /// Seeding strategy.
    pub initial_layout: InitialLayout,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            restarts: 10,
            initial_layout: InitialLayout::Best,
        }
    }
}

impl LayoutParams {
    /// Sets the refinement iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the number of constrained-MDS restarts.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Sets the seeding strategy.
    pub fn with_initial_layout(mut self, initial_layout: InitialLayout) -> Self {
        self.initial_layout = initial_layout;
        self
    }
}

/// Area-preserving radius for a set of the given size.
pub fn radius_for_size(size: f64) -> f64 {
    (size / PI).sqrt()
}

/// Returns `reflections` plus a zero-size pair for every two sets whose intersection was not
/// requested.
pub fn add_missing_areas(reflections: &[SetReflection]) -> Vec<SetReflection> {
    let mut out = reflections.to_vec();
    let mut ids: Vec<&str> = Vec::new();
    let mut pairs: HashSet<(&str, &str)> = HashSet::new();
    for r in reflections {
        match r.sets.as_slice() {
            [single] => ids.push(single.as_str()),
            [a, b] => {
                pairs.insert((a.as_str(), b.as_str()));
                pairs.insert((b.as_str(), a.as_str()));
            }
            _ => {}
        }
    }
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            if !pairs.contains(&(*a, *b)) {
                out.push(SetReflection::new([*a, *b], 0.0));
            }
        }
    }
    out
}

/// Distance between centres of circles `r1`, `r2` whose overlap is `overlap`.
pub fn distance_from_intersect_area(r1: f64, r2: f64, overlap: f64) -> f64 {
    let min = r1.min(r2);
    if min * min * PI <= overlap + DELTA {
        return (r1 - r2).abs();
    }
    bisect(
        |d| circle_overlap(d, r1, r2) - overlap,
        0.0,
        r1 + r2,
        BisectParams::default(),
    )
    .unwrap_or(r1 + r2)
}

#[derive(Clone, Debug)]
struct Area {
    sets: SmallVec<[usize; 4]>,
    size: f64,
    weight: f64,
}

/// Index-based view of the input used by every solver stage.
#[derive(Clone, Debug)]
struct Problem {
    names: Vec<String>,
    sizes: Vec<f64>,
    radii: Vec<f64>,
    /// Multi-set areas, including the zero-size pairs added for missing intersections.
    areas: Vec<Area>,
}

fn canonical_order(a: &SetReflection, b: &SetReflection) -> Ordering {
    a.sets
        .len()
        .cmp(&b.sets.len())
        .then_with(|| a.sorted_names().cmp(&b.sorted_names()))
}

impl Problem {
    fn new(reflections: &[SetReflection]) -> Self {
        let mut sorted: Vec<&SetReflection> = reflections.iter().collect();
        sorted.sort_by(|a, b| canonical_order(a, b));

        let mut names = Vec::new();
        let mut sizes = Vec::new();
        let mut ids: HashMap<&str, usize> = HashMap::new();
        for r in sorted.iter().filter(|r| r.is_single()) {
            let name = r.sets[0].as_str();
            if r.size.is_nan() || r.size <= 0.0 {
                log::warn!("venn: set {name:?} has non-positive size {}, skipped", r.size);
                continue;
            }
            if ids.contains_key(name) {
                log::warn!("venn: duplicate set {name:?}, keeping the first");
                continue;
            }
            ids.insert(name, names.len());
            names.push(String::from(name));
            sizes.push(r.size);
        }

        let mut areas = Vec::new();
        let mut pairs: HashSet<(usize, usize)> = HashSet::new();
        for r in sorted.iter().filter(|r| !r.is_single()) {
            let sorted_names = r.sorted_names();
            if sorted_names.len() < 2 || r.size.is_nan() {
                continue;
            }
            let Some(sets) = sorted_names
                .iter()
                .map(|n| ids.get(n).copied())
                .collect::<Option<SmallVec<[usize; 4]>>>()
            else {
                log::warn!("venn: intersection {:?} references an unknown set, skipped", r.sets);
                continue;
            };
            if let [a, b] = sets.as_slice() {
                pairs.insert((*a.min(b), *a.max(b)));
            }
            areas.push(Area {
                sets,
                size: r.size.max(0.0),
                weight: r.weight,
            });
        }

        for a in 0..names.len() {
            for b in a + 1..names.len() {
                if !pairs.contains(&(a, b)) {
                    areas.push(Area {
                        sets: SmallVec::from_slice(&[a, b]),
                        size: 0.0,
                        weight: 1.0,
                    });
                }
            }
        }

        let radii = sizes.iter().map(|&s| radius_for_size(s)).collect();
        Self {
            names,
            sizes,
            radii,
            areas,
        }
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn circle(&self, centres: &[f64], i: usize) -> Circle {
        Circle::new((centres[2 * i], centres[2 * i + 1]), self.radii[i])
    }

    /// Weighted squared overlap error at `centres` (flattened `x, y` pairs).
    fn loss(&self, centres: &[f64], pairs_only: bool) -> f64 {
        let mut out = 0.0;
        for area in &self.areas {
            let overlap = match area.sets.as_slice() {
                [a, b] => {
                    let ca = self.circle(centres, *a);
                    let cb = self.circle(centres, *b);
                    circle_overlap(ca.center.distance(cb.center), ca.radius, cb.radius)
                }
                _ if pairs_only => continue,
                sets => {
                    let circles: SmallVec<[Circle; 4]> =
                        sets.iter().map(|&i| self.circle(centres, i)).collect();
                    intersection_area(&circles, None)
                }
            };
            out += area.weight * (overlap - area.size) * (overlap - area.size);
        }
        out
    }

    fn pairs(&self) -> impl Iterator<Item = (usize, usize, &Area)> + '_ {
        self.areas.iter().filter_map(|a| match a.sets.as_slice() {
            [l, r] => Some((*l, *r, a)),
            _ => None,
        })
    }

    fn greedy(&self) -> Vec<f64> {
        let n = self.len();
        let mut centres = vec![1e10; 2 * n];
        if n == 0 {
            return centres;
        }

        let mut overlaps: Vec<Vec<(usize, f64, f64)>> = vec![Vec::new(); n];
        for (l, r, area) in self.pairs() {
            let weight = if area.size + DELTA >= self.sizes[l].min(self.sizes[r]) {
                0.0
            } else {
                area.weight
            };
            overlaps[l].push((r, area.size, weight));
            overlaps[r].push((l, area.size, weight));
        }

        let mut most_overlapped: Vec<(usize, f64)> = overlaps
            .iter()
            .enumerate()
            .map(|(i, o)| (i, o.iter().map(|(_, size, weight)| size * weight).sum()))
            .collect();
        most_overlapped.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut positioned = vec![false; n];
        let first = most_overlapped[0].0;
        centres[2 * first] = 0.0;
        centres[2 * first + 1] = 0.0;
        positioned[first] = true;

        for &(set, _) in &most_overlapped[1..] {
            let mut overlap: Vec<(usize, f64)> = overlaps[set]
                .iter()
                .filter(|(other, _, _)| positioned[*other])
                .map(|&(other, size, _)| (other, size))
                .collect();
            overlap.sort_by(|a, b| b.1.total_cmp(&a.1));

            let mut points: Vec<Point> = Vec::new();
            for (j, &(other, size)) in overlap.iter().enumerate() {
                let p1 = self.circle(&centres, other);
                let d1 = distance_from_intersect_area(self.radii[set], p1.radius, size);
                points.extend([
                    Point::new(p1.center.x + d1, p1.center.y),
                    Point::new(p1.center.x - d1, p1.center.y),
                    Point::new(p1.center.x, p1.center.y + d1),
                    Point::new(p1.center.x, p1.center.y - d1),
                ]);
                for &(other2, size2) in &overlap[j + 1..] {
                    let p2 = self.circle(&centres, other2);
                    let d2 = distance_from_intersect_area(self.radii[set], p2.radius, size2);
                    points.extend(circle_circle_intersection(
                        &Circle::new(p1.center, d1),
                        &Circle::new(p2.center, d2),
                    ));
                }
            }
            if points.is_empty() {
                points.push(Point::ZERO);
            }

            let mut best_loss = 1e50;
            let mut best_point = points[0];
            for &p in &points {
                centres[2 * set] = p.x;
                centres[2 * set + 1] = p.y;
                let loss = self.loss(&centres, true);
                if loss < best_loss {
                    best_loss = loss;
                    best_point = p;
                }
            }
            centres[2 * set] = best_point.x;
            centres[2 * set + 1] = best_point.y;
            positioned[set] = true;
        }
        centres
    }

    fn constrained_mds(&self, restarts: usize) -> Vec<f64> {
        let n = self.len();
        let mut distances = vec![vec![0.0; n]; n];
        let mut constraints = vec![vec![0.0; n]; n];
        for (l, r, area) in self.pairs() {
            let d = distance_from_intersect_area(self.radii[l], self.radii[r], area.size);
            distances[l][r] = d;
            distances[r][l] = d;
            let c = if area.size + DELTA >= self.sizes[l].min(self.sizes[r]) {
                1.0
            } else if area.size <= DELTA {
                -1.0
            } else {
                0.0
            };
            constraints[l][r] = c;
            constraints[r][l] = c;
        }

        let row_norms: f64 = distances
            .iter()
            .map(|row| row.iter().map(|v| v * v).sum::<f64>())
            .sum();
        let mut norm = row_norms.sqrt() / n as f64;
        if norm.is_nan() || norm <= 0.0 {
            norm = 1.0;
        }
        for v in distances.iter_mut().flatten() {
            *v /= norm;
        }

        let mut best: Option<GradientPoint> = None;
        for i in 0..restarts.max(1) {
            // Deterministic seeds keep repeated layouts identical.
            let seed = (i as f64).sin().abs();
            let initial: Vec<f64> = (0..2 * n).map(|z| seed / (z + 1) as f64).collect();
            let current = conjugate_gradient(
                |x, grad| mds_gradient(x, grad, &distances, &constraints),
                &initial,
                ConjugateGradientParams::default(),
            );
            if best.as_ref().is_none_or(|b| current.fx < b.fx) {
                best = Some(current);
            }
        }

        best.map(|b| b.x.iter().map(|v| v * norm).collect())
            .unwrap_or_else(|| vec![0.0; 2 * n])
    }

    fn initial(&self, params: &LayoutParams) -> Vec<f64> {
        match params.initial_layout {
            InitialLayout::Greedy => self.greedy(),
            InitialLayout::ConstrainedMds => self.constrained_mds(params.restarts),
            InitialLayout::Best => {
                let greedy = self.greedy();
                if self.areas.len() + self.len() < 8 {
                    return greedy;
                }
                let mds = self.constrained_mds(params.restarts);
                let mds_loss = self.loss(&mds, false);
                let greedy_loss = self.loss(&greedy, false);
                if mds_loss + 1e-8 < greedy_loss {
                    log::debug!("venn: constrained MDS seed {mds_loss} beats greedy {greedy_loss}");
                    mds
                } else {
                    greedy
                }
            }
        }
    }

    fn to_solution(&self, centres: &[f64]) -> Solution {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), self.circle(centres, i)))
            .collect()
    }
}

/// Stress of a layout against target pair distances, with subset/disjoint constraints.
///
/// Pairs marked `1` (subset) are satisfied at any distance up to the target; pairs marked
/// `-1` (disjoint) at any distance beyond it.
fn mds_gradient(
    x: &[f64],
    grad: &mut [f64],
    distances: &[Vec<f64>],
    constraints: &[Vec<f64>],
) -> f64 {
    let mut loss = 0.0;
    grad.fill(0.0);
    for i in 0..distances.len() {
        let (xi, yi) = (x[2 * i], x[2 * i + 1]);
        for j in i + 1..distances.len() {
            let (xj, yj) = (x[2 * j], x[2 * j + 1]);
            let dij = distances[i][j];
            let constraint = constraints[i][j];
            let squared = (xj - xi) * (xj - xi) + (yj - yi) * (yj - yi);
            let distance = squared.sqrt();
            let delta = squared - dij * dij;
            if (constraint > 0.0 && distance <= dij) || (constraint < 0.0 && distance >= dij) {
                continue;
            }
            loss += 2.0 * delta * delta;
            grad[2 * i] += 4.0 * delta * (xi - xj);
            grad[2 * i + 1] += 4.0 * delta * (yi - yj);
            grad[2 * j] += 4.0 * delta * (xj - xi);
            grad[2 * j + 1] += 4.0 * delta * (yj - yi);
        }
    }
    loss
}

/// Lays out one circle per single-set reflection.
///
/// Single sets with a non-positive size, duplicate single sets, and intersections naming an
/// unknown set are skipped with a warning. An input without usable sets yields an empty
/// solution.
pub fn venn(reflections: &[SetReflection], params: &LayoutParams) -> Solution {
    let problem = Problem::new(reflections);
    if problem.len() == 0 {
        return Solution::new();
    }

    let initial = problem.initial(params);
    let result = nelder_mead(
        |centres| problem.loss(centres, false),
        &initial,
        &NelderMeadParams::default().with_max_iterations(params.max_iterations),
    );
    log::debug!(
        "venn: {} sets, {} areas, loss {} after {} iterations",
        problem.len(),
        problem.areas.len(),
        result.fx,
        result.iterations
    );
    problem.to_solution(&result.x)
}

/// Greedy layout without refinement.
pub fn greedy_layout(reflections: &[SetReflection]) -> Solution {
    let problem = Problem::new(reflections);
    problem.to_solution(&problem.greedy())
}

/// Constrained-MDS layout without refinement.
pub fn constrained_mds_layout(reflections: &[SetReflection], restarts: usize) -> Solution {
    let problem = Problem::new(reflections);
    problem.to_solution(&problem.constrained_mds(restarts))
}

/// Weighted squared overlap error of `solution` against `reflections`.
///
/// Reflections naming a set absent from `solution` are ignored.
pub fn loss(solution: &Solution, reflections: &[SetReflection]) -> f64 {
    let mut out = 0.0;
    for r in reflections.iter().filter(|r| !r.is_single()) {
        let Some(circles) = solution.circles_for(r.sets.iter().map(String::as_str)) else {
            continue;
        };
        let overlap = match circles.as_slice() {
            [a, b] => circle_overlap(a.center.distance(b.center), a.radius, b.radius),
            _ => intersection_area(&circles, None),
        };
        out += r.weight * (overlap - r.size) * (overlap - r.size);
    }
    out
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn two_sets() -> Vec<SetReflection> {
        vec![
            SetReflection::new(["A"], 10.0),
            SetReflection::new(["B"], 10.0),
            SetReflection::new(["A", "B"], 4.0),
        ]
    }

    #[test]
    fn two_equal_sets_overlap_as_requested() {
        let solution = venn(&two_sets(), &LayoutParams::default());
        let a = solution.get("A").copied().unwrap();
        let b = solution.get("B").copied().unwrap();
        let r = radius_for_size(10.0);
        assert!((a.radius - r).abs() < 1e-12);
        assert!((b.radius - r).abs() < 1e-12);
        let overlap = intersection_area(&[a, b], None);
        assert!((overlap - 4.0).abs() <= 0.2, "overlap {overlap}");
    }

    #[test]
    fn permutations_give_identical_solutions() {
        let base = vec![
            SetReflection::new(["A", "B"], 5.0),
            SetReflection::new(["A"], 10.0),
            SetReflection::new(["B"], 8.0),
        ];
        let reference = venn(&base, &LayoutParams::default());
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let permuted: Vec<_> = order.iter().map(|&i| base[i].clone()).collect();
            assert_eq!(venn(&permuted, &LayoutParams::default()), reference, "{order:?}");
        }
    }

    #[test]
    fn swapped_names_in_an_intersection_do_not_matter() {
        let a = venn(&two_sets(), &LayoutParams::default());
        let mut swapped = two_sets();
        swapped[2] = SetReflection::new(["B", "A"], 4.0);
        assert_eq!(venn(&swapped, &LayoutParams::default()), a);
    }

    #[test]
    fn missing_pairs_are_added_as_disjoint() {
        let areas = add_missing_areas(&[
            SetReflection::new(["A"], 1.0),
            SetReflection::new(["B"], 1.0),
            SetReflection::new(["C"], 1.0),
            SetReflection::new(["B", "A"], 0.5),
        ]);
        let added: Vec<_> = areas[4..].iter().map(|r| r.sets.to_vec()).collect();
        assert_eq!(added, [vec!["A", "C"], vec!["B", "C"]]);
        assert!(areas[4..].iter().all(|r| r.size == 0.0));
    }

    #[test]
    fn degenerate_inputs_do_not_fail() {
        assert!(venn(&[], &LayoutParams::default()).is_empty());
        assert!(venn(&[SetReflection::new(["A"], 0.0)], &LayoutParams::default()).is_empty());
        assert!(venn(&[SetReflection::new(["A"], f64::NAN)], &LayoutParams::default()).is_empty());

        let single = venn(&[SetReflection::new(["A"], 3.0)], &LayoutParams::default());
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn unknown_sets_in_intersections_are_ignored() {
        let mut input = two_sets();
        input.push(SetReflection::new(["A", "C"], 3.0));
        let params = LayoutParams::default();
        assert_eq!(
            venn(&input, &params),
            venn(&two_sets(), &params),
            "rows naming unknown sets are dropped"
        );
    }

    #[test]
    fn distance_for_area_inverts_overlap() {
        let (r1, r2) = (1.5, 1.0);
        for &target in &[0.1, 0.8, 2.0] {
            let d = distance_from_intersect_area(r1, r2, target);
            assert!((circle_overlap(d, r1, r2) - target).abs() < 1e-6, "target {target}");
        }
        assert_eq!(distance_from_intersect_area(1.5, 1.0, 10.0), 0.5);
    }

    #[test]
    fn disjoint_and_nested_requests_are_respected() {
        let solution = venn(
            &[
                SetReflection::new(["A"], 8.0),
                SetReflection::new(["B"], 2.0),
                SetReflection::new(["C"], 3.0),
                SetReflection::new(["A", "B"], 2.0),
                SetReflection::new(["A", "C"], 0.0),
            ],
            &LayoutParams::default(),
        );
        let a = solution.get("A").copied().unwrap();
        let b = solution.get("B").copied().unwrap();
        let c = solution.get("C").copied().unwrap();
        let ab = circle_overlap(a.center.distance(b.center), a.radius, b.radius);
        let ac = circle_overlap(a.center.distance(c.center), a.radius, c.radius);
        assert!((ab - 2.0).abs() < 0.1, "B should sit inside A, overlap {ab}");
        assert!(ac < 0.1, "A and C should stay apart, overlap {ac}");
    }

    #[test]
    fn three_set_layout_fits_pairs_and_triple() {
        let input = vec![
            SetReflection::new(["A"], 12.0),
            SetReflection::new(["B"], 12.0),
            SetReflection::new(["C"], 12.0),
            SetReflection::new(["A", "B"], 4.0),
            SetReflection::new(["A", "C"], 4.0),
            SetReflection::new(["B", "C"], 4.0),
            SetReflection::new(["A", "B", "C"], 1.5),
        ];
        let solution = venn(&input, &LayoutParams::default());
        assert!(loss(&solution, &input) < 0.5, "loss {}", loss(&solution, &input));
    }

    #[test]
    fn mds_seeding_is_deterministic() {
        let input = vec![
            SetReflection::new(["A"], 5.0),
            SetReflection::new(["B"], 5.0),
            SetReflection::new(["C"], 5.0),
            SetReflection::new(["A", "B"], 1.0),
        ];
        assert_eq!(constrained_mds_layout(&input, 3), constrained_mds_layout(&input, 3));
        assert_eq!(constrained_mds_layout(&input, 3).len(), 3);
    }
}
