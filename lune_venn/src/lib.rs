// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Area-proportional Venn layout.
//!
//! This crate is the geometry half of the Venn chart in `lune_charts`:
//! - **Geometry**: circle overlap areas, intersection regions and their boundary arcs.
//! - **Layout**: place one circle per set so overlaps approximate requested sizes.
//! - **Normalization**: canonical orientation, cluster packing and viewport scaling.
//! - **Text centres**: a max-margin anchor point inside each region, for labels and markers.
//!
//! Everything is deterministic: the same reflections in any order produce the same solution.
//! Rendering is out of scope; [`region_path`] turns boundary arcs into a `kurbo::BezPath`.

#![no_std]

extern crate alloc;

#[cfg(not(feature = "std"))]
mod float;
mod geometry;
mod layout;
mod normalize;
mod optimize;
mod solution;
mod text_centre;

pub use geometry::{
    BoundaryArc, DELTA, IntersectionPoint, IntersectionStats, centroid, circle_area,
    circle_circle_intersection, circle_overlap, contained_in_circles, distance,
    intersection_area, intersection_points, region_path,
};
pub use layout::{
    InitialLayout, LayoutParams, SetReflection, add_missing_areas, constrained_mds_layout,
    distance_from_intersect_area, greedy_layout, loss, radius_for_size, venn,
};
pub use normalize::{
    DEFAULT_ORIENTATION, OrientationOrder, disjoint_clusters, normalize_solution, scale_solution,
};
pub use optimize::{
    BisectError, BisectParams, ConjugateGradientParams, GradientPoint, Minimum, NelderMeadParams,
    bisect, conjugate_gradient, nelder_mead, wolfe_line_search,
};
pub use solution::Solution;
pub use text_centre::{
    TextCentre, circle_margin, compute_text_centre, compute_text_centres, containing_circles,
};

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn two_set_scenario_end_to_end() {
        let reflections = [
            SetReflection::new(["A"], 10.0),
            SetReflection::new(["B"], 10.0),
            SetReflection::new(["A", "B"], 4.0),
        ];
        let raw = venn(&reflections, &LayoutParams::default());
        let normalized = normalize_solution(&raw, DEFAULT_ORIENTATION, OrientationOrder::ByRadius);

        let a = *normalized.get("A").unwrap();
        let b = *normalized.get("B").unwrap();
        let expected_radius = (10.0 / core::f64::consts::PI).sqrt();
        assert!((a.radius - expected_radius).abs() < 1e-12);
        assert!((b.radius - expected_radius).abs() < 1e-12);

        let overlap = intersection_area(&[a, b], None);
        assert!((overlap - 4.0).abs() <= 0.2, "overlap {overlap}");

        let scaled = scale_solution(&normalized, 400.0, 300.0, 0.0);
        let centres = compute_text_centres(&scaled, &reflections);
        let a = scaled.get("A").unwrap();
        let b = scaled.get("B").unwrap();
        assert!(a.center.x < centres[2].point.x && centres[2].point.x < b.center.x);
        assert!(centres[0].point.x < centres[2].point.x);
        assert!(centres[1].point.x > centres[2].point.x);
    }
}
