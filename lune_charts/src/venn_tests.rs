// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end Venn chart tests: data flow, incremental redraws, interactivity.

extern crate std;

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use lune_core::{
    ConsistencyState, Drawable, Invalidatable, LayerId, Mark, MarkPayload, PointState,
    PointStateful,
};
use lune_venn::intersection_area;
use peniko::{Brush, Color};
use peniko::color::palette::css;

use crate::data::{DataSet, SharedDataSet, VennRow};
use crate::palette::ColorPalette;
use crate::settings::{LabelSettings, MarkerSettings, StateSettings};
use crate::symbol::Symbol;
use crate::venn_chart::{
    SelectionMode, VENN_APPEARANCE, VENN_LABELS, VENN_MARKERS, VennChart, VennMarkKind,
};

fn two_sets() -> SharedDataSet {
    DataSet::shared(vec![
        VennRow::new("A", 10.0),
        VennRow::new("B", 10.0),
        VennRow::new("A&B", 4.0),
    ])
}

fn chart(data: SharedDataSet) -> VennChart {
    VennChart::new()
        .with_data(data)
        .with_container(LayerId(1))
        .with_bounds(Rect::new(0.0, 0.0, 400.0, 300.0))
}

fn find(chart: &VennChart, kind: VennMarkKind, row: usize) -> Option<Mark> {
    let id = chart.mark_id(kind, row);
    chart.marks().into_iter().find(|m| m.id == id)
}

fn region_fill(chart: &VennChart, row: usize) -> Color {
    let mark = find(chart, VennMarkKind::Region, row).expect("region mark");
    let MarkPayload::Path(path) = &mark.payload else {
        panic!("region marks are paths");
    };
    let Brush::Solid(color) = &path.fill else {
        panic!("region fills are solid");
    };
    *color
}

#[test]
fn two_sets_end_to_end() {
    let mut chart = chart(two_sets());
    assert!(chart.draw());

    let solution = chart.solution().expect("solution");
    let a = *solution.get("A").unwrap();
    let b = *solution.get("B").unwrap();
    let radius = (10.0 / core::f64::consts::PI).sqrt();
    assert!((a.radius - radius).abs() < 1e-9, "{a:?}");
    assert!((b.radius - radius).abs() < 1e-9, "{b:?}");
    let overlap = intersection_area(&[a, b], None);
    assert!((overlap - 4.0).abs() <= 0.2, "overlap {overlap}");

    // Every row gets a region, and the intersection label sits between the set labels.
    for row in 0..3 {
        assert!(find(&chart, VennMarkKind::Region, row).is_some(), "region {row}");
        assert!(find(&chart, VennMarkKind::Label, row).is_some(), "label {row}");
        assert!(find(&chart, VennMarkKind::Marker, row).is_none(), "markers are off");
    }
    let ca = chart.text_centre(0).unwrap();
    let cb = chart.text_centre(1).unwrap();
    let cab = chart.text_centre(2).unwrap();
    let (lo, hi) = if ca.x < cb.x { (ca.x, cb.x) } else { (cb.x, ca.x) };
    assert!(lo < cab.x && cab.x < hi, "{ca:?} {cab:?} {cb:?}");

    // Intersections stack above their sets.
    let za = find(&chart, VennMarkKind::Region, 0).unwrap().z_index;
    let zab = find(&chart, VennMarkKind::Region, 2).unwrap().z_index;
    assert!(zab > za);
}

#[test]
fn invalid_rows_are_missing() {
    let data = DataSet::shared(vec![
        VennRow::new("A", 10.0),
        VennRow::new("A,C", 2.0),
        VennRow::new("B", -1.0),
        VennRow::new("A", 3.0),
        VennRow::new("A,", 1.0),
    ]);
    let mut chart = chart(data).with_data_separator(",");
    assert!(chart.draw());

    assert!(!chart.is_missing(0));
    assert!(chart.is_missing(1), "C has no row of its own");
    assert!(chart.is_missing(2), "negative value");
    assert!(chart.is_missing(3), "A is defined twice");
    assert!(chart.is_missing(4), "empty set name");
    assert_eq!(chart.reflections().len(), 1);
    assert!(chart.region_path(0).is_some());
    assert!(chart.region_path(1).is_none());

    assert!(find(&chart, VennMarkKind::Region, 1).is_none());
    assert_eq!(chart.legend_items().len(), 1);
}

#[test]
fn repeated_intersections_are_missing() {
    let data = DataSet::shared(vec![
        VennRow::new("A", 10.0),
        VennRow::new("B", 10.0),
        VennRow::new("A&B", 4.0),
        VennRow::new("B&A", 4.0),
        VennRow::new("A&A", 4.0),
    ]);
    let mut chart = chart(data);
    chart.calculate();
    assert!(!chart.is_missing(2));
    assert!(chart.is_missing(3));
    assert!(chart.is_missing(4));
}

#[test]
fn row_order_does_not_change_layout() {
    let singles = [("A", 12.0), ("B", 9.0), ("C", 6.0)];
    let orders: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    let mut layouts = Vec::new();
    for order in orders {
        let mut rows: Vec<VennRow> = order
            .iter()
            .map(|&i| VennRow::new(singles[i].0, singles[i].1))
            .collect();
        rows.push(VennRow::new("A&B", 3.0));
        rows.push(VennRow::new("B&C", 2.0));
        let mut chart = chart(DataSet::shared(rows));
        chart.calculate();
        let solution = chart.solution().unwrap();
        let circles: Vec<_> = ["A", "B", "C"]
            .iter()
            .map(|name| *solution.get(name).unwrap())
            .collect();
        layouts.push(circles);
    }
    for layout in &layouts[1..] {
        for (c, first) in layout.iter().zip(&layouts[0]) {
            assert!((c.center - first.center).hypot() < 1e-9, "{c:?} vs {first:?}");
            assert!((c.radius - first.radius).abs() < 1e-9);
        }
    }
}

#[test]
fn second_draw_does_no_work() {
    let mut chart = chart(two_sets());
    assert!(chart.draw());
    let stats = chart.draw_stats();
    assert_eq!(stats.calculations, 1);
    assert_eq!(stats.geometry_passes, 1);
    assert_eq!(stats.appearance_passes, 1);
    assert_eq!(stats.legend_builds, 1);
    assert!(chart.is_consistent());

    assert!(!chart.draw());
    assert_eq!(chart.draw_stats(), stats);
}

#[test]
fn settings_changes_redo_only_their_phase() {
    let mut chart = chart(two_sets());
    chart.draw();
    let before = chart.draw_stats();

    let hovered = chart.settings().hovered.clone().with_labels(LabelSettings {
        font_size: Some(20.0),
        ..LabelSettings::default()
    });
    chart.set_hovered(hovered);
    assert!(chart.has_invalidation_state(VENN_LABELS));
    assert!(!chart.has_invalidation_state(VENN_APPEARANCE));
    assert!(!chart.has_invalidation_state(ConsistencyState::LEGEND));
    chart.draw();
    let after = chart.draw_stats();
    assert_eq!(after.label_passes, before.label_passes + 1);
    assert_eq!(after.appearance_passes, before.appearance_passes);
    assert_eq!(after.calculations, before.calculations);

    chart.set_normal(
        StateSettings::default()
            .with_fill_opacity(0.5)
            .with_markers(MarkerSettings {
                enabled: Some(true),
                ..MarkerSettings::default()
            }),
    );
    assert!(chart.has_invalidation_state(
        VENN_APPEARANCE | VENN_MARKERS | ConsistencyState::LEGEND
    ));
    chart.draw();
    let last = chart.draw_stats();
    assert_eq!(last.appearance_passes, after.appearance_passes + 1);
    assert_eq!(last.marker_passes, after.marker_passes + 1);
    assert_eq!(last.legend_builds, after.legend_builds + 1);
    assert_eq!(last.geometry_passes, before.geometry_passes);
}

#[test]
fn separate_changes_share_one_draw() {
    let mut chart = chart(two_sets());
    chart.draw();
    let before = chart.draw_stats();

    chart.set_palette(ColorPalette::new([css::RED, css::GREEN]));
    let hovered = chart.settings().hovered.clone().with_labels(LabelSettings {
        font_size: Some(18.0),
        ..LabelSettings::default()
    });
    chart.set_hovered(hovered);
    assert!(chart.has_invalidation_state(VENN_APPEARANCE | VENN_LABELS));

    assert!(chart.draw());
    let after = chart.draw_stats();
    assert_eq!(after.appearance_passes, before.appearance_passes + 1);
    assert_eq!(after.label_passes, before.label_passes + 1);
    assert_eq!(after.calculations, before.calculations, "no layout solve");
    assert_eq!(after.geometry_passes, before.geometry_passes);
    assert!(chart.is_consistent());
    assert_eq!(region_fill(&chart, 0).components[..3], css::RED.components[..3]);
}

#[test]
fn data_changes_reach_every_chart() {
    let data = two_sets();
    let mut first = chart(data.clone());
    let mut second = chart(data.clone());
    first.draw();
    second.draw();
    assert!(first.is_consistent() && second.is_consistent());

    data.borrow_mut().set_value(2, 2.0);
    assert!(!first.is_consistent());
    assert!(second.has_invalidation_state(crate::venn_chart::VENN_DATA));

    assert!(first.draw());
    assert!(second.draw());
    assert_eq!(first.draw_stats().calculations, 2);
    assert_eq!(second.draw_stats().calculations, 2);

    // A detached chart no longer listens.
    second.set_data(None);
    second.draw();
    data.borrow_mut().set_value(2, 3.0);
    assert!(second.is_consistent());
    assert!(second.is_no_data());
}

#[test]
fn intersection_settings_are_translated() {
    let mut chart = chart(two_sets());
    chart.draw();

    chart.update_intersections(|i| i.set_normal(StateSettings::default().with_fill(css::RED)));
    assert!(chart.has_invalidation_state(VENN_APPEARANCE | ConsistencyState::LEGEND));
    assert!(!chart.has_invalidation_state(VENN_LABELS));
    chart.draw();

    assert_eq!(region_fill(&chart, 2).components[..3], css::RED.components[..3]);
    assert_ne!(region_fill(&chart, 0).components[..3], css::RED.components[..3]);

    chart.update_intersections(|i| {
        i.set_hovered(StateSettings::default().with_labels(LabelSettings {
            enabled: Some(false),
            ..LabelSettings::default()
        }));
    });
    assert!(chart.has_invalidation_state(VENN_LABELS));
    assert!(!chart.has_invalidation_state(ConsistencyState::LEGEND));
}

#[test]
fn intersections_blend_parent_colors() {
    let data = DataSet::shared(vec![
        VennRow::new("A", 10.0).with_fill(Color::from_rgb8(0, 0, 0)),
        VennRow::new("B", 10.0).with_fill(Color::from_rgb8(255, 255, 255)),
        VennRow::new("A&B", 4.0),
    ]);
    let mut chart = chart(data);
    chart.draw();
    let fill = region_fill(&chart, 2);
    for c in &fill.components[..3] {
        assert!((c - 0.5).abs() < 1e-3, "{fill:?}");
    }
    assert!((fill.components[3] - 0.65).abs() < 1e-6);
}

#[test]
fn hover_redraws_only_the_point() {
    let mut chart = chart(two_sets());
    chart.draw();
    let before = chart.draw_stats();
    let normal = region_fill(&chart, 0);

    chart.hover(0);
    assert_eq!(chart.point_state(0), PointState::HOVER);
    assert!(chart.draw());
    let after = chart.draw_stats();
    assert_eq!(after.appearance_passes, before.appearance_passes);
    assert_eq!(after.label_passes, before.label_passes);
    assert_eq!(after.point_updates, before.point_updates + 1);

    let hovered = region_fill(&chart, 0);
    assert!(hovered.components[3] > normal.components[3]);
    assert_eq!(region_fill(&chart, 1).components[3], normal.components[3]);

    // Moving the hover updates the old and the new point.
    chart.hover(1);
    chart.draw();
    assert_eq!(chart.draw_stats().point_updates, after.point_updates + 2);
    assert_eq!(chart.point_state(0), PointState::NORMAL);
}

#[test]
fn selection_clears_hover() {
    let mut chart = chart(two_sets());
    chart.draw();

    chart.hover(0);
    chart.select(0, false);
    assert_eq!(chart.point_state(0), PointState::SELECT);
    assert_eq!(chart.point_state(1), PointState::NORMAL);
    chart.draw();

    // The selected state's hatch shows up.
    assert!(find(&chart, VennMarkKind::Hatch, 0).is_some());
    assert!(find(&chart, VennMarkKind::Hatch, 1).is_none());

    chart.select(1, true);
    assert_eq!(chart.point_state(0), PointState::SELECT);
    assert_eq!(chart.point_state(1), PointState::SELECT);
    let sum = chart.format_context(0).unwrap().selected_points_sum;
    assert_eq!(sum, 20.0);

    chart.select(2, false);
    assert_eq!(chart.point_state(0), PointState::NORMAL);
    assert_eq!(chart.point_state(2), PointState::SELECT);

    chart.unselect();
    assert!(!chart.interactivity().has_point_state(PointState::SELECT));
}

#[test]
fn single_select_keeps_one_point() {
    let mut chart = chart(two_sets()).with_selection_mode(SelectionMode::SingleSelect);
    chart.select(0, false);
    chart.select(1, true);
    assert_eq!(chart.point_state(0), PointState::NORMAL);
    assert_eq!(chart.point_state(1), PointState::SELECT);

    chart.set_selection_mode(SelectionMode::Disabled);
    chart.select(0, false);
    assert_eq!(chart.point_state(0), PointState::NORMAL);
}

#[test]
fn series_state_redraws_everything() {
    let mut chart = chart(two_sets());
    chart.draw();
    let before = chart.draw_stats();

    chart.hover_series();
    assert_eq!(chart.interactivity().series_state(), PointState::HOVER);
    chart.draw();
    assert_eq!(chart.draw_stats().appearance_passes, before.appearance_passes + 1);

    chart.unhover();
    assert_eq!(chart.interactivity().series_state(), PointState::NORMAL);
}

#[test]
fn pointer_hits_the_deepest_region() {
    let mut chart = chart(two_sets());
    chart.draw();
    let centre_ab = chart.text_centre(2).unwrap();
    let centre_a = chart.text_centre(0).unwrap();

    assert_eq!(chart.point_at(centre_ab), Some(2));
    assert_eq!(chart.point_at(centre_a), Some(0));
    assert_eq!(chart.point_at(Point::new(-50.0, -50.0)), None);

    chart.handle_pointer_move(centre_ab);
    assert_eq!(chart.point_state(2), PointState::HOVER);
    chart.handle_pointer_move(Point::new(-50.0, -50.0));
    assert_eq!(chart.point_state(2), PointState::NORMAL);

    chart.handle_pointer_down(centre_a, false);
    assert_eq!(chart.point_state(0), PointState::SELECT);
    chart.handle_pointer_down(Point::new(-50.0, -50.0), false);
    assert_eq!(chart.point_state(0), PointState::NORMAL);
}

#[test]
fn legend_lists_sets_only() {
    let data = DataSet::shared(vec![
        VennRow::new("A", 10.0).with_name("Apples"),
        VennRow::new("B", 10.0),
        VennRow::new("A&B", 4.0),
    ]);
    let mut chart = chart(data);
    chart.draw();
    let items = chart.legend_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].label, "Apples");
    assert_eq!(items[1].label, "B");
    assert_eq!(items[0].symbol, Symbol::Square);
    assert_eq!(items[1].index, Some(1));

    chart.set_normal(
        StateSettings::default()
            .with_fill_opacity(0.65)
            .with_markers(MarkerSettings {
                enabled: Some(true),
                ..MarkerSettings::default()
            }),
    );
    chart.draw();
    let items = chart.legend_items();
    assert_eq!(items[0].symbol, Symbol::Circle);
    assert_eq!(items[1].symbol, Symbol::Square, "second palette symbol");
    assert!(find(&chart, VennMarkKind::Marker, 2).is_some());
}

#[test]
fn labels_use_the_format_context() {
    let mut chart = chart(two_sets());
    chart.set_normal(
        StateSettings::default()
            .with_fill_opacity(0.65)
            .with_labels(LabelSettings {
                format: Some(crate::settings::LabelFormat::Template(
                    "{%X}={%Value}".into(),
                )),
                ..LabelSettings::default()
            }),
    );
    chart.draw();
    let mark = find(&chart, VennMarkKind::Label, 2).unwrap();
    let MarkPayload::Text(label) = &mark.payload else {
        panic!("labels are text");
    };
    assert_eq!(label.text, "A&B=4");
    assert_eq!(label.font_size, 13.0);
}

fn label_text(chart: &VennChart, row: usize) -> alloc::string::String {
    let mark = find(chart, VennMarkKind::Label, row).expect("label mark");
    let MarkPayload::Text(label) = &mark.payload else {
        panic!("labels are text");
    };
    label.text.clone()
}

#[test]
fn selection_sum_labels_follow_the_selection() {
    let mut chart = chart(two_sets());
    let normal = chart.settings().normal.clone().with_labels(LabelSettings {
        format: Some(crate::settings::LabelFormat::Template(
            "{%SelectedPointsSum}".into(),
        )),
        ..LabelSettings::default()
    });
    chart.set_normal(normal);
    chart.draw();
    assert_eq!(label_text(&chart, 1), "0", "nothing selected");

    chart.select(0, false);
    chart.draw();
    for row in 0..3 {
        assert_eq!(label_text(&chart, row), "10", "row {row}");
    }

    chart.select(2, true);
    chart.draw();
    assert_eq!(label_text(&chart, 1), "14");

    chart.unselect();
    chart.draw();
    assert_eq!(label_text(&chart, 0), "0");
}

#[test]
fn mark_ids_stay_unique_past_the_minimum_stride() {
    let mut rows = vec![VennRow::new("A", 10.0)];
    rows.extend((0..10_000).map(|_| VennRow::new("B", -1.0)));
    let mut chart = chart(DataSet::shared(rows));
    chart.calculate();

    let last_region = chart.mark_id(VennMarkKind::Region, 10_000);
    let first_hatch = chart.mark_id(VennMarkKind::Hatch, 0);
    assert!(last_region < first_hatch, "{last_region:?} {first_hatch:?}");
    assert!(chart.mark_id(VennMarkKind::Marker, 0) > chart.mark_id(VennMarkKind::Label, 10_000));
}

#[test]
fn disabled_chart_removes_its_marks() {
    let mut chart = chart(two_sets());
    chart.draw();
    assert!(!chart.marks().is_empty());

    chart.set_enabled(false);
    assert!(!chart.draw());
    assert!(chart.marks().is_empty());

    chart.set_enabled(true);
    assert!(chart.draw());
    assert!(!chart.marks().is_empty());
}

#[test]
fn draw_needs_container_and_bounds() {
    let mut chart = VennChart::new().with_data(two_sets());
    assert!(!chart.draw(), "no container");
    chart.set_container(Some(LayerId(1)));
    assert!(!chart.draw(), "no bounds");
    chart.set_bounds(Rect::new(0.0, 0.0, 100.0, 100.0));
    assert!(chart.draw());
}

#[test]
fn empty_data_draws_nothing() {
    let mut chart = chart(DataSet::shared(Vec::new()));
    assert!(chart.is_no_data());
    assert!(chart.draw());
    assert!(chart.marks().is_empty());
    assert!(chart.solution().is_none());
    assert!(chart.is_consistent());
}

#[test]
fn z_index_shifts_marks() {
    let mut chart = chart(two_sets());
    chart.draw();
    let base = find(&chart, VennMarkKind::Region, 0).unwrap().z_index;
    chart.set_z_index(2);
    assert!(chart.draw());
    let shifted = find(&chart, VennMarkKind::Region, 0).unwrap().z_index;
    assert_eq!(shifted, base + 2 * crate::z_order::COMPONENT_STRIDE);
}
