// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Venn chart demo for `lune_charts`.
//!
//! Builds a three-set chart next to its legend, draws it, then hovers a set through the legend,
//! selects a region and redraws. Only the touched regions are rebuilt; the scene diff shows it. The final frame
//! is written to `lune_charts_demo.svg`.
//!
//! Set `RUST_LOG=debug` to see the chart's phase logging.

mod svg;

use kurbo::{Point, Rect};
use lune_charts::{
    DataSet, HatchChoice, HeuristicTextMeasurer, LabelFormat, LabelSettings, Legend,
    PlacedLegend, Splitter, StateSettings, VennChart, VennRow,
};
use lune_core::{Cursor, CursorHost, Drawable, LayerId, Mark, Scene};

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 420.0;
const LEGEND_ID_BASE: u64 = 900_000;
const SPLITTER_ID_BASE: u64 = 950_000;

/// Stands in for a window's pointer cursor.
#[derive(Debug, Default)]
struct Window {
    cursor: Cursor,
}

impl CursorHost for Window {
    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        log::info!("cursor: {cursor:?}");
        self.cursor = cursor;
    }
}

/// Draws the splitter and chart, then lays the legend out in the right pane.
fn frame(chart: &mut VennChart, splitter: &mut Splitter) -> (Vec<Mark>, PlacedLegend) {
    splitter.draw();
    if let Some(bounds) = splitter.start_bounds() {
        chart.set_bounds(bounds);
    }
    chart.draw();

    let measurer = HeuristicTextMeasurer::default();
    let legend = Legend::new(LEGEND_ID_BASE, chart.legend_items().to_vec())
        .with_font_size(13.0)
        .with_swatch_size(12.0);
    let size = legend.measure(&measurer);
    let right = splitter
        .end_bounds()
        .unwrap_or_else(|| Rect::new(WIDTH, 0.0, WIDTH, HEIGHT));
    let origin = Point::new(
        right.x0 + 24.0,
        right.y0 + (right.height() - size.height) * 0.5,
    );
    let placed = legend.arrange(origin, &measurer);

    let mut marks = chart.marks();
    marks.extend(placed.marks());
    marks.extend(splitter.marks());
    (marks, placed)
}

fn main() {
    env_logger::init();

    let data = DataSet::shared(vec![
        VennRow::new("Rust", 16.0),
        VennRow::new("Geometry", 12.0),
        VennRow::new("Charts", 10.0),
        VennRow::new("Rust&Geometry", 4.0),
        VennRow::new("Rust&Charts", 3.0),
        VennRow::new("Geometry&Charts", 2.0),
        VennRow::new("Rust&Geometry&Charts", 1.0).with_name("All three"),
    ]);

    let mut chart = VennChart::new()
        .with_id_base(0)
        .with_data(data.clone())
        .with_container(LayerId(0))
        .with_padding(16.0);
    chart.update_intersections(|i| {
        i.set_normal(StateSettings::default().with_labels(LabelSettings {
            format: Some(LabelFormat::Template("{%Value}".into())),
            ..LabelSettings::default()
        }));
        i.set_selected(
            StateSettings::default()
                .with_fill_opacity(0.95)
                .with_hatch_fill(HatchChoice::Palette),
        );
    });

    let mut splitter = Splitter::new()
        .with_id_base(SPLITTER_ID_BASE)
        .with_container(LayerId(0))
        .with_bounds(Rect::new(0.0, 0.0, WIDTH, HEIGHT));
    splitter.set_limits(240.0, 160.0);
    splitter.set_position(0.7);

    let mut scene = Scene::new();
    let mut doc = svg::SvgDocument::new(Rect::new(0.0, 0.0, WIDTH, HEIGHT));

    let (marks, legend) = frame(&mut chart, &mut splitter);
    let diffs = scene.tick(marks);
    doc.apply(&diffs);
    println!("first frame: {} marks, {:?}", scene.len(), chart.draw_stats());

    // Pointer over the second legend item hovers its circle.
    let probe = Point::new(legend.bounds().x0 + 2.0, legend.bounds().center().y - 1.0);
    let legend_hit = legend.item_at(probe).and_then(|item| item.index);
    if let Some(index) = legend_hit {
        chart.hover(index);
    }
    let (marks, _) = frame(&mut chart, &mut splitter);
    let diffs = scene.tick(marks);
    doc.apply(&diffs);
    println!(
        "legend hover on {legend_hit:?}: {} diffs, {:?}",
        diffs.len(),
        chart.draw_stats()
    );

    // Pointer over the middle of the diagram, then a click there.
    let centre = chart
        .text_centre(6)
        .unwrap_or_else(|| Point::new(WIDTH * 0.35, HEIGHT * 0.5));
    chart.handle_pointer_move(centre);
    chart.handle_pointer_down(centre, false);
    if let Some(context) = chart.format_context(6) {
        println!(
            "selected {:?}: selected sum {}",
            context.name, context.selected_points_sum
        );
    }

    let (marks, _) = frame(&mut chart, &mut splitter);
    let diffs = scene.tick(marks);
    doc.apply(&diffs);
    println!(
        "after select: {} diffs, {:?}",
        diffs.len(),
        chart.draw_stats()
    );

    // Drag the divider left; the chart re-lays out in the narrower pane.
    let mut window = Window::default();
    {
        let mut drag = splitter.begin_drag(&mut window);
        drag.drag_to(Point::new(WIDTH * 0.6, HEIGHT * 0.5));
        let position = drag.finish();
        println!("splitter at {position}");
    }
    let (marks, _) = frame(&mut chart, &mut splitter);
    doc.apply(&scene.tick(marks));

    // Data edits reach the chart through its listener.
    data.borrow_mut().set_value(0, 20.0);
    let (marks, _) = frame(&mut chart, &mut splitter);
    let diffs = scene.tick(marks);
    doc.apply(&diffs);
    println!(
        "after data edit: {} diffs, {:?}, cursor back to {:?}",
        diffs.len(),
        chart.draw_stats(),
        window.cursor
    );
    println!("diffs applied (enter, update, exit): {:?}", doc.diff_counts());

    let svg = doc.render("lune charts demo");
    std::fs::write("lune_charts_demo.svg", svg).expect("write lune_charts_demo.svg");
    println!("wrote lune_charts_demo.svg");
}
