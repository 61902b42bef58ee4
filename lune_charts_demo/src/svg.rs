// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A retained SVG document fed by scene diffs.

use std::collections::HashMap;
use std::fmt::Write as _;

use kurbo::Rect;
use lune_core::{MarkDiff, MarkId, MarkPayload, TextAnchor, TextBaseline, TextMark};
use peniko::{Brush, Color};

/// Live marks keyed by id, with their paint order.
#[derive(Debug)]
pub(crate) struct SvgDocument {
    view_box: Rect,
    live: HashMap<MarkId, (i32, MarkPayload)>,
    counts: [usize; 3],
}

impl SvgDocument {
    pub(crate) fn new(view_box: Rect) -> Self {
        Self {
            view_box,
            live: HashMap::new(),
            counts: [0; 3],
        }
    }

    /// Folds one frame of diffs into the document.
    pub(crate) fn apply(&mut self, diffs: &[MarkDiff]) {
        for diff in diffs {
            match diff {
                MarkDiff::Enter { id, z_index, new } => {
                    self.counts[0] += 1;
                    self.live.insert(*id, (*z_index, new.as_ref().clone()));
                }
                MarkDiff::Update {
                    id,
                    new_z_index,
                    new,
                    ..
                } => {
                    self.counts[1] += 1;
                    self.live.insert(*id, (*new_z_index, new.as_ref().clone()));
                }
                MarkDiff::Exit { id, .. } => {
                    self.counts[2] += 1;
                    self.live.remove(id);
                }
            }
        }
    }

    /// `(enter, update, exit)` counts applied so far.
    pub(crate) fn diff_counts(&self) -> (usize, usize, usize) {
        let [enter, update, exit] = self.counts;
        (enter, update, exit)
    }

    pub(crate) fn render(&self, title: &str) -> String {
        let Rect { x0, y0, .. } = self.view_box;
        let (w, h) = (self.view_box.width(), self.view_box.height());
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{x0} {y0} {w} {h}\" \
             width=\"{w}\" height=\"{h}\">\n<title>{}</title>\n",
            escape_xml(title)
        );

        let mut ordered: Vec<_> = self.live.iter().collect();
        ordered.sort_by_key(|&(id, &(z, _))| (z, id.0));
        for (_, (_, payload)) in ordered {
            write_element(&mut svg, payload);
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn write_element(svg: &mut String, payload: &MarkPayload) {
    match payload {
        MarkPayload::Rect(mark) => {
            let r = mark.rect;
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
                r.x0,
                r.y0,
                r.width(),
                r.height()
            );
            paint_attr(svg, "fill", &mark.fill);
            svg.push_str("/>\n");
        }
        MarkPayload::Path(mark) => {
            let _ = write!(svg, "<path d=\"{}\"", mark.path.to_svg());
            paint_attr(svg, "fill", &mark.fill);
            if mark.stroke_width > 0.0 {
                paint_attr(svg, "stroke", &mark.stroke);
                let _ = write!(svg, " stroke-width=\"{}\"", mark.stroke_width);
            }
            svg.push_str("/>\n");
        }
        MarkPayload::Text(mark) => write_text(svg, mark),
    }
}

fn write_text(svg: &mut String, mark: &TextMark) {
    let anchor = match mark.anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    };
    let baseline = match mark.baseline {
        TextBaseline::Alphabetic => "alphabetic",
        TextBaseline::Middle => "middle",
        TextBaseline::Hanging => "hanging",
        TextBaseline::Ideographic => "ideographic",
    };
    let (x, y) = (mark.pos.x, mark.pos.y);
    let _ = write!(
        svg,
        "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"{}\" \
         text-anchor=\"{anchor}\" dominant-baseline=\"{baseline}\"",
        mark.font_size
    );
    if mark.angle != 0.0 {
        let _ = write!(svg, " transform=\"rotate({} {x} {y})\"", mark.angle);
    }
    paint_attr(svg, "fill", &mark.fill);
    let _ = writeln!(svg, ">{}</text>", escape_xml(&mark.text));
}

/// Solid paints become a hex color plus opacity; anything else is `none`.
fn paint_attr(svg: &mut String, name: &str, brush: &Brush) {
    let color = match brush {
        Brush::Solid(color) => *color,
        _ => Color::TRANSPARENT,
    };
    let [r, g, b, a] = color.to_rgba8().to_u8_array();
    if a == 0 {
        let _ = write!(svg, " {name}=\"none\"");
        return;
    }
    let _ = write!(svg, " {name}=\"#{r:02x}{g:02x}{b:02x}\"");
    if a < u8::MAX {
        let _ = write!(svg, " {name}-opacity=\"{:.3}\"", f64::from(a) / 255.0);
    }
}

fn escape_xml(text: &str) -> String {
    text.chars().fold(String::with_capacity(text.len()), |mut out, c| {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
        out
    })
}
