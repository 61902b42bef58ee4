// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Appearance, label and marker settings for one interaction state.
//!
//! Every field is optional: an unset field falls through to the next level of the resolution
//! chain (point, state, normal, default).

extern crate alloc;

use alloc::string::String;

use lune_core::{PointState, clarify_state};
use peniko::color::palette::css;
use peniko::{Brush, Color};

use crate::symbol::Symbol;

/// Stroke paint and width.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke paint.
    pub brush: Brush,
    /// Stroke width in scene coordinates.
    pub stroke_width: f64,
}

impl StrokeStyle {
    /// Convenience for a solid stroke.
    pub fn solid(brush: impl Into<Brush>, stroke_width: f64) -> Self {
        Self {
            brush: brush.into(),
            stroke_width,
        }
    }

    /// No stroke.
    pub fn none() -> Self {
        Self::solid(Color::TRANSPARENT, 0.0)
    }
}

/// Line pattern of a hatch fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HatchKind {
    /// Lines running from top-left to bottom-right.
    BackwardDiagonal,
    /// Lines running from bottom-left to top-right.
    ForwardDiagonal,
    /// Horizontal lines.
    Horizontal,
    /// Vertical lines.
    Vertical,
    /// Horizontal and vertical lines.
    Cross,
    /// Both diagonals.
    DiagonalCross,
}

/// A hatch pattern drawn over a region fill.
#[derive(Clone, Debug, PartialEq)]
pub struct HatchFill {
    /// Pattern.
    pub kind: HatchKind,
    /// Line color.
    pub color: Color,
    /// Distance between parallel lines.
    pub spacing: f64,
    /// Line width.
    pub thickness: f64,
}

impl HatchFill {
    /// A black pattern with 8px spacing and 1px lines.
    pub fn new(kind: HatchKind) -> Self {
        Self {
            kind,
            color: css::BLACK,
            spacing: 8.0,
            thickness: 1.0,
        }
    }

    /// Sets the line color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the line spacing.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Sets the line width.
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }
}

/// Whether and how a region is hatched.
#[derive(Clone, Debug, PartialEq)]
pub enum HatchChoice {
    /// No hatch.
    Disabled,
    /// Pattern taken from the chart's hatch palette.
    Palette,
    /// An explicit pattern.
    Fill(HatchFill),
}

/// Label text source.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelFormat {
    /// The row name, or its set key when unnamed.
    Name,
    /// The set key.
    X,
    /// The row value.
    Value,
    /// A template with `{%Token}` placeholders, see [`FormatContext`](crate::FormatContext).
    Template(String),
}

impl LabelFormat {
    /// Whether the rendered text depends on which points are selected.
    pub fn reads_selection(&self) -> bool {
        match self {
            Self::Template(template) => template
                .to_ascii_lowercase()
                .contains("{%selectedpointssum}"),
            Self::Name | Self::X | Self::Value => false,
        }
    }
}

/// Region label settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelSettings {
    /// Whether labels are drawn.
    pub enabled: Option<bool>,
    /// Font size.
    pub font_size: Option<f64>,
    /// Text color.
    pub fill: Option<Color>,
    /// Text source.
    pub format: Option<LabelFormat>,
}

/// Region marker settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerSettings {
    /// Whether markers are drawn.
    pub enabled: Option<bool>,
    /// Shape; defaults to the marker palette entry.
    pub symbol: Option<Symbol>,
    /// Symbol size.
    pub size: Option<f64>,
    /// Fill; defaults to the region color.
    pub fill: Option<Color>,
}

/// Settings for one interaction state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateSettings {
    /// Region color; defaults to the palette (circles) or the parents' blend (intersections).
    pub fill: Option<Color>,
    /// Multiplier applied to the fill alpha.
    pub fill_opacity: Option<f64>,
    /// Region outline.
    pub stroke: Option<StrokeStyle>,
    /// Region hatch.
    pub hatch_fill: Option<HatchChoice>,
    /// Labels.
    pub labels: LabelSettings,
    /// Markers.
    pub markers: MarkerSettings,
}

impl StateSettings {
    /// Sets the fill color.
    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Sets the fill opacity.
    pub fn with_fill_opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = Some(opacity);
        self
    }

    /// Sets the outline.
    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.stroke = Some(stroke);
        self
    }

    /// Sets the hatch.
    pub fn with_hatch_fill(mut self, hatch_fill: HatchChoice) -> Self {
        self.hatch_fill = Some(hatch_fill);
        self
    }

    /// Sets the label settings.
    pub fn with_labels(mut self, labels: LabelSettings) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the marker settings.
    pub fn with_markers(mut self, markers: MarkerSettings) -> Self {
        self.markers = markers;
        self
    }

    pub(crate) fn diff(&self, other: &Self) -> SettingsDiff {
        SettingsDiff {
            appearance: self.fill != other.fill
                || self.fill_opacity != other.fill_opacity
                || self.stroke != other.stroke
                || self.hatch_fill != other.hatch_fill,
            labels: self.labels != other.labels,
            markers: self.markers != other.markers,
        }
    }
}

/// Which setting groups differ between two [`StateSettings`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SettingsDiff {
    pub(crate) appearance: bool,
    pub(crate) labels: bool,
    pub(crate) markers: bool,
}

/// Normal, hovered and selected settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatefulSettings {
    /// Settings without interaction.
    pub normal: StateSettings,
    /// Settings while hovered.
    pub hovered: StateSettings,
    /// Settings while selected. Selection wins over hover.
    pub selected: StateSettings,
}

impl StatefulSettings {
    /// Settings for a (possibly compound) point state.
    pub fn state(&self, state: PointState) -> &StateSettings {
        match clarify_state(state) {
            PointState::SELECT => &self.selected,
            PointState::HOVER => &self.hovered,
            _ => &self.normal,
        }
    }

    /// Mutable settings for a (possibly compound) point state.
    pub fn state_mut(&mut self, state: PointState) -> &mut StateSettings {
        match clarify_state(state) {
            PointState::SELECT => &mut self.selected,
            PointState::HOVER => &mut self.hovered,
            _ => &mut self.normal,
        }
    }

    /// Chart-level defaults: translucent fills, name labels, no markers, palette hatch on
    /// selection.
    pub fn chart_defaults() -> Self {
        Self {
            normal: StateSettings {
                fill_opacity: Some(0.65),
                hatch_fill: Some(HatchChoice::Disabled),
                labels: LabelSettings {
                    enabled: Some(true),
                    font_size: Some(13.0),
                    fill: Some(Color::from_rgb8(0x21, 0x21, 0x21)),
                    format: Some(LabelFormat::Name),
                },
                markers: MarkerSettings {
                    enabled: Some(false),
                    size: Some(10.0),
                    ..MarkerSettings::default()
                },
                ..StateSettings::default()
            },
            hovered: StateSettings {
                fill_opacity: Some(0.85),
                ..StateSettings::default()
            },
            selected: StateSettings {
                fill_opacity: Some(0.85),
                hatch_fill: Some(HatchChoice::Palette),
                ..StateSettings::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_wins_over_hover() {
        let settings = StatefulSettings::chart_defaults();
        let both = PointState::HOVER | PointState::SELECT;
        assert_eq!(
            settings.state(both).hatch_fill,
            Some(HatchChoice::Palette),
            "compound states use the selected settings"
        );
        assert_eq!(settings.state(PointState::HOVER).fill_opacity, Some(0.85));
        assert_eq!(settings.state(PointState::NORMAL).fill_opacity, Some(0.65));
    }

    #[test]
    fn selection_tokens_are_detected() {
        let sum = LabelFormat::Template("Total: {%selectedPointsSum}".into());
        assert!(sum.reads_selection());
        assert!(!LabelFormat::Template("{%Name}".into()).reads_selection());
        assert!(!LabelFormat::Value.reads_selection());
    }

    #[test]
    fn diff_groups_fields() {
        let a = StateSettings::default();
        let b = StateSettings::default().with_fill(css::RED);
        let d = a.diff(&b);
        assert!(d.appearance && !d.labels && !d.markers, "{d:?}");

        let c = StateSettings::default().with_labels(LabelSettings {
            enabled: Some(false),
            ..LabelSettings::default()
        });
        let d = a.diff(&c);
        assert!(!d.appearance && d.labels && !d.markers, "{d:?}");
        assert_eq!(a.diff(&a), SettingsDiff::default());
    }
}
