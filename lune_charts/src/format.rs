// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Values exposed to label and tooltip text.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};

use crate::settings::LabelFormat;

/// Per-point values available to label formats.
///
/// Templates reference them as `{%X}`, `{%Name}`, `{%Value}`, `{%Index}`,
/// `{%IsIntersection}` and `{%SelectedPointsSum}`. Token names are case-insensitive;
/// unknown tokens are kept verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatContext {
    /// Data row index.
    pub index: usize,
    /// Set key, joined by the data separator.
    pub x: String,
    /// Row name; the set key when the row has none.
    pub name: String,
    /// Row value.
    pub value: f64,
    /// Whether the row describes an intersection of several sets.
    pub is_intersection: bool,
    /// Sum of the values of all selected points.
    pub selected_points_sum: f64,
}

impl FormatContext {
    /// Value of a template token, without the `{%` `}` delimiters.
    pub fn token(&self, token: &str) -> Option<String> {
        let value = match token.to_ascii_lowercase().as_str() {
            "x" => self.x.clone(),
            "name" => self.name.clone(),
            "value" => format!("{}", self.value),
            "index" => self.index.to_string(),
            "isintersection" => self.is_intersection.to_string(),
            "selectedpointssum" => format!("{}", self.selected_points_sum),
            _ => return None,
        };
        Some(value)
    }

    /// Renders `format` for this point.
    pub fn format(&self, format: &LabelFormat) -> String {
        match format {
            LabelFormat::Name => self.name.clone(),
            LabelFormat::X => self.x.clone(),
            LabelFormat::Value => format!("{}", self.value),
            LabelFormat::Template(template) => self.render(template),
        }
    }

    fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{%") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            match self.token(&after[..end]) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> FormatContext {
        FormatContext {
            index: 2,
            x: "A&B".into(),
            name: "Both".into(),
            value: 4.0,
            is_intersection: true,
            selected_points_sum: 14.5,
        }
    }

    #[test]
    fn templates_substitute_tokens() {
        let ctx = context();
        let text = ctx.format(&LabelFormat::Template(
            "{%Name} ({%x}): {%VALUE} #{%Index} {%IsIntersection} {%SelectedPointsSum}".into(),
        ));
        assert_eq!(text, "Both (A&B): 4 #2 true 14.5");
    }

    #[test]
    fn unknown_and_unterminated_tokens_are_kept() {
        let ctx = context();
        assert_eq!(
            ctx.format(&LabelFormat::Template("{%Nope} {%Name".into())),
            "{%Nope} {%Name"
        );
        assert_eq!(ctx.format(&LabelFormat::Value), "4");
        assert_eq!(ctx.format(&LabelFormat::X), "A&B");
    }
}
