// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rough text sizing for legend layout.
//!
//! Shaping belongs to whoever renders the text marks, so layout code takes a measurer.

use kurbo::Size;

/// Estimates the extent of a single line of text.
pub trait TextMeasurer {
    /// Size of `text` set at `font_size`, in mark coordinates.
    fn measure(&self, text: &str, font_size: f64) -> Size;
}

/// Fixed advance per character, one em tall.
#[derive(Clone, Copy, Debug)]
pub struct HeuristicTextMeasurer {
    /// Average glyph advance, in ems.
    pub advance: f64,
}

impl Default for HeuristicTextMeasurer {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> Size {
        let chars = text.chars().count() as f64;
        Size::new(self.advance * font_size * chars, font_size)
    }
}
