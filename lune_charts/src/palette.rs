// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Palettes that hand out per-series defaults by index.

extern crate alloc;

use alloc::vec::Vec;

use peniko::Color;
use peniko::color::palette::css;

use crate::settings::HatchKind;
use crate::symbol::Symbol;

/// A cyclic list of items.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette<T> {
    items: Vec<T>,
}

/// Region colors.
pub type ColorPalette = Palette<Color>;
/// Hatch patterns.
pub type HatchFillPalette = Palette<HatchKind>;
/// Marker shapes.
pub type MarkerPalette = Palette<Symbol>;

impl<T: Clone> Palette<T> {
    /// Creates a palette from `items`.
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Items in order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the palette has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`, wrapping around. `None` for an empty palette.
    pub fn item_at(&self, index: usize) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[index % self.items.len()].clone())
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new([
            Color::from_rgb8(0x64, 0xb5, 0xf6),
            Color::from_rgb8(0x19, 0x76, 0xd2),
            Color::from_rgb8(0xef, 0x6c, 0x00),
            Color::from_rgb8(0xff, 0xd5, 0x4f),
            Color::from_rgb8(0x45, 0x5a, 0x64),
            Color::from_rgb8(0x96, 0xa6, 0xa6),
            Color::from_rgb8(0xdd, 0x2c, 0x00),
            Color::from_rgb8(0x00, 0x83, 0x8f),
            Color::from_rgb8(0x00, 0xbf, 0xa5),
            Color::from_rgb8(0xff, 0xa0, 0x00),
        ])
    }
}

impl Default for HatchFillPalette {
    fn default() -> Self {
        Self::new([
            HatchKind::BackwardDiagonal,
            HatchKind::ForwardDiagonal,
            HatchKind::Horizontal,
            HatchKind::Vertical,
            HatchKind::DiagonalCross,
            HatchKind::Cross,
        ])
    }
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self::new([
            Symbol::Circle,
            Symbol::Square,
            Symbol::TriangleUp,
            Symbol::Diamond,
            Symbol::TriangleDown,
            Symbol::Cross,
        ])
    }
}

/// Mixes `colors` pairwise, each step taking the midpoint of the running mix and the next
/// color. An empty list is black.
pub fn blend_colors(colors: &[Color]) -> Color {
    let Some((first, rest)) = colors.split_first() else {
        return css::BLACK;
    };
    rest.iter().fold(*first, |acc, next| {
        let a = acc.components;
        let b = next.components;
        Color::new([
            (a[0] + b[0]) * 0.5,
            (a[1] + b[1]) * 0.5,
            (a[2] + b[2]) * 0.5,
            (a[3] + b[3]) * 0.5,
        ])
    })
}
