// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Venn input rows and the shared data set charts observe.

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use lune_core::{Consistency, ConsistencyState, Invalidatable, Signal};
use peniko::Color;
use smallvec::SmallVec;

use crate::settings::{HatchChoice, StateSettings, StatefulSettings, StrokeStyle};

/// Set names of a parsed key.
pub type SetNames = SmallVec<[String; 2]>;

/// Why a set key could not be split into set names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataError {
    /// The key has no names, or one of its names is empty.
    EmptySetName {
        /// The key as given.
        key: String,
    },
    /// The data separator is empty.
    InvalidSeparator,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySetName { key } => write!(f, "set key {key:?} contains an empty set name"),
            Self::InvalidSeparator => write!(f, "data separator must not be empty"),
        }
    }
}

impl core::error::Error for DataError {}

/// Which sets a row describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetKey {
    /// Names joined by the chart's data separator, e.g. `"A&B"`.
    Joined(String),
    /// Explicit names.
    List(Vec<String>),
}

impl SetKey {
    /// An explicit list of names.
    pub fn list<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::List(names.into_iter().map(Into::into).collect())
    }

    /// Splits the key into set names.
    pub fn parse(&self, separator: &str) -> Result<SetNames, DataError> {
        let names: SetNames = match self {
            Self::Joined(key) => {
                if separator.is_empty() {
                    return Err(DataError::InvalidSeparator);
                }
                key.split(separator).map(String::from).collect()
            }
            Self::List(names) => names.iter().cloned().collect(),
        };
        if names.is_empty() || names.iter().any(String::is_empty) {
            return Err(DataError::EmptySetName { key: self.display(separator) });
        }
        Ok(names)
    }

    /// The key as text, list names joined by `separator`.
    pub fn display(&self, separator: &str) -> String {
        match self {
            Self::Joined(key) => key.clone(),
            Self::List(names) => names.join(separator),
        }
    }
}

impl From<&str> for SetKey {
    fn from(key: &str) -> Self {
        Self::Joined(key.into())
    }
}

impl From<String> for SetKey {
    fn from(key: String) -> Self {
        Self::Joined(key)
    }
}

impl From<Vec<String>> for SetKey {
    fn from(names: Vec<String>) -> Self {
        Self::List(names)
    }
}

impl<const N: usize> From<[&str; N]> for SetKey {
    fn from(names: [&str; N]) -> Self {
        Self::list(names)
    }
}

/// One Venn input row: a set or an intersection with its size.
#[derive(Clone, Debug, PartialEq)]
pub struct VennRow {
    /// Sets described by the row.
    pub x: SetKey,
    /// Area of the set or intersection.
    pub value: f64,
    /// Display name; the set key is used when absent.
    pub name: Option<String>,
    /// Per-point settings overriding the chart settings.
    pub settings: StatefulSettings,
}

impl VennRow {
    /// Creates a row without overrides.
    pub fn new(x: impl Into<SetKey>, value: f64) -> Self {
        Self {
            x: x.into(),
            value,
            name: None,
            settings: StatefulSettings::default(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the normal fill.
    pub fn with_fill(mut self, fill: Color) -> Self {
        self.settings.normal.fill = Some(fill);
        self
    }

    /// Overrides the normal outline.
    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.settings.normal.stroke = Some(stroke);
        self
    }

    /// Overrides the normal hatch.
    pub fn with_hatch_fill(mut self, hatch_fill: HatchChoice) -> Self {
        self.settings.normal.hatch_fill = Some(hatch_fill);
        self
    }

    /// Overrides the hovered settings.
    pub fn with_hovered(mut self, hovered: StateSettings) -> Self {
        self.settings.hovered = hovered;
        self
    }

    /// Overrides the selected settings.
    pub fn with_selected(mut self, selected: StateSettings) -> Self {
        self.settings.selected = selected;
        self
    }
}

/// A data set shared between charts.
pub type SharedDataSet = Rc<RefCell<DataSet>>;

/// Rows plus change notification.
///
/// Every mutation dispatches `DATA_CHANGED | NEEDS_REDRAW` to the listeners synchronously.
/// Mutating a data set from inside a draw pass re-enters invalidation and is not supported.
#[derive(Debug)]
pub struct DataSet {
    consistency: Consistency,
    rows: Vec<VennRow>,
}

impl DataSet {
    /// Creates a data set.
    pub fn new(rows: Vec<VennRow>) -> Self {
        Self {
            consistency: Consistency::new(
                ConsistencyState::DATA,
                Signal::DATA_CHANGED | Signal::NEEDS_REDRAW,
            ),
            rows,
        }
    }

    /// Creates a data set ready to be shared.
    pub fn shared(rows: Vec<VennRow>) -> SharedDataSet {
        Rc::new(RefCell::new(Self::new(rows)))
    }

    /// All rows.
    pub fn rows(&self) -> &[VennRow] {
        &self.rows
    }

    /// Row at `index`.
    pub fn row(&self, index: usize) -> Option<&VennRow> {
        self.rows.get(index)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row.
    pub fn push(&mut self, row: VennRow) {
        self.rows.push(row);
        self.changed();
    }

    /// Replaces the row at `index`. Returns `false` if out of range.
    pub fn set_row(&mut self, index: usize, row: VennRow) -> bool {
        let Some(slot) = self.rows.get_mut(index) else {
            return false;
        };
        if *slot != row {
            *slot = row;
            self.changed();
        }
        true
    }

    /// Changes the value of the row at `index`. Returns `false` if out of range.
    pub fn set_value(&mut self, index: usize, value: f64) -> bool {
        let Some(slot) = self.rows.get_mut(index) else {
            return false;
        };
        if slot.value.to_bits() != value.to_bits() {
            slot.value = value;
            self.changed();
        }
        true
    }

    /// Removes the row at `index`.
    pub fn remove(&mut self, index: usize) -> Option<VennRow> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        self.changed();
        Some(row)
    }

    /// Replaces every row.
    pub fn set_rows(&mut self, rows: Vec<VennRow>) {
        self.rows = rows;
        self.changed();
    }

    fn changed(&mut self) {
        log::trace!("data set changed: {} rows", self.rows.len());
        self.consistency
            .dispatch_signal(Signal::DATA_CHANGED | Signal::NEEDS_REDRAW);
    }
}

impl Invalidatable for DataSet {
    fn consistency(&self) -> &Consistency {
        &self.consistency
    }

    fn consistency_mut(&mut self) -> &mut Consistency {
        &mut self.consistency
    }
}
