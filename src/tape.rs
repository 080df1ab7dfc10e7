//! This module defines the unbounded, bidirectional tape used by the execution engine.
//!
//! Only a finite window `[lo, hi)` of cells is materialized. Cells outside it hold the default
//! symbol and are materialized when the head moves onto them, so `lo <= head < hi` always holds.

use crate::types::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::iter::once;

const PREFIX: &str = "... ";
const SUFFIX: &str = " ...";

/// A single-track tape with a read/write head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    cells: VecDeque<Symbol>,
    lo: i64,
    head: i64,
    default_symbol: Symbol,
}

/// A two-line text depiction of a tape.
///
/// ```text
/// ... zero one  zero zero ...
///     -1   0^s0 1    2
/// ```
///
/// The first line shows the materialized cells, framed by one default cell and an ellipsis on
/// each side. The second line labels each cell with its absolute index and marks the head with
/// `^<state>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendering {
    /// The framed symbol line.
    pub tape: String,
    /// The index and head marker line.
    pub ruler: String,
}

impl fmt::Display for Rendering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.tape)?;
        write!(f, "{}", self.ruler)
    }
}

impl Tape {
    /// Creates a tape holding `initial` at positions `0..initial.len()` with the head on cell 0.
    ///
    /// An empty input materializes a single default cell under the head.
    pub fn new(initial: Vec<Symbol>, default_symbol: Symbol) -> Self {
        let mut cells = VecDeque::from(initial);
        if cells.is_empty() {
            cells.push_back(default_symbol.clone());
        }

        Self {
            cells,
            lo: 0,
            head: 0,
            default_symbol,
        }
    }

    /// Returns the symbol under the head, or `None` if the head left the materialized window.
    pub fn read(&self) -> Option<&str> {
        self.offset(self.head)
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
    }

    /// Overwrites the cell under the head and returns the previous symbol.
    ///
    /// Returns `None` and leaves the tape untouched if the head is outside the window.
    pub fn write(&mut self, symbol: Symbol) -> Option<Symbol> {
        let cell = self.offset(self.head).and_then(|i| self.cells.get_mut(i))?;
        Some(std::mem::replace(cell, symbol))
    }

    /// Materializes one default cell below the window.
    pub fn extend_left(&mut self) {
        self.cells.push_front(self.default_symbol.clone());
        self.lo -= 1;
    }

    /// Materializes one default cell above the window.
    pub fn extend_right(&mut self) {
        self.cells.push_back(self.default_symbol.clone());
    }

    /// Moves the head one cell left, extending the window if needed.
    pub fn move_left(&mut self) {
        self.head -= 1;
        if self.head < self.lo {
            self.extend_left();
        }
    }

    /// Moves the head one cell right, extending the window if needed.
    pub fn move_right(&mut self) {
        self.head += 1;
        if self.head >= self.hi() {
            self.extend_right();
        }
    }

    /// Returns the logical symbol at an absolute position; unmaterialized cells read as default.
    pub fn get(&self, position: i64) -> &str {
        self.offset(position)
            .and_then(|i| self.cells.get(i))
            .unwrap_or(&self.default_symbol)
    }

    /// Returns the absolute position of the head.
    pub fn head(&self) -> i64 {
        self.head
    }

    /// Returns the lowest materialized position.
    pub fn lo(&self) -> i64 {
        self.lo
    }

    /// Returns one past the highest materialized position.
    pub fn hi(&self) -> i64 {
        self.lo + self.cells.len() as i64
    }

    /// Returns the symbol used for unwritten cells.
    pub fn default_symbol(&self) -> &str {
        &self.default_symbol
    }

    /// Returns the materialized cells from `lo` to `hi`.
    pub fn cells(&self) -> Vec<&str> {
        self.cells.iter().map(String::as_str).collect()
    }

    /// Renders the tape with the head labelled by `state`.
    ///
    /// Every cell is padded to the same width: the longest symbol shown, or the head label
    /// `^<state>` plus one, whichever is larger.
    pub fn render(&self, state: &str) -> Rendering {
        let label = format!("^{state}");
        let width = self
            .cells
            .iter()
            .chain(once(&self.default_symbol))
            .map(|symbol| symbol.len())
            .max()
            .unwrap_or(0)
            .max(label.len() + 1);

        let padded = once(&self.default_symbol)
            .chain(self.cells.iter())
            .chain(once(&self.default_symbol))
            .map(|symbol| format!("{symbol:<width$}"))
            .collect::<Vec<_>>()
            .join(" ");
        let tape = format!("{PREFIX}{padded}{SUFFIX}");

        let column =
            |position: i64| PREFIX.len() as i64 + (position - self.lo + 1) * (width as i64 + 1);
        let mut ruler = vec![b' '; tape.len()];
        for position in (self.lo - 1)..=self.hi() {
            stamp(&mut ruler, column(position), &position.to_string());
        }
        stamp(&mut ruler, column(self.head) + 1, &label);

        let ruler = String::from_utf8_lossy(&ruler).trim_end().to_string();

        Rendering { tape, ruler }
    }

    /// Converts an absolute position to an index into `cells`.
    fn offset(&self, position: i64) -> Option<usize> {
        if position >= self.lo && position < self.hi() {
            Some((position - self.lo) as usize)
        } else {
            None
        }
    }
}

/// Writes `text` into `line` starting at `start`, dropping whatever falls outside the line.
fn stamp(line: &mut [u8], start: i64, text: &str) {
    for (i, byte) in text.bytes().enumerate() {
        let column = start + i as i64;
        if column > 0 && (column as usize) < line.len() {
            line[column as usize] = byte;
        }
    }
}
