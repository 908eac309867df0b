//! Core types for the coverage grid.
//!
//! Defines grid cells and the discrete action set shared by the
//! environment, the policies and the replay store.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `(row, col)` cell on the grid.
///
/// Row 0 is the top row; `Up` decreases the row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    /// Creates a new cell.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Applies a displacement, returning `None` when the result would leave
    /// the `[0, n_row) x [0, n_col)` rectangle.
    pub fn offset(&self, delta: (isize, isize), n_row: usize, n_col: usize) -> Option<Cell> {
        let row = self.row.checked_add_signed(delta.0)?;
        let col = self.col.checked_add_signed(delta.1)?;
        (row < n_row && col < n_col).then_some(Cell { row, col })
    }

    /// Manhattan distance to another cell.
    pub fn manhattan(&self, other: &Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Index pair usable with `ndarray` layers.
    pub fn ix(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the five discrete agent actions.
///
/// The discriminant is the action index seen by learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Action {
    Stay = 0,
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
}

impl Action {
    /// All actions in index order.
    pub const ALL: [Action; 5] = [
        Action::Stay,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
    ];

    /// The four movement actions (the no-op-free action set).
    pub const MOVES: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// `(d_row, d_col)` displacement of this action.
    pub fn delta(&self) -> (isize, isize) {
        match self {
            Action::Stay => (0, 0),
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// Index of this action in [`Action::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Looks up an action by index.
    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// Returns true for every action except [`Action::Stay`].
    pub fn is_move(&self) -> bool {
        !matches!(self, Action::Stay)
    }

    /// One-hot encoding over the five-action set.
    pub fn one_hot(&self) -> [f32; 5] {
        let mut v = [0.0; 5];
        v[self.index()] = 1.0;
        v
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Stay => write!(f, "stay"),
            Action::Up => write!(f, "up"),
            Action::Down => write!(f, "down"),
            Action::Left => write!(f, "left"),
            Action::Right => write!(f, "right"),
        }
    }
}
