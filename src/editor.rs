//! Non-visual map editor.
//!
//! Holds the state a map-editing front end manipulates (obstacles, dirty
//! cells and agent homes) and exports it as an [`EnvLayout`]. Rendering and
//! pointer handling stay with the front end; it only forwards cell
//! coordinates of its clicks and drags here.

use ndarray::Array2;
use tracing::{debug, warn};

use crate::env::{Cell, ConfigError, EnvLayout, MAX_AGENTS, MAX_GRID, MIN_GRID};

/// What a click or drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Rectangles toggle obstacles.
    Obstacle,
    /// Rectangles toggle dirty cells.
    Dirty,
    /// Drags place, remove and move agents.
    Agent,
    /// A run is using the layout; every edit is ignored.
    Blocked,
}

/// Editable map model.
#[derive(Debug, Clone)]
pub struct LayoutEditor {
    n_row: usize,
    n_col: usize,
    obstacles: Array2<bool>,
    dirty: Array2<bool>,
    agents: Vec<Cell>,
    mode: EditMode,
    /// Mode to restore when a run ends.
    resume_mode: EditMode,
}

impl LayoutEditor {
    /// Empty map of the given size with every cell dirty.
    pub fn new(n_row: usize, n_col: usize) -> Self {
        let (n_row, n_col) = clamp_size(n_row, n_col);
        Self {
            n_row,
            n_col,
            obstacles: Array2::from_elem((n_row, n_col), false),
            dirty: Array2::from_elem((n_row, n_col), true),
            agents: Vec::new(),
            mode: EditMode::Obstacle,
            resume_mode: EditMode::Obstacle,
        }
    }

    /// Loads a layout, e.g. the last exported one, for further editing.
    pub fn from_layout(layout: &EnvLayout) -> Self {
        let mut editor = Self::new(layout.n_row, layout.n_col);
        editor.dirty.fill(false);
        for &cell in &layout.obstacles {
            if editor.in_bounds(cell) {
                editor.obstacles[cell.ix()] = true;
            }
        }
        for &cell in &layout.dirty {
            if editor.in_bounds(cell) {
                editor.dirty[cell.ix()] = true;
            }
        }
        for &home in &layout.agent_homes {
            if editor.in_bounds(home)
                && !editor.obstacles[home.ix()]
                && !editor.agents.contains(&home)
                && editor.agents.len() < MAX_AGENTS
            {
                editor.agents.push(home);
            }
        }
        editor
    }

    pub fn n_row(&self) -> usize {
        self.n_row
    }

    pub fn n_col(&self) -> usize {
        self.n_col
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Agent homes in index order.
    pub fn agents(&self) -> &[Cell] {
        &self.agents
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.obstacles[cell.ix()]
    }

    pub fn is_dirty(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.dirty[cell.ix()]
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.n_row && cell.col < self.n_col
    }

    fn locked(&self) -> bool {
        self.mode == EditMode::Blocked
    }

    /// Switches the edit mode. Ignored while a run holds the layout.
    pub fn set_mode(&mut self, mode: EditMode) -> bool {
        if self.locked() || mode == EditMode::Blocked {
            return false;
        }
        self.mode = mode;
        true
    }

    /// Blocks editing while a run uses the exported layout.
    pub fn begin_run(&mut self) {
        if !self.locked() {
            self.resume_mode = self.mode;
            self.mode = EditMode::Blocked;
        }
    }

    /// Re-enables editing in the mode active before the run.
    pub fn end_run(&mut self) {
        if self.locked() {
            self.mode = self.resume_mode;
        }
    }

    /// Changes the map size, clamped to the supported range.
    ///
    /// Content inside the new bounds is kept, new cells start dirty and
    /// agents that fall outside are removed.
    pub fn resize(&mut self, n_row: usize, n_col: usize) -> bool {
        if self.locked() {
            return false;
        }
        let (n_row, n_col) = clamp_size(n_row, n_col);
        let mut obstacles = Array2::from_elem((n_row, n_col), false);
        let mut dirty = Array2::from_elem((n_row, n_col), true);
        for ((r, c), cell) in obstacles.indexed_iter_mut() {
            if r < self.n_row && c < self.n_col {
                *cell = self.obstacles[(r, c)];
                dirty[(r, c)] = self.dirty[(r, c)];
            }
        }
        self.agents.retain(|a| a.row < n_row && a.col < n_col);
        self.n_row = n_row;
        self.n_col = n_col;
        self.obstacles = obstacles;
        self.dirty = dirty;
        true
    }

    /// Applies a drag rectangle spanned by two corner cells.
    ///
    /// Obstacle mode toggles obstacles, skipping agent homes. Dirty mode
    /// toggles dirty flags, skipping obstacles. Returns the number of cells
    /// changed.
    pub fn apply_rect(&mut self, corner_a: Cell, corner_b: Cell) -> usize {
        if !matches!(self.mode, EditMode::Obstacle | EditMode::Dirty) {
            return 0;
        }
        let rows = corner_a.row.min(corner_b.row)..=corner_a.row.max(corner_b.row).min(self.n_row - 1);
        let cols = corner_a.col.min(corner_b.col)..=corner_a.col.max(corner_b.col).min(self.n_col - 1);

        let mut changed = 0;
        for row in rows {
            for col in cols.clone() {
                let cell = Cell::new(row, col);
                let toggled = match self.mode {
                    EditMode::Obstacle if !self.agents.contains(&cell) => {
                        self.obstacles[cell.ix()] = !self.obstacles[cell.ix()];
                        true
                    }
                    EditMode::Dirty if !self.obstacles[cell.ix()] => {
                        self.dirty[cell.ix()] = !self.dirty[cell.ix()];
                        true
                    }
                    _ => false,
                };
                if toggled {
                    changed += 1;
                }
            }
        }
        debug!(mode = ?self.mode, changed, "rectangle applied");
        changed
    }

    /// Applies an agent drag from `from` to `to`.
    ///
    /// Releasing on the press cell toggles an agent there; dragging an agent
    /// moves it when the target is free. Obstacle targets are refused.
    pub fn drag_agent(&mut self, from: Cell, to: Cell) -> bool {
        if self.mode != EditMode::Agent || !self.in_bounds(from) || !self.in_bounds(to) {
            return false;
        }
        if self.obstacles[to.ix()] {
            return false;
        }

        let at_from = self.agents.iter().position(|&a| a == from);
        let to_taken = self.agents.contains(&to);
        match at_from {
            Some(idx) if from == to => {
                self.agents.remove(idx);
                true
            }
            None if from == to => {
                if self.agents.len() >= MAX_AGENTS {
                    warn!(max = MAX_AGENTS, "agent limit reached");
                    return false;
                }
                self.agents.push(to);
                true
            }
            Some(idx) if !to_taken => {
                self.agents[idx] = to;
                true
            }
            _ => false,
        }
    }

    pub fn clear_obstacles(&mut self) {
        if !self.locked() {
            self.obstacles.fill(false);
        }
    }

    /// Marks every cell dirty again.
    pub fn reset_dirty(&mut self) {
        if !self.locked() {
            self.dirty.fill(true);
        }
    }

    pub fn clear_dirty(&mut self) {
        if !self.locked() {
            self.dirty.fill(false);
        }
    }

    pub fn clear_agents(&mut self) {
        if !self.locked() {
            self.agents.clear();
        }
    }

    /// Exports the map as a sanitised layout.
    ///
    /// Dirty flags under obstacles are dropped.
    pub fn export(&self) -> Result<EnvLayout, ConfigError> {
        let cells_where = |layer: &Array2<bool>| -> Vec<Cell> {
            layer
                .indexed_iter()
                .filter(|&(_, &v)| v)
                .map(|(ix, _)| Cell::from(ix))
                .collect()
        };
        EnvLayout {
            n_row: self.n_row,
            n_col: self.n_col,
            agent_homes: self.agents.clone(),
            dirty: cells_where(&self.dirty),
            obstacles: cells_where(&self.obstacles),
        }
        .sanitized()
    }
}

impl Default for LayoutEditor {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

fn clamp_size(n_row: usize, n_col: usize) -> (usize, usize) {
    let clamped = (n_row.clamp(MIN_GRID, MAX_GRID), n_col.clamp(MIN_GRID, MAX_GRID));
    if clamped != (n_row, n_col) {
        warn!(n_row, n_col, "map size clamped to {}x{}", clamped.0, clamped.1);
    }
    clamped
}
