//! Authoritative world state of the coverage environment.
//!
//! [`GridState`] owns the static obstacle layer, the per-episode dirty,
//! visited and occupancy layers, and the agent registry. Construction is
//! two-phase: [`GridState::build`] creates every static layer once, then
//! [`GridState::reset`] only touches per-episode state.
//!
//! Moves go through three calls so that a whole tick can be validated as a
//! batch: [`GridState::apply_move`] stages a destination, then either
//! [`GridState::commit_move`] or [`GridState::rollback_move`] settles it.

use ndarray::Array2;

use super::agent::{AgentSnapshot, AgentState};
use super::collision::RewindCause;
use super::error::ConfigError;
use super::layout::EnvLayout;
use super::types::{Action, Cell};

/// Ground truth of the grid world.
#[derive(Debug, Clone)]
pub struct GridState {
    n_row: usize,
    n_col: usize,
    obstacles: Array2<bool>,
    /// Dirty set restored on every reset.
    initial_dirty: Array2<bool>,
    initial_dirty_count: usize,
    dirty: Array2<bool>,
    dirty_remaining: usize,
    /// First agent to have stood on each cell this episode.
    visited: Array2<Option<usize>>,
    /// Agent committed on each cell.
    occupancy: Array2<Option<usize>>,
    agents: Vec<AgentState>,
}

impl GridState {
    /// Builds the grid for a layout and performs the first reset.
    ///
    /// The layout is sanitised first (see [`EnvLayout::sanitized`]).
    pub fn build(layout: &EnvLayout) -> Result<Self, ConfigError> {
        let layout = layout.sanitized()?;
        let shape = (layout.n_row, layout.n_col);

        let mut obstacles = Array2::from_elem(shape, false);
        for cell in &layout.obstacles {
            obstacles[cell.ix()] = true;
        }
        let mut initial_dirty = Array2::from_elem(shape, false);
        for cell in &layout.dirty {
            initial_dirty[cell.ix()] = true;
        }

        let mut grid = Self {
            n_row: layout.n_row,
            n_col: layout.n_col,
            obstacles,
            dirty: initial_dirty.clone(),
            initial_dirty,
            initial_dirty_count: 0,
            dirty_remaining: 0,
            visited: Array2::from_elem(shape, None),
            occupancy: Array2::from_elem(shape, None),
            agents: layout.agent_homes.iter().copied().map(AgentState::new).collect(),
        };
        grid.reset(false);
        Ok(grid)
    }

    /// Restores the per-episode layers.
    ///
    /// The dirty layer returns to its initial set and the visited layer is
    /// cleared. A start cell counts as visited only once its agent commits
    /// onto it, which is also when it gets cleaned. With `keep_agents` the agents stay where the last episode left them;
    /// otherwise they return home. The obstacle layer is never touched.
    pub fn reset(&mut self, keep_agents: bool) {
        self.dirty.assign(&self.initial_dirty);
        self.initial_dirty_count = self.dirty.iter().filter(|&&d| d).count();
        self.dirty_remaining = self.initial_dirty_count;
        self.visited.fill(None);
        self.occupancy.fill(None);

        for (idx, agent) in self.agents.iter_mut().enumerate() {
            agent.reset(keep_agents);
            self.occupancy[agent.position.ix()] = Some(idx);
        }
    }

    /// Stages `cell` as the agent's destination for this tick.
    ///
    /// Occupancy is left untouched until [`GridState::commit_move`]. A target
    /// outside the grid or on an obstacle is refused with the matching
    /// [`RewindCause`]; the caller rewinds the agent.
    pub fn apply_move(&mut self, agent: usize, cell: Cell) -> Result<(), RewindCause> {
        if !self.in_bounds(cell) {
            return Err(RewindCause::OutOfBounds);
        }
        if self.is_obstacle(cell) {
            return Err(RewindCause::Obstacle);
        }
        self.agents[agent].pending = Some(cell);
        Ok(())
    }

    /// Finalises the agent's staged move and returns its new cell.
    ///
    /// The previous cell is only released if it still belongs to this agent,
    /// so simultaneous commits give the same result in any order.
    pub fn commit_move(&mut self, agent: usize) -> Cell {
        let state = &mut self.agents[agent];
        let Some(dest) = state.pending.take() else {
            return state.position;
        };
        let from = state.position;
        state.position = dest;

        if self.occupancy[from.ix()] == Some(agent) {
            self.occupancy[from.ix()] = None;
        }
        self.occupancy[dest.ix()] = Some(agent);
        if self.visited[dest.ix()].is_none() {
            self.visited[dest.ix()] = Some(agent);
        }
        dest
    }

    /// Drops the agent's staged move; it stays on its committed cell.
    pub fn rollback_move(&mut self, agent: usize) -> Cell {
        let state = &mut self.agents[agent];
        state.pending = None;
        state.position
    }

    /// Records the action an agent chose this tick.
    pub fn set_last_action(&mut self, agent: usize, action: Action) {
        self.agents[agent].last_action = action;
    }

    /// Cleans a cell. Returns true if it was dirty.
    pub fn clean(&mut self, cell: Cell) -> bool {
        let dirty = &mut self.dirty[cell.ix()];
        if *dirty {
            *dirty = false;
            self.dirty_remaining -= 1;
            true
        } else {
            false
        }
    }

    /// Increments an agent's cleaned-cell counter.
    pub fn credit_clean(&mut self, agent: usize) {
        self.agents[agent].cleaned += 1;
    }

    /// Agents whose staged destination is `cell`.
    pub fn pending_claimants(&self, cell: Cell) -> impl Iterator<Item = usize> + '_ {
        self.agents
            .iter()
            .enumerate()
            .filter(move |(_, a)| a.pending == Some(cell))
            .map(|(i, _)| i)
    }

    pub fn n_row(&self) -> usize {
        self.n_row
    }

    pub fn n_col(&self) -> usize {
        self.n_col
    }

    pub fn n_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn agent(&self, idx: usize) -> &AgentState {
        &self.agents[idx]
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.n_row && cell.col < self.n_col
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles[cell.ix()]
    }

    pub fn is_dirty(&self, cell: Cell) -> bool {
        self.dirty[cell.ix()]
    }

    /// Agent committed on `cell`, if any.
    pub fn occupant(&self, cell: Cell) -> Option<usize> {
        self.occupancy[cell.ix()]
    }

    /// Dirty cells left in this episode.
    pub fn dirty_count(&self) -> usize {
        self.dirty_remaining
    }

    /// Dirty cells at the start of this episode.
    pub fn initial_dirty_count(&self) -> usize {
        self.initial_dirty_count
    }

    pub fn obstacle_layer(&self) -> &Array2<bool> {
        &self.obstacles
    }

    pub fn dirty_layer(&self) -> &Array2<bool> {
        &self.dirty
    }

    pub fn visited_layer(&self) -> &Array2<Option<usize>> {
        &self.visited
    }

    pub fn occupancy_layer(&self) -> &Array2<Option<usize>> {
        &self.occupancy
    }

    /// Immutable copies of every agent.
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents
            .iter()
            .enumerate()
            .map(|(i, a)| a.snapshot(i))
            .collect()
    }

    /// Exports the static configuration back into a layout.
    pub fn layout(&self) -> EnvLayout {
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
            agent_homes: self.agents.iter().map(|a| a.home).collect(),
            dirty: cells_where(&self.initial_dirty),
            obstacles: cells_where(&self.obstacles),
        }
    }
}
