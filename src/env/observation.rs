//! Observation encoding for the coverage environment.
//!
//! Each agent sees the whole map as four binary layers of shape
//! `(n_row, n_col)`. Other agents appear only as occupancy, never by index.

use ndarray::{Array2, Array3, Axis};

use super::grid::GridState;

/// Number of layers in an [`Observation`].
pub const OBSERVATION_LAYERS: usize = 4;

/// One agent's view of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// 1 on obstacle cells.
    pub obstacle: Array2<f32>,
    /// 1 on the observing agent's cell only.
    pub self_layer: Array2<f32>,
    /// 1 on every cell held by another agent.
    pub others: Array2<f32>,
    /// 1 on every cell that is still dirty.
    pub dirty: Array2<f32>,
}

impl Observation {
    /// `(n_row, n_col)` of each layer.
    pub fn shape(&self) -> (usize, usize) {
        self.obstacle.dim()
    }

    /// Layers stacked along a leading channel axis:
    /// `[obstacle, self, others, dirty]`.
    pub fn stacked(&self) -> Array3<f32> {
        let (n_row, n_col) = self.shape();
        let mut out = Array3::zeros((OBSERVATION_LAYERS, n_row, n_col));
        for (k, layer) in [&self.obstacle, &self.self_layer, &self.others, &self.dirty]
            .into_iter()
            .enumerate()
        {
            out.index_axis_mut(Axis(0), k).assign(layer);
        }
        out
    }

    /// Row-major flattening of [`Observation::stacked`].
    pub fn flatten(&self) -> Vec<f32> {
        self.stacked().iter().copied().collect()
    }
}

/// Builds observations from a [`GridState`] without mutating it.
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// Builds the observation for a single agent.
    pub fn build(grid: &GridState, agent_idx: usize) -> Observation {
        let shape = (grid.n_row(), grid.n_col());
        let own = grid.agent(agent_idx).position;

        let obstacle = grid.obstacle_layer().mapv(|o| if o { 1.0 } else { 0.0 });
        let dirty = grid.dirty_layer().mapv(|d| if d { 1.0 } else { 0.0 });

        let mut self_layer = Array2::zeros(shape);
        self_layer[own.ix()] = 1.0;

        let mut others = Array2::zeros(shape);
        for (idx, agent) in grid.agents().iter().enumerate() {
            if idx != agent_idx {
                others[agent.position.ix()] = 1.0;
            }
        }
        others[own.ix()] = 0.0;

        Observation {
            obstacle,
            self_layer,
            others,
            dirty,
        }
    }

    /// Builds observations for every agent, in index order.
    pub fn build_all(grid: &GridState) -> Vec<Observation> {
        (0..grid.n_agents())
            .map(|i| Self::build(grid, i))
            .collect()
    }

    /// Length of [`Observation::flatten`] for a grid.
    pub fn flat_dim(n_row: usize, n_col: usize) -> usize {
        OBSERVATION_LAYERS * n_row * n_col
    }
}
