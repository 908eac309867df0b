//! Greedy coverage baseline.
//!
//! Each agent heads for its nearest dirty cell by breadth-first search over
//! free cells, treating other agents as walls for the current tick.

use std::collections::VecDeque;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::trait_::Policy;
use crate::env::{Action, Cell, Observation};

/// Nearest-dirty-cell heuristic.
///
/// `noise` passed to [`Policy::choose_actions`] is the probability that an
/// agent takes a random action instead.
pub struct GreedyCoveragePolicy {
    actions: Vec<Action>,
    rng: StdRng,
}

impl GreedyCoveragePolicy {
    pub fn new(actions: &[Action], seed: u64) -> Self {
        let actions = if actions.is_empty() {
            Action::ALL.to_vec()
        } else {
            actions.to_vec()
        };
        Self {
            actions,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn allows_stay(&self) -> bool {
        self.actions.contains(&Action::Stay)
    }

    fn random_action(&mut self) -> Action {
        *self.actions.choose(&mut self.rng).unwrap_or(&Action::Stay)
    }

    /// First move on a shortest path to the closest dirty cell.
    fn plan(&self, obs: &Observation) -> Option<Action> {
        let start = own_cell(&obs.self_layer)?;
        if obs.dirty[start.ix()] > 0.5 && self.allows_stay() {
            return Some(Action::Stay);
        }

        let (n_row, n_col) = obs.shape();
        let blocked = |c: Cell| obs.obstacle[c.ix()] > 0.5 || obs.others[c.ix()] > 0.5;

        let mut first_move: Array2<Option<Action>> = Array2::from_elem((n_row, n_col), None);
        let mut seen = Array2::from_elem((n_row, n_col), false);
        seen[start.ix()] = true;
        let mut queue = VecDeque::new();

        for action in Action::MOVES {
            if let Some(next) = start.offset(action.delta(), n_row, n_col) {
                if !blocked(next) {
                    seen[next.ix()] = true;
                    first_move[next.ix()] = Some(action);
                    queue.push_back(next);
                }
            }
        }

        while let Some(cell) = queue.pop_front() {
            if obs.dirty[cell.ix()] > 0.5 {
                return first_move[cell.ix()];
            }
            for action in Action::MOVES {
                if let Some(next) = cell.offset(action.delta(), n_row, n_col) {
                    if !seen[next.ix()] && !blocked(next) {
                        seen[next.ix()] = true;
                        first_move[next.ix()] = first_move[cell.ix()];
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }
}

fn own_cell(layer: &Array2<f32>) -> Option<Cell> {
    layer
        .indexed_iter()
        .find(|&(_, &v)| v > 0.5)
        .map(|(ix, _)| Cell::from(ix))
}

impl Policy for GreedyCoveragePolicy {
    fn choose_actions(&mut self, observations: &[Observation], noise: f64) -> Vec<Action> {
        observations
            .iter()
            .map(|obs| {
                if noise > 0.0 && self.rng.gen_bool(noise.min(1.0)) {
                    return self.random_action();
                }
                match self.plan(obs) {
                    Some(action) => action,
                    None if self.allows_stay() => Action::Stay,
                    None => self.random_action(),
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "greedy_coverage"
    }
}
