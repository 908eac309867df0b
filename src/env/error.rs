use thiserror::Error;

use super::types::{Action, Cell};

/// Errors raised while validating an environment or training configuration.
///
/// Recoverable problems (grid too small, stray dirty cells) are clamped with a
/// warning instead; these variants cover the cases with no safe default.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Environment needs at least one agent")]
    NoAgents,

    #[error("Too many agents: {count} (supported maximum is {max})")]
    TooManyAgents { count: usize, max: usize },

    #[error("Agent {agent} home {cell} lies outside the {n_row}x{n_col} grid")]
    HomeOutOfBounds {
        agent: usize,
        cell: Cell,
        n_row: usize,
        n_col: usize,
    },

    #[error("Agents {first} and {second} share the home cell {cell}")]
    DuplicateHome {
        first: usize,
        second: usize,
        cell: Cell,
    },

    #[error("Grid has no free cell left after obstacle placement")]
    NoFreeCells,

    #[error("Layout has no dirty cell to clean")]
    NoDirtyCells,

    #[error("Not enough free cells ({free}) to place {agents} agents")]
    NotEnoughFreeCells { free: usize, agents: usize },

    #[error("Obstacle density must lie in [0, 1), got {0}")]
    InvalidDensity(f64),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Errors raised by [`super::CoverageEnv::step`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("Expected {expected} actions, got {actual}")]
    ActionCount { expected: usize, actual: usize },

    #[error("Action `{action}` is not part of this environment's action set")]
    ActionNotAllowed { action: Action },

    #[error("Episode already finished; call reset() before stepping again")]
    EpisodeFinished,
}
