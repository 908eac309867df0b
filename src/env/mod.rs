//! Multi-agent grid coverage environment.
//!
//! Agents move on a rectangular grid with obstacles and clean dirty cells.
//! All agents move simultaneously; [`CollisionResolver`] validates every tick
//! as a batch before anything is committed to [`GridState`].

pub mod agent;
pub mod collision;
pub mod config;
pub mod environment;
pub mod error;
pub mod grid;
pub mod layout;
pub mod observation;
pub mod reward;
pub mod types;

#[cfg(test)]
mod tests;

pub use agent::{AgentSnapshot, AgentState};
pub use collision::{CollisionResolver, MoveOutcome, Resolution, RewindCause};
pub use config::{EnvConfig, RewardConfig, MAX_AGENTS, MAX_GRID, MIN_GRID};
pub use environment::{CoverageEnv, DoneReason, EpisodeStatus, StepInfo, StepResult};
pub use error::{ConfigError, EnvError};
pub use grid::GridState;
pub use layout::EnvLayout;
pub use observation::{Observation, ObservationBuilder, OBSERVATION_LAYERS};
pub use reward::{RewardModel, StepRewards};
pub use types::{Action, Cell};
