//! Coverage environment and episode control.
//!
//! Each tick runs: propose moves → resolve collisions → apply rewards and
//! cleaning → build next observations → evaluate termination.

use ndarray::Array2;
use tracing::{debug, info};

use super::agent::AgentSnapshot;
use super::collision::{CollisionResolver, MoveOutcome};
use super::config::EnvConfig;
use super::error::{ConfigError, EnvError};
use super::grid::GridState;
use super::layout::EnvLayout;
use super::observation::{Observation, ObservationBuilder};
use super::reward::RewardModel;
use super::types::{Action, Cell};

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoneReason {
    /// Every dirty cell was cleaned.
    Cleared,
    /// The step budget ran out first.
    Truncated,
}

/// Episode state shared by all agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStatus {
    Running,
    Done(DoneReason),
}

impl EpisodeStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, EpisodeStatus::Done(_))
    }
}

/// Snapshot of the world after a step, for loggers and renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Steps taken in this episode, including this one.
    pub steps: u32,
    pub agents: Vec<AgentSnapshot>,
    /// First agent to visit each cell, `None` when unvisited.
    pub visited: Array2<Option<usize>>,
    pub dirty: Array2<bool>,
    /// Per-agent outcome of the move proposal.
    pub outcomes: Vec<MoveOutcome>,
    /// Cells cleaned this step, with the cleaning agent.
    pub cleaned: Vec<(usize, Cell)>,
    pub dirty_remaining: usize,
}

impl StepInfo {
    /// Number of agents rewound this step.
    pub fn rewound(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rewound()).count()
    }
}

/// Result of a single environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Per-agent observations after the step.
    pub observations: Vec<Observation>,
    /// Per-agent rewards.
    pub rewards: Vec<f64>,
    /// Per-agent done flags; all equal since agents finish together.
    pub dones: Vec<bool>,
    /// The episode ended because every dirty cell was cleaned.
    pub terminated: bool,
    /// The episode ended because the step budget ran out.
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepResult {
    /// Whether the episode is over for any reason.
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }

    /// Sum of the agents' rewards.
    pub fn team_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// The multi-agent coverage environment.
///
/// # Lifecycle
///
/// 1. Build with [`CoverageEnv::new`]; the grid is already reset.
/// 2. Call [`CoverageEnv::reset`] to start an episode and get observations.
/// 3. Call [`CoverageEnv::step`] with one action per agent until
///    [`StepResult::done`].
#[derive(Debug, Clone)]
pub struct CoverageEnv {
    config: EnvConfig,
    grid: GridState,
    steps: u32,
    status: EpisodeStatus,
}

impl CoverageEnv {
    /// Builds an environment, sanitising the layout.
    pub fn new(config: EnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = GridState::build(&config.layout)?;
        info!(
            n_row = grid.n_row(),
            n_col = grid.n_col(),
            n_agents = grid.n_agents(),
            dirty = grid.initial_dirty_count(),
            "coverage environment built"
        );
        Ok(Self {
            config,
            grid,
            steps: 0,
            status: EpisodeStatus::Running,
        })
    }

    /// Replaces the layout and rewards, rebuilding the static layers.
    pub fn reconfigure(&mut self, config: EnvConfig) -> Result<(), ConfigError> {
        *self = Self::new(config)?;
        Ok(())
    }

    /// Starts a new episode.
    ///
    /// With `keep_agents` the agents start where the previous episode left
    /// them instead of at their homes.
    pub fn reset(&mut self, keep_agents: bool) -> Vec<Observation> {
        self.grid.reset(keep_agents);
        self.steps = 0;
        self.status = EpisodeStatus::Running;
        ObservationBuilder::build_all(&self.grid)
    }

    /// Executes one tick.
    ///
    /// # Errors
    ///
    /// [`EnvError::ActionCount`] when `actions` does not hold one action per
    /// agent, [`EnvError::ActionNotAllowed`] for [`Action::Stay`] when the
    /// action set excludes it, [`EnvError::EpisodeFinished`] after the
    /// episode ended. Invalid moves and collisions are not errors.
    pub fn step(&mut self, actions: &[Action]) -> Result<StepResult, EnvError> {
        if self.status.is_done() {
            return Err(EnvError::EpisodeFinished);
        }
        if actions.len() != self.grid.n_agents() {
            return Err(EnvError::ActionCount {
                expected: self.grid.n_agents(),
                actual: actions.len(),
            });
        }
        if let Some(&action) = actions
            .iter()
            .find(|a| !self.config.action_set().contains(a))
        {
            return Err(EnvError::ActionNotAllowed { action });
        }

        let resolution = CollisionResolver::resolve(&mut self.grid, actions);
        let scored = RewardModel::apply(&mut self.grid, actions, &resolution, &self.config.rewards);
        self.steps += 1;

        let terminated = self.grid.dirty_count() == 0;
        let truncated = !terminated && self.steps >= self.config.max_steps;
        if terminated {
            self.status = EpisodeStatus::Done(DoneReason::Cleared);
        } else if truncated {
            self.status = EpisodeStatus::Done(DoneReason::Truncated);
        }

        debug!(
            step = self.steps,
            rewound = resolution.rewound_count(),
            cleaned = scored.cleaned.len(),
            dirty_remaining = self.grid.dirty_count(),
            "step"
        );

        let done = terminated || truncated;
        Ok(StepResult {
            observations: ObservationBuilder::build_all(&self.grid),
            rewards: scored.rewards,
            dones: vec![done; self.grid.n_agents()],
            terminated,
            truncated,
            info: StepInfo {
                steps: self.steps,
                agents: self.grid.snapshot(),
                visited: self.grid.visited_layer().clone(),
                dirty: self.grid.dirty_layer().clone(),
                outcomes: resolution.outcomes,
                cleaned: scored.cleaned,
                dirty_remaining: self.grid.dirty_count(),
            },
        })
    }

    /// Current observations without stepping.
    pub fn observe(&self) -> Vec<Observation> {
        ObservationBuilder::build_all(&self.grid)
    }

    /// Fraction of the episode's initial dirty cells that have been cleaned.
    pub fn coverage(&self) -> f64 {
        let initial = self.grid.initial_dirty_count();
        if initial == 0 {
            return 1.0;
        }
        (initial - self.grid.dirty_count()) as f64 / initial as f64
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Sanitised layout currently in use.
    pub fn layout(&self) -> EnvLayout {
        self.grid.layout()
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn n_agents(&self) -> usize {
        self.grid.n_agents()
    }

    /// Number of actions per agent.
    pub fn action_dim(&self) -> usize {
        self.config.action_dim()
    }
}
