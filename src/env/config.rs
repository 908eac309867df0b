//! Configuration for the coverage environment.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::layout::EnvLayout;
use super::types::Action;

/// Smallest supported grid side.
pub const MIN_GRID: usize = 5;
/// Largest supported grid side.
pub const MAX_GRID: usize = 20;
/// Largest supported number of agents.
pub const MAX_AGENTS: usize = 10;

/// Reward shaping constants.
///
/// The structure of the reward is fixed (see [`super::RewardModel`]); only
/// the magnitudes are tunable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RewardConfig {
    /// Cost charged every step to an agent that chose a movement action.
    pub step_cost: f64,
    /// Cost charged every step to an agent that chose [`Action::Stay`].
    pub idle_cost: f64,
    /// Penalty for every agent whose move was rewound.
    pub collision_penalty: f64,
    /// Reward for committing onto a dirty cell.
    pub clean_reward: f64,
    /// Scale of the terminal bonus paid once all dirty cells are cleaned.
    pub terminal_bonus_scale: f64,
}

impl RewardConfig {
    /// Checks that costs are non-positive and gains are non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, f64, bool); 5] = [
            ("step_cost", self.step_cost, self.step_cost <= 0.0),
            ("idle_cost", self.idle_cost, self.idle_cost <= 0.0),
            (
                "collision_penalty",
                self.collision_penalty,
                self.collision_penalty <= 0.0,
            ),
            ("clean_reward", self.clean_reward, self.clean_reward >= 0.0),
            (
                "terminal_bonus_scale",
                self.terminal_bonus_scale,
                self.terminal_bonus_scale >= 0.0,
            ),
        ];
        for (name, value, ok) in checks {
            if !value.is_finite() || !ok {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("{} has the wrong sign or is not finite", value),
                });
            }
        }
        Ok(())
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            step_cost: -0.05,
            idle_cost: -0.1,
            collision_penalty: -0.5,
            clean_reward: 1.0,
            terminal_bonus_scale: 10.0,
        }
    }
}

/// Full configuration of a [`super::CoverageEnv`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    /// Grid geometry, agent homes, dirty and obstacle cells.
    pub layout: EnvLayout,
    /// Reward shaping constants.
    pub rewards: RewardConfig,
    /// Step budget; reaching it truncates the episode.
    pub max_steps: u32,
    /// Whether [`Action::Stay`] is part of the action set.
    pub allow_stay: bool,
}

impl EnvConfig {
    /// Creates a configuration with default rewards for the given layout.
    pub fn new(layout: EnvLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Actions available to agents, in index order.
    pub fn action_set(&self) -> &'static [Action] {
        if self.allow_stay {
            &Action::ALL
        } else {
            &Action::MOVES
        }
    }

    /// Number of actions available to each agent.
    pub fn action_dim(&self) -> usize {
        self.action_set().len()
    }

    /// Validates the scalar parameters. Layout problems are checked when the
    /// grid is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_steps",
                reason: "step budget must be positive".into(),
            });
        }
        self.rewards.validate()
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            layout: EnvLayout::default(),
            rewards: RewardConfig::default(),
            max_steps: 200,
            allow_stay: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EnvConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.action_dim(), 5);
    }

    #[test]
    fn action_set_without_stay() {
        let cfg = EnvConfig {
            allow_stay: false,
            ..EnvConfig::default()
        };
        assert_eq!(cfg.action_dim(), 4);
        assert!(!cfg.action_set().contains(&Action::Stay));
    }

    #[test]
    fn positive_step_cost_rejected() {
        let rewards = RewardConfig {
            step_cost: 0.5,
            ..RewardConfig::default()
        };
        assert!(matches!(
            rewards.validate(),
            Err(ConfigError::InvalidParameter {
                name: "step_cost",
                ..
            })
        ));
    }

    #[test]
    fn zero_step_budget_rejected() {
        let cfg = EnvConfig {
            max_steps: 0,
            ..EnvConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
