//! Training run configuration.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::env::{ConfigError, EnvConfig, EnvLayout, RewardConfig, MAX_AGENTS};
use crate::replay::ReplayConfig;

/// Every knob of a training run, enumerated up front.
///
/// Passed by value into [`super::Trainer`]; nothing is read from globals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrainingConfig {
    // --- Environment ---
    /// Side of the square grid; clamped to the supported range.
    pub grid_size: usize,
    pub agent_count: usize,
    /// Fraction of cells turned into obstacles for random layouts.
    pub obstacle_density: f64,
    pub rewards: RewardConfig,
    /// Step budget per episode.
    pub max_steps: u32,

    // --- Replay ---
    pub buffer_capacity: usize,
    pub batch_size: usize,
    pub priority_exponent: f64,
    pub priority_mix_phi: f64,
    /// Use the prioritized store instead of the uniform one.
    pub prioritized: bool,

    // --- Loop ---
    pub n_episodes: u32,
    /// Run a learning update every this many environment steps.
    pub learn_every: u64,
    /// Every this many episodes, frames are marked visual.
    pub render_period: u32,
    /// Every this many episodes, progress is logged.
    pub print_interval: u32,
    /// Noise handed to the policy while training.
    pub exploration_noise: f64,
    /// Evaluation mode: no learning, no exploration noise, every frame visual.
    pub evaluate: bool,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            agent_count: 2,
            obstacle_density: 0.1,
            rewards: RewardConfig::default(),
            max_steps: 200,
            buffer_capacity: 100_000,
            batch_size: 1024,
            priority_exponent: 0.6,
            priority_mix_phi: 0.01,
            prioritized: false,
            n_episodes: 50_000,
            learn_every: 100,
            render_period: 100,
            print_interval: 100,
            exploration_noise: 0.1,
            evaluate: false,
            seed: 0,
        }
    }
}

impl TrainingConfig {
    /// Validates every parameter that has no safe default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_count == 0 {
            return Err(ConfigError::NoAgents);
        }
        if self.agent_count > MAX_AGENTS {
            return Err(ConfigError::TooManyAgents {
                count: self.agent_count,
                max: MAX_AGENTS,
            });
        }
        if !(0.0..1.0).contains(&self.obstacle_density) {
            return Err(ConfigError::InvalidDensity(self.obstacle_density));
        }
        self.rewards.validate()?;
        self.replay_config().validate()?;

        let positive: [(&'static str, u64); 4] = [
            ("max_steps", u64::from(self.max_steps)),
            ("learn_every", self.learn_every),
            ("render_period", u64::from(self.render_period)),
            ("print_interval", u64::from(self.print_interval)),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: "must be positive".into(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.exploration_noise) {
            return Err(ConfigError::InvalidParameter {
                name: "exploration_noise",
                reason: format!("must lie in [0, 1], got {}", self.exploration_noise),
            });
        }
        Ok(())
    }

    /// Random layout for this run, reproducible from `seed`.
    pub fn layout(&self) -> Result<EnvLayout, ConfigError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        EnvLayout::random(
            self.grid_size,
            self.grid_size,
            self.agent_count,
            self.obstacle_density,
            &mut rng,
        )
    }

    /// Environment configuration on a random layout.
    pub fn env_config(&self) -> Result<EnvConfig, ConfigError> {
        Ok(self.env_config_for(self.layout()?))
    }

    /// Environment configuration on a given layout, e.g. one from the editor.
    pub fn env_config_for(&self, layout: EnvLayout) -> EnvConfig {
        EnvConfig {
            layout,
            rewards: self.rewards.clone(),
            max_steps: self.max_steps,
            ..EnvConfig::default()
        }
    }

    pub fn replay_config(&self) -> ReplayConfig {
        ReplayConfig {
            capacity: self.buffer_capacity,
            batch_size: self.batch_size,
            priority_exponent: self.priority_exponent,
            priority_mix_phi: self.priority_mix_phi,
            seed: self.seed,
        }
    }

    /// Noise handed to the policy: zero in evaluation mode.
    pub fn noise(&self) -> f64 {
        if self.evaluate {
            0.0
        } else {
            self.exploration_noise
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn agent_limits() {
        let cfg = TrainingConfig {
            agent_count: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoAgents));

        let cfg = TrainingConfig {
            agent_count: 11,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::TooManyAgents { count: 11, max: 10 })
        );
    }

    #[test]
    fn zero_learn_every_rejected() {
        let cfg = TrainingConfig {
            learn_every: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidParameter {
                name: "learn_every",
                ..
            })
        ));
    }

    #[test]
    fn zero_capacity_rejected() {
        let cfg = TrainingConfig {
            buffer_capacity: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn layout_is_reproducible() {
        let cfg = TrainingConfig {
            grid_size: 8,
            agent_count: 3,
            seed: 42,
            ..Default::default()
        };
        let a = cfg.layout().unwrap();
        assert_eq!(a, cfg.layout().unwrap());
        assert_eq!(a.n_agents(), 3);
        assert_eq!((a.n_row, a.n_col), (8, 8));
    }

    #[test]
    fn env_config_carries_rewards_and_budget() {
        let cfg = TrainingConfig {
            max_steps: 33,
            ..Default::default()
        };
        let env = cfg.env_config().unwrap();
        assert_eq!(env.max_steps, 33);
        assert_eq!(env.rewards, cfg.rewards);
    }

    #[test]
    fn evaluation_disables_noise() {
        let cfg = TrainingConfig {
            evaluate: true,
            ..Default::default()
        };
        assert_eq!(cfg.noise(), 0.0);
    }
}
