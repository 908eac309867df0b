//! Per-agent reward for the coverage environment.
//!
//! Combines action costs, collision penalties, cleaning gains and the
//! terminal coverage bonus. Cleaning is applied here as a side effect: the
//! dirty flag of a committed destination is cleared and the agent's counter
//! incremented.

use super::collision::Resolution;
use super::config::RewardConfig;
use super::grid::GridState;
use super::types::{Action, Cell};

/// Rewards and cleaning events of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRewards {
    /// One scalar per agent.
    pub rewards: Vec<f64>,
    /// Cells cleaned this step, with the agent that cleaned them.
    pub cleaned: Vec<(usize, Cell)>,
    /// True when this step removed the last dirty cell.
    pub cleared: bool,
}

impl StepRewards {
    /// Sum of all agents' rewards.
    pub fn team_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// Computes rewards for the coverage environment.
pub struct RewardModel;

impl RewardModel {
    /// Scores one resolved step and cleans committed dirty cells.
    ///
    /// # Components
    ///
    /// 1. **Action cost**: `step_cost` for a movement action, `idle_cost` for
    ///    [`Action::Stay`]; charged regardless of the move's validity.
    /// 2. **Collision penalty**: `collision_penalty` for every rewound agent.
    /// 3. **Cleaning**: `clean_reward` when the committed cell was dirty.
    /// 4. **Terminal bonus**: on the step that clears the last dirty cell,
    ///    every agent receives [`RewardModel::terminal_bonus`].
    pub fn apply(
        grid: &mut GridState,
        actions: &[Action],
        resolution: &Resolution,
        config: &RewardConfig,
    ) -> StepRewards {
        let mut rewards = Vec::with_capacity(actions.len());
        let mut cleaned = Vec::new();

        for (i, (action, outcome)) in actions.iter().zip(&resolution.outcomes).enumerate() {
            let mut reward = if action.is_move() {
                config.step_cost
            } else {
                config.idle_cost
            };

            if outcome.is_rewound() {
                reward += config.collision_penalty;
            } else if grid.clean(outcome.cell()) {
                grid.credit_clean(i);
                cleaned.push((i, outcome.cell()));
                reward += config.clean_reward;
            }
            rewards.push(reward);
        }

        let cleared = !cleaned.is_empty() && grid.dirty_count() == 0;
        if cleared {
            let initial = grid.initial_dirty_count();
            for (reward, agent) in rewards.iter_mut().zip(grid.agents()) {
                *reward += Self::terminal_bonus(agent.cleaned, initial, config);
            }
        }

        StepRewards {
            rewards,
            cleaned,
            cleared,
        }
    }

    /// Terminal bonus for an agent:
    /// `terminal_bonus_scale * cleaned / initial_dirty`.
    ///
    /// Zero when the agent cleaned nothing or the episode started clean.
    pub fn terminal_bonus(cleaned: u32, initial_dirty: usize, config: &RewardConfig) -> f64 {
        if cleaned == 0 || initial_dirty == 0 {
            return 0.0;
        }
        config.terminal_bonus_scale * f64::from(cleaned) / initial_dirty as f64
    }
}
