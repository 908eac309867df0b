//! The unit of experience stored by a replay store.

use crate::env::{Action, Observation, StepResult};

/// One tick of experience for every agent.
///
/// Holds owned copies of the observations, so it never aliases the live
/// environment layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Per-agent observations before the step.
    pub observations: Vec<Observation>,
    /// Joint action, one per agent.
    pub actions: Vec<Action>,
    /// Per-agent rewards.
    pub rewards: Vec<f64>,
    /// Per-agent observations after the step.
    pub next_observations: Vec<Observation>,
    /// Per-agent done flags.
    pub dones: Vec<bool>,
}

impl Transition {
    /// Bundles a step's outcome with the observations that produced it.
    pub fn from_step(observations: Vec<Observation>, actions: Vec<Action>, result: &StepResult) -> Self {
        Self {
            observations,
            actions,
            rewards: result.rewards.clone(),
            next_observations: result.observations.clone(),
            dones: result.dones.clone(),
        }
    }

    /// Sum of the per-agent rewards.
    pub fn team_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    pub fn n_agents(&self) -> usize {
        self.actions.len()
    }
}
