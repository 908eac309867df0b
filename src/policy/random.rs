//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::trait_::Policy;
use crate::env::{Action, Observation};

/// Uniformly random action selection from a fixed action set.
///
/// Used for sanity checks and as a lower-bound baseline.
pub struct RandomPolicy {
    actions: Vec<Action>,
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a new random policy.
    ///
    /// # Arguments
    ///
    /// * `actions` - Allowed actions, usually `EnvConfig::action_set()`
    /// * `seed` - RNG seed
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
}

impl Policy for RandomPolicy {
    fn choose_actions(&mut self, observations: &[Observation], _noise: f64) -> Vec<Action> {
        (0..observations.len())
            .map(|_| *self.actions.choose(&mut self.rng).unwrap_or(&Action::Stay))
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}
