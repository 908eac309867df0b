//! Learner interface consumed by the training loop.

use crate::env::{Action, Observation};
use crate::replay::{BufferError, ReplayStore};

/// A policy that picks one action per agent and, optionally, learns from a
/// replay store.
///
/// Neural learners live outside this crate and plug in through this trait.
/// Actions must come from the environment's action set.
pub trait Policy: Send {
    /// Selects one action per agent.
    ///
    /// # Arguments
    ///
    /// * `observations` - Per-agent observations, in agent index order
    /// * `noise` - Exploration noise; zero during evaluation
    ///
    /// # Returns
    ///
    /// A vector of actions, one per agent.
    fn choose_actions(&mut self, observations: &[Observation], noise: f64) -> Vec<Action>;

    /// Runs one learning update from the store.
    ///
    /// Called by the trainer only once the store is ready. Policies without
    /// parameters keep the default no-op.
    fn learn(&mut self, _store: &mut dyn ReplayStore) -> Result<(), BufferError> {
        Ok(())
    }

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
