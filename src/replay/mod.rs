//! Fixed-capacity replay stores feeding a learner.
//!
//! Two variants share the [`ReplayStore`] trait:
//!
//! - [`UniformReplay`]: circular overwrite, uniform sampling.
//! - [`PrioritizedReplay`]: priority-weighted sampling with anti-priority
//!   eviction once full.
//!
//! Stores are used from the training thread only and own a seeded RNG so a
//! run can be reproduced.

pub mod error;
pub mod prioritized;
pub mod transition;
pub mod uniform;

pub use error::BufferError;
pub use prioritized::PrioritizedReplay;
pub use transition::Transition;
pub use uniform::UniformReplay;

use crate::env::ConfigError;

/// Transitions drawn from a store, with the slots they came from.
#[derive(Debug, Clone)]
pub struct Batch {
    pub slots: Vec<usize>,
    pub transitions: Vec<Transition>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Interface shared by the replay store variants.
pub trait ReplayStore: Send {
    /// Inserts one transition.
    fn store(&mut self, transition: Transition);

    /// Draws `batch_size` distinct transitions.
    ///
    /// # Errors
    ///
    /// [`BufferError::EmptyBatch`] for a zero batch,
    /// [`BufferError::Underfull`] when fewer transitions are stored.
    fn sample(&mut self, batch_size: usize) -> Result<Batch, BufferError>;

    /// Number of filled slots.
    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Batch size the store was configured with.
    fn batch_size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once at least one configured batch can be sampled.
    fn ready(&self) -> bool {
        self.len() >= self.batch_size()
    }

    /// Samples a batch of the configured size.
    fn sample_batch(&mut self) -> Result<Batch, BufferError> {
        let n = self.batch_size();
        self.sample(n)
    }
}

/// Construction parameters for a replay store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayConfig {
    pub capacity: usize,
    pub batch_size: usize,
    /// Exponent applied to priorities when sampling (prioritized only).
    pub priority_exponent: f64,
    /// EMA mixing factor for priority updates (prioritized only).
    pub priority_mix_phi: f64,
    pub seed: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            batch_size: 256,
            priority_exponent: 0.6,
            priority_mix_phi: 0.01,
            seed: 0,
        }
    }
}

impl ReplayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "buffer_capacity",
                reason: "must be positive".into(),
            });
        }
        if self.batch_size == 0 || self.batch_size > self.capacity {
            return Err(ConfigError::InvalidParameter {
                name: "batch_size",
                reason: format!("must lie in [1, {}], got {}", self.capacity, self.batch_size),
            });
        }
        if !self.priority_exponent.is_finite() || self.priority_exponent < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "priority_exponent",
                reason: format!("must be finite and non-negative, got {}", self.priority_exponent),
            });
        }
        if !(0.0..=1.0).contains(&self.priority_mix_phi) {
            return Err(ConfigError::InvalidParameter {
                name: "priority_mix_phi",
                reason: format!("must lie in [0, 1], got {}", self.priority_mix_phi),
            });
        }
        Ok(())
    }

    /// Builds the uniform or prioritized store described by this config.
    pub fn build(&self, prioritized: bool) -> Result<Box<dyn ReplayStore>, ConfigError> {
        if prioritized {
            Ok(Box::new(PrioritizedReplay::new(self)?))
        } else {
            Ok(Box::new(UniformReplay::new(self)?))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Transition;
    use crate::env::Action;

    /// Observation-free transition whose first reward is `marker`.
    pub fn marked(marker: f64) -> Transition {
        Transition {
            observations: Vec::new(),
            actions: vec![Action::Stay],
            rewards: vec![marker],
            next_observations: Vec::new(),
            dones: vec![false],
        }
    }
}
