//! Circular replay store with uniform sampling.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use super::{Batch, BufferError, ReplayConfig, ReplayStore, Transition};
use crate::env::ConfigError;

/// Writes go to slot `counter % capacity`, overwriting the oldest entry once
/// the store is full.
#[derive(Debug)]
pub struct UniformReplay {
    slots: Vec<Transition>,
    capacity: usize,
    batch_size: usize,
    counter: usize,
    rng: StdRng,
}

impl UniformReplay {
    pub fn new(config: &ReplayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            slots: Vec::new(),
            capacity: config.capacity,
            batch_size: config.batch_size,
            counter: 0,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Transition stored in `slot`, if filled.
    pub fn get(&self, slot: usize) -> Option<&Transition> {
        self.slots.get(slot)
    }

    /// Total number of transitions ever stored.
    pub fn total_stored(&self) -> usize {
        self.counter
    }
}

impl ReplayStore for UniformReplay {
    fn store(&mut self, transition: Transition) {
        let slot = self.counter % self.capacity;
        if slot < self.slots.len() {
            self.slots[slot] = transition;
        } else {
            self.slots.push(transition);
        }
        self.counter += 1;
    }

    fn sample(&mut self, batch_size: usize) -> Result<Batch, BufferError> {
        if batch_size == 0 {
            return Err(BufferError::EmptyBatch);
        }
        let filled = self.slots.len();
        if filled < batch_size {
            return Err(BufferError::Underfull {
                stored: filled,
                requested: batch_size,
            });
        }

        let slots = index::sample(&mut self.rng, filled, batch_size).into_vec();
        let transitions = slots.iter().map(|&s| self.slots[s].clone()).collect();
        Ok(Batch { slots, transitions })
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}
