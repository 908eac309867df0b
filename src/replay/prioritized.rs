//! Replay store with priority-weighted sampling.
//!
//! Slot `i` is sampled with probability proportional to `priority_i^alpha`.
//! Once the store is full, the slot to overwrite is drawn from the
//! complement of that distribution, so low-priority transitions are evicted
//! first and high-reward experience stays around longer.
//!
//! New slots start at the highest priority currently stored (1.0 for the
//! first one). Sampled slots then drift towards the min–max normalised team
//! reward of their transition:
//!
//! ```text
//! p <- phi * (r - r_min) / (r_max - r_min) + (1 - phi) * p
//! ```

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{Batch, BufferError, ReplayConfig, ReplayStore, Transition};
use crate::env::ConfigError;

#[derive(Debug)]
pub struct PrioritizedReplay {
    slots: Vec<Transition>,
    priorities: Vec<f64>,
    capacity: usize,
    batch_size: usize,
    alpha: f64,
    phi: f64,
    counter: usize,
    min_reward: f64,
    max_reward: f64,
    rng: StdRng,
}

impl PrioritizedReplay {
    pub fn new(config: &ReplayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            slots: Vec::new(),
            priorities: Vec::new(),
            capacity: config.capacity,
            batch_size: config.batch_size,
            alpha: config.priority_exponent,
            phi: config.priority_mix_phi,
            counter: 0,
            min_reward: f64::INFINITY,
            max_reward: f64::NEG_INFINITY,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    pub fn get(&self, slot: usize) -> Option<&Transition> {
        self.slots.get(slot)
    }

    /// Priorities of the filled slots.
    pub fn priorities(&self) -> &[f64] {
        &self.priorities
    }

    pub fn total_stored(&self) -> usize {
        self.counter
    }

    /// Sampling distribution over the filled slots.
    ///
    /// Falls back to uniform when every priority is zero.
    pub fn probabilities(&self) -> Vec<f64> {
        let scaled: Vec<f64> = self.priorities.iter().map(|p| p.powf(self.alpha)).collect();
        let total: f64 = scaled.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            let n = scaled.len().max(1) as f64;
            return vec![1.0 / n; scaled.len()];
        }
        normalized(scaled, total)
    }

    /// Slot to overwrite, drawn from the complement of the sampling
    /// distribution.
    fn eviction_slot(&mut self) -> usize {
        let complement: Vec<f64> = self.probabilities().iter().map(|p| 1.0 - p).collect();
        let total: f64 = complement.iter().sum();
        if total > 0.0 {
            let probs = normalized(complement, total);
            if let Ok(dist) = WeightedIndex::new(&probs) {
                return dist.sample(&mut self.rng);
            }
        }
        // Single slot, or all mass on one slot after rounding.
        self.lowest_priority_slot()
    }

    fn lowest_priority_slot(&self) -> usize {
        self.priorities
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn update_priorities(&mut self, slots: &[usize]) {
        let span = self.max_reward - self.min_reward;
        if !(span.is_finite() && span > 0.0) {
            return;
        }
        for &slot in slots {
            let target = (self.slots[slot].team_reward() - self.min_reward) / span;
            let p = &mut self.priorities[slot];
            *p = self.phi * target + (1.0 - self.phi) * *p;
        }
    }
}

impl ReplayStore for PrioritizedReplay {
    fn store(&mut self, transition: Transition) {
        let initial = self
            .priorities
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(1.0);

        let reward = transition.team_reward();
        self.min_reward = self.min_reward.min(reward);
        self.max_reward = self.max_reward.max(reward);

        if self.slots.len() < self.capacity {
            self.slots.push(transition);
            self.priorities.push(initial);
        } else {
            let slot = self.eviction_slot();
            debug!(slot, priority = self.priorities[slot], "evicting replay slot");
            self.slots[slot] = transition;
            self.priorities[slot] = initial;
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

        let probs = self.probabilities();
        let slots = draw_without_replacement(&mut self.rng, probs, batch_size);
        let transitions = slots.iter().map(|&s| self.slots[s].clone()).collect();
        self.update_priorities(&slots);
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

/// Divides by `total` and pins the last entry so the vector sums to one.
fn normalized(mut weights: Vec<f64>, total: f64) -> Vec<f64> {
    for w in weights.iter_mut() {
        *w /= total;
    }
    if let Some((last, head)) = weights.split_last_mut() {
        *last = (1.0 - head.iter().sum::<f64>()).max(0.0);
    }
    weights
}

/// Draws `n` distinct indices, each draw weighted by the remaining `weights`.
///
/// Once only zero weights remain, the rest are picked uniformly among the
/// unpicked indices.
fn draw_without_replacement<R: Rng>(rng: &mut R, mut weights: Vec<f64>, n: usize) -> Vec<usize> {
    let mut picked = Vec::with_capacity(n);
    while picked.len() < n {
        let idx = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => {
                let remaining: Vec<usize> = (0..weights.len())
                    .filter(|i| !picked.contains(i))
                    .collect();
                remaining[rng.gen_range(0..remaining.len())]
            }
        };
        weights[idx] = 0.0;
        picked.push(idx);
    }
    picked
}
