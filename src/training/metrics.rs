//! Evaluation metrics for the coverage environment.
//!
//! Runs a policy without exploration noise and aggregates episode-level
//! statistics.

use std::fmt;

use crate::env::{CoverageEnv, EnvError};
use crate::policy::Policy;

/// Aggregated evaluation metrics over multiple episodes.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    /// Mean fraction of initially dirty cells cleaned per episode.
    pub mean_coverage: f64,
    /// Mean number of steps per episode.
    pub mean_steps: f64,
    /// Fraction of episodes that cleared the map before the step budget.
    pub solve_rate: f64,
    /// Mean number of rewound moves per episode.
    pub mean_rewinds: f64,
    /// Mean summed team reward per episode.
    pub mean_team_reward: f64,
    /// Fewest steps needed by a solved episode.
    pub fastest_solve: Option<u32>,
    /// Number of episodes evaluated.
    pub n_episodes: usize,
}

#[derive(Debug, Default)]
struct EpisodeStats {
    coverage: f64,
    steps: u32,
    solved: bool,
    rewinds: usize,
    team_reward: f64,
}

impl EvaluationMetrics {
    /// Evaluates a policy over multiple episodes and returns aggregated metrics.
    ///
    /// # Arguments
    ///
    /// * `env` - The environment to evaluate in
    /// * `policy` - The policy to evaluate
    /// * `n_episodes` - Number of episodes to run
    pub fn evaluate(
        env: &mut CoverageEnv,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Result<Self, EnvError> {
        let mut all_stats = Vec::with_capacity(n_episodes);

        for _ in 0..n_episodes {
            let mut obs = env.reset(false);
            let mut stats = EpisodeStats::default();

            loop {
                let actions = policy.choose_actions(&obs, 0.0);
                let result = env.step(&actions)?;
                stats.rewinds += result.info.rewound();
                stats.team_reward += result.team_reward();

                if result.done() {
                    stats.solved = result.terminated;
                    stats.steps = result.info.steps;
                    break;
                }
                obs = result.observations;
            }
            stats.coverage = env.coverage();
            all_stats.push(stats);
        }

        let n = all_stats.len().max(1) as f64;
        let mean = |f: fn(&EpisodeStats) -> f64| all_stats.iter().map(f).sum::<f64>() / n;

        Ok(Self {
            mean_coverage: mean(|s| s.coverage),
            mean_steps: mean(|s| f64::from(s.steps)),
            solve_rate: mean(|s| if s.solved { 1.0 } else { 0.0 }),
            mean_rewinds: mean(|s| s.rewinds as f64),
            mean_team_reward: mean(|s| s.team_reward),
            fastest_solve: all_stats.iter().filter(|s| s.solved).map(|s| s.steps).min(),
            n_episodes,
        })
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes
        )?;
        writeln!(f, "  Mean coverage:       {:.1}%", self.mean_coverage * 100.0)?;
        writeln!(f, "  Mean steps:          {:.1}", self.mean_steps)?;
        writeln!(f, "  Solve rate:          {:.1}%", self.solve_rate * 100.0)?;
        writeln!(f, "  Mean rewinds:        {:.2}", self.mean_rewinds)?;
        match self.fastest_solve {
            Some(steps) => writeln!(f, "  Fastest solve:       {} steps", steps)?,
            None => writeln!(f, "  Fastest solve:       -")?,
        }
        writeln!(f, "  Mean team reward:    {:.2}", self.mean_team_reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Action, Cell, EnvConfig, EnvLayout};
    use crate::policy::{GreedyCoveragePolicy, RandomPolicy};

    fn env(homes: Vec<Cell>, max_steps: u32) -> CoverageEnv {
        let config = EnvConfig {
            max_steps,
            ..EnvConfig::new(EnvLayout::all_dirty(5, 5, homes))
        };
        CoverageEnv::new(config).unwrap()
    }

    #[test]
    fn evaluate_completes() {
        let mut env = env(vec![Cell::new(0, 0), Cell::new(4, 4)], 10);
        let mut policy = RandomPolicy::new(&Action::ALL, 42);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 3).unwrap();
        assert_eq!(metrics.n_episodes, 3);
        assert_eq!(metrics.mean_steps, 10.0);
        assert_eq!(metrics.solve_rate, 0.0);
        assert!(metrics.mean_coverage > 0.0 && metrics.mean_coverage < 1.0);
    }

    #[test]
    fn greedy_single_agent_always_solves() {
        let mut env = env(vec![Cell::new(0, 0)], 200);
        let mut policy = GreedyCoveragePolicy::new(&Action::ALL, 0);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 2).unwrap();
        assert_eq!(metrics.solve_rate, 1.0);
        assert_eq!(metrics.mean_coverage, 1.0);
        assert_eq!(metrics.mean_rewinds, 0.0);
        assert!(metrics.fastest_solve.is_some());
    }

    #[test]
    fn display_mentions_episode_count() {
        let mut env = env(vec![Cell::new(0, 0)], 5);
        let mut policy = RandomPolicy::new(&Action::ALL, 1);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 1).unwrap();
        assert!(metrics.to_string().contains("(1 episodes)"));
    }
}
