//! Episode/step loop tying the environment, replay store and policy together.

use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use super::config::TrainingConfig;
use super::control::StopHandle;
use super::render::{RenderFrame, RenderSink};
use crate::env::{ConfigError, CoverageEnv, EnvLayout};
use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::replay::{ReplayStore, Transition};

/// Window of the rolling average score.
pub const SCORE_WINDOW: usize = 100;

/// Outcome of a training (or evaluation) run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    /// Team score of every finished episode, in order. An episode cut short
    /// by a stop is left out.
    pub score_history: Vec<f64>,
    /// Best rolling average reached, if any episode ran.
    pub best_average: Option<f64>,
    /// Fewest steps an episode needed to clear the map.
    pub fastest_solve: Option<u32>,
    pub total_steps: u64,
    pub learn_calls: u64,
    /// Episode index to pass to [`Trainer::start_episode`] to resume.
    pub next_episode: u32,
    /// True when the run ended because of a stop request.
    pub stopped: bool,
}

impl TrainingReport {
    pub fn episodes(&self) -> usize {
        self.score_history.len()
    }

    /// Mean score of the last [`SCORE_WINDOW`] episodes.
    pub fn average_score(&self) -> Option<f64> {
        rolling_average(&self.score_history)
    }
}

fn rolling_average(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let window = &scores[scores.len().saturating_sub(SCORE_WINDOW)..];
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Drives episodes of a [`CoverageEnv`] with a [`Policy`], storing every
/// transition and triggering learning updates.
///
/// # Example
///
/// ```no_run
/// use maac::policy::RandomPolicy;
/// use maac::env::Action;
/// use maac::training::{Trainer, TrainingConfig};
///
/// let config = TrainingConfig { n_episodes: 10, ..Default::default() };
/// let policy = Box::new(RandomPolicy::new(&Action::ALL, 0));
/// let handle = Trainer::new(config, policy).unwrap().spawn();
/// let report = handle.join().unwrap();
/// println!("{:?}", report.average_score());
/// ```
pub struct Trainer {
    config: TrainingConfig,
    env: CoverageEnv,
    store: Box<dyn ReplayStore>,
    policy: Box<dyn Policy>,
    sink: Option<Box<dyn RenderSink>>,
    stop: StopHandle,
    start_episode: u32,
}

impl Trainer {
    /// Builds a trainer on a random layout generated from `config`.
    pub fn new(config: TrainingConfig, policy: Box<dyn Policy>) -> std::result::Result<Self, ConfigError> {
        let layout = config.layout()?;
        Self::with_layout(config, layout, policy)
    }

    /// Builds a trainer on a given layout, e.g. one exported by the editor.
    pub fn with_layout(
        config: TrainingConfig,
        layout: EnvLayout,
        policy: Box<dyn Policy>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let env = CoverageEnv::new(config.env_config_for(layout))?;
        let store = config.replay_config().build(config.prioritized)?;
        info!(
            policy = policy.name(),
            prioritized = config.prioritized,
            evaluate = config.evaluate,
            episodes = config.n_episodes,
            "trainer ready"
        );
        Ok(Self {
            config,
            env,
            store,
            policy,
            sink: None,
            stop: StopHandle::new(),
            start_episode: 0,
        })
    }

    /// Sends render frames to `sink`.
    pub fn with_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Resumes the episode count at `episode`.
    pub fn start_episode(mut self, episode: u32) -> Self {
        self.start_episode = episode;
        self
    }

    /// Handle that stops this trainer, usable from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn env(&self) -> &CoverageEnv {
        &self.env
    }

    pub fn store(&self) -> &dyn ReplayStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Runs the loop on the current thread until `n_episodes` or a stop.
    pub fn run(&mut self) -> Result<TrainingReport> {
        let mut report = TrainingReport {
            next_episode: self.start_episode,
            ..Default::default()
        };
        let noise = self.config.noise();

        for episode in self.start_episode..self.config.n_episodes {
            if self.stop.is_stopped() {
                report.stopped = true;
                break;
            }
            let visual = self.config.evaluate || episode % self.config.render_period == 0;
            let mut obs = self.env.reset(false);
            self.emit(episode, true, visual, report.fastest_solve);

            let mut score = 0.0;
            let mut interrupted = false;
            loop {
                let actions = self.policy.choose_actions(&obs, noise);
                let result = self.env.step(&actions)?;
                if result.terminated {
                    let steps = result.info.steps;
                    report.fastest_solve = Some(report.fastest_solve.map_or(steps, |f| f.min(steps)));
                }
                score += result.team_reward();

                self.store.store(Transition::from_step(obs, actions, &result));
                report.total_steps += 1;

                if !self.config.evaluate
                    && report.total_steps % self.config.learn_every == 0
                    && self.store.ready()
                {
                    self.policy.learn(self.store.as_mut())?;
                    report.learn_calls += 1;
                }

                self.emit(episode, false, visual, report.fastest_solve);
                let done = result.done();
                obs = result.observations;
                if done {
                    break;
                }
                if self.stop.is_stopped() {
                    interrupted = true;
                    break;
                }
            }

            if interrupted {
                // The partial score is dropped; a resumed run replays this
                // episode from reset.
                debug!(episode, score, steps = self.env.steps(), "episode interrupted");
                report.next_episode = episode;
                report.stopped = true;
                break;
            }

            report.score_history.push(score);
            let average = rolling_average(&report.score_history).unwrap_or(score);
            debug!(episode, score, steps = self.env.steps(), "episode finished");

            if !self.config.evaluate && report.best_average.map_or(true, |best| average > best) {
                report.best_average = Some(average);
            }
            if episode > 0 && episode % self.config.print_interval == 0 {
                info!(
                    episode,
                    average = format_args!("{:.1}", average),
                    total_steps = report.total_steps,
                    stored = self.store.len(),
                    "training progress"
                );
            }
            report.next_episode = episode + 1;
        }

        info!(
            episodes = report.episodes(),
            total_steps = report.total_steps,
            stopped = report.stopped,
            "training finished"
        );
        Ok(report)
    }

    /// Moves the trainer onto a background thread.
    pub fn spawn(mut self) -> TrainerHandle {
        let stop = self.stop_handle();
        let join = thread::spawn(move || self.run());
        TrainerHandle { stop, join }
    }

    fn emit(&mut self, episode: u32, reset: bool, visual: bool, fastest_solve: Option<u32>) {
        if let Some(sink) = self.sink.as_mut() {
            sink.render(RenderFrame::capture(&self.env, episode, reset, visual, fastest_solve));
        }
    }
}

/// Caller's side of a background training run.
pub struct TrainerHandle {
    stop: StopHandle,
    join: JoinHandle<Result<TrainingReport>>,
}

impl TrainerHandle {
    /// Requests a cooperative stop; the current step completes first.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the run to end and returns its report.
    pub fn join(self) -> Result<TrainingReport> {
        self.join.join().map_err(|_| Error::TrainerPanicked)?
    }
}
