//! Render hand-off from the training thread.
//!
//! The trainer pushes owned [`RenderFrame`]s into a [`RenderSink`]; a viewer
//! never touches the live grid. Sinks must not block: a slow viewer should
//! drop frames rather than slow down the simulation.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use ndarray::Array2;
use tracing::debug;

use crate::env::{AgentSnapshot, CoverageEnv};

/// Immutable picture of the world at one point of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub episode: u32,
    /// Steps taken in the episode so far.
    pub steps: u32,
    pub agents: Vec<AgentSnapshot>,
    pub visited: Array2<Option<usize>>,
    pub dirty: Array2<bool>,
    /// Emitted right after an episode reset.
    pub reset: bool,
    /// Whether a viewer should draw this frame in full.
    pub visual: bool,
    /// Fewest steps any episode of the run needed to clear the map.
    pub fastest_solve: Option<u32>,
}

impl RenderFrame {
    /// Copies the environment's current state.
    pub fn capture(
        env: &CoverageEnv,
        episode: u32,
        reset: bool,
        visual: bool,
        fastest_solve: Option<u32>,
    ) -> Self {
        let grid = env.grid();
        Self {
            episode,
            steps: env.steps(),
            agents: grid.snapshot(),
            visited: grid.visited_layer().clone(),
            dirty: grid.dirty_layer().clone(),
            reset,
            visual,
            fastest_solve,
        }
    }

    /// Number of cells still dirty in this frame.
    pub fn dirty_remaining(&self) -> usize {
        self.dirty.iter().filter(|&&d| d).count()
    }
}

/// Receiver of render frames.
pub trait RenderSink: Send {
    fn render(&mut self, frame: RenderFrame);
}

impl<F> RenderSink for F
where
    F: FnMut(RenderFrame) + Send,
{
    fn render(&mut self, frame: RenderFrame) {
        self(frame)
    }
}

/// Forwards frames over a bounded channel, dropping them when it is full.
pub struct ChannelSink {
    tx: SyncSender<RenderFrame>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: SyncSender<RenderFrame>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Creates a sink and the receiving end of its channel.
    pub fn bounded(capacity: usize) -> (Self, Receiver<RenderFrame>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (Self::new(tx), rx)
    }

    /// Frames discarded because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl RenderSink for ChannelSink {
    fn render(&mut self, frame: RenderFrame) {
        match self.tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                debug!(dropped = self.dropped, "render channel full, frame dropped");
            }
            // Viewer went away; keep training.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
