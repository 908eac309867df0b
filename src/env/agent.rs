//! Agent registry entries.

use super::types::{Action, Cell};

/// State of a single cleaning agent.
///
/// The agent index (position in the registry) is its identity for the whole
/// lifetime of the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    /// Start cell, restored by a full reset.
    pub home: Cell,
    /// Committed cell.
    pub position: Cell,
    /// Destination staged for the current tick, if any.
    pub pending: Option<Cell>,
    /// Action chosen on the last tick.
    pub last_action: Action,
    /// Number of cells cleaned this episode.
    pub cleaned: u32,
}

impl AgentState {
    /// Creates an agent standing on its home cell.
    pub fn new(home: Cell) -> Self {
        Self {
            home,
            position: home,
            pending: None,
            last_action: Action::Stay,
            cleaned: 0,
        }
    }

    /// Clears per-episode state, optionally sending the agent home.
    pub fn reset(&mut self, keep_position: bool) {
        if !keep_position {
            self.position = self.home;
        }
        self.pending = None;
        self.last_action = Action::Stay;
        self.cleaned = 0;
    }

    /// Immutable copy for renderers and logs.
    pub fn snapshot(&self, index: usize) -> AgentSnapshot {
        AgentSnapshot {
            index,
            home: self.home,
            position: self.position,
            last_action: self.last_action,
            cleaned: self.cleaned,
        }
    }
}

/// Plain-data view of an agent, safe to hand to another thread.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshot {
    pub index: usize,
    pub home: Cell,
    pub position: Cell,
    pub last_action: Action,
    pub cleaned: u32,
}
