//! Simultaneous-move validation.
//!
//! Every agent proposes a destination for the tick; [`CollisionResolver`]
//! decides as a batch which proposals commit and which are rewound, so no
//! agent's commit can influence another agent's proposal in the same tick.
//!
//! The order of checks is fixed:
//!
//! 1. destinations outside the grid or on an obstacle are rewound;
//! 2. among the remaining agents every unordered pair is checked for a swap
//!    (each targets the other's cell) and for convergence (same target);
//!    both parties of a conflict are rewound, there is no index priority;
//! 3. rewinds cascade: an agent targeting the cell of a rewound agent is
//!    rewound as well, until no claim on an occupied cell remains;
//! 4. the survivors commit.

use tracing::debug;

use super::grid::GridState;
use super::types::{Action, Cell};

/// Why a proposed move was rewound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewindCause {
    /// Destination outside `[0, n_row) x [0, n_col)`.
    OutOfBounds,
    /// Destination is an obstacle cell.
    Obstacle,
    /// Two agents tried to trade places.
    Swap,
    /// Two or more agents targeted the same cell.
    Convergence,
    /// Target cell stays occupied by an agent that was itself rewound.
    Blocked,
}

impl RewindCause {
    /// True for causes detected before any inter-agent check.
    pub fn is_invalid_move(&self) -> bool {
        matches!(self, RewindCause::OutOfBounds | RewindCause::Obstacle)
    }
}

/// Settled result of one agent's proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Committed { from: Cell, to: Cell },
    Rewound { at: Cell, cause: RewindCause },
}

impl MoveOutcome {
    /// Cell the agent stands on after resolution.
    pub fn cell(&self) -> Cell {
        match self {
            MoveOutcome::Committed { to, .. } => *to,
            MoveOutcome::Rewound { at, .. } => *at,
        }
    }

    pub fn is_rewound(&self) -> bool {
        matches!(self, MoveOutcome::Rewound { .. })
    }

    pub fn cause(&self) -> Option<RewindCause> {
        match self {
            MoveOutcome::Rewound { cause, .. } => Some(*cause),
            MoveOutcome::Committed { .. } => None,
        }
    }
}

/// Outcomes of one tick, indexed by agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcomes: Vec<MoveOutcome>,
}

impl Resolution {
    /// Number of rewound agents.
    pub fn rewound_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rewound()).count()
    }

    pub fn is_rewound(&self, agent: usize) -> bool {
        self.outcomes[agent].is_rewound()
    }
}

/// Batch resolver for simultaneous agent moves.
pub struct CollisionResolver;

impl CollisionResolver {
    /// Resolves one tick and applies the result to `grid`.
    ///
    /// `actions` must hold one action per agent.
    pub fn resolve(grid: &mut GridState, actions: &[Action]) -> Resolution {
        let n = grid.n_agents();
        debug_assert_eq!(actions.len(), n);

        let origins: Vec<Cell> = grid.agents().iter().map(|a| a.position).collect();
        let mut causes: Vec<Option<RewindCause>> = vec![None; n];

        // Stage proposals; invalid targets are rejected before pairing.
        for (i, action) in actions.iter().enumerate() {
            grid.set_last_action(i, *action);
            let staged = match origins[i].offset(action.delta(), grid.n_row(), grid.n_col()) {
                Some(dest) => grid.apply_move(i, dest),
                None => Err(RewindCause::OutOfBounds),
            };
            if let Err(cause) = staged {
                causes[i] = Some(cause);
            }
        }

        let dests: Vec<Option<Cell>> = grid.agents().iter().map(|a| a.pending).collect();
        for i in 0..n {
            let Some(di) = dests[i] else { continue };
            for j in (i + 1)..n {
                let Some(dj) = dests[j] else { continue };
                let conflict = if origins[i] == dj && di == origins[j] {
                    Some(RewindCause::Swap)
                } else if di == dj {
                    Some(RewindCause::Convergence)
                } else {
                    None
                };
                if let Some(cause) = conflict {
                    causes[i].get_or_insert(cause);
                    causes[j].get_or_insert(cause);
                }
            }
        }

        // Cascade: a rewound agent keeps its cell, so anyone heading there
        // must be rewound too.
        let mut worklist: Vec<usize> = (0..n).filter(|&i| causes[i].is_some()).collect();
        while let Some(i) = worklist.pop() {
            let at = grid.rollback_move(i);
            let blocked: Vec<usize> = grid
                .pending_claimants(at)
                .filter(|&j| causes[j].is_none())
                .collect();
            for j in blocked {
                causes[j] = Some(RewindCause::Blocked);
                worklist.push(j);
            }
        }

        let outcomes = (0..n)
            .map(|i| match causes[i] {
                Some(cause) => {
                    debug!(agent = i, cell = %origins[i], ?cause, "move rewound");
                    MoveOutcome::Rewound {
                        at: origins[i],
                        cause,
                    }
                }
                None => MoveOutcome::Committed {
                    from: origins[i],
                    to: grid.commit_move(i),
                },
            })
            .collect();

        Resolution { outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::layout::EnvLayout;

    fn grid(homes: &[(usize, usize)], obstacles: &[(usize, usize)]) -> GridState {
        let mut layout =
            EnvLayout::all_dirty(5, 5, homes.iter().copied().map(Cell::from).collect());
        layout.obstacles = obstacles.iter().copied().map(Cell::from).collect();
        GridState::build(&layout).unwrap()
    }

    fn max_occupancy(grid: &GridState) -> usize {
        let mut counts = std::collections::HashMap::new();
        for agent in grid.agents() {
            *counts.entry(agent.position).or_insert(0usize) += 1;
        }
        counts.values().copied().max().unwrap_or(0)
    }

    #[test]
    fn free_moves_commit() {
        let mut g = grid(&[(0, 0), (4, 4)], &[]);
        let res = CollisionResolver::resolve(&mut g, &[Action::Right, Action::Up]);
        assert_eq!(res.rewound_count(), 0);
        assert_eq!(g.agent(0).position, Cell::new(0, 1));
        assert_eq!(g.agent(1).position, Cell::new(3, 4));
    }

    #[test]
    fn wall_and_obstacle_rewound() {
        let mut g = grid(&[(0, 0), (2, 2)], &[(2, 3)]);
        let res = CollisionResolver::resolve(&mut g, &[Action::Up, Action::Right]);
        assert_eq!(res.outcomes[0].cause(), Some(RewindCause::OutOfBounds));
        assert_eq!(res.outcomes[1].cause(), Some(RewindCause::Obstacle));
        assert_eq!(g.agent(0).position, Cell::new(0, 0));
        assert_eq!(g.agent(1).position, Cell::new(2, 2));
    }

    #[test]
    fn swap_rewinds_both() {
        let mut g = grid(&[(2, 2), (2, 3)], &[]);
        let res = CollisionResolver::resolve(&mut g, &[Action::Right, Action::Left]);
        assert_eq!(res.outcomes[0].cause(), Some(RewindCause::Swap));
        assert_eq!(res.outcomes[1].cause(), Some(RewindCause::Swap));
        assert_eq!(g.agent(0).position, Cell::new(2, 2));
        assert_eq!(g.agent(1).position, Cell::new(2, 3));
    }

    #[test]
    fn three_way_convergence_rewinds_all() {
        // All three target (2, 2).
        let mut g = grid(&[(1, 2), (2, 1), (3, 2)], &[]);
        let res =
            CollisionResolver::resolve(&mut g, &[Action::Down, Action::Right, Action::Up]);
        assert_eq!(res.rewound_count(), 3);
        for o in &res.outcomes {
            assert_eq!(o.cause(), Some(RewindCause::Convergence));
        }
        assert_eq!(g.occupant(Cell::new(2, 2)), None);
    }

    #[test]
    fn moving_onto_staying_agent_rewinds_both() {
        let mut g = grid(&[(2, 2), (2, 3)], &[]);
        let res = CollisionResolver::resolve(&mut g, &[Action::Right, Action::Stay]);
        assert_eq!(res.outcomes[0].cause(), Some(RewindCause::Convergence));
        assert_eq!(res.outcomes[1].cause(), Some(RewindCause::Convergence));
    }

    #[test]
    fn rewind_cascades_along_a_chain() {
        // Agent 2 hits the wall, so agent 1 cannot enter its cell, so agent 0
        // cannot enter agent 1's cell.
        let mut g = grid(&[(0, 2), (0, 3), (0, 4)], &[]);
        let res =
            CollisionResolver::resolve(&mut g, &[Action::Right, Action::Right, Action::Right]);
        assert_eq!(res.outcomes[2].cause(), Some(RewindCause::OutOfBounds));
        assert_eq!(res.outcomes[1].cause(), Some(RewindCause::Blocked));
        assert_eq!(res.outcomes[0].cause(), Some(RewindCause::Blocked));
        assert_eq!(g.agent(0).position, Cell::new(0, 2));
        assert_eq!(max_occupancy(&g), 1);
    }

    #[test]
    fn train_of_agents_moves_together() {
        let mut g = grid(&[(1, 0), (1, 1), (1, 2)], &[]);
        let res =
            CollisionResolver::resolve(&mut g, &[Action::Right, Action::Right, Action::Right]);
        assert_eq!(res.rewound_count(), 0);
        assert_eq!(g.agent(0).position, Cell::new(1, 1));
        assert_eq!(g.agent(2).position, Cell::new(1, 3));
        assert_eq!(g.occupant(Cell::new(1, 0)), None);
        assert_eq!(g.occupant(Cell::new(1, 1)), Some(0));
    }

    #[test]
    fn rotation_of_four_commits() {
        // 2x2 block rotating clockwise, no pair swaps or converges.
        let mut g = grid(&[(1, 1), (1, 2), (2, 2), (2, 1)], &[]);
        let res = CollisionResolver::resolve(
            &mut g,
            &[Action::Right, Action::Down, Action::Left, Action::Up],
        );
        assert_eq!(res.rewound_count(), 0);
        assert_eq!(g.agent(0).position, Cell::new(1, 2));
        assert_eq!(g.agent(3).position, Cell::new(1, 1));
        assert_eq!(max_occupancy(&g), 1);
    }

    #[test]
    fn uninvolved_agents_unaffected_by_conflict() {
        let mut g = grid(&[(2, 2), (2, 3), (4, 0)], &[]);
        let res =
            CollisionResolver::resolve(&mut g, &[Action::Right, Action::Left, Action::Right]);
        assert!(res.is_rewound(0));
        assert!(res.is_rewound(1));
        assert!(!res.is_rewound(2));
        assert_eq!(g.agent(2).position, Cell::new(4, 1));
    }

    #[test]
    fn no_pending_moves_left_after_resolution() {
        let mut g = grid(&[(2, 2), (2, 3), (0, 0)], &[]);
        CollisionResolver::resolve(&mut g, &[Action::Right, Action::Left, Action::Down]);
        assert!(g.agents().iter().all(|a| a.pending.is_none()));
    }
}
