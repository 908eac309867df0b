//! Scenario tests for the coverage environment.

use super::*;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn env_with(layout: EnvLayout) -> CoverageEnv {
    CoverageEnv::new(EnvConfig::new(layout)).unwrap()
}

fn random_actions(rng: &mut StdRng, n: usize) -> Vec<Action> {
    (0..n).map(|_| Action::ALL[rng.gen_range(0..5)]).collect()
}

mod scenarios {
    use super::*;

    #[test]
    fn test_clean_adjacent_cell_reward() {
        let layout = EnvLayout {
            n_row: 5,
            n_col: 5,
            agent_homes: vec![Cell::new(2, 2)],
            dirty: vec![Cell::new(2, 3)],
            obstacles: vec![],
        };
        let mut env = env_with(layout);
        env.reset(false);
        let result = env.step(&[Action::Right]).unwrap();

        let cfg = RewardConfig::default();
        // Last dirty cell: the terminal bonus is paid on top.
        let bonus = RewardModel::terminal_bonus(1, 1, &cfg);
        assert_relative_eq!(result.rewards[0], 0.95 + bonus, epsilon = 1e-9);
        assert!(!result.info.dirty[(2, 3)]);
        assert_eq!(result.observations[0].dirty[(2, 3)], 0.0);
    }

    #[test]
    fn test_clean_adjacent_cell_reward_without_bonus() {
        // A second, far dirty cell keeps the episode running.
        let layout = EnvLayout {
            n_row: 5,
            n_col: 5,
            agent_homes: vec![Cell::new(2, 2)],
            dirty: vec![Cell::new(2, 3), Cell::new(0, 0)],
            obstacles: vec![],
        };
        let mut env = env_with(layout);
        env.reset(false);
        let result = env.step(&[Action::Right]).unwrap();
        assert_relative_eq!(result.rewards[0], -0.05 + 1.0);
        assert!(!result.done());
    }

    #[test]
    fn test_head_on_collision() {
        let layout = EnvLayout::all_dirty(5, 5, vec![Cell::new(2, 2), Cell::new(2, 3)]);
        let mut env = env_with(layout);
        env.reset(false);
        let result = env.step(&[Action::Right, Action::Left]).unwrap();

        assert_eq!(result.info.agents[0].position, Cell::new(2, 2));
        assert_eq!(result.info.agents[1].position, Cell::new(2, 3));
        let cfg = RewardConfig::default();
        for r in &result.rewards {
            assert_relative_eq!(*r, cfg.step_cost + cfg.collision_penalty);
        }
        assert_eq!(result.info.rewound(), 2);
    }

    #[test]
    fn test_single_dirty_cell_terminates_everyone() {
        let layout = EnvLayout {
            n_row: 5,
            n_col: 5,
            agent_homes: vec![Cell::new(0, 0), Cell::new(4, 4)],
            dirty: vec![Cell::new(0, 1)],
            obstacles: vec![],
        };
        let mut env = env_with(layout);
        env.reset(false);
        let result = env.step(&[Action::Right, Action::Up]).unwrap();

        assert!(result.terminated);
        assert!(!result.truncated);
        assert_eq!(result.dones, vec![true, true]);
        assert_eq!(env.status(), EpisodeStatus::Done(DoneReason::Cleared));

        let cfg = RewardConfig::default();
        let expected_bonus = cfg.terminal_bonus_scale / 1.0 * 1.0;
        assert_relative_eq!(
            result.rewards[0],
            cfg.step_cost + cfg.clean_reward + expected_bonus
        );
        // Agent 1 cleaned nothing: no bonus.
        assert_relative_eq!(result.rewards[1], cfg.step_cost);
    }

    #[test]
    fn test_clear_wins_over_truncation_on_same_step() {
        let layout = EnvLayout {
            n_row: 5,
            n_col: 5,
            agent_homes: vec![Cell::new(0, 0)],
            dirty: vec![Cell::new(0, 1)],
            obstacles: vec![],
        };
        let config = EnvConfig {
            max_steps: 1,
            ..EnvConfig::new(layout)
        };
        let mut env = CoverageEnv::new(config).unwrap();
        env.reset(false);
        let result = env.step(&[Action::Right]).unwrap();
        assert!(result.terminated);
        assert!(!result.truncated);
    }

    #[test]
    fn test_obstacle_blocks_and_penalises() {
        let layout = EnvLayout {
            n_row: 5,
            n_col: 5,
            agent_homes: vec![Cell::new(1, 1)],
            dirty: vec![Cell::new(4, 4)],
            obstacles: vec![Cell::new(1, 2)],
        };
        let mut env = env_with(layout);
        env.reset(false);
        let result = env.step(&[Action::Right]).unwrap();
        assert_eq!(result.info.agents[0].position, Cell::new(1, 1));
        assert_eq!(
            result.info.outcomes[0].cause(),
            Some(RewindCause::Obstacle)
        );
        assert_relative_eq!(result.rewards[0], -0.55);
    }
}

mod reset {
    use super::*;

    #[test]
    fn test_reset_is_idempotent() {
        let mut layout = EnvLayout::all_dirty(6, 6, vec![Cell::new(0, 0), Cell::new(5, 5)]);
        layout.obstacles = vec![Cell::new(3, 3)];
        let mut env = env_with(layout);
        env.reset(false);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            let actions = random_actions(&mut rng, 2);
            env.step(&actions).unwrap();
        }

        let first = env.reset(false);
        let snap_a = (
            env.grid().dirty_layer().clone(),
            env.grid().visited_layer().clone(),
            env.grid().snapshot(),
        );
        let second = env.reset(false);
        let snap_b = (
            env.grid().dirty_layer().clone(),
            env.grid().visited_layer().clone(),
            env.grid().snapshot(),
        );
        assert_eq!(first, second);
        assert_eq!(snap_a, snap_b);
    }

    #[test]
    fn test_obstacles_survive_reset() {
        let mut layout = EnvLayout::all_dirty(5, 5, vec![Cell::new(0, 0)]);
        layout.obstacles = vec![Cell::new(2, 2)];
        let mut env = env_with(layout);
        let before = env.grid().obstacle_layer().clone();
        env.reset(false);
        env.reset(true);
        assert_eq!(env.grid().obstacle_layer(), &before);
    }
}

mod invariants {
    use super::*;

    fn crowded_env(seed: u64) -> CoverageEnv {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = EnvLayout::random(6, 6, 6, 0.15, &mut rng).unwrap();
        let config = EnvConfig {
            max_steps: 60,
            ..EnvConfig::new(layout)
        };
        CoverageEnv::new(config).unwrap()
    }

    #[test]
    fn test_at_most_one_agent_per_cell() {
        for seed in 0..20 {
            let mut env = crowded_env(seed);
            env.reset(false);
            let mut rng = StdRng::seed_from_u64(seed + 100);
            loop {
                let actions = random_actions(&mut rng, env.n_agents());
                let result = env.step(&actions).unwrap();

                let mut cells: Vec<Cell> =
                    result.info.agents.iter().map(|a| a.position).collect();
                cells.sort();
                cells.dedup();
                assert_eq!(cells.len(), env.n_agents(), "two agents share a cell");
                for cell in &cells {
                    assert!(!env.grid().is_obstacle(*cell));
                }
                if result.done() {
                    break;
                }
            }
        }
    }

    #[test]
    fn test_visitation_is_monotonic() {
        for seed in 0..10 {
            let mut env = crowded_env(seed);
            env.reset(false);
            let n_agents = env.n_agents();
            let mut previous = env.grid().visited_layer().clone();
            let mut rng = StdRng::seed_from_u64(seed + 200);
            loop {
                let actions = random_actions(&mut rng, n_agents);
                let result = env.step(&actions).unwrap();
                for (before, after) in previous.iter().zip(result.info.visited.iter()) {
                    if let Some(agent) = after {
                        assert!(*agent < n_agents);
                    }
                    if before.is_some() {
                        assert_eq!(before, after, "visited cell changed owner");
                    }
                }
                previous = result.info.visited.clone();
                if result.done() {
                    break;
                }
            }
        }
    }

    #[test]
    fn test_leaving_start_cell_keeps_it_unvisited() {
        let mut env = env_with(EnvLayout::all_dirty(5, 5, vec![Cell::new(0, 0)]));
        env.reset(false);
        assert_eq!(env.grid().visited_layer()[(0, 0)], None);

        let result = env.step(&[Action::Right]).unwrap();
        assert_eq!(result.info.visited[(0, 0)], None);
        assert!(result.info.dirty[(0, 0)]);
        assert_eq!(result.info.visited[(0, 1)], Some(0));
        assert!(!result.info.dirty[(0, 1)]);

        let result = env.step(&[Action::Left]).unwrap();
        assert_eq!(result.info.visited[(0, 0)], Some(0));
        assert!(!result.info.dirty[(0, 0)]);
    }

    #[test]
    fn test_visited_cells_are_clean() {
        for seed in 0..10 {
            let mut env = crowded_env(seed);
            env.reset(false);
            let mut rng = StdRng::seed_from_u64(seed + 300);
            loop {
                let actions = random_actions(&mut rng, env.n_agents());
                let result = env.step(&actions).unwrap();
                for (visited, dirty) in result.info.visited.iter().zip(result.info.dirty.iter()) {
                    assert!(!(visited.is_some() && *dirty), "visited cell still dirty");
                }
                if result.done() {
                    break;
                }
            }
        }
    }

    #[test]
    fn test_dirty_never_on_obstacles() {
        let mut env = crowded_env(5);
        let obs = env.reset(false);
        let product = &obs[0].dirty * &obs[0].obstacle;
        assert_eq!(product.sum(), 0.0);
    }

    #[test]
    fn test_cleaned_counts_match_coverage() {
        let mut env = crowded_env(9);
        env.reset(false);
        let mut rng = StdRng::seed_from_u64(9);
        loop {
            let actions = random_actions(&mut rng, env.n_agents());
            if env.step(&actions).unwrap().done() {
                break;
            }
        }
        let cleaned: u32 = env.grid().agents().iter().map(|a| a.cleaned).sum();
        let initial = env.grid().initial_dirty_count();
        assert_eq!(cleaned as usize, initial - env.grid().dirty_count());
    }
}
