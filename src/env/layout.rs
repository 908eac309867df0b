//! Persisted environment layout.
//!
//! An [`EnvLayout`] is the flat record exchanged with the map editor and
//! written to disk between editing sessions: grid size, agent homes, dirty
//! cells and obstacle cells. It carries no training state.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::config::{MAX_AGENTS, MAX_GRID, MIN_GRID};
use super::error::ConfigError;
use super::types::Cell;

/// Grid geometry plus the agent, dirty and obstacle placements.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvLayout {
    pub n_row: usize,
    pub n_col: usize,
    /// Home cell of each agent; the position in this list is the agent index.
    pub agent_homes: Vec<Cell>,
    pub dirty: Vec<Cell>,
    pub obstacles: Vec<Cell>,
}

impl EnvLayout {
    /// Layout with every cell dirty and no obstacles.
    pub fn all_dirty(n_row: usize, n_col: usize, agent_homes: Vec<Cell>) -> Self {
        let dirty = (0..n_row)
            .flat_map(|row| (0..n_col).map(move |col| Cell::new(row, col)))
            .collect();
        Self {
            n_row,
            n_col,
            agent_homes,
            dirty,
            obstacles: Vec::new(),
        }
    }

    /// Number of agents described by this layout.
    pub fn n_agents(&self) -> usize {
        self.agent_homes.len()
    }

    /// Generates a random layout.
    ///
    /// Obstacles cover `round(obstacle_density * cells)` cells, agents are
    /// placed on distinct free cells and every remaining free cell is dirty.
    pub fn random<R: Rng + ?Sized>(
        n_row: usize,
        n_col: usize,
        agent_count: usize,
        obstacle_density: f64,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        if !(0.0..1.0).contains(&obstacle_density) {
            return Err(ConfigError::InvalidDensity(obstacle_density));
        }
        if agent_count == 0 {
            return Err(ConfigError::NoAgents);
        }
        if agent_count > MAX_AGENTS {
            return Err(ConfigError::TooManyAgents {
                count: agent_count,
                max: MAX_AGENTS,
            });
        }
        let (n_row, n_col) = clamp_dims(n_row, n_col);

        let mut cells: Vec<Cell> = (0..n_row)
            .flat_map(|row| (0..n_col).map(move |col| Cell::new(row, col)))
            .collect();
        cells.shuffle(rng);

        let n_obstacles = (obstacle_density * cells.len() as f64).round() as usize;
        let free = cells.len() - n_obstacles.min(cells.len());
        if free == 0 {
            return Err(ConfigError::NoFreeCells);
        }
        if free < agent_count {
            return Err(ConfigError::NotEnoughFreeCells {
                free,
                agents: agent_count,
            });
        }

        let obstacles = cells.split_off(free);
        let agent_homes = cells[..agent_count].to_vec();
        let mut dirty = cells;
        dirty.sort();
        let mut obstacles = obstacles;
        obstacles.sort();

        Ok(Self {
            n_row,
            n_col,
            agent_homes,
            dirty,
            obstacles,
        })
    }

    /// Returns a cleaned copy of this layout, or an error when no safe
    /// default exists.
    ///
    /// - dimensions are clamped to `[MIN_GRID, MAX_GRID]`;
    /// - dirty and obstacle cells outside the grid are dropped, duplicates
    ///   removed;
    /// - obstacles on agent homes are removed;
    /// - dirty cells on obstacles are removed.
    ///
    /// A layout left without any dirty cell is rejected: its episodes would
    /// be over before the first step.
    pub fn sanitized(&self) -> Result<EnvLayout, ConfigError> {
        let (n_row, n_col) = clamp_dims(self.n_row, self.n_col);
        if (n_row, n_col) != (self.n_row, self.n_col) {
            warn!(
                requested_rows = self.n_row,
                requested_cols = self.n_col,
                n_row,
                n_col,
                "grid size clamped"
            );
        }
        let inside = |c: &Cell| c.row < n_row && c.col < n_col;

        let mut obstacles: BTreeSet<Cell> = BTreeSet::new();
        for cell in &self.obstacles {
            if inside(cell) {
                obstacles.insert(*cell);
            } else {
                warn!(%cell, "dropping obstacle outside the grid");
            }
        }
        if obstacles.len() >= n_row * n_col {
            return Err(ConfigError::NoFreeCells);
        }

        if self.agent_homes.is_empty() {
            return Err(ConfigError::NoAgents);
        }
        if self.agent_homes.len() > MAX_AGENTS {
            return Err(ConfigError::TooManyAgents {
                count: self.agent_homes.len(),
                max: MAX_AGENTS,
            });
        }
        for (agent, cell) in self.agent_homes.iter().enumerate() {
            if !inside(cell) {
                return Err(ConfigError::HomeOutOfBounds {
                    agent,
                    cell: *cell,
                    n_row,
                    n_col,
                });
            }
            if let Some(first) = self.agent_homes[..agent].iter().position(|c| c == cell) {
                return Err(ConfigError::DuplicateHome {
                    first,
                    second: agent,
                    cell: *cell,
                });
            }
            if obstacles.remove(cell) {
                warn!(agent, %cell, "removing obstacle placed on an agent home");
            }
        }

        let mut dirty: BTreeSet<Cell> = BTreeSet::new();
        for cell in &self.dirty {
            if !inside(cell) {
                warn!(%cell, "dropping dirty cell outside the grid");
            } else if !obstacles.contains(cell) {
                dirty.insert(*cell);
            }
        }

        if dirty.is_empty() {
            return Err(ConfigError::NoDirtyCells);
        }

        Ok(EnvLayout {
            n_row,
            n_col,
            agent_homes: self.agent_homes.clone(),
            dirty: dirty.into_iter().collect(),
            obstacles: obstacles.into_iter().collect(),
        })
    }
}

#[cfg(feature = "serde")]
impl EnvLayout {
    /// Writes this layout as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        tracing::debug!(path = %path.as_ref().display(), "layout exported");
        Ok(())
    }

    /// Reads a layout written by [`EnvLayout::save_json`].
    ///
    /// The result is not sanitised; building an environment from it does that.
    pub fn load_json(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Default for EnvLayout {
    fn default() -> Self {
        Self::all_dirty(10, 10, vec![Cell::new(0, 0), Cell::new(9, 9)])
    }
}

fn clamp_dims(n_row: usize, n_col: usize) -> (usize, usize) {
    (n_row.clamp(MIN_GRID, MAX_GRID), n_col.clamp(MIN_GRID, MAX_GRID))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn dimensions_are_clamped() {
        let layout = EnvLayout::all_dirty(2, 40, vec![Cell::new(0, 0)]);
        let clean = layout.sanitized().unwrap();
        assert_eq!((clean.n_row, clean.n_col), (MIN_GRID, MAX_GRID));
    }

    #[test]
    fn out_of_bounds_dirty_dropped_after_clamp() {
        // 30x30 clamps to 20x20, dirty cells beyond row 19 disappear.
        let layout = EnvLayout::all_dirty(30, 30, vec![Cell::new(0, 0)]);
        let clean = layout.sanitized().unwrap();
        assert_eq!(clean.dirty.len(), MAX_GRID * MAX_GRID);
    }

    #[test]
    fn obstacle_on_home_removed_and_dirty_on_obstacle_removed() {
        let mut layout = EnvLayout::all_dirty(5, 5, vec![Cell::new(1, 1)]);
        layout.obstacles = vec![Cell::new(1, 1), Cell::new(3, 3)];
        let clean = layout.sanitized().unwrap();
        assert_eq!(clean.obstacles, vec![Cell::new(3, 3)]);
        assert!(!clean.dirty.contains(&Cell::new(3, 3)));
        assert!(clean.dirty.contains(&Cell::new(1, 1)));
    }

    #[test]
    fn no_agents_is_an_error() {
        let layout = EnvLayout::all_dirty(5, 5, vec![]);
        assert_eq!(layout.sanitized(), Err(ConfigError::NoAgents));
    }

    #[test]
    fn duplicate_home_is_an_error() {
        let layout = EnvLayout::all_dirty(5, 5, vec![Cell::new(1, 1), Cell::new(1, 1)]);
        assert!(matches!(
            layout.sanitized(),
            Err(ConfigError::DuplicateHome {
                first: 0,
                second: 1,
                ..
            })
        ));
    }

    #[test]
    fn home_outside_grid_is_an_error() {
        let layout = EnvLayout::all_dirty(5, 5, vec![Cell::new(7, 0)]);
        assert!(matches!(
            layout.sanitized(),
            Err(ConfigError::HomeOutOfBounds { agent: 0, .. })
        ));
    }

    #[test]
    fn fully_blocked_grid_is_an_error() {
        let mut layout = EnvLayout::all_dirty(5, 5, vec![Cell::new(0, 0)]);
        layout.obstacles = layout.dirty.clone();
        assert_eq!(layout.sanitized(), Err(ConfigError::NoFreeCells));
    }

    #[test]
    fn layout_without_dirty_cells_is_an_error() {
        let mut layout = EnvLayout::all_dirty(5, 5, vec![Cell::new(0, 0)]);
        layout.dirty.clear();
        assert_eq!(layout.sanitized(), Err(ConfigError::NoDirtyCells));

        // Dirty cells hidden under obstacles do not count.
        layout.dirty = vec![Cell::new(2, 2)];
        layout.obstacles = vec![Cell::new(2, 2)];
        assert_eq!(layout.sanitized(), Err(ConfigError::NoDirtyCells));
    }

    #[test]
    fn random_layout_is_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        let layout = EnvLayout::random(8, 8, 3, 0.2, &mut rng).unwrap();
        assert_eq!(layout.n_agents(), 3);
        assert_eq!(layout.obstacles.len(), 13); // round(0.2 * 64)
        assert_eq!(layout.dirty.len() + layout.obstacles.len(), 64);
        for home in &layout.agent_homes {
            assert!(!layout.obstacles.contains(home));
        }
        assert_eq!(layout.sanitized().unwrap(), layout);
    }

    #[test]
    fn random_layout_rejects_bad_density() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            EnvLayout::random(5, 5, 1, 1.5, &mut rng),
            Err(ConfigError::InvalidDensity(1.5))
        );
    }

    #[test]
    fn random_layout_needs_room_for_agents() {
        let mut rng = StdRng::seed_from_u64(7);
        // 25 cells, 24 obstacles, 2 agents.
        assert_eq!(
            EnvLayout::random(5, 5, 2, 0.96, &mut rng),
            Err(ConfigError::NotEnoughFreeCells { free: 1, agents: 2 })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_persistence_round_trip() {
        let mut layout = EnvLayout::all_dirty(6, 7, vec![Cell::new(0, 1), Cell::new(5, 6)]);
        layout.obstacles = vec![Cell::new(2, 2)];
        let path = std::env::temp_dir().join(format!("maac_layout_{}.json", std::process::id()));
        layout.save_json(&path).unwrap();
        let restored = EnvLayout::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(restored, layout);
    }
}
