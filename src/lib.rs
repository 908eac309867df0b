//! maac - Multi-Agent Area Coverage
//!
//! A grid-world testbed where several agents clean dirty cells together.
//! Moves are simultaneous and resolved as a batch, observations are full-map
//! layers, and transitions feed a uniform or prioritized replay store for an
//! external learner.

pub mod editor;
pub mod env;
pub mod error;
pub mod policy;
pub mod replay;
pub mod training;

pub use error::{Error, Result};
