//! Trajectory types and collection for recording controller-driven episodes.
//!
//! This module provides:
//! - [`types::Step`], [`types::Trajectory`] -- what happened during an episode.
//! - [`types::TrajectoryBuffer`] -- accumulation across episodes with summary
//!   statistics and JSON export.
//! - [`collector::TrajectoryCollector`] -- runs a policy against an
//!   [`EpisodeController`](crate::episode::EpisodeController) under a step
//!   budget.

pub mod collector;
pub mod types;

// Re-export the most commonly used items at the module level.
pub use collector::TrajectoryCollector;
pub use types::{Step, Trajectory, TrajectoryBuffer};
