//! One embodied cooking episode: find a tomato, cook it in a microwave, say
//! `Done`.
//!
//! - [`actions`] -- the fixed, index-addressed action set.
//! - [`goal`] -- two-slot sub-goal bookkeeping.
//! - [`controller`] -- [`EpisodeController`], which owns the simulator session
//!   and judges every action.
//! - [`error`] -- the controller's error taxonomy.

pub mod actions;
pub mod controller;
pub mod error;
pub mod goal;

pub use actions::{Action, ActionSet, BASIC_ACTIONS};
pub use controller::{AgentState, EpisodeController, EpisodePhase, StepOutcome};
pub use error::EpisodeError;
pub use goal::{GoalState, Slots, TrackedObject};
