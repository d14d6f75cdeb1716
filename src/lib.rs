//! Kitchen episodes: an episode controller for a two-object embodied cooking
//! task (pick up a tomato, cook it in a microwave) with shaped rewards and
//! replay.
//!
//! The simulator is an external collaborator behind [`env::Simulator`]; the
//! policy is an external collaborator behind [`agent::AgentPolicy`].

pub mod agent;
pub mod catalog;
pub mod config;
pub mod env;
pub mod episode;
pub mod trajectory;
