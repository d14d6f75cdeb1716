//! Agent module: the policy seam the episode runner drives.
//!
//! Policies are external to the controller; the ones here are simple
//! baselines used by the CLI and in tests.

pub mod policy;

// Re-export the primary types for convenient access.
pub use policy::{AgentPolicy, RandomAgent, ScriptedAgent};
