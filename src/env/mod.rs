//! Simulator abstractions and concrete implementations.
//!
//! The episode controller drives any [`Simulator`] whose sessions implement
//! [`Environment`].
//!
//! Included simulators:
//! - **THOR** ([`thor`]) -- an AI2-THOR kitchen reached through an HTTP bridge.
//! - **Mock kitchen** ([`mock`]) -- an in-process scripted kitchen with
//!   deterministic, seedable object placement, for tests and offline runs.

pub mod mock;
pub mod thor;
pub mod traits;

// Re-export the core traits and event types at the module level.
pub use traits::{AgentPose, Environment, Event, EventMetadata, SceneObject, Simulator};
