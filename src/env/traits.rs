//! Core simulator traits and shared event types.
//!
//! A [`Simulator`] launches a session; the session implements [`Environment`]
//! and is what the episode controller talks to for the rest of its life.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::episode::Action;

/// An object as reported in the simulator's event metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    /// Simulator-assigned identifier, stable for the life of the scene.
    pub object_id: String,
    /// Type name, e.g. `"Tomato"` or `"Microwave"`.
    pub object_type: String,
    /// Whether the object is currently in view and within interaction range.
    pub visible: bool,
}

/// Agent pose at the time of the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPose {
    /// Yaw in degrees, one of 0/90/180/270.
    pub rotation: u16,
    /// Camera pitch in degrees; positive looks down.
    pub horizon: i16,
}

/// Metadata attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Objects in the scene, in the simulator's enumeration order.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub agent: AgentPose,
}

/// The simulator's report after a reset, step, or interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Whether the low-level action that produced this event succeeded.
    pub last_action_success: bool,
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl Event {
    /// Visible objects, in enumeration order.
    pub fn visible_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.metadata.objects.iter().filter(|o| o.visible)
    }

    /// The first visible object of `object_type` in enumeration order.
    pub fn first_visible(&self, object_type: &str) -> Option<&SceneObject> {
        self.visible_objects().find(|o| o.object_type == object_type)
    }
}

/// Launches simulator sessions.
#[allow(async_fn_in_trait)]
pub trait Simulator: Send + Sync {
    type Session: Environment;

    /// Start a session on `scene`, optionally pinned to a GPU.
    async fn start(&self, scene: &str, gpu_id: Option<usize>) -> Result<Self::Session>;
}

/// A running simulator session.
///
/// Interaction calls report environment-side failure through their `bool`
/// result and [`Environment::last_action_success`]; `Err` is reserved for the
/// session itself being unusable (transport failure, dead process).
#[allow(async_fn_in_trait)]
pub trait Environment: Send {
    /// Reload `scene`. With `change_seed` the session draws a new random seed
    /// first; without it the previous seed is reused.
    async fn reset(&mut self, scene: &str, change_seed: bool) -> Result<()>;

    /// Execute one low-level action and return the resulting event.
    async fn step(&mut self, action: Action) -> Result<Event>;

    /// Whether the most recent action or interaction succeeded.
    fn last_action_success(&self) -> bool;

    /// The most recent event, if any action has been taken since start.
    fn last_event(&self) -> Option<&Event>;

    /// Pick up the object with `object_id`.
    async fn pickup(&mut self, object_id: &str) -> Result<bool>;

    /// Cook the tomato `tomato_id` in the microwave `microwave_id`.
    ///
    /// `tomato_id` is `None` when no tomato has been acquired; implementations
    /// must reject that case rather than error.
    async fn cook(&mut self, microwave_id: &str, tomato_id: Option<&str>) -> Result<bool>;
}
