//! An in-process kitchen simulator for tests and offline runs.
//!
//! Each scene is a layout of objects placed at one of four headings around
//! the agent. An object is visible when the agent faces its heading with the
//! camera level. The agent never leaves its spot: `MoveAhead` only reports
//! whether the way is blocked.
//!
//! The session logs every action and interaction it receives so tests can
//! check exactly what the controller sent.

use std::collections::HashMap;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::traits::{AgentPose, Environment, Event, EventMetadata, SceneObject, Simulator};
use crate::episode::Action;

const HORIZON_STEP: i16 = 30;
const MIN_HORIZON: i16 = -30;
const MAX_HORIZON: i16 = 60;
const PICKUPABLE: [&str; 2] = ["Tomato", "Apple"];

// ---------------------------------------------------------------------------
// Scene layouts
// ---------------------------------------------------------------------------

/// One object in a scene layout.
#[derive(Debug, Clone)]
pub struct PlacedObject {
    pub object_id: String,
    pub object_type: String,
    /// Heading in degrees (0/90/180/270) the agent must face to see it.
    pub rotation: u16,
}

impl PlacedObject {
    pub fn new(object_id: &str, object_type: &str, rotation: u16) -> Self {
        Self {
            object_id: object_id.to_string(),
            object_type: object_type.to_string(),
            rotation: rotation % 360,
        }
    }
}

/// A named kitchen layout.
#[derive(Debug, Clone, Default)]
pub struct SceneLayout {
    pub objects: Vec<PlacedObject>,
    /// Headings at which `MoveAhead` is blocked.
    pub blocked_rotations: Vec<u16>,
}

impl SceneLayout {
    fn default_scenes() -> HashMap<String, SceneLayout> {
        let mut scenes = HashMap::new();
        // Tomatoes off to the right, microwave behind, a wall to the left.
        scenes.insert(
            "FloorPlan1".to_string(),
            SceneLayout {
                objects: vec![
                    PlacedObject::new("CounterTop|1", "CounterTop", 0),
                    PlacedObject::new("Apple|1", "Apple", 0),
                    PlacedObject::new("Tomato|1", "Tomato", 90),
                    PlacedObject::new("Tomato|2", "Tomato", 90),
                    PlacedObject::new("Microwave|1", "Microwave", 180),
                    PlacedObject::new("Fridge|1", "Fridge", 270),
                ],
                blocked_rotations: vec![270],
            },
        );
        // Everything on the counter in front of the agent.
        scenes.insert(
            "FloorPlan2".to_string(),
            SceneLayout {
                objects: vec![
                    PlacedObject::new("Tomato|1", "Tomato", 0),
                    PlacedObject::new("Microwave|1", "Microwave", 0),
                ],
                blocked_rotations: Vec::new(),
            },
        );
        // A kitchen without a tomato.
        scenes.insert(
            "FloorPlan3".to_string(),
            SceneLayout {
                objects: vec![
                    PlacedObject::new("Bread|1", "Bread", 0),
                    PlacedObject::new("Microwave|1", "Microwave", 90),
                ],
                blocked_rotations: vec![0, 180],
            },
        );
        scenes
    }
}

// ---------------------------------------------------------------------------
// Launcher
// ---------------------------------------------------------------------------

/// Launches [`MockKitchenEnv`] sessions.
#[derive(Debug, Clone)]
pub struct MockKitchen {
    scenes: HashMap<String, SceneLayout>,
    seed: u64,
    randomize_objects: bool,
    permissive_cook: bool,
}

impl MockKitchen {
    /// A kitchen with the built-in `FloorPlan1`..`FloorPlan3` layouts.
    pub fn new(seed: u64) -> Self {
        Self {
            scenes: SceneLayout::default_scenes(),
            seed,
            randomize_objects: false,
            permissive_cook: false,
        }
    }

    /// Add or replace a scene layout.
    pub fn with_scene(mut self, name: &str, layout: SceneLayout) -> Self {
        self.scenes.insert(name.to_string(), layout);
        self
    }

    /// Draw object headings from the session seed on every reset.
    pub fn with_randomized_objects(mut self, randomize: bool) -> Self {
        self.randomize_objects = randomize;
        self
    }

    /// Make every `cook` call report success, whatever its arguments.
    pub fn with_permissive_cook(mut self, permissive: bool) -> Self {
        self.permissive_cook = permissive;
        self
    }
}

impl Simulator for MockKitchen {
    type Session = MockKitchenEnv;

    async fn start(&self, scene: &str, gpu_id: Option<usize>) -> Result<MockKitchenEnv> {
        let mut env = MockKitchenEnv {
            scenes: self.scenes.clone(),
            layout: SceneLayout::default(),
            placements: Vec::new(),
            randomize_objects: self.randomize_objects,
            permissive_cook: self.permissive_cook,
            seed: self.seed,
            rng: StdRng::seed_from_u64(self.seed),
            pose: AgentPose::default(),
            held: None,
            cooked: None,
            last_event: None,
            step_log: Vec::new(),
            pickup_log: Vec::new(),
            cook_log: Vec::new(),
            reset_count: 0,
        };
        env.load_scene(scene)?;
        tracing::info!(scene, ?gpu_id, seed = self.seed, "mock kitchen started");
        Ok(env)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A running mock kitchen.
#[derive(Debug, Clone)]
pub struct MockKitchenEnv {
    scenes: HashMap<String, SceneLayout>,
    layout: SceneLayout,
    /// Current heading of each object in `layout.objects`.
    placements: Vec<u16>,
    randomize_objects: bool,
    permissive_cook: bool,
    seed: u64,
    rng: StdRng,
    pose: AgentPose,
    held: Option<String>,
    cooked: Option<(String, String)>,
    last_event: Option<Event>,
    step_log: Vec<Action>,
    pickup_log: Vec<String>,
    cook_log: Vec<(String, Option<String>)>,
    reset_count: usize,
}

impl MockKitchenEnv {
    /// Every action passed to `step`, in order, since start.
    pub fn step_log(&self) -> &[Action] {
        &self.step_log
    }

    /// Every object id passed to `pickup`, in order.
    pub fn pickup_log(&self) -> &[String] {
        &self.pickup_log
    }

    /// Every `(microwave_id, tomato_id)` passed to `cook`, in order.
    pub fn cook_log(&self) -> &[(String, Option<String>)] {
        &self.cook_log
    }

    /// Number of `reset` calls since start.
    pub fn reset_count(&self) -> usize {
        self.reset_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The id of the object currently held, if any.
    pub fn held(&self) -> Option<&str> {
        self.held.as_deref()
    }

    /// `(microwave_id, tomato_id)` of the last successful cook.
    pub fn cooked(&self) -> Option<(&str, &str)> {
        self.cooked.as_ref().map(|(m, t)| (m.as_str(), t.as_str()))
    }

    /// Current heading of `object_id`.
    pub fn placement_of(&self, object_id: &str) -> Option<u16> {
        self.layout
            .objects
            .iter()
            .position(|o| o.object_id == object_id)
            .map(|i| self.placements[i])
    }

    fn load_scene(&mut self, scene: &str) -> Result<()> {
        let layout = self
            .scenes
            .get(scene)
            .cloned()
            .with_context(|| format!("unknown mock scene '{scene}'"))?;

        self.rng = StdRng::seed_from_u64(self.seed);
        self.placements = layout
            .objects
            .iter()
            .map(|o| {
                if self.randomize_objects {
                    90 * self.rng.gen_range(0..4u16)
                } else {
                    o.rotation
                }
            })
            .collect();
        self.layout = layout;
        self.pose = AgentPose::default();
        self.held = None;
        self.cooked = None;
        self.last_event = Some(self.snapshot(true));
        Ok(())
    }

    fn is_visible(&self, index: usize) -> bool {
        let object = &self.layout.objects[index];
        if self.held.as_deref() == Some(object.object_id.as_str()) {
            return true;
        }
        self.pose.horizon == 0 && self.placements[index] == self.pose.rotation
    }

    fn visible_object(&self, object_id: &str) -> Option<&PlacedObject> {
        self.layout
            .objects
            .iter()
            .enumerate()
            .find(|(i, o)| o.object_id == object_id && self.is_visible(*i))
            .map(|(_, o)| o)
    }

    fn snapshot(&self, success: bool) -> Event {
        let objects = self
            .layout
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| SceneObject {
                object_id: o.object_id.clone(),
                object_type: o.object_type.clone(),
                visible: self.is_visible(i),
            })
            .collect();
        Event {
            last_action_success: success,
            metadata: EventMetadata {
                objects,
                agent: self.pose,
            },
        }
    }

    fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::MoveAhead => !self.layout.blocked_rotations.contains(&self.pose.rotation),
            Action::RotateLeft => {
                self.pose.rotation = (self.pose.rotation + 270) % 360;
                true
            }
            Action::RotateRight => {
                self.pose.rotation = (self.pose.rotation + 90) % 360;
                true
            }
            Action::LookUp => self.tilt(-HORIZON_STEP),
            Action::LookDown => self.tilt(HORIZON_STEP),
            Action::LookTomato | Action::LookMicrowave | Action::Done => true,
        }
    }

    fn tilt(&mut self, delta: i16) -> bool {
        let next = self.pose.horizon + delta;
        if !(MIN_HORIZON..=MAX_HORIZON).contains(&next) {
            return false;
        }
        self.pose.horizon = next;
        true
    }

    fn finish_interaction(&mut self, success: bool) -> bool {
        self.last_event = Some(self.snapshot(success));
        success
    }
}

impl Environment for MockKitchenEnv {
    async fn reset(&mut self, scene: &str, change_seed: bool) -> Result<()> {
        if change_seed {
            self.seed = self.rng.gen();
        }
        self.load_scene(scene)?;
        self.reset_count += 1;
        tracing::debug!(scene, change_seed, seed = self.seed, "mock kitchen reset");
        Ok(())
    }

    async fn step(&mut self, action: Action) -> Result<Event> {
        self.step_log.push(action);
        let success = self.apply(action);
        let event = self.snapshot(success);
        self.last_event = Some(event.clone());
        Ok(event)
    }

    fn last_action_success(&self) -> bool {
        self.last_event
            .as_ref()
            .is_some_and(|e| e.last_action_success)
    }

    fn last_event(&self) -> Option<&Event> {
        self.last_event.as_ref()
    }

    async fn pickup(&mut self, object_id: &str) -> Result<bool> {
        self.pickup_log.push(object_id.to_string());
        let success = self.held.is_none()
            && self
                .visible_object(object_id)
                .is_some_and(|o| PICKUPABLE.contains(&o.object_type.as_str()));
        if success {
            self.held = Some(object_id.to_string());
        }
        Ok(self.finish_interaction(success))
    }

    async fn cook(&mut self, microwave_id: &str, tomato_id: Option<&str>) -> Result<bool> {
        self.cook_log
            .push((microwave_id.to_string(), tomato_id.map(str::to_string)));

        let microwave_ready = self
            .visible_object(microwave_id)
            .is_some_and(|o| o.object_type == "Microwave");
        let tomato_held = tomato_id.is_some() && tomato_id == self.held.as_deref();
        let success = self.permissive_cook || (microwave_ready && tomato_held);

        if success {
            if let Some(tomato_id) = tomato_id {
                self.cooked = Some((microwave_id.to_string(), tomato_id.to_string()));
            }
        }
        Ok(self.finish_interaction(success))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn kitchen(scene: &str) -> MockKitchenEnv {
        MockKitchen::new(7).start(scene, None).await.unwrap()
    }

    fn visible_ids(event: &Event) -> Vec<&str> {
        event.visible_objects().map(|o| o.object_id.as_str()).collect()
    }

    #[tokio::test]
    async fn visibility_follows_heading_and_horizon() {
        let mut env = kitchen("FloorPlan1").await;
        let start = env.last_event().unwrap().clone();
        assert_eq!(visible_ids(&start), vec!["CounterTop|1", "Apple|1"]);

        let event = env.step(Action::RotateRight).await.unwrap();
        assert_eq!(visible_ids(&event), vec!["Tomato|1", "Tomato|2"]);

        let event = env.step(Action::LookDown).await.unwrap();
        assert!(event.last_action_success);
        assert!(visible_ids(&event).is_empty());
    }

    #[tokio::test]
    async fn blocked_moves_and_tilt_limits_fail() {
        let mut env = kitchen("FloorPlan1").await;
        assert!(env.step(Action::MoveAhead).await.unwrap().last_action_success);

        env.step(Action::RotateLeft).await.unwrap();
        assert!(!env.step(Action::MoveAhead).await.unwrap().last_action_success);
        assert!(!env.last_action_success());

        assert!(env.step(Action::LookUp).await.unwrap().last_action_success);
        assert!(!env.step(Action::LookUp).await.unwrap().last_action_success);
    }

    #[tokio::test]
    async fn pickup_and_cook_require_the_right_objects() {
        let mut env = kitchen("FloorPlan2").await;

        assert!(!env.pickup("Microwave|1").await.unwrap());
        assert!(!env.cook("Microwave|1", None).await.unwrap());
        assert!(env.pickup("Tomato|1").await.unwrap());
        assert_eq!(env.held(), Some("Tomato|1"));
        assert!(!env.cook("Microwave|1", Some("Tomato|9")).await.unwrap());
        assert!(env.cook("Microwave|1", Some("Tomato|1")).await.unwrap());
        assert_eq!(env.cooked(), Some(("Microwave|1", "Tomato|1")));
        assert_eq!(env.cook_log().len(), 3);
    }

    #[tokio::test]
    async fn reset_without_reseed_reproduces_placement() {
        let mut env = MockKitchen::new(11)
            .with_randomized_objects(true)
            .start("FloorPlan1", None)
            .await
            .unwrap();

        env.reset("FloorPlan1", true).await.unwrap();
        let seed = env.seed();
        let placement: Vec<_> = ["Tomato|1", "Microwave|1", "Apple|1"]
            .iter()
            .map(|id| env.placement_of(id))
            .collect();

        env.reset("FloorPlan1", false).await.unwrap();
        assert_eq!(env.seed(), seed);
        let replayed: Vec<_> = ["Tomato|1", "Microwave|1", "Apple|1"]
            .iter()
            .map(|id| env.placement_of(id))
            .collect();
        assert_eq!(placement, replayed);

        env.reset("FloorPlan1", true).await.unwrap();
        assert_ne!(env.seed(), seed);
        assert_eq!(env.reset_count(), 3);
    }

    #[tokio::test]
    async fn unknown_scene_fails_to_start() {
        let err = MockKitchen::new(0)
            .start("FloorPlan404", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown mock scene"));
    }
}
