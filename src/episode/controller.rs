//! The episode controller: lifecycle, action bookkeeping, shaped reward and
//! replay for one tomato-and-microwave cooking episode.
//!
//! ```text
//! Uninitialized --new_episode--> Active --step(Done)--> Terminal
//!                                  ^                       |
//!                                  +------new_episode------+
//! ```
//!
//! The controller owns exactly one simulator session, started lazily by the
//! first [`EpisodeController::new_episode`] and reset by every later one.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::actions::{Action, ActionSet};
use super::error::EpisodeError;
use super::goal::{GoalState, Slots, TrackedObject};
use crate::catalog::ObjectCatalog;
use crate::config::{EpisodeConfig, RewardConfig};
use crate::env::{Environment, Event, Simulator};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where the current episode is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodePhase {
    Uninitialized,
    Active,
    Terminal,
}

/// The result of judging one action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub reward: f64,
    pub terminal: bool,
    /// Whether the simulator executed the action (and any interaction it
    /// triggered) without failure. Independent of goal progress.
    pub action_was_successful: bool,
}

/// What the agent gets to see before choosing its next action.
#[derive(Debug, Clone, Copy)]
pub struct AgentState<'a> {
    /// The latest simulator event.
    pub event: Option<&'a Event>,
    /// Which object kinds the agent has already tried to find.
    pub tried_find: &'a Slots<bool>,
}

/// The simulator session, before and after the first episode starts it.
#[derive(Debug)]
enum EnvHandle<E> {
    Unbound,
    Bound(E),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives one simulator session through a sequence of episodes.
///
/// Not safe to share: every call awaits the simulator before returning, and
/// callers must not overlap calls on the same controller.
pub struct EpisodeController<S: Simulator> {
    simulator: S,
    env: EnvHandle<S::Session>,
    gpu_id: Option<usize>,
    actions: ActionSet,
    rewards: RewardConfig,
    catalog: ObjectCatalog,

    // -- per-episode state --------------------------------------------------
    goal: GoalState,
    actions_taken: Vec<Action>,
    success: bool,
    scene: Option<String>,
    phase: EpisodePhase,
}

impl<S: Simulator> EpisodeController<S> {
    /// Create a controller. No simulator session is started until the first
    /// call to [`new_episode`](Self::new_episode).
    pub fn new(simulator: S, catalog: ObjectCatalog, config: &EpisodeConfig) -> Self {
        Self {
            simulator,
            env: EnvHandle::Unbound,
            gpu_id: config.simulator.gpu_id,
            actions: ActionSet::new(config.actions.clone()),
            rewards: config.reward,
            catalog,
            goal: GoalState::default(),
            actions_taken: Vec::new(),
            success: false,
            scene: None,
            phase: EpisodePhase::Uninitialized,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a fresh episode in `scene`.
    ///
    /// Starts the simulator on the first call and resets it (with a new
    /// seed) on every later call. Only a failure to start or reach the
    /// simulator is returned as an error. Per-episode state is always fully
    /// re-initialised, even when the simulator fails; after a failure the
    /// controller is back to `Uninitialized` and `step` is refused.
    pub async fn new_episode(&mut self, scene: &str) -> Result<bool, EpisodeError> {
        let bound = match self.env {
            EnvHandle::Bound(ref mut env) => env.reset(scene, true).await,
            EnvHandle::Unbound => match self.simulator.start(scene, self.gpu_id).await {
                Ok(session) => {
                    self.env = EnvHandle::Bound(session);
                    Ok(())
                }
                Err(err) => Err(err),
            },
        };

        self.goal = GoalState::default();
        self.actions_taken.clear();
        self.success = false;

        if let Err(err) = bound {
            self.scene = None;
            self.phase = EpisodePhase::Uninitialized;
            warn!(scene, error = %err, "failed to start episode");
            return Err(err.into());
        }

        self.scene = Some(scene.to_string());
        self.phase = EpisodePhase::Active;

        info!(scene, "new episode");
        Ok(true)
    }

    /// Take the action at `action_index` and judge the result.
    pub async fn step(&mut self, action_index: usize) -> Result<StepOutcome, EpisodeError> {
        match self.phase {
            EpisodePhase::Uninitialized => return Err(EpisodeError::NotStarted),
            EpisodePhase::Terminal => return Err(EpisodeError::EpisodeTerminated),
            EpisodePhase::Active => {}
        }
        let action = self.actions.resolve(action_index)?;
        self.actions_taken.push(action);
        self.action_step(action).await
    }

    /// End the current episode without a `Done`, e.g. when the caller's step
    /// budget runs out. The episode is unsuccessful and no reward is given.
    pub fn truncate(&mut self) -> Result<(), EpisodeError> {
        match self.phase {
            EpisodePhase::Uninitialized => Err(EpisodeError::NotStarted),
            EpisodePhase::Terminal => Ok(()),
            EpisodePhase::Active => {
                self.success = false;
                self.phase = EpisodePhase::Terminal;
                info!(steps = self.actions_taken.len(), "episode truncated");
                Ok(())
            }
        }
    }

    /// Re-run the recorded actions against the same scene, pausing `delay`
    /// between actions.
    ///
    /// The simulator is reset without reseeding and the goal state starts
    /// from scratch, so every action is judged again. Rewards only match the
    /// original run if the simulator restores the same world state.
    pub async fn slow_replay(&mut self, delay: Duration) -> Result<(), EpisodeError> {
        let scene = self.scene.clone().ok_or(EpisodeError::NotStarted)?;
        let EnvHandle::Bound(env) = &mut self.env else {
            return Err(EpisodeError::NotStarted);
        };
        env.reset(&scene, false).await?;

        self.goal = GoalState::default();
        self.success = false;
        self.phase = EpisodePhase::Active;

        let actions = self.actions_taken.clone();
        info!(scene = %scene, actions = actions.len(), "replaying episode");
        for action in actions {
            let outcome = self.action_step(action).await?;
            debug!(%action, reward = outcome.reward, "replayed action");
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Judging
    // ------------------------------------------------------------------

    async fn action_step(&mut self, action: Action) -> Result<StepOutcome, EpisodeError> {
        let EnvHandle::Bound(env) = &mut self.env else {
            return Err(EpisodeError::NotStarted);
        };
        env.step(action).await?;
        let outcome = self.judge(action).await?;
        debug!(
            %action,
            reward = outcome.reward,
            terminal = outcome.terminal,
            ok = outcome.action_was_successful,
            "step judged"
        );
        Ok(outcome)
    }

    /// Score `action` against the simulator's latest event and advance the
    /// goal state.
    ///
    /// Every action costs the step penalty. A lookup that completes its
    /// sub-goal adds the success bonus once; a `Done` with both sub-goals
    /// complete adds it again and marks the episode successful. When several
    /// visible objects match, only the first in enumeration order is tried.
    pub async fn judge(&mut self, action: Action) -> Result<StepOutcome, EpisodeError> {
        let EnvHandle::Bound(env) = &mut self.env else {
            return Err(EpisodeError::NotStarted);
        };

        let bonus = self.rewards.goal_success_reward;
        let mut reward = self.rewards.step_penalty;
        let mut terminal = false;
        let mut action_was_successful = env.last_action_success();

        match action {
            Action::LookTomato => {
                if !self.goal.target.tomato {
                    if let Some(tomato_id) = first_visible_id(&*env, TrackedObject::Tomato) {
                        let picked = env.pickup(&tomato_id).await?;
                        action_was_successful &= picked;
                        if picked {
                            self.goal.satisfy(TrackedObject::Tomato, &tomato_id);
                            reward += bonus;
                            info!(%tomato_id, "tomato picked up");
                        }
                    }
                }
            }
            Action::LookMicrowave => {
                self.goal.tried_find.microwave = true;
                if !self.goal.target.microwave {
                    if let Some(microwave_id) = first_visible_id(&*env, TrackedObject::Microwave) {
                        let tomato_id = self.goal.cook_id.tomato.clone();
                        let cooked = env.cook(&microwave_id, tomato_id.as_deref()).await?;
                        action_was_successful &= cooked;
                        match (cooked, tomato_id) {
                            (true, Some(tomato_id)) => {
                                self.goal.satisfy(TrackedObject::Microwave, &microwave_id);
                                reward += bonus;
                                info!(%microwave_id, %tomato_id, "tomato cooked");
                            }
                            (true, None) => {
                                warn!(%microwave_id, "simulator reported a cook with no tomato held");
                            }
                            (false, _) => {}
                        }
                    }
                }
            }
            Action::Done => {
                terminal = true;
                self.success = self.goal.is_complete();
                if self.success {
                    reward += bonus;
                }
                self.phase = EpisodePhase::Terminal;
                info!(success = self.success, steps = self.actions_taken.len(), "episode done");
            }
            Action::MoveAhead
            | Action::RotateLeft
            | Action::RotateRight
            | Action::LookUp
            | Action::LookDown => {}
        }

        Ok(StepOutcome {
            reward,
            terminal,
            action_was_successful,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The observation handed to the agent.
    pub fn state_for_agent(&self) -> AgentState<'_> {
        AgentState {
            event: self.environment().and_then(|env| env.last_event()),
            tried_find: &self.goal.tried_find,
        }
    }

    pub fn goal(&self) -> &GoalState {
        &self.goal
    }

    /// Whether the last `Done` found both sub-goals complete.
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// The scene of the current episode.
    pub fn scene(&self) -> Option<&str> {
        self.scene.as_deref()
    }

    /// Actions taken so far this episode, in order.
    pub fn actions_taken(&self) -> &[Action] {
        &self.actions_taken
    }

    pub fn action_set(&self) -> &ActionSet {
        &self.actions
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    /// The simulator session, once started.
    pub fn environment(&self) -> Option<&S::Session> {
        match &self.env {
            EnvHandle::Bound(env) => Some(env),
            EnvHandle::Unbound => None,
        }
    }
}

fn first_visible_id<E: Environment>(env: &E, kind: TrackedObject) -> Option<String> {
    env.last_event()
        .and_then(|event| event.first_visible(kind.object_type()))
        .map(|object| object.object_id.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
