//! Trajectory collection: driving a controller with a policy.
//!
//! The [`TrajectoryCollector`] runs each episode by repeatedly:
//!   1. handing the controller's agent state to the policy,
//!   2. stepping the controller with the chosen index,
//!   3. recording the judged outcome,
//!
//! until the controller reports a terminal step or the step budget runs out.
//! The budget belongs to the caller; with `strict_done` the collector ends the
//! controller's episode through [`EpisodeController::truncate`].

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::agent::AgentPolicy;
use crate::config::RunConfig;
use crate::env::Simulator;
use crate::episode::EpisodeController;
use crate::trajectory::types::{Step, Trajectory};

/// Runs budgeted episodes and records them.
#[derive(Debug, Clone)]
pub struct TrajectoryCollector {
    /// Step budget per episode.
    max_steps: usize,
    /// Count budget exhaustion as a terminal failure.
    strict_done: bool,
}

impl TrajectoryCollector {
    pub fn new(max_steps: usize, strict_done: bool) -> Self {
        Self {
            max_steps,
            strict_done,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.max_episode_length, config.strict_done)
    }

    /// Run one episode per entry in `scenes`.
    pub async fn collect_episodes<S, A>(
        &self,
        controller: &mut EpisodeController<S>,
        agent: &mut A,
        scenes: &[String],
    ) -> Result<Vec<Trajectory>>
    where
        S: Simulator,
        A: AgentPolicy,
    {
        let mut trajectories = Vec::with_capacity(scenes.len());

        for (ep, scene) in scenes.iter().enumerate() {
            let trajectory = self.run_episode(controller, agent, scene).await?;
            tracing::info!(
                episode = ep,
                scene = %scene,
                steps = trajectory.steps.len(),
                reward = trajectory.total_reward,
                success = trajectory.success,
                truncated = trajectory.truncated,
                "collected episode"
            );
            trajectories.push(trajectory);
        }

        Ok(trajectories)
    }

    /// Start a new episode in `scene` and run it to completion or budget.
    pub async fn run_episode<S, A>(
        &self,
        controller: &mut EpisodeController<S>,
        agent: &mut A,
        scene: &str,
    ) -> Result<Trajectory>
    where
        S: Simulator,
        A: AgentPolicy,
    {
        controller.new_episode(scene).await?;
        agent.reset();

        let num_actions = controller.action_set().len();
        let mut steps: Vec<Step> = Vec::new();
        let mut total_reward = 0.0;
        let mut reached_terminal = false;

        for step_index in 0..self.max_steps {
            let action_index = agent
                .select_action(&controller.state_for_agent(), num_actions)
                .await?;
            let action = controller.action_set().resolve(action_index)?;
            let outcome = controller.step(action_index).await?;

            steps.push(Step {
                step_index,
                action_index,
                action,
                reward: outcome.reward,
                action_was_successful: outcome.action_was_successful,
            });
            total_reward += outcome.reward;

            if outcome.terminal {
                reached_terminal = true;
                break;
            }
        }

        let truncated = !reached_terminal;
        if truncated {
            tracing::debug!(scene, budget = self.max_steps, "step budget exhausted");
            if self.strict_done {
                controller.truncate()?;
            }
        }

        Ok(Trajectory {
            id: Uuid::new_v4().to_string(),
            scene: scene.to_string(),
            steps,
            total_reward,
            success: controller.success(),
            terminated: reached_terminal || (truncated && self.strict_done),
            truncated,
            goal: controller.goal().clone(),
            recorded_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{RandomAgent, ScriptedAgent};
    use crate::catalog::ObjectCatalog;
    use crate::config::EpisodeConfig;
    use crate::env::mock::MockKitchen;
    use crate::episode::{Action, EpisodePhase};

    fn controller() -> EpisodeController<MockKitchen> {
        EpisodeController::new(
            MockKitchen::new(5),
            ObjectCatalog::default(),
            &EpisodeConfig::default(),
        )
    }

    #[tokio::test]
    async fn scripted_run_succeeds_in_floorplan1() {
        let mut c = controller();
        let mut agent = ScriptedAgent::from_actions(
            c.action_set(),
            &[
                Action::RotateRight,
                Action::LookTomato,
                Action::RotateRight,
                Action::LookMicrowave,
                Action::Done,
            ],
        )
        .unwrap();
        let collector = TrajectoryCollector::new(30, false);

        let t = collector.run_episode(&mut c, &mut agent, "FloorPlan1").await.unwrap();

        assert!(t.success);
        assert!(t.terminated);
        assert!(!t.truncated);
        assert_eq!(t.steps.len(), 5);
        assert!((t.total_reward - (5.0 * -0.01 + 3.0 * 5.0)).abs() < 1e-9);
        assert_eq!(t.goal.cook_id.tomato.as_deref(), Some("Tomato|1"));
        assert_eq!(t.actions(), c.actions_taken());
    }

    #[tokio::test]
    async fn budget_exhaustion_truncates() {
        let mut c = controller();
        let mut agent = ScriptedAgent::new(vec![1; 3], 1);
        let lenient = TrajectoryCollector::new(3, false);
        let strict = TrajectoryCollector::new(3, true);

        let t = lenient.run_episode(&mut c, &mut agent, "FloorPlan2").await.unwrap();
        assert!(t.truncated);
        assert!(!t.terminated);
        assert!(!t.success);
        assert_eq!(t.steps.len(), 3);
        assert_eq!(c.phase(), EpisodePhase::Active);

        let t = strict.run_episode(&mut c, &mut agent, "FloorPlan2").await.unwrap();
        assert!(t.truncated);
        assert!(t.terminated);
        assert!(!t.success);
        assert_eq!(c.phase(), EpisodePhase::Terminal);
    }

    #[tokio::test]
    async fn collect_runs_one_episode_per_scene() {
        let mut c = controller();
        let mut agent = RandomAgent::new(9);
        let collector = TrajectoryCollector::from_config(&RunConfig::default());
        let scenes = vec!["FloorPlan1".to_string(), "FloorPlan3".to_string()];

        let trajectories = collector
            .collect_episodes(&mut c, &mut agent, &scenes)
            .await
            .unwrap();

        assert_eq!(trajectories.len(), 2);
        assert_eq!(trajectories[1].scene, "FloorPlan3");
        // No tomato in FloorPlan3.
        assert!(!trajectories[1].success);
        assert!(!trajectories[1].goal.target.tomato);
        for t in &trajectories {
            assert!(t.steps.len() <= 30);
            assert_eq!(t.terminated, !t.truncated);
        }
    }
}
