//! Trajectory data types: what happened during an episode, step by step.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::episode::{Action, GoalState};

// ---------------------------------------------------------------------------
// Single step
// ---------------------------------------------------------------------------

/// A single judged step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Zero-based index of this step within the trajectory.
    pub step_index: usize,
    /// Index the agent chose.
    pub action_index: usize,
    pub action: Action,
    pub reward: f64,
    pub action_was_successful: bool,
}

// ---------------------------------------------------------------------------
// Full trajectory
// ---------------------------------------------------------------------------

/// One complete episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub scene: String,
    pub steps: Vec<Step>,
    pub total_reward: f64,
    /// Whether `Done` was issued with both sub-goals complete.
    pub success: bool,
    /// Whether the episode reached a terminal state.
    pub terminated: bool,
    /// Whether the step budget ran out before `Done`.
    pub truncated: bool,
    /// Goal state at the end of the episode.
    pub goal: GoalState,
    pub recorded_at: DateTime<Utc>,
}

impl Trajectory {
    /// The action sequence, suitable for replay.
    pub fn actions(&self) -> Vec<Action> {
        self.steps.iter().map(|s| s.action).collect()
    }
}

// ---------------------------------------------------------------------------
// Trajectory buffer
// ---------------------------------------------------------------------------

/// Accumulates trajectories across episodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrajectoryBuffer {
    trajectories: Vec<Trajectory>,
}

impl TrajectoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn push(&mut self, trajectory: Trajectory) {
        self.trajectories.push(trajectory);
    }

    pub fn extend(&mut self, iter: impl IntoIterator<Item = Trajectory>) {
        self.trajectories.extend(iter);
    }

    pub fn as_slice(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn last(&self) -> Option<&Trajectory> {
        self.trajectories.last()
    }

    /// Fraction of buffered episodes that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.trajectories.is_empty() {
            return 0.0;
        }
        let successes = self.trajectories.iter().filter(|t| t.success).count();
        successes as f64 / self.trajectories.len() as f64
    }

    /// Mean total reward per episode.
    pub fn mean_reward(&self) -> f64 {
        if self.trajectories.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trajectories.iter().map(|t| t.total_reward).sum();
        sum / self.trajectories.len() as f64
    }

    /// Write all trajectories as a pretty-printed JSON array.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.trajectories)
            .context("Failed to serialize trajectories to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write trajectories to {}", path.display()))?;
        tracing::info!(path = %path.display(), count = self.len(), "Saved trajectories");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory(success: bool, total_reward: f64) -> Trajectory {
        Trajectory {
            id: uuid::Uuid::new_v4().to_string(),
            scene: "FloorPlan1".into(),
            steps: vec![Step {
                step_index: 0,
                action_index: 7,
                action: Action::Done,
                reward: total_reward,
                action_was_successful: true,
            }],
            total_reward,
            success,
            terminated: true,
            truncated: false,
            goal: GoalState::default(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn buffer_statistics() {
        let mut buffer = TrajectoryBuffer::new();
        assert_eq!(buffer.success_rate(), 0.0);

        buffer.push(trajectory(true, 4.0));
        buffer.extend([trajectory(false, -1.0), trajectory(false, 0.0), trajectory(true, 1.0)]);

        assert_eq!(buffer.len(), 4);
        assert!((buffer.success_rate() - 0.5).abs() < f64::EPSILON);
        assert!((buffer.mean_reward() - 1.0).abs() < f64::EPSILON);
        assert_eq!(buffer.last().unwrap().actions(), vec![Action::Done]);
    }

    #[test]
    fn saved_file_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectories.json");
        let mut buffer = TrajectoryBuffer::new();
        buffer.push(trajectory(true, 9.99));

        buffer.save_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Trajectory> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].steps[0].action, Action::Done);
    }
}
