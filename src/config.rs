use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::episode::{Action, BASIC_ACTIONS};

/// Complete configuration for running kitchen episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub simulator: SimulatorConfig,
    pub reward: RewardConfig,
    pub catalog: CatalogConfig,
    pub run: RunConfig,
    /// The fixed action list agents index into.
    pub actions: Vec<Action>,
}

/// Simulator launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Navigation grid size in metres (default: 0.25).
    pub grid_size: f64,
    /// Camera field of view in degrees (default: 100.0).
    pub fov: f64,
    /// Shuffle object placement on reseeded resets (default: false).
    pub randomize_objects: bool,
    /// Base random seed (default: 1).
    pub seed: u64,
    /// Worker rank; added to `seed` so parallel workers diverge (default: 0).
    pub rank: u64,
    /// GPU to render on, if any.
    pub gpu_id: Option<usize>,
    /// Base URL of the simulator bridge server.
    pub bridge_url: String,
    /// Path to the simulator build, forwarded to the bridge.
    pub executable_path: Option<PathBuf>,
}

impl SimulatorConfig {
    /// The seed this worker's simulator is started with.
    pub fn worker_seed(&self) -> u64 {
        self.seed.wrapping_add(self.rank)
    }
}

/// Shaped-reward constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Applied to every step (default: -0.01).
    pub step_penalty: f64,
    /// Added per sub-goal and once more on a successful `Done` (default: 5.0).
    pub goal_success_reward: f64,
}

/// Locations of the two object-name lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub int_objects: PathBuf,
    pub rec_objects: PathBuf,
}

/// Caller-side episode limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Step budget per episode (default: 30).
    pub max_episode_length: usize,
    /// Count budget exhaustion as a terminal failure (default: false).
    pub strict_done: bool,
    /// Pause between replayed actions in milliseconds (default: 200).
    pub replay_delay_ms: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            reward: RewardConfig::default(),
            catalog: CatalogConfig::default(),
            run: RunConfig::default(),
            actions: BASIC_ACTIONS.to_vec(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            grid_size: 0.25,
            fov: 100.0,
            randomize_objects: false,
            seed: 1,
            rank: 0,
            gpu_id: None,
            bridge_url: "http://localhost:3100".into(),
            executable_path: None,
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            step_penalty: -0.01,
            goal_success_reward: 5.0,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            int_objects: "./datasets/objects/int_objects.txt".into(),
            rec_objects: "./datasets/objects/rec_objects.txt".into(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_episode_length: 30,
            strict_done: false,
            replay_delay_ms: 200,
        }
    }
}

impl EpisodeConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }
}
