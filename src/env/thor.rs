//! AI2-THOR kitchen simulator reached through an HTTP bridge.
//!
//! The bridge wraps a local THOR build and exposes one endpoint per call:
//! - `POST {base_url}/start`  -- body: scene, gpu id and launch settings
//! - `POST {base_url}/reset`  -- body: `{"scene": ..., "change_seed": bool}`
//! - `POST {base_url}/step`   -- body: `{"action": "<action name>"}`
//! - `POST {base_url}/pickup` -- body: `{"objectId": ...}`
//! - `POST {base_url}/cook`   -- body: `{"microwaveId": ..., "tomatoId": ...}`
//!
//! `start`, `reset` and `step` return an [`Event`]; `pickup` and `cook` return
//! [`InteractionResponse`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::traits::{Environment, Event, Simulator};
use crate::config::SimulatorConfig;
use crate::episode::Action;

// ---------------------------------------------------------------------------
// Launcher
// ---------------------------------------------------------------------------

/// Launches THOR sessions through the bridge server.
#[derive(Debug, Clone)]
pub struct ThorSimulator {
    base_url: String,
    http: reqwest::Client,
    settings: LaunchSettings,
}

/// Launch settings forwarded verbatim to `/start`.
#[derive(Debug, Clone, Serialize)]
struct LaunchSettings {
    grid_size: f64,
    fov: f64,
    randomize_objects: bool,
    seed: u64,
    executable_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    scene: &'a str,
    gpu_id: Option<usize>,
    #[serde(flatten)]
    settings: &'a LaunchSettings,
}

/// The JSON shape returned by `/pickup` and `/cook`.
#[derive(Debug, Deserialize)]
struct InteractionResponse {
    success: bool,
    #[serde(default)]
    event: Option<Event>,
}

impl ThorSimulator {
    /// Create a launcher pointing at the bridge configured in `config`.
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            base_url: config.bridge_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            settings: LaunchSettings {
                grid_size: config.grid_size,
                fov: config.fov,
                randomize_objects: config.randomize_objects,
                seed: config.worker_seed(),
                executable_path: config.executable_path.clone(),
            },
        }
    }
}

impl Simulator for ThorSimulator {
    type Session = ThorEnv;

    async fn start(&self, scene: &str, gpu_id: Option<usize>) -> Result<ThorEnv> {
        let body = StartRequest {
            scene,
            gpu_id,
            settings: &self.settings,
        };
        let event: Event = self
            .http
            .post(format!("{}/start", self.base_url))
            .json(&body)
            .send()
            .await
            .context("failed to reach THOR bridge on start")?
            .error_for_status()
            .context("THOR bridge rejected start")?
            .json()
            .await
            .context("failed to parse THOR start response")?;

        tracing::info!(scene, ?gpu_id, base_url = %self.base_url, "THOR session started");

        Ok(ThorEnv {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            last_event: Some(event),
        })
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A live THOR session.
#[derive(Debug)]
pub struct ThorEnv {
    base_url: String,
    http: reqwest::Client,
    last_event: Option<Event>,
}

impl ThorEnv {
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.http
            .post(format!("{}/{endpoint}", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to reach THOR bridge on {endpoint}"))?
            .error_for_status()
            .with_context(|| format!("THOR bridge rejected {endpoint}"))?
            .json()
            .await
            .with_context(|| format!("failed to parse THOR {endpoint} response"))
    }

    fn record_interaction(&mut self, resp: InteractionResponse) -> bool {
        match resp.event {
            Some(event) => self.last_event = Some(event),
            None => {
                if let Some(event) = self.last_event.as_mut() {
                    event.last_action_success = resp.success;
                }
            }
        }
        resp.success
    }
}

impl Environment for ThorEnv {
    async fn reset(&mut self, scene: &str, change_seed: bool) -> Result<()> {
        let event: Event = self
            .post(
                "reset",
                serde_json::json!({ "scene": scene, "change_seed": change_seed }),
            )
            .await?;
        tracing::debug!(scene, change_seed, "THOR session reset");
        self.last_event = Some(event);
        Ok(())
    }

    async fn step(&mut self, action: Action) -> Result<Event> {
        let event: Event = self
            .post("step", serde_json::json!({ "action": action.as_str() }))
            .await?;
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
        let resp: InteractionResponse = self
            .post("pickup", serde_json::json!({ "objectId": object_id }))
            .await?;
        Ok(self.record_interaction(resp))
    }

    async fn cook(&mut self, microwave_id: &str, tomato_id: Option<&str>) -> Result<bool> {
        let Some(tomato_id) = tomato_id else {
            // The bridge has no way to express "no tomato"; reject locally.
            if let Some(event) = self.last_event.as_mut() {
                event.last_action_success = false;
            }
            return Ok(false);
        };
        let resp: InteractionResponse = self
            .post(
                "cook",
                serde_json::json!({ "microwaveId": microwave_id, "tomatoId": tomato_id }),
            )
            .await?;
        Ok(self.record_interaction(resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ThorEnv {
        ThorEnv {
            base_url: "http://127.0.0.1:1".into(),
            http: reqwest::Client::new(),
            last_event: Some(Event {
                last_action_success: true,
                ..Event::default()
            }),
        }
    }

    #[test]
    fn start_request_flattens_settings() {
        let sim = ThorSimulator::new(&SimulatorConfig {
            seed: 4,
            rank: 2,
            ..SimulatorConfig::default()
        });
        let body = serde_json::to_value(StartRequest {
            scene: "FloorPlan1",
            gpu_id: Some(0),
            settings: &sim.settings,
        })
        .unwrap();

        assert_eq!(body["scene"], "FloorPlan1");
        assert_eq!(body["gpu_id"], 0);
        assert_eq!(body["seed"], 6);
        assert_eq!(body["grid_size"], 0.25);
    }

    #[tokio::test]
    async fn cook_without_tomato_is_rejected_locally() {
        let mut env = session();
        let cooked = env.cook("Microwave|1", None).await.unwrap();
        assert!(!cooked);
        assert!(!env.last_action_success());
    }

    #[tokio::test]
    async fn unreachable_bridge_is_an_error() {
        let mut env = session();
        let err = env.step(Action::MoveAhead).await.unwrap_err();
        assert!(err.to_string().contains("failed to reach THOR bridge on step"));
    }

    #[test]
    fn interaction_without_event_updates_success_flag() {
        let mut env = session();
        let ok = env.record_interaction(InteractionResponse {
            success: false,
            event: None,
        });
        assert!(!ok);
        assert!(!env.last_action_success());
    }
}
