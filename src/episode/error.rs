use thiserror::Error;

/// Errors surfaced by the episode controller.
///
/// Environment-reported failures (blocked movement, failed pickup or cook) are
/// not errors; they show up as `action_was_successful = false`.
#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error("action index {index} out of range for {len} actions")]
    ActionIndexOutOfRange { index: usize, len: usize },

    #[error("no active episode; call new_episode first")]
    NotStarted,

    #[error("episode already terminated; call new_episode to start another")]
    EpisodeTerminated,

    #[error("environment error: {0:#}")]
    Environment(#[from] anyhow::Error),
}
