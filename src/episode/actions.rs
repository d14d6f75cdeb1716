//! The fixed, index-addressed set of discrete actions available to the agent.

use serde::{Deserialize, Serialize};

use super::error::EpisodeError;

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// Every discrete action the controller knows how to judge.
///
/// The wire names match the simulator's action strings, so an `Action`
/// serializes to exactly what the bridge expects in `{"action": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveAhead,
    RotateLeft,
    RotateRight,
    LookUp,
    LookDown,
    /// Try to locate and pick up a visible tomato.
    LookTomato,
    /// Try to locate a visible microwave and cook the held tomato in it.
    LookMicrowave,
    /// Declare the task finished.
    Done,
}

impl Action {
    /// The simulator's name for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveAhead => "MoveAhead",
            Self::RotateLeft => "RotateLeft",
            Self::RotateRight => "RotateRight",
            Self::LookUp => "LookUp",
            Self::LookDown => "LookDown",
            Self::LookTomato => "LookTomato",
            Self::LookMicrowave => "LookMicrowave",
            Self::Done => "Done",
        }
    }

    /// Parse from a string (case-insensitive, `_`/`-`/space separators ignored).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "moveahead" => Some(Self::MoveAhead),
            "rotateleft" => Some(Self::RotateLeft),
            "rotateright" => Some(Self::RotateRight),
            "lookup" => Some(Self::LookUp),
            "lookdown" => Some(Self::LookDown),
            "looktomato" => Some(Self::LookTomato),
            "lookmicrowave" => Some(Self::LookMicrowave),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The default action list, in index order.
pub const BASIC_ACTIONS: [Action; 8] = [
    Action::MoveAhead,
    Action::RotateLeft,
    Action::RotateRight,
    Action::LookUp,
    Action::LookDown,
    Action::LookTomato,
    Action::LookMicrowave,
    Action::Done,
];

// ---------------------------------------------------------------------------
// Action set
// ---------------------------------------------------------------------------

/// The action list an agent indexes into. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet {
    actions: Vec<Action>,
}

impl ActionSet {
    /// Build a set from an explicit list. An empty list falls back to
    /// [`BASIC_ACTIONS`].
    pub fn new(actions: Vec<Action>) -> Self {
        if actions.is_empty() {
            return Self::default();
        }
        Self { actions }
    }

    /// Resolve an agent-supplied index to its action.
    pub fn resolve(&self, index: usize) -> Result<Action, EpisodeError> {
        self.actions
            .get(index)
            .copied()
            .ok_or(EpisodeError::ActionIndexOutOfRange {
                index,
                len: self.actions.len(),
            })
    }

    /// Position of `action` in the set, if present.
    pub fn index_of(&self, action: Action) -> Option<usize> {
        self.actions.iter().position(|a| *a == action)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions
    }
}

impl Default for ActionSet {
    fn default() -> Self {
        Self {
            actions: BASIC_ACTIONS.to_vec(),
        }
    }
}
