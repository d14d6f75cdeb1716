//! Per-episode sub-goal bookkeeping.
//!
//! The task tracks exactly two object kinds, so every per-kind value lives in a
//! [`Slots`] with one named field per kind instead of an open map.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// The two object kinds whose sub-goals make up the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackedObject {
    Tomato,
    Microwave,
}

impl TrackedObject {
    pub const ALL: [TrackedObject; 2] = [TrackedObject::Tomato, TrackedObject::Microwave];

    /// The simulator's `objectType` for this kind.
    pub fn object_type(&self) -> &'static str {
        match self {
            Self::Tomato => "Tomato",
            Self::Microwave => "Microwave",
        }
    }
}

/// One value per tracked object kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots<T> {
    pub tomato: T,
    pub microwave: T,
}

impl<T> Slots<T> {
    pub fn all(&self, mut f: impl FnMut(&T) -> bool) -> bool {
        f(&self.tomato) && f(&self.microwave)
    }
}

impl<T> Index<TrackedObject> for Slots<T> {
    type Output = T;

    fn index(&self, kind: TrackedObject) -> &T {
        match kind {
            TrackedObject::Tomato => &self.tomato,
            TrackedObject::Microwave => &self.microwave,
        }
    }
}

impl<T> IndexMut<TrackedObject> for Slots<T> {
    fn index_mut(&mut self, kind: TrackedObject) -> &mut T {
        match kind {
            TrackedObject::Tomato => &mut self.tomato,
            TrackedObject::Microwave => &mut self.microwave,
        }
    }
}

/// Sub-goal progress for the current episode.
///
/// `cook_id[kind]` is `None` until the environment confirms the interaction
/// for that kind; the microwave id is never bound while the tomato id is
/// unbound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalState {
    /// Whether each sub-goal has been satisfied.
    pub target: Slots<bool>,
    /// Environment-assigned object id bound to each kind.
    pub cook_id: Slots<Option<String>>,
    /// Whether the agent has attempted to locate each kind.
    pub tried_find: Slots<bool>,
}

impl GoalState {
    /// Both sub-goals satisfied.
    pub fn is_complete(&self) -> bool {
        self.target.all(|done| *done)
    }

    /// Record a confirmed interaction for `kind`.
    pub(crate) fn satisfy(&mut self, kind: TrackedObject, object_id: &str) {
        self.cook_id[kind] = Some(object_id.to_string());
        self.tried_find[kind] = true;
        self.target[kind] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_has_nothing_bound() {
        let goal = GoalState::default();
        for kind in TrackedObject::ALL {
            assert!(!goal.target[kind]);
            assert!(!goal.tried_find[kind]);
            assert!(goal.cook_id[kind].is_none());
        }
        assert!(!goal.is_complete());
    }

    #[test]
    fn completion_requires_both_slots() {
        let mut goal = GoalState::default();
        goal.satisfy(TrackedObject::Tomato, "Tomato|1");
        assert!(!goal.is_complete());
        assert_eq!(goal.cook_id.tomato.as_deref(), Some("Tomato|1"));

        goal.satisfy(TrackedObject::Microwave, "Microwave|1");
        assert!(goal.is_complete());
    }
}
