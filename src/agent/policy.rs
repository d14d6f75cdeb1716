//! Action-selection policies.
//!
//! An [`AgentPolicy`] sees the controller's [`AgentState`] and returns an index
//! into the controller's action set.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::episode::{Action, ActionSet, AgentState};

/// The subset of agent capabilities the episode runner relies on.
#[allow(async_fn_in_trait)]
pub trait AgentPolicy {
    /// Choose an action index in `0..num_actions` for the current state.
    async fn select_action(&mut self, state: &AgentState<'_>, num_actions: usize)
        -> Result<usize>;

    /// Forget any per-episode state. Called before every episode.
    fn reset(&mut self) {}
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

/// Plays a fixed list of action indices, then keeps returning `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedAgent {
    script: Vec<usize>,
    fallback: usize,
    cursor: usize,
}

impl ScriptedAgent {
    pub fn new(script: Vec<usize>, fallback: usize) -> Self {
        Self {
            script,
            fallback,
            cursor: 0,
        }
    }

    /// Build a script from action kinds. Falls back to `Done` once the script
    /// runs out.
    pub fn from_actions(actions: &ActionSet, script: &[Action]) -> Result<Self> {
        let Some(done) = actions.index_of(Action::Done) else {
            bail!("action set has no Done action to fall back on");
        };
        let indices = script
            .iter()
            .map(|a| match actions.index_of(*a) {
                Some(i) => Ok(i),
                None => bail!("action {a} is not in the action set"),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(indices, done))
    }
}

impl AgentPolicy for ScriptedAgent {
    async fn select_action(
        &mut self,
        _state: &AgentState<'_>,
        _num_actions: usize,
    ) -> Result<usize> {
        let index = self.script.get(self.cursor).copied().unwrap_or(self.fallback);
        self.cursor += 1;
        Ok(index)
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

// ---------------------------------------------------------------------------
// Random
// ---------------------------------------------------------------------------

/// Picks uniformly among all actions. Seeded, so runs are reproducible.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl AgentPolicy for RandomAgent {
    async fn select_action(
        &mut self,
        _state: &AgentState<'_>,
        num_actions: usize,
    ) -> Result<usize> {
        if num_actions == 0 {
            bail!("cannot select from an empty action set");
        }
        Ok(self.rng.gen_range(0..num_actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::Slots;

    fn empty_state(tried: &Slots<bool>) -> AgentState<'_> {
        AgentState {
            event: None,
            tried_find: tried,
        }
    }

    #[tokio::test]
    async fn scripted_agent_falls_back_to_done() {
        let actions = ActionSet::default();
        let mut agent =
            ScriptedAgent::from_actions(&actions, &[Action::LookTomato, Action::RotateLeft])
                .unwrap();
        let tried = Slots::default();
        let state = empty_state(&tried);

        let mut picked = Vec::new();
        for _ in 0..4 {
            picked.push(agent.select_action(&state, actions.len()).await.unwrap());
        }
        assert_eq!(picked, vec![5, 1, 7, 7]);

        agent.reset();
        assert_eq!(agent.select_action(&state, actions.len()).await.unwrap(), 5);
    }

    #[test]
    fn scripted_agent_rejects_unknown_actions() {
        let actions = ActionSet::new(vec![Action::MoveAhead, Action::Done]);
        assert!(ScriptedAgent::from_actions(&actions, &[Action::LookTomato]).is_err());

        let no_done = ActionSet::new(vec![Action::MoveAhead]);
        assert!(ScriptedAgent::from_actions(&no_done, &[]).is_err());
    }

    #[tokio::test]
    async fn random_agent_is_seeded_and_in_range() {
        let tried = Slots::default();
        let state = empty_state(&tried);
        let mut a = RandomAgent::new(42);
        let mut b = RandomAgent::new(42);

        for _ in 0..50 {
            let x = a.select_action(&state, 8).await.unwrap();
            let y = b.select_action(&state, 8).await.unwrap();
            assert_eq!(x, y);
            assert!(x < 8);
        }
        assert!(a.select_action(&state, 0).await.is_err());
    }
}
