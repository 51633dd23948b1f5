//! State Registry
//!
//! The shared state-id namespace. Every non-zero state id is owned by at most
//! one actor; `0` cannot be claimed because [`StateId`] cannot represent it.
//! Independently written actors only cooperate correctly if their ids are
//! disjoint, so the registry refuses an overlapping claim instead of letting
//! two actors race for the same hop.

use crate::{ActorError, Result};
use linkchain_codec::StateId;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Unique actor identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    /// Create new actor ID
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Create from UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self { id }
    }

    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership map from state id to actor
#[derive(Debug, Default)]
pub struct StateRegistry {
    owners: RwLock<HashMap<StateId, ActorId>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim every id in `states` for `actor`, or none of them
    ///
    /// Re-claiming an id the actor already owns is a no-op.
    pub fn claim(&self, actor: &ActorId, states: &[StateId]) -> Result<()> {
        let mut owners = self.owners.write();

        let mut seen = HashSet::with_capacity(states.len());
        for state in states {
            if !seen.insert(*state) {
                return Err(ActorError::configuration(
                    format!("State {} listed twice by {}", state, actor),
                    Some("states"),
                ));
            }
            if let Some(owner) = owners.get(state) {
                if owner != actor {
                    return Err(ActorError::DuplicateState {
                        state: *state,
                        owner: owner.clone(),
                    });
                }
            }
        }

        for state in states {
            owners.insert(*state, actor.clone());
        }
        debug!(actor = %actor, states = ?states, "Claimed states");
        Ok(())
    }

    /// Release every id owned by `actor`, returning them in ascending order
    pub fn release(&self, actor: &ActorId) -> Vec<StateId> {
        let mut owners = self.owners.write();
        let mut released: Vec<StateId> = owners
            .iter()
            .filter(|(_, owner)| *owner == actor)
            .map(|(state, _)| *state)
            .collect();
        for state in &released {
            owners.remove(state);
        }
        released.sort();
        if !released.is_empty() {
            debug!(actor = %actor, states = ?released, "Released states");
        }
        released
    }

    /// Owner of `state`, if any
    pub fn owner(&self, state: StateId) -> Option<ActorId> {
        self.owners.read().get(&state).cloned()
    }

    /// Ids owned by `actor`, ascending
    pub fn states_of(&self, actor: &ActorId) -> Vec<StateId> {
        let mut states: Vec<StateId> = self
            .owners
            .read()
            .iter()
            .filter(|(_, owner)| *owner == actor)
            .map(|(state, _)| *state)
            .collect();
        states.sort();
        states
    }

    /// Ordered copy of the whole namespace
    pub fn snapshot(&self) -> BTreeMap<StateId, ActorId> {
        self.owners
            .read()
            .iter()
            .map(|(state, owner)| (*state, owner.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.owners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.read().is_empty()
    }
}
