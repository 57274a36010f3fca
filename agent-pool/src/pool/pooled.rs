//! Checked-out agent handle.

use std::borrow::Borrow;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};
use tracing::debug;

use super::Shared;
use crate::agent::AgentId;

/// An agent together with its pool identity, as stored in the idle set.
pub(crate) struct Slot<T> {
    pub(crate) id: AgentId,
    pub(crate) agent: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Borrow<AgentId> for Slot<T> {
    fn borrow(&self) -> &AgentId {
        &self.id
    }
}

/// An agent checked out of a [`ResourcePool`](crate::ResourcePool).
///
/// The holder has exclusive use of the agent until it hands the handle back
/// through `release_idle` or `release_removed`. Dropping the handle without
/// releasing it evicts the agent, since its state can no longer be trusted.
pub struct Pooled<T: Send + 'static> {
    id: AgentId,
    agent: Option<T>,
    pool: Weak<Shared<T>>,
}

impl<T: Send + 'static> Pooled<T> {
    pub(crate) fn new(slot: Slot<T>, pool: &Arc<Shared<T>>) -> Self {
        Self {
            id: slot.id,
            agent: Some(slot.agent),
            pool: Arc::downgrade(pool),
        }
    }

    /// Identity of the agent within its pool.
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub(crate) fn belongs_to(&self, pool: &Arc<Shared<T>>) -> bool {
        std::ptr::eq(self.pool.as_ptr(), Arc::as_ptr(pool))
    }

    /// Take the agent out without triggering the drop-time eviction.
    pub(crate) fn into_slot(mut self) -> Option<Slot<T>> {
        let id = self.id;
        self.agent.take().map(|agent| Slot { id, agent })
    }

    /// Hand the agent back to the pool it was checked out of, either to the
    /// idle set or evicted.
    pub(crate) fn return_home(self, idle: bool) {
        let id = self.id;
        let pool = self.pool.upgrade();
        let slot = self.into_slot();
        match (pool, slot) {
            (Some(pool), Some(slot)) if idle => pool.restore(slot),
            (Some(pool), slot) => {
                let stale = pool.evict(id);
                drop(stale);
                drop(slot);
            }
            (None, _) => {}
        }
    }
}

impl<T: Send + 'static> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `into_slot` and `drop` take the agent, and both consume the handle.
        self.agent.as_ref().expect("pooled agent present until released")
    }
}

impl<T: Send + 'static> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.agent.as_mut().expect("pooled agent present until released")
    }
}

impl<T: Send + 'static> Drop for Pooled<T> {
    fn drop(&mut self) {
        let Some(agent) = self.agent.take() else {
            return;
        };
        if let Some(pool) = self.pool.upgrade() {
            debug!("Agent {} dropped without release, evicting", self.id);
            let stale = pool.evict(self.id);
            drop(stale);
        }
        drop(agent);
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("id", &self.id)
            .field("agent", &self.agent)
            .finish()
    }
}
