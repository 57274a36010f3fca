//! Bounded pool of lazily constructed agents.

mod pooled;
mod waiter;

pub use pooled::Pooled;

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::agent::{AgentFactory, AgentId};
use crate::config::{AcquireOrder, PoolConfig};
use crate::error::{PoolError, Result};
use crate::set::ExtractableSet;
use pooled::Slot;
use waiter::WaitQueue;

/// Pool membership, guarded by the pool mutex. The mutex is never held
/// across an `.await`.
struct PoolState<T> {
    /// Every live agent, idle or checked out.
    total: HashSet<AgentId>,
    /// Agents ready to be handed out. Always a subset of `total`.
    idle: ExtractableSet<Slot<T>>,
    /// Factory calls in flight; each holds one unit of capacity.
    constructing: usize,
    waiters: WaitQueue,
}

impl<T> PoolState<T> {
    fn new() -> Self {
        Self {
            total: HashSet::new(),
            idle: ExtractableSet::new(),
            constructing: 0,
            waiters: WaitQueue::default(),
        }
    }
}

pub(crate) struct Shared<T: Send + 'static> {
    config: PoolConfig,
    factory: Box<dyn AgentFactory<T>>,
    state: Mutex<PoolState<T>>,
}

/// What `acquire` does next, decided under the lock.
enum Step<T: Send + 'static> {
    Reuse(Slot<T>),
    Construct(Reservation<T>),
    Wait(Waiter<T>),
}

impl<T: Send + 'static> Shared<T> {
    /// `resumed` is set when the caller was woken from the queue.
    fn next_step(self: &Arc<Self>, resumed: bool) -> Result<Step<T>> {
        let mut state = self.state.lock();
        if resumed {
            state.waiters.resume();
        }

        let below_capacity = state.total.len() + state.constructing < self.config.capacity;
        let construct_first = self.config.acquire_order == AcquireOrder::ConstructFirst;
        if below_capacity && (construct_first || state.idle.is_empty()) {
            state.constructing += 1;
            return Ok(Step::Construct(Reservation {
                shared: self.clone(),
                armed: true,
            }));
        }

        if !state.idle.is_empty() {
            return state.idle.pop().map(Step::Reuse);
        }

        // Woken waiters still hold their slot, so a resumed caller only
        // takes back the place it already had.
        let pending = state.waiters.pending();
        if !resumed && self.config.max_waiters.is_some_and(|max| pending >= max) {
            return Err(PoolError::ReentrantWait { pending });
        }

        let (key, rx) = state.waiters.register(resumed);
        debug!("No agent available, waiting ({} pending)", pending + 1);
        Ok(Step::Wait(Waiter {
            shared: self.clone(),
            key,
            rx,
            done: false,
        }))
    }

    /// Put an agent back into the idle set and wake a waiter.
    fn restore(&self, slot: Slot<T>) {
        let rejected = {
            let mut state = self.state.lock();
            let rejected = if state.total.contains(&slot.id) {
                debug!("Agent {} returned to idle", slot.id);
                state.idle.add(slot);
                None
            } else {
                debug!("Ignoring release of unknown agent {}", slot.id);
                Some(slot)
            };
            state.waiters.wake_one();
            rejected
        };
        drop(rejected);
    }

    /// Remove an agent from the pool and wake a waiter. Returns the idle copy,
    /// if the agent was idle, so the caller can drop it outside the lock.
    fn evict(&self, id: AgentId) -> Option<Slot<T>> {
        let mut state = self.state.lock();
        let stale = state.idle.delete(&id);
        if state.total.remove(&id) {
            debug!("Agent {} evicted ({} remaining)", id, state.total.len());
        }
        state.waiters.wake_one();
        stale
    }
}

/// One unit of capacity held for an in-flight construction. Dropping it
/// unfulfilled gives the capacity back and wakes a waiter.
struct Reservation<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    armed: bool,
}

impl<T: Send + 'static> Reservation<T> {
    /// Register a freshly built agent, then hand out an idle one.
    fn fulfil(mut self, agent: T) -> Result<Slot<T>> {
        let id = AgentId::new();
        let mut state = self.shared.state.lock();
        self.armed = false;
        state.constructing -= 1;
        state.total.insert(id);
        state.idle.add(Slot { id, agent });
        debug!(
            "Constructed agent {} ({}/{})",
            id,
            state.total.len(),
            self.shared.config.capacity
        );
        state.idle.pop()
    }
}

impl<T: Send + 'static> Drop for Reservation<T> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.shared.state.lock();
            state.constructing -= 1;
            state.waiters.wake_one();
        }
    }
}

/// A queued `acquire`. Dropping it before it is woken removes it from the
/// queue; dropping it after it was woken passes the wake-up on.
struct Waiter<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    key: u64,
    rx: oneshot::Receiver<()>,
    done: bool,
}

impl<T: Send + 'static> Waiter<T> {
    /// Returns whether the waiter was signalled. Either way the caller
    /// tries again.
    async fn wait(mut self) -> bool {
        let woken = (&mut self.rx).await.is_ok();
        self.done = true;
        woken
    }
}

impl<T: Send + 'static> Drop for Waiter<T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = self.shared.state.lock();
        if !state.waiters.remove(self.key) {
            debug!("Abandoned waiter was already woken, forwarding");
            state.waiters.resume();
            state.waiters.wake_one();
        }
    }
}

/// A bounded pool of agents of type `T`.
///
/// Agents are constructed on demand by the pool's factory, up to
/// `capacity`. Each agent is handed to one caller at a time; callers that
/// find the pool exhausted wait in FIFO order until an agent is released
/// or evicted.
///
/// Cloning the pool clones a handle to the same state.
pub struct ResourcePool<T: Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> ResourcePool<T> {
    /// Create a pool that builds agents with `factory`.
    ///
    /// No agent is constructed until the first `acquire`.
    pub fn new(factory: impl AgentFactory<T>, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        info!("Creating agent pool with capacity={}", config.capacity);

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                factory: Box::new(factory),
                state: Mutex::new(PoolState::new()),
            }),
        })
    }

    /// Acquire an agent for exclusive use.
    ///
    /// Constructs a new agent while the pool is below capacity, otherwise
    /// reuses an idle one, otherwise waits for a release. The order of the
    /// first two follows [`PoolConfig::acquire_order`].
    ///
    /// # Errors
    /// - [`PoolError::Construction`] / [`PoolError::InvalidAgent`] if the
    ///   factory fails; the pool is left unchanged.
    /// - [`PoolError::ReentrantWait`] if waiting is needed and
    ///   `max_waiters` callers are already waiting.
    /// - [`PoolError::Timeout`] if `acquire_timeout` elapses first.
    ///
    /// Dropping the returned future gives up any queue position or capacity
    /// it was holding.
    pub async fn acquire(&self) -> Result<Pooled<T>> {
        match self.shared.config.acquire_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.acquire_inner()).await {
                Ok(result) => result,
                Err(_) => Err(PoolError::Timeout(limit)),
            },
            None => self.acquire_inner().await,
        }
    }

    async fn acquire_inner(&self) -> Result<Pooled<T>> {
        let mut resumed = false;
        loop {
            match self.shared.next_step(resumed)? {
                Step::Reuse(slot) => {
                    debug!("Reusing idle agent {}", slot.id);
                    return Ok(Pooled::new(slot, &self.shared));
                }
                Step::Construct(reservation) => return self.construct(reservation).await,
                Step::Wait(waiter) => resumed = waiter.wait().await,
            }
        }
    }

    async fn construct(&self, reservation: Reservation<T>) -> Result<Pooled<T>> {
        let agent = self
            .shared
            .factory
            .create()
            .await
            .map_err(PoolError::Construction)?;

        if !self.shared.factory.validate(&agent) {
            return Err(PoolError::InvalidAgent);
        }

        let slot = reservation.fulfil(agent)?;
        Ok(Pooled::new(slot, &self.shared))
    }

    /// Return an agent to the idle set and wake one waiter.
    ///
    /// An agent checked out of a different pool is not adopted and is handed
    /// back untouched, still checked out of the pool it came from.
    pub fn release_idle(&self, agent: Pooled<T>) -> Option<Pooled<T>> {
        if !agent.belongs_to(&self.shared) {
            debug!("Agent {} belongs to another pool", agent.id());
            return Some(agent);
        }
        agent.return_home(true);
        None
    }

    /// Permanently remove an agent from the pool and wake one waiter.
    ///
    /// The freed capacity lets a later `acquire` construct a replacement.
    /// Agents from a different pool are handed back as in
    /// [`release_idle`](Self::release_idle).
    pub fn release_removed(&self, agent: Pooled<T>) -> Option<Pooled<T>> {
        if !agent.belongs_to(&self.shared) {
            debug!("Agent {} belongs to another pool", agent.id());
            return Some(agent);
        }
        agent.return_home(false);
        None
    }

    /// Wake the oldest waiting `acquire`, if any.
    ///
    /// The woken caller re-checks the pool and may go back to waiting.
    pub fn wake(&self) {
        let mut state = self.shared.state.lock();
        if state.waiters.wake_one() {
            debug!("Woke a waiting acquire");
        }
    }

    /// Maximum number of live agents.
    pub fn capacity(&self) -> usize {
        self.shared.config.capacity
    }

    /// Number of live agents, idle or checked out.
    pub fn total_count(&self) -> usize {
        self.shared.state.lock().total.len()
    }

    /// Number of agents ready to be acquired.
    pub fn idle_count(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    /// Number of `acquire` calls currently waiting, counting woken ones
    /// that have not resumed yet.
    pub fn waiter_count(&self) -> usize {
        self.shared.state.lock().waiters.pending()
    }

    /// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();

        PoolStats {
            total_count: state.total.len(),
            idle_count: state.idle.len(),
            active_count: state.total.len() - state.idle.len(),
            waiting_count: state.waiters.pending(),
        }
    }
}

impl<T: Send + 'static> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub total_count: usize,
    pub idle_count: usize,
    pub active_count: usize,
    pub waiting_count: usize,
}
