//! Request client over a pool of agents.

use tracing::debug;

use crate::agent::{Agent, AgentFactory, Transfer, TransferRequest};
use crate::config::PoolConfig;
use crate::error::{ClientError, Result};
use crate::pool::{Pooled, ResourcePool};

/// Client that runs requests on pooled agents.
///
/// A successful request returns its agent to the pool for reuse. A failed
/// request evicts the agent, so the next `acquire` may build a fresh one.
///
/// # Example
///
/// ```rust,no_run
/// use agent_pool::{PoolClient, PoolConfig, TransferRequest};
/// # use agent_pool::{Agent, Transfer};
/// # struct Http2Agent;
/// # #[async_trait::async_trait]
/// # impl Agent for Http2Agent {
/// #     type Error = std::io::Error;
/// #     async fn request(&mut self, _: TransferRequest) -> Result<Transfer, Self::Error> {
/// #         Ok(Transfer::new(200, "ok"))
/// #     }
/// # }
/// # async fn connect() -> Result<Http2Agent, std::io::Error> { Ok(Http2Agent) }
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PoolClient::new(connect, PoolConfig::new().with_capacity(4))?;
///
/// let request = TransferRequest::new(Duration::from_secs(2), Duration::from_secs(10))
///     .with_header(":path", "/index.html");
/// let transfer = client.request(request).await?;
/// println!("status {}", transfer.stats.status);
/// # Ok(())
/// # }
/// ```
pub struct PoolClient<A: Agent> {
    pool: ResourcePool<A>,
}

impl<A: Agent> PoolClient<A> {
    /// Create a client over a new pool built with `factory`.
    pub fn new(factory: impl AgentFactory<A>, config: PoolConfig) -> Result<Self> {
        Ok(Self::from_pool(ResourcePool::new(factory, config)?))
    }

    /// Create a client over an existing pool.
    pub fn from_pool(pool: ResourcePool<A>) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &ResourcePool<A> {
        &self.pool
    }

    /// Acquire an agent, e.g. to hold it across several steps before
    /// calling [`perform`](Self::perform).
    pub async fn next_agent(&self) -> Result<Pooled<A>> {
        self.pool.acquire().await
    }

    /// Run `request` on `agent`.
    ///
    /// On success the agent goes back to the idle set; on failure it is
    /// evicted and the agent's error is returned unchanged. Either way, a
    /// waiting `acquire` is woken before this returns. An agent from another
    /// pool is returned to that pool instead.
    pub async fn perform(
        &self,
        mut agent: Pooled<A>,
        request: TransferRequest,
    ) -> std::result::Result<Transfer, A::Error> {
        match agent.request(request).await {
            Ok(transfer) => {
                if let Some(foreign) = self.pool.release_idle(agent) {
                    foreign.return_home(true);
                }
                Ok(transfer)
            }
            Err(e) => {
                debug!("Request on agent {} failed: {}", agent.id(), e);
                if let Some(foreign) = self.pool.release_removed(agent) {
                    foreign.return_home(false);
                }
                Err(e)
            }
        }
    }

    /// Acquire an agent and run `request` on it.
    pub async fn request(
        &self,
        request: TransferRequest,
    ) -> std::result::Result<Transfer, ClientError<A::Error>> {
        let agent = self.next_agent().await?;
        self.perform(agent, request)
            .await
            .map_err(ClientError::Agent)
    }

    /// Return an agent obtained from [`next_agent`](Self::next_agent) unused.
    ///
    /// See [`ResourcePool::release_idle`] for agents from another pool.
    pub fn release(&self, agent: Pooled<A>) -> Option<Pooled<A>> {
        self.pool.release_idle(agent)
    }

    /// Evict an agent obtained from [`next_agent`](Self::next_agent).
    pub fn remove(&self, agent: Pooled<A>) -> Option<Pooled<A>> {
        self.pool.release_removed(agent)
    }
}

impl<A: Agent> Clone for PoolClient<A> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<A: Agent> std::fmt::Debug for PoolClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolClient").field("pool", &self.pool).finish()
    }
}
