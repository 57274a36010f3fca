//! Error types for the agent pool.

use std::time::Duration;

/// Boxed error produced by agent factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`ResourcePool`](crate::ResourcePool) operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool configuration was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The agent factory failed to produce an agent.
    #[error("Agent construction failed: {0}")]
    Construction(#[source] BoxError),

    /// The agent factory produced an agent that failed validation.
    #[error("Agent construction produced an invalid agent")]
    InvalidAgent,

    /// An arbitrary member was requested from an empty set.
    #[error("Cannot extract a member from an empty set")]
    EmptyCollection,

    /// The caller needed to wait but the waiter queue is full.
    ///
    /// With `max_waiters = Some(1)` this means a second caller arrived while
    /// an earlier `acquire` was still suspended.
    #[error("Cannot wait for an agent: {pending} waiter(s) already pending")]
    ReentrantWait {
        /// Number of waiters queued when the call was rejected.
        pending: usize,
    },

    /// No agent became available within the configured acquire timeout.
    #[error("Timed out after {0:?} waiting for an agent")]
    Timeout(Duration),
}

/// Errors raised by [`PoolClient::request`](crate::PoolClient::request).
#[derive(Debug, thiserror::Error)]
pub enum ClientError<E>
where
    E: std::error::Error + 'static,
{
    /// No agent could be acquired.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The agent itself failed; it has been evicted from the pool.
    #[error("Agent request failed: {0}")]
    Agent(#[source] E),
}

impl<E> ClientError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the agent's own error, if this failure came from the agent.
    pub fn into_agent_error(self) -> Option<E> {
        match self {
            ClientError::Agent(e) => Some(e),
            ClientError::Pool(_) => None,
        }
    }
}

/// Result type for pool operations.
pub type Result<T, E = PoolError> = std::result::Result<T, E>;
