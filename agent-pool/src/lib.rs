//! Agent Pool - bounded pooling of asynchronously constructed agents
//!
//! This crate hands out reusable "agents" (typically network transports) to
//! concurrent callers, one caller per agent at a time. Agents are built on
//! demand by an asynchronous factory up to a fixed capacity, reused while
//! they keep succeeding, and evicted as soon as a request on them fails.
//!
//! # Features
//!
//! - **Lazy**: no agent is constructed before it is needed
//! - **Bounded**: live agents never exceed the configured capacity
//! - **Fair waiting**: callers that find the pool exhausted are woken in FIFO order
//! - **Cancellable**: dropping an `acquire` future frees its place in the queue
//!
//! # Example
//!
//! ```rust
//! use agent_pool::{PoolConfig, ResourcePool};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), agent_pool::PoolError> {
//! let factory = || async { Ok::<_, std::io::Error>(String::from("connection")) };
//! let pool = ResourcePool::new(factory, PoolConfig::new().with_capacity(2))?;
//!
//! let agent = pool.acquire().await?;
//! assert_eq!(agent.as_str(), "connection");
//! pool.release_idle(agent);
//!
//! assert_eq!(pool.total_count(), 1);
//! assert_eq!(pool.idle_count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`pool`] - The pool itself and checked-out handles
//! - [`client`] - Request client that recycles or evicts agents
//! - [`agent`] - Agent and factory contracts, request/transfer types
//! - [`config`] - Pool configuration
//! - [`set`] - Unordered set with arbitrary extraction

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod pool;
pub mod set;

pub use agent::{Agent, AgentFactory, AgentId, Headers, Transfer, TransferRequest, TransferStats};
pub use client::PoolClient;
pub use config::{AcquireOrder, PoolConfig};
pub use error::{BoxError, ClientError, PoolError, Result};
pub use pool::{PoolStats, Pooled, ResourcePool};
pub use set::ExtractableSet;
