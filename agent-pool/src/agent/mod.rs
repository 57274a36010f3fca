//! Capability contracts for pooled agents and the factories that build them.

pub mod types;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use uuid::Uuid;

use crate::error::BoxError;
pub use types::{Headers, Transfer, TransferRequest, TransferStats};

/// Identity assigned to every agent the pool constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(Uuid);

impl AgentId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A reusable resource able to perform one request at a time.
///
/// The pool guarantees exclusive access: while an agent is checked out no
/// other caller can reach it, so `request` takes `&mut self`.
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    /// Error returned by a failed request. Any failure evicts the agent.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Perform one request and produce its transfer.
    async fn request(&mut self, request: TransferRequest) -> Result<Transfer, Self::Error>;

    /// Protocol negotiated by the underlying connection, if known.
    fn alpn_protocol(&self) -> Option<&str> {
        None
    }
}

/// Asynchronous constructor for pooled resources.
///
/// Any `Fn() -> impl Future<Output = Result<T, E>>` closure is a factory.
#[async_trait]
pub trait AgentFactory<T>: Send + Sync + 'static {
    /// Build a new resource.
    async fn create(&self) -> Result<T, BoxError>;

    /// Accept or reject a freshly built resource. Rejected resources are
    /// dropped and `acquire` fails with [`PoolError::InvalidAgent`].
    ///
    /// [`PoolError::InvalidAgent`]: crate::PoolError::InvalidAgent
    fn validate(&self, _resource: &T) -> bool {
        true
    }
}

#[async_trait]
impl<T, F, Fut, E> AgentFactory<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    E: Into<BoxError> + Send,
{
    async fn create(&self) -> Result<T, BoxError> {
        (self)().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_ids_are_unique() {
        let a = AgentId::new();
        let b = AgentId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }

    #[tokio::test]
    async fn test_closure_factory() {
        let factory = || async { Ok::<_, std::io::Error>(7u32) };
        assert_eq!(factory.create().await.unwrap(), 7);
        assert!(factory.validate(&7));
    }

    #[tokio::test]
    async fn test_closure_factory_error_is_boxed() {
        let factory = || async { Err::<u32, _>("no route to host".to_string()) };
        let err = factory.create().await.unwrap_err();
        assert_eq!(err.to_string(), "no route to host");
    }
}
