//! Shared mock agent for integration tests.
#![allow(dead_code)]

use agent_pool::{Agent, AgentFactory, BoxError, Transfer, TransferRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a test log subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_pool=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

#[derive(Debug, thiserror::Error)]
#[error("request rejected by agent {agent}")]
pub struct MockError {
    pub agent: usize,
}

/// Agent whose behaviour is driven by the request headers:
/// `:path` is `resolve` or `reject`, `delay-ms` is how long the request takes.
#[derive(Debug)]
pub struct MockAgent {
    pub number: usize,
    pub valid: bool,
}

#[async_trait]
impl Agent for MockAgent {
    type Error = MockError;

    async fn request(&mut self, request: TransferRequest) -> Result<Transfer, MockError> {
        let delay = request
            .header("delay-ms")
            .and_then(|ms| ms.parse().ok())
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        match request.header(":path") {
            Some("reject") => Err(MockError { agent: self.number }),
            _ => Ok(Transfer::new(200, format!("agent-{}", self.number))),
        }
    }

    fn alpn_protocol(&self) -> Option<&str> {
        Some("h2")
    }
}

/// Factory counting constructions, with optional delay and scripted failures.
#[derive(Debug, Clone, Default)]
pub struct MockFactory {
    pub created: Arc<AtomicUsize>,
    pub construct_delay: Duration,
    /// Number of upcoming constructions that fail outright.
    pub failures: Arc<AtomicUsize>,
    /// Number of upcoming constructions that produce an invalid agent.
    pub invalid: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.construct_delay = delay;
        self
    }

    pub fn failing(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn producing_invalid(self, count: usize) -> Self {
        self.invalid.store(count, Ordering::SeqCst);
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl AgentFactory<MockAgent> for MockFactory {
    async fn create(&self) -> Result<MockAgent, BoxError> {
        if !self.construct_delay.is_zero() {
            tokio::time::sleep(self.construct_delay).await;
        }
        if take_one(&self.failures) {
            return Err("connect ECONNREFUSED".into());
        }
        let number = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockAgent {
            number,
            valid: !take_one(&self.invalid),
        })
    }

    fn validate(&self, agent: &MockAgent) -> bool {
        agent.valid
    }
}

/// Build a request that resolves or rejects after `delay_ms`.
pub fn request(path: &str, delay_ms: u64) -> TransferRequest {
    TransferRequest::new(Duration::from_millis(200), Duration::from_millis(100))
        .with_header(":path", path)
        .with_header("delay-ms", delay_ms.to_string())
}
