//! Pool configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PoolError, Result};

/// Order in which `acquire` considers constructing versus reusing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquireOrder {
    /// Construct a new agent whenever the pool is below capacity, even if
    /// idle agents exist. The pool fills up to capacity before reusing.
    #[default]
    ConstructFirst,
    /// Reuse an idle agent when one exists; construct only when none is idle.
    IdleFirst,
}

/// Configuration for a [`ResourcePool`](crate::ResourcePool).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of live agents.
    pub capacity: usize,
    /// Maximum number of suspended `acquire` calls. `None` is unbounded.
    pub max_waiters: Option<usize>,
    pub acquire_order: AcquireOrder,
    /// Give up on `acquire` after this long.
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            max_waiters: None,
            acquire_order: AcquireOrder::default(),
            acquire_timeout: None,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of live agents.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Limit the number of callers that may wait at once.
    pub fn with_max_waiters(mut self, max_waiters: usize) -> Self {
        self.max_waiters = Some(max_waiters);
        self
    }

    pub fn with_acquire_order(mut self, order: AcquireOrder) -> Self {
        self.acquire_order = order;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Check that the configuration describes a usable pool.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.max_waiters == Some(0) {
            return Err(PoolError::InvalidConfig(
                "max_waiters must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}
