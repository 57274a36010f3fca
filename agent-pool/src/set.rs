//! Unordered set with arbitrary-member extraction.

use std::borrow::Borrow;

use crate::error::{PoolError, Result};

/// A set supporting membership updates and removal of an arbitrary member.
///
/// Callers must not depend on which member [`pop`](Self::pop) returns.
/// Pools hold at most a few dozen agents, so members live in a vector and
/// lookups are linear.
#[derive(Debug, Clone)]
pub struct ExtractableSet<T> {
    members: Vec<T>,
}

impl<T: PartialEq> ExtractableSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Insert `value`. Returns `false` if an equal member was already present,
    /// in which case the set is unchanged.
    pub fn add(&mut self, value: T) -> bool {
        if self.members.contains(&value) {
            return false;
        }
        self.members.push(value);
        true
    }

    /// Remove and return the member equal to `value`, if present.
    pub fn delete<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        let index = self.members.iter().position(|m| Borrow::<Q>::borrow(m) == value)?;
        Some(self.members.swap_remove(index))
    }

    /// Whether a member equal to `value` is present.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.members.iter().any(|m| Borrow::<Q>::borrow(m) == value)
    }

    /// Remove and return an arbitrary member.
    pub fn pop(&mut self) -> Result<T> {
        self.members.pop().ok_or(PoolError::EmptyCollection)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: PartialEq> Default for ExtractableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
