//! FIFO queue of suspended `acquire` calls.

use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Queue of waiters, each woken through its own oneshot channel.
///
/// Waking dequeues the waiter before signalling it, so a woken waiter that
/// finds nothing available must register again. Until it does, or gives up,
/// it is counted in `woken` and still occupies a waiter slot.
#[derive(Debug, Default)]
pub(crate) struct WaitQueue {
    next_key: u64,
    queue: VecDeque<(u64, oneshot::Sender<()>)>,
    woken: usize,
}

impl WaitQueue {
    /// Register a waiter, at the front when it is retrying after a wake-up.
    pub(crate) fn register(&mut self, front: bool) -> (u64, oneshot::Receiver<()>) {
        let key = self.next_key;
        self.next_key = self.next_key.wrapping_add(1);
        let (tx, rx) = oneshot::channel();
        if front {
            self.queue.push_front((key, tx));
        } else {
            self.queue.push_back((key, tx));
        }
        (key, rx)
    }

    /// Remove a still-queued waiter. Returns `false` if it was already woken.
    pub(crate) fn remove(&mut self, key: u64) -> bool {
        match self.queue.iter().position(|(k, _)| *k == key) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Wake the oldest waiter that is still listening.
    pub(crate) fn wake_one(&mut self) -> bool {
        while let Some((_, tx)) = self.queue.pop_front() {
            if tx.send(()).is_ok() {
                self.woken += 1;
                return true;
            }
        }
        false
    }

    /// A woken waiter has resumed or been abandoned.
    pub(crate) fn resume(&mut self) {
        self.woken = self.woken.saturating_sub(1);
    }

    /// Queued waiters plus woken ones that have not resumed yet.
    pub(crate) fn pending(&self) -> usize {
        self.queue.len() + self.woken
    }
}
