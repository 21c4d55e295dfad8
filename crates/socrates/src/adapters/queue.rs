//! In-memory demo adapter for the [`QueueWrite`]/[`QueueRead`] ports.
//!
//! A production deployment would back these with Redis lists (`LPUSH`/
//! `BRPOP`), matching the Python original's `QueueConfig.redis_url`. The
//! hexagonal port is what pipeline crates depend on, so only this file
//! would change to go to a real broker.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use domain::{AlertEnvelope, QueueError, QueueRead, QueueWrite};

/// A single named FIFO queue with optional `maxlen` trimming.
///
/// `name` carries the Redis key a production deployment would use for this
/// queue (`QueueEndpoints` in `config.rs`); here it only labels log lines,
/// but keeps the key names meaningfully connected to the running adapter
/// rather than sitting unread in the config file.
#[derive(Debug)]
pub struct InMemoryQueue {
    name: String,
    inner: RefCell<VecDeque<AlertEnvelope>>,
    maxlen: Option<usize>,
    closed: RefCell<bool>,
}

impl InMemoryQueue {
    #[must_use]
    pub fn new(name: impl Into<String>, maxlen: Option<usize>) -> Self {
        Self { name: name.into(), inner: RefCell::new(VecDeque::new()), maxlen, closed: RefCell::new(false) }
    }

    /// Signal end-of-data. Idempotent.
    pub fn close(&self) {
        *self.closed.borrow_mut() = true;
        log::debug!("queue.closed: name={}", self.name);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }
}

impl QueueWrite for InMemoryQueue {
    /// Append `item`, trimming the oldest entries first if `maxlen` is set.
    ///
    /// The trim happens atomically with the push: no intermediate state is
    /// observable to a concurrent `pop` (§4.1).
    async fn push(&self, item: AlertEnvelope) -> Result<(), QueueError> {
        if *self.closed.borrow() {
            return Err(QueueError::Closed);
        }
        let mut inner = self.inner.borrow_mut();
        inner.push_back(item);
        if let Some(maxlen) = self.maxlen {
            while inner.len() > maxlen {
                inner.pop_front();
            }
        }
        Ok(())
    }
}

impl QueueRead for InMemoryQueue {
    /// Pop the oldest entry, polling up to `timeout` before returning
    /// `Ok(None)`.
    async fn pop(&self, timeout: Duration) -> Result<Option<AlertEnvelope>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut inner = self.inner.borrow_mut();
                if let Some(item) = inner.pop_front() {
                    return Ok(Some(item));
                }
            }
            if *self.closed.borrow() {
                return Err(QueueError::Closed);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(id: &str) -> AlertEnvelope {
        let mut map = serde_json::Map::new();
        map.insert("id".to_owned(), id.into());
        AlertEnvelope::new(map)
    }

    #[tokio::test]
    async fn push_then_pop_is_fifo() {
        let queue = InMemoryQueue::new("test", None);
        queue.push(envelope("a")).await.unwrap();
        queue.push(envelope("b")).await.unwrap();
        let first = queue.pop(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(first.get("id").unwrap(), "a");
    }

    #[tokio::test]
    async fn maxlen_trims_oldest_entries_atomically() {
        let queue = InMemoryQueue::new("test", Some(2));
        queue.push(envelope("a")).await.unwrap();
        queue.push(envelope("b")).await.unwrap();
        queue.push(envelope("c")).await.unwrap();
        assert_eq!(queue.len(), 2);
        let first = queue.pop(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(first.get("id").unwrap(), "b");
    }

    #[tokio::test]
    async fn pop_on_empty_open_queue_times_out_with_none() {
        let queue = InMemoryQueue::new("test", None);
        let result = queue.pop(Duration::from_millis(5)).await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn pop_on_empty_closed_queue_returns_closed() {
        let queue = InMemoryQueue::new("test", None);
        queue.close();
        let result = queue.pop(Duration::from_millis(5)).await;
        assert_eq!(result, Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn push_to_closed_queue_returns_closed() {
        let queue = InMemoryQueue::new("test", None);
        queue.close();
        let result = queue.push(envelope("a")).await;
        assert_eq!(result, Err(QueueError::Closed));
    }
}
