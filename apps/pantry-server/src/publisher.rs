//! In-memory queue publishers.
//!
//! Messages are logged and the most recent ones kept per queue, standing in
//! for a real broker in local runs.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;

use pantry_http::{PublishError, Publisher, PublisherProvider};
use pantry_model::QueueName;

/// How many messages each in-memory queue retains.
pub const RETAINED_MESSAGES: usize = 256;

/// Publisher that keeps the latest [`RETAINED_MESSAGES`] of one queue.
#[derive(Debug)]
pub struct InMemoryPublisher {
    queue: QueueName,
    published: AtomicU64,
    messages: Mutex<VecDeque<Bytes>>,
}

impl InMemoryPublisher {
    fn new(queue: QueueName) -> Self {
        Self {
            queue,
            published: AtomicU64::new(0),
            messages: Mutex::new(VecDeque::with_capacity(RETAINED_MESSAGES)),
        }
    }

    /// Retained messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Bytes> {
        self.messages.lock().iter().cloned().collect()
    }

    /// Messages published over the publisher's lifetime, retained or not.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, message: Bytes) -> Result<(), PublishError> {
        let sequence = self.published.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(queue = %self.queue, sequence, bytes = message.len(), "message published");
        tracing::debug!(queue = %self.queue, payload = %String::from_utf8_lossy(&message), "message payload");

        let mut messages = self.messages.lock();
        if messages.len() == RETAINED_MESSAGES {
            messages.pop_front();
        }
        messages.push_back(message);
        Ok(())
    }
}

/// Hands out one [`InMemoryPublisher`] per queue, created on first use.
#[derive(Debug, Default)]
pub struct InMemoryPublisherProvider {
    queues: DashMap<QueueName, Arc<InMemoryPublisher>>,
}

impl InMemoryPublisherProvider {
    /// Create a provider with no queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The publisher for `queue`, if anything was ever published to it.
    #[must_use]
    pub fn queue(&self, queue: QueueName) -> Option<Arc<InMemoryPublisher>> {
        self.queues.get(&queue).map(|p| Arc::clone(p.value()))
    }
}

impl PublisherProvider for InMemoryPublisherProvider {
    fn provide_publisher(&self, queue: QueueName) -> Result<Arc<dyn Publisher>, PublishError> {
        let publisher = self
            .queues
            .entry(queue)
            .or_insert_with(|| Arc::new(InMemoryPublisher::new(queue)));
        Ok(Arc::clone(publisher.value()) as Arc<dyn Publisher>)
    }
}
