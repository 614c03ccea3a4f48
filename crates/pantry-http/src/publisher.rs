//! Message publishing collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use pantry_model::QueueName;

/// Why a message could not be published.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// No publisher is available for the queue.
    #[error("no publisher available for queue {0}")]
    Unavailable(QueueName),
    /// The broker refused or lost the message.
    #[error("publishing to {queue}: {reason}")]
    Transport {
        /// Target queue.
        queue: QueueName,
        /// Broker-reported reason.
        reason: String,
    },
    /// The broker did not answer in time.
    #[error("publishing to {0} timed out")]
    Timeout(QueueName),
    /// The message could not be serialized.
    #[error("encoding message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Enqueues serialized messages onto one queue.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message.
    async fn publish(&self, message: Bytes) -> Result<(), PublishError>;
}

/// Hands out publishers by queue.
pub trait PublisherProvider: Send + Sync + 'static {
    /// Obtain a publisher for `queue`.
    fn provide_publisher(&self, queue: QueueName) -> Result<Arc<dyn Publisher>, PublishError>;
}
