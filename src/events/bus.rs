//! In-memory pub/sub over tokio broadcast channels.
//!
//! Publishing never blocks. A subscriber that falls behind by more than the
//! channel capacity loses the oldest messages and is told how many.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Broadcast bus for one message type
pub struct BroadcastBus<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T> Clone for BroadcastBus<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> BroadcastBus<T> {
    /// Create a bus buffering up to `capacity` messages per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish to all current subscribers, returning how many received it
    pub fn publish(&self, message: T) -> usize {
        debug!(?message, "Publishing");
        match self.sender.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No subscribers listening");
                0
            }
        }
    }

    pub fn subscribe(&self) -> BusReceiver<T> {
        BusReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving half of a bus subscription
pub struct BusReceiver<T> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> BusReceiver<T> {
    /// Wait for the next message
    pub async fn recv(&mut self) -> Result<T, BusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => BusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Bus receiver lagged by {} messages", n);
                BusError::Lagged(n)
            }
        })
    }

    /// Receive without waiting
    pub fn try_recv(&mut self) -> Result<T, BusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => BusError::Empty,
            broadcast::error::TryRecvError::Closed => BusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Bus receiver lagged by {} messages", n);
                BusError::Lagged(n)
            }
        })
    }
}

/// Errors that can occur when receiving from a bus
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("Bus is closed")]
    Closed,

    #[error("No messages available")]
    Empty,

    #[error("Receiver lagged by {0} messages (messages were dropped)")]
    Lagged(u64),
}
