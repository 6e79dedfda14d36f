//! # Stage Queue
//!
//! The inbound side: typed stage messages with explicit settlement.

use crate::DEFAULT_MAX_REDELIVERIES;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Errors from settling a delivery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The delivery tag is not outstanding (already settled or never issued).
    #[error("Unknown delivery tag: {0}")]
    UnknownDeliveryTag(u64),

    /// The broker connection failed.
    #[error("Broker error: {0}")]
    Broker(String),
}

/// One message handed to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Settlement handle, unique per delivery attempt.
    pub delivery_tag: u64,
    /// Stage tag (`cal`, `btc`, `eth`).
    pub message_type: String,
    pub payload: Vec<u8>,
    /// Set when this message was delivered before and rejected.
    pub redelivered: bool,
    /// Number of times this message has been handed out, including this one.
    pub delivery_count: u32,
}

/// Inbound stage event queue.
#[async_trait]
pub trait StageQueue: Send + Sync {
    /// Queue name, for logging.
    fn name(&self) -> &str;

    /// Wait for the next delivery.
    ///
    /// Returns `None` once the queue is closed and fully settled.
    async fn next_delivery(&self) -> Option<Delivery>;

    /// Settle a delivery as processed.
    async fn ack(&self, delivery_tag: u64) -> Result<(), QueueError>;

    /// Settle a delivery as failed, optionally returning it for redelivery.
    async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), QueueError>;
}

/// Settlement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub published: u64,
    pub acked: u64,
    pub rejected: u64,
    pub dead_lettered: u64,
}

#[derive(Debug, Clone)]
struct Message {
    message_type: String,
    payload: Vec<u8>,
    delivery_count: u32,
}

enum Take {
    Ready(Delivery),
    Drained,
    Empty,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Message>,
    unacked: HashMap<u64, Message>,
    dead_letters: Vec<Delivery>,
    next_tag: u64,
    closed: bool,
    stats: QueueStats,
}

/// In-memory stage queue with broker-style settlement.
///
/// Rejected deliveries are requeued at the back of the queue with
/// `redelivered` set. After `max_redeliveries` rejections a message is
/// moved to the dead-letter list instead.
pub struct InMemoryStageQueue {
    name: String,
    max_redeliveries: u32,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl InMemoryStageQueue {
    /// Create an open queue with the default redelivery limit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_max_redeliveries(name, DEFAULT_MAX_REDELIVERIES)
    }

    /// Create an open queue with a custom redelivery limit.
    #[must_use]
    pub fn with_max_redeliveries(name: impl Into<String>, max_redeliveries: u32) -> Self {
        Self {
            name: name.into(),
            max_redeliveries,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }

    /// Enqueue a message.
    ///
    /// Messages published after `close` are dropped.
    pub fn publish(&self, message_type: impl Into<String>, payload: impl Into<Vec<u8>>) {
        {
            let mut state = self.state.lock();
            if state.closed {
                warn!(queue = %self.name, "Publish after close, message dropped");
                return;
            }
            state.ready.push_back(Message {
                message_type: message_type.into(),
                payload: payload.into(),
                delivery_count: 0,
            });
            state.stats.published += 1;
        }
        self.notify.notify_one();
    }

    /// Stop accepting publishes.
    ///
    /// Consumers keep receiving until every outstanding message is settled.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    /// Settlement counters so far.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.state.lock().stats
    }

    /// Messages waiting to be delivered.
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.state.lock().ready.len()
    }

    /// Deliveries handed out and not yet settled.
    #[must_use]
    pub fn unacked_len(&self) -> usize {
        self.state.lock().unacked.len()
    }

    /// Messages that exhausted their redeliveries.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<Delivery> {
        self.state.lock().dead_letters.clone()
    }

    fn try_take(&self) -> Take {
        let mut state = self.state.lock();
        if let Some(mut message) = state.ready.pop_front() {
            message.delivery_count += 1;
            state.next_tag += 1;
            let delivery_tag = state.next_tag;
            let delivery = Delivery {
                delivery_tag,
                message_type: message.message_type.clone(),
                payload: message.payload.clone(),
                redelivered: message.delivery_count > 1,
                delivery_count: message.delivery_count,
            };
            state.unacked.insert(delivery_tag, message);
            return Take::Ready(delivery);
        }
        if state.closed && state.unacked.is_empty() {
            return Take::Drained;
        }
        Take::Empty
    }
}

#[async_trait]
impl StageQueue for InMemoryStageQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_delivery(&self) -> Option<Delivery> {
        loop {
            let notified = self.notify.notified();
            match self.try_take() {
                Take::Ready(delivery) => {
                    // More may be ready; pass the wakeup along.
                    self.notify.notify_one();
                    return Some(delivery);
                }
                Take::Drained => {
                    self.notify.notify_one();
                    return None;
                }
                Take::Empty => notified.await,
            }
        }
    }

    async fn ack(&self, delivery_tag: u64) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock();
            state
                .unacked
                .remove(&delivery_tag)
                .ok_or(QueueError::UnknownDeliveryTag(delivery_tag))?;
            state.stats.acked += 1;
        }
        debug!(queue = %self.name, delivery_tag, "Delivery acked");
        self.notify.notify_one();
        Ok(())
    }

    async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock();
            let message = state
                .unacked
                .remove(&delivery_tag)
                .ok_or(QueueError::UnknownDeliveryTag(delivery_tag))?;
            state.stats.rejected += 1;

            if requeue && message.delivery_count <= self.max_redeliveries {
                debug!(
                    queue = %self.name,
                    delivery_tag,
                    delivery_count = message.delivery_count,
                    "Delivery requeued"
                );
                state.ready.push_back(message);
            } else {
                warn!(
                    queue = %self.name,
                    delivery_tag,
                    message_type = %message.message_type,
                    delivery_count = message.delivery_count,
                    "Delivery dead-lettered"
                );
                state.stats.dead_lettered += 1;
                state.dead_letters.push(Delivery {
                    delivery_tag,
                    redelivered: message.delivery_count > 1,
                    delivery_count: message.delivery_count,
                    message_type: message.message_type,
                    payload: message.payload,
                });
            }
        }
        self.notify.notify_one();
        Ok(())
    }
}
