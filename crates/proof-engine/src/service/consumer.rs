//! # Stage Consumer
//!
//! Pulls deliveries off the stage queue and runs each through the handler
//! in its own task, settling it with the handler's decision.
//!
//! ## Concurrency
//!
//! - At most `prefetch` deliveries in flight (semaphore permits).
//! - No ordering across deliveries; each event is self-contained.
//!
//! ## Shutdown
//!
//! When the watch signal flips (or its sender is dropped) the consumer
//! stops taking deliveries, then waits for every in-flight task to ack or
//! reject. Nothing is left half-settled.

use super::pipeline::Disposition;
use crate::domain::config::ConsumerConfig;
use crate::ports::inbound::{Delivery, StageEventHandler, StageQueue};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Counters for one consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Deliveries taken from the queue.
    pub received: u64,
    pub acked: u64,
    pub rejected: u64,
    /// Ack or reject calls the broker refused.
    pub settle_failures: u64,
    /// Tasks that panicked before settling.
    pub panicked: u64,
}

struct Settled {
    disposition: Disposition,
    ok: bool,
}

impl ConsumerStats {
    fn record(&mut self, result: Result<Settled, JoinError>) {
        match result {
            Ok(settled) => {
                match settled.disposition {
                    Disposition::Ack => self.acked += 1,
                    Disposition::Reject => self.rejected += 1,
                }
                if !settled.ok {
                    self.settle_failures += 1;
                }
            }
            Err(e) => {
                error!(error = %e, "Delivery task failed before settling");
                self.panicked += 1;
            }
        }
    }
}

pub struct StageConsumer {
    queue: Arc<dyn StageQueue>,
    handler: Arc<dyn StageEventHandler>,
    permits: Arc<Semaphore>,
    prefetch: usize,
}

impl StageConsumer {
    pub fn new(
        queue: Arc<dyn StageQueue>,
        handler: Arc<dyn StageEventHandler>,
        config: &ConsumerConfig,
    ) -> Self {
        let prefetch = config.prefetch.max(1);
        Self {
            queue,
            handler,
            permits: Arc::new(Semaphore::new(prefetch)),
            prefetch,
        }
    }

    /// Consume until the queue drains, `shutdown` turns `true` or its
    /// sender is dropped, then wait for in-flight deliveries to settle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> ConsumerStats {
        let mut in_flight = JoinSet::new();
        let mut stats = ConsumerStats::default();

        info!(queue = %self.queue.name(), prefetch = self.prefetch, "Stage consumer started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let permit = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    stats.record(result);
                    continue;
                }
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let delivery = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    stats.record(result);
                    continue;
                }
                delivery = self.queue.next_delivery() => match delivery {
                    Some(delivery) => delivery,
                    None => {
                        debug!(queue = %self.queue.name(), "Queue drained");
                        break;
                    }
                },
            };

            stats.received += 1;
            let queue = self.queue.clone();
            let handler = self.handler.clone();
            in_flight.spawn(async move {
                let _permit = permit;
                settle(queue.as_ref(), handler.as_ref(), delivery).await
            });
        }

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "Draining in-flight deliveries");
        }
        while let Some(result) = in_flight.join_next().await {
            stats.record(result);
        }

        info!(
            queue = %self.queue.name(),
            received = stats.received,
            acked = stats.acked,
            rejected = stats.rejected,
            "Stage consumer stopped"
        );
        stats
    }
}

async fn settle(
    queue: &dyn StageQueue,
    handler: &dyn StageEventHandler,
    delivery: Delivery,
) -> Settled {
    let tag = delivery.delivery_tag;
    if delivery.redelivered {
        debug!(
            delivery_tag = tag,
            delivery_count = delivery.delivery_count,
            "Processing redelivery"
        );
    }

    let report = handler
        .handle(&delivery.message_type, &delivery.payload)
        .await;

    let result = match report.disposition {
        Disposition::Ack => queue.ack(tag).await,
        Disposition::Reject => queue.reject(tag, true).await,
    };
    if let Err(e) = &result {
        warn!(delivery_tag = tag, disposition = ?report.disposition, error = %e, "Settlement failed");
    }

    Settled {
        disposition: report.disposition,
        ok: result.is_ok(),
    }
}
