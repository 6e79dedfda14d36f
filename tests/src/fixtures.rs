//! # Fixtures
//!
//! Stage event builders and an in-memory engine harness shared by the
//! integration tests and benchmarks.

use proof_bus::{InMemoryNotificationExchange, InMemoryStageQueue};
use proof_engine::{
    ConsumerConfig, ConsumerStats, InMemoryKeyValueStore, KeyValueStore, PipelineConfig,
    ProofPipeline, StageConsumer,
};
use proof_types::SubscriptionRecord;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

pub const QUEUE: &str = "work.proof";

/// A distinct v1 hash id per `n`, all submitted in late November 2023.
pub fn hash_id(n: u32) -> Uuid {
    Uuid::from_fields(
        0xf1e2_c3a0_u32.wrapping_add(n),
        0x8d7b,
        0x11ee,
        &[0xb9, 0x62, 0x02, 0x42, 0xac, 0x12, 0x00, 0x02],
    )
}

pub fn cal_event(hash_id: &Uuid) -> Value {
    json!({
        "hash": "ab12cd34ef56",
        "hashId": hash_id.to_string(),
        "aggregationFragment": [{"l": "0a0b"}, {"op": "sha-256"}],
        "calendarFragment": [
            {"r": "0c0d"},
            {"op": "sha-256"},
            {"anchors": [{"type": "cal", "anchor_id": "1027", "uris": ["/calendar/1027/hash"]}]}
        ]
    })
}

fn chain_event(hash_id: &Uuid, anchor_type: &str, anchor_id: &str) -> Value {
    let mut event = cal_event(hash_id);
    event["anchorAggregationFragment"] = json!([{"l": "1e1f"}, {"op": "sha-256-x2"}]);
    event["chainAnchorFragment"] = json!({
        "ops": [{"r": "2a2b"}, {"op": "sha-256-x2"}],
        "anchor": {"type": anchor_type, "anchor_id": anchor_id, "uris": []}
    });
    event
}

pub fn btc_event(hash_id: &Uuid) -> Value {
    chain_event(hash_id, "btc", "560301")
}

pub fn eth_event(hash_id: &Uuid) -> Value {
    chain_event(hash_id, "eth", "0x5f3a")
}

pub fn payload(event: &Value) -> Vec<u8> {
    serde_json::to_vec(event).unwrap_or_default()
}

/// Register a live subscription the way the API layer would.
pub fn subscribe(store: &InMemoryKeyValueStore, hash_id: &Uuid, instance: &str, connection: &str) {
    let record = json!({
        "hashId": hash_id.to_string(),
        "frontEndInstanceId": instance,
        "connectionId": connection,
    });
    store.insert(SubscriptionRecord::key(hash_id), payload(&record));
}

/// The engine wired over in-memory adapters.
pub struct Engine {
    pub store: Arc<InMemoryKeyValueStore>,
    pub exchange: Arc<InMemoryNotificationExchange>,
    pub queue: Arc<InMemoryStageQueue>,
    pub pipeline: Arc<ProofPipeline>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_max_redeliveries(proof_bus::DEFAULT_MAX_REDELIVERIES)
    }

    pub fn with_max_redeliveries(max_redeliveries: u32) -> Self {
        let store = Arc::new(InMemoryKeyValueStore::new());
        Self::over(store.clone(), store, max_redeliveries)
    }

    /// Engine whose pipeline talks to `backing`, typically a wrapper that
    /// injects faults in front of `store`.
    pub fn over(
        store: Arc<InMemoryKeyValueStore>,
        backing: Arc<dyn KeyValueStore>,
        max_redeliveries: u32,
    ) -> Self {
        let exchange = Arc::new(InMemoryNotificationExchange::new());
        let pipeline = ProofPipeline::new(backing, exchange.clone(), &PipelineConfig::default())
            .map(Arc::new)
            .unwrap_or_else(|e| panic!("proof schema failed to compile: {e}"));

        Self {
            store,
            exchange,
            queue: Arc::new(InMemoryStageQueue::with_max_redeliveries(
                QUEUE,
                max_redeliveries,
            )),
            pipeline,
        }
    }

    pub fn publish(&self, message_type: &str, event: &Value) {
        self.queue.publish(message_type, payload(event));
    }

    /// Close the queue and consume until every message is settled.
    pub async fn drain(&self, prefetch: usize) -> ConsumerStats {
        self.queue.close();
        let consumer = StageConsumer::new(
            self.queue.clone(),
            self.pipeline.clone(),
            &ConsumerConfig::new(prefetch),
        );
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        consumer.run(shutdown_rx).await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
