//! # Reliability
//!
//! Outages, redelivery, dead letters and shutdown.

#[cfg(test)]
mod tests {
    use crate::fixtures::{btc_event, cal_event, hash_id, subscribe, Engine};
    use async_trait::async_trait;
    use proof_engine::{
        ConsumerConfig, InMemoryKeyValueStore, KeyValueStore, StageConsumer, StoreError,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Fails the first few reads and writes, then delegates.
    struct FlakyStore {
        inner: Arc<InMemoryKeyValueStore>,
        failing_writes: AtomicUsize,
        failing_reads: AtomicUsize,
    }

    impl FlakyStore {
        fn new(inner: Arc<InMemoryKeyValueStore>, writes: usize, reads: usize) -> Self {
            Self {
                inner,
                failing_writes: AtomicUsize::new(writes),
                failing_reads: AtomicUsize::new(reads),
            }
        }

        fn trip(counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
            if Self::trip(&self.failing_writes) {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inner.set_ex(key, value, ttl).await
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            if Self::trip(&self.failing_reads) {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inner.get(key).await
        }
    }

    fn flaky_engine(writes: usize, reads: usize, max_redeliveries: u32) -> Engine {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let flaky = Arc::new(FlakyStore::new(store.clone(), writes, reads));
        Engine::over(store, flaky, max_redeliveries)
    }

    #[tokio::test]
    async fn test_store_outage_recovers_on_redelivery() {
        let engine = flaky_engine(2, 0, 5);
        let id = hash_id(1);
        subscribe(&engine.store, &id, "fe-x", "ws-1");
        let mut binding = engine.exchange.bind("fe-x");

        engine.publish("cal", &cal_event(&id));
        let stats = engine.drain(1).await;

        assert_eq!(stats.received, 3);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.acked, 1);
        assert!(engine.queue.dead_letters().is_empty());
        assert!(engine
            .pipeline
            .repository()
            .fetch(&id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(binding.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_subscription_lookup_outage_redelivers() {
        let engine = flaky_engine(0, 1, 5);
        let id = hash_id(2);
        subscribe(&engine.store, &id, "fe-x", "ws-2");
        let mut binding = engine.exchange.bind("fe-x");

        engine.publish("btc", &btc_event(&id));
        let stats = engine.drain(1).await;

        assert_eq!(stats.received, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.acked, 1);

        // Second attempt rewrote the same proof and announced it once
        let notifications = binding.drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].connection_id, "ws-2");
    }

    #[tokio::test]
    async fn test_exchange_outage_dead_letters() {
        let engine = Engine::with_max_redeliveries(1);
        let id = hash_id(3);
        subscribe(&engine.store, &id, "fe-x", "ws-3");
        engine.exchange.set_unavailable(true);

        engine.publish("cal", &cal_event(&id));
        let stats = engine.drain(1).await;

        assert_eq!(stats.received, 2);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.acked, 0);

        let dead = engine.queue.dead_letters();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].message_type, "cal");
        assert_eq!(dead[0].delivery_count, 2);
        assert!(dead[0].redelivered);

        // Persisted before the publish failed
        assert!(engine
            .pipeline
            .repository()
            .fetch(&id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(engine.exchange.published(), 0);
    }

    #[tokio::test]
    async fn test_non_conformant_event_acked_without_retry() {
        let engine = Engine::new();
        let id = hash_id(4);
        let mut event = cal_event(&id);
        event["aggregationFragment"] = json!([{"l": "not-hex"}, {"op": "sha-256"}]);

        engine.publish("cal", &event);
        let stats = engine.drain(1).await;

        assert_eq!(stats.received, 1);
        assert_eq!(stats.acked, 1);
        assert_eq!(stats.rejected, 0);
        assert!(engine.store.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_events_acked() {
        let engine = Engine::new();
        engine.queue.publish("cal", b"{not json".to_vec());
        engine.queue.publish("btc", b"{}".to_vec());
        engine.publish("zzz", &cal_event(&hash_id(5)));

        let stats = engine.drain(2).await;

        assert_eq!(stats.received, 3);
        assert_eq!(stats.acked, 3);
        assert!(engine.queue.dead_letters().is_empty());
        assert!(engine.store.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_leaves_messages_queued() {
        let engine = Engine::new();
        for n in 0..5 {
            engine.publish("cal", &cal_event(&hash_id(10 + n)));
        }

        let consumer = StageConsumer::new(
            engine.queue.clone(),
            engine.pipeline.clone(),
            &ConsumerConfig::new(2),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();
        let stats = consumer.run(shutdown_rx).await;

        assert_eq!(stats.received, 0);
        assert_eq!(engine.queue.ready_len(), 5);
        assert_eq!(engine.queue.unacked_len(), 0);
        assert!(engine.store.is_empty());
    }
}
