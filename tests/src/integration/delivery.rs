//! # Delivery Flows
//!
//! Stage events through the consumer into the store, then out to the
//! front-end instance holding each subscription.

#[cfg(test)]
mod tests {
    use crate::fixtures::{btc_event, cal_event, eth_event, hash_id, subscribe, Engine};
    use proof_engine::ConformanceGate;
    use proof_types::{AnchorType, BranchLabel, Op};

    #[tokio::test]
    async fn test_cal_event_stored_and_announced() {
        let engine = Engine::new();
        let id = hash_id(1);
        subscribe(&engine.store, &id, "fe-x", "ws-42");
        let mut binding = engine.exchange.bind("fe-x");

        engine.publish("cal", &cal_event(&id));
        let stats = engine.drain(4).await;

        assert_eq!(stats.received, 1);
        assert_eq!(stats.acked, 1);
        assert_eq!(stats.rejected, 0);

        let proof = engine
            .pipeline
            .repository()
            .fetch(&id)
            .await
            .unwrap()
            .expect("proof stored");
        assert_eq!(proof.hash, "ab12cd34ef56");
        assert_eq!(proof.hash_id, id);
        assert_eq!(proof.branches.len(), 1);

        let root = &proof.branches[0];
        assert_eq!(root.label, BranchLabel::CalAnchorBranch);
        assert!(root.branches.is_empty());
        // l, op from aggregation; r, op from calendar; anchor
        assert_eq!(root.ops.len(), 5);
        let anchors = root.terminal_anchors().unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].anchor_type, AnchorType::Cal);
        assert_eq!(anchors[0].anchor_id, "1027");

        let notifications = binding.drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].hash_id, id);
        assert_eq!(notifications[0].connection_id, "ws-42");
    }

    #[tokio::test]
    async fn test_btc_event_replaces_cal_proof() {
        let engine = Engine::new();
        let id = hash_id(2);
        subscribe(&engine.store, &id, "fe-x", "ws-7");
        let mut binding = engine.exchange.bind("fe-x");

        engine.publish("cal", &cal_event(&id));
        engine.publish("btc", &btc_event(&id));
        // One at a time so the btc write lands last
        let stats = engine.drain(1).await;
        assert_eq!(stats.acked, 2);

        let proof = engine
            .pipeline
            .repository()
            .fetch(&id)
            .await
            .unwrap()
            .unwrap();
        let root = proof.root_branch().unwrap();
        assert_eq!(root.label, BranchLabel::CalAnchorBranch);
        assert_eq!(root.branches.len(), 1);

        let nested = &root.branches[0];
        assert_eq!(nested.label, BranchLabel::BtcAnchorBranch);
        assert!(nested.branches.is_empty());
        assert!(matches!(nested.ops.first(), Some(Op::Prepend { .. })));
        let anchors = nested.terminal_anchors().unwrap();
        assert_eq!(anchors[0].anchor_type, AnchorType::Btc);
        assert_eq!(anchors[0].anchor_id, "560301");

        // Each stored stage is announced
        assert_eq!(binding.drain().len(), 2);
    }

    #[tokio::test]
    async fn test_stored_proofs_pass_the_gate_again() {
        let engine = Engine::new();
        let (cal, btc) = (hash_id(3), hash_id(4));

        engine.publish("cal", &cal_event(&cal));
        engine.publish("btc", &btc_event(&btc));
        engine.drain(2).await;

        let gate = ConformanceGate::new().unwrap();
        for id in [cal, btc] {
            let proof = engine
                .pipeline
                .repository()
                .fetch(&id)
                .await
                .unwrap()
                .unwrap();
            gate.check(&proof).unwrap();
        }
    }

    #[tokio::test]
    async fn test_notifications_routed_to_subscribing_instance() {
        let engine = Engine::new();
        let mut x = engine.exchange.bind("fe-x");
        let mut y = engine.exchange.bind("fe-y");
        let mut z = engine.exchange.bind("fe-z");

        let ids: Vec<_> = (10..16).map(hash_id).collect();
        for (i, id) in ids.iter().enumerate() {
            let instance = if i % 2 == 0 { "fe-x" } else { "fe-y" };
            subscribe(&engine.store, id, instance, &format!("ws-{i}"));
            engine.publish("cal", &cal_event(id));
        }

        let stats = engine.drain(3).await;
        assert_eq!(stats.acked, 6);
        assert_eq!(engine.exchange.published(), 6);

        let mut to_x: Vec<_> = x.drain().into_iter().map(|n| n.hash_id).collect();
        let mut to_y: Vec<_> = y.drain().into_iter().map(|n| n.hash_id).collect();
        to_x.sort();
        to_y.sort();

        let mut expected_x = vec![ids[0], ids[2], ids[4]];
        let mut expected_y = vec![ids[1], ids[3], ids[5]];
        expected_x.sort();
        expected_y.sort();
        assert_eq!(to_x, expected_x);
        assert_eq!(to_y, expected_y);
        assert!(z.drain().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribed_proofs_stored_silently() {
        let engine = Engine::new();
        let id = hash_id(20);

        engine.publish("cal", &cal_event(&id));
        let stats = engine.drain(1).await;

        assert_eq!(stats.acked, 1);
        assert_eq!(engine.exchange.published(), 0);
        assert!(engine
            .pipeline
            .repository()
            .fetch(&id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_mixed_batch_under_concurrency() {
        let engine = Engine::new();
        let mut binding = engine.exchange.bind("fe-x");

        let mut stored = Vec::new();
        let mut deferred = Vec::new();
        for n in 0..30 {
            let id = hash_id(100 + n);
            subscribe(&engine.store, &id, "fe-x", "ws-batch");
            match n % 3 {
                0 => {
                    engine.publish("cal", &cal_event(&id));
                    stored.push(id);
                }
                1 => {
                    engine.publish("btc", &btc_event(&id));
                    stored.push(id);
                }
                _ => {
                    engine.publish("eth", &eth_event(&id));
                    deferred.push(id);
                }
            }
        }

        let stats = engine.drain(8).await;
        assert_eq!(stats.received, 30);
        assert_eq!(stats.acked, 30);
        assert_eq!(stats.rejected, 0);
        assert_eq!(engine.queue.stats().acked, 30);

        let repository = engine.pipeline.repository();
        for id in &stored {
            assert!(repository.fetch(id).await.unwrap().is_some());
        }
        for id in &deferred {
            assert!(repository.fetch(id).await.unwrap().is_none());
        }
        assert_eq!(binding.drain().len(), stored.len());
    }

    #[tokio::test]
    async fn test_eth_event_deferred() {
        let engine = Engine::new();
        let id = hash_id(30);
        subscribe(&engine.store, &id, "fe-x", "ws-1");
        let mut binding = engine.exchange.bind("fe-x");

        engine.publish("eth", &eth_event(&id));
        let stats = engine.drain(1).await;

        assert_eq!(stats.acked, 1);
        assert!(engine.queue.dead_letters().is_empty());
        assert!(engine
            .pipeline
            .repository()
            .fetch(&id)
            .await
            .unwrap()
            .is_none());
        assert!(binding.drain().is_empty());
    }
}
