//! # Proof Engine Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | `assembly` | decode, compose and conformance check of one event |
//! | `codec` | zstd encode and decode of a stored proof |
//! | `pipeline` | batches through the consumer on in-memory adapters |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use proof_engine::{codec, compose, decode, Composition, ConformanceGate};
use proof_tests::fixtures::{btc_event, cal_event, hash_id, payload, subscribe, Engine};
use proof_types::ProofDocument;
use std::time::Duration;

fn document(message_type: &str, bytes: &[u8]) -> ProofDocument {
    let event = decode(message_type, bytes).unwrap_or_else(|e| panic!("fixture decodes: {e}"));
    match compose(&event) {
        Composition::Document(doc) => doc,
        Composition::Deferred(stage) => panic!("fixture deferred at {stage}"),
    }
}

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");
    let gate = ConformanceGate::new().unwrap_or_else(|e| panic!("schema compiles: {e}"));

    let id = hash_id(1);
    let inputs = [
        ("cal", payload(&cal_event(&id))),
        ("btc", payload(&btc_event(&id))),
    ];

    for (message_type, bytes) in &inputs {
        group.bench_with_input(BenchmarkId::new("decode", message_type), bytes, |b, bytes| {
            b.iter(|| black_box(decode(message_type, bytes).is_ok()))
        });

        let event = decode(message_type, bytes).unwrap_or_else(|e| panic!("{e}"));
        group.bench_with_input(BenchmarkId::new("compose", message_type), &event, |b, event| {
            b.iter(|| black_box(compose(event)))
        });

        let doc = document(message_type, bytes);
        group.bench_with_input(BenchmarkId::new("check", message_type), &doc, |b, doc| {
            b.iter(|| black_box(gate.check(doc).is_ok()))
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let doc = document("btc", &payload(&btc_event(&hash_id(2))));
    let encoded = codec::encode(&doc).unwrap_or_else(|e| panic!("{e}"));

    group.bench_function("encode_btc_proof", |b| {
        b.iter(|| black_box(codec::encode(&doc).map(|bytes| bytes.len())))
    });
    group.bench_function("decode_btc_proof", |b| {
        b.iter(|| black_box(codec::decode(&encoded).is_ok()))
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| panic!("runtime: {e}"));

    for size in [10u32, 100, 500] {
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("cal_batch", size), &size, |b, &size| {
            b.iter(|| {
                let engine = Engine::new();
                let _binding = engine.exchange.bind("fe-bench");
                for n in 0..size {
                    let id = hash_id(n);
                    subscribe(&engine.store, &id, "fe-bench", "ws-bench");
                    engine.publish("cal", &cal_event(&id));
                }
                black_box(rt.block_on(engine.drain(16)).acked)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assembly, bench_codec, bench_pipeline);
criterion_main!(benches);
