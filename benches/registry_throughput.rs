//! Benchmark suite for the transaction registry
//!
//! Measures the operations behind each API call using the divan
//! benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use std::sync::Arc;
use transaction_gateway::core::TransactionRegistry;
use transaction_gateway::types::{AuthorizationOutcome, TransactionType};

fn main() {
    divan::main();
}

const SIZES: &[usize] = &[100, 1_000, 10_000];

fn filled(count: usize) -> TransactionRegistry {
    let registry = TransactionRegistry::new();
    for i in 0..count {
        registry
            .create(format!("tx-{}", i), TransactionType::Sale, 100)
            .expect("create failed");
    }
    registry
}

/// Create `count` transactions in an empty registry
#[divan::bench(args = SIZES)]
fn create(bencher: divan::Bencher, count: usize) {
    bencher
        .with_inputs(TransactionRegistry::new)
        .bench_local_values(|registry| {
            for i in 0..count {
                registry
                    .create(format!("tx-{}", i), TransactionType::Sale, 100)
                    .expect("create failed");
            }
            registry
        });
}

/// Poll every transaction once
#[divan::bench(args = SIZES)]
fn get(bencher: divan::Bencher, count: usize) {
    let registry = filled(count);
    let ids: Vec<String> = (0..count).map(|i| format!("tx-{}", i)).collect();
    bencher.bench_local(|| {
        for id in &ids {
            divan::black_box(registry.get(id).expect("get failed"));
        }
    });
}

/// Approve every transaction
#[divan::bench(args = SIZES)]
fn advance(bencher: divan::Bencher, count: usize) {
    bencher
        .with_inputs(|| filled(count))
        .bench_local_values(|registry| {
            for i in 0..count {
                registry
                    .advance(&format!("tx-{}", i), AuthorizationOutcome::approved(100, "000000"))
                    .expect("advance failed");
            }
            registry
        });
}

/// Flush a full registry
#[divan::bench(args = SIZES)]
fn clear(bencher: divan::Bencher, count: usize) {
    bencher
        .with_inputs(|| filled(count))
        .bench_local_values(|registry| {
            divan::black_box(registry.clear());
            registry
        });
}

/// Duplicate creates racing from several threads
#[divan::bench(threads = [1, 4, 8])]
fn create_contended(bencher: divan::Bencher) {
    let registry = Arc::new(TransactionRegistry::new());
    let counter = std::sync::atomic::AtomicUsize::new(0);
    bencher.bench(|| {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed) / 2;
        divan::black_box(registry.create(format!("tx-{}", n), TransactionType::Sale, 100))
    });
}
