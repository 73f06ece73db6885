//! Benchmarks for compilation, full propagation and cross-clique joins.
//!
//! Run with:
//! - `cargo bench --bench propagation`
//! - `cargo bench --bench propagation --features rayon`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jtree_core::{Evidence, InferenceEngine, Network, NetworkBuilder, NodeDefinition};

/// A layered network: each variable after the first two has the two
/// previous variables as parents.
fn make_ladder(len: usize, cardinality: usize, seed: u64) -> Network {
    let mut state = seed;
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        0.05 + ((state >> 11) as f64) / ((u64::MAX >> 11) as f64)
    };
    let levels: Vec<String> = (0..cardinality).map(|s| format!("s{}", s)).collect();
    let mut builder = NetworkBuilder::new();
    for i in 0..len {
        let parents: Vec<String> = (i.saturating_sub(2)..i).map(|p| format!("V{}", p)).collect();
        let size = cardinality.pow(parents.len() as u32 + 1);
        let values = (0..size).map(|_| next()).collect();
        builder.add_node(
            format!("V{}", i),
            NodeDefinition::potential(levels.iter().cloned(), parents, values),
        );
    }
    builder.build().expect("ladder network")
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for len in [8_usize, 32, 128] {
        let network = make_ladder(len, 3, len as u64);
        group.bench_with_input(BenchmarkId::new("ladder", len), &network, |b, network| {
            b.iter(|| black_box(InferenceEngine::new(black_box(network.clone())).expect("engine")));
        });
    }
    group.finish();
}

fn bench_propagate(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagate");
    for len in [8_usize, 32, 128] {
        let mut engine = InferenceEngine::new(make_ladder(len, 3, len as u64)).expect("engine");
        let evidence = Evidence::new().hard(format!("V{}", len - 1), "s0");
        group.bench_function(BenchmarkId::new("ladder", len), |b| {
            b.iter(|| {
                engine.set_evidence(black_box(&evidence)).expect("evidence");
                engine.propagate().expect("propagate");
            });
        });
    }
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");
    for len in [8_usize, 32] {
        let mut engine = InferenceEngine::new(make_ladder(len, 3, len as u64)).expect("engine");
        let first = "V0".to_string();
        let last = format!("V{}", len - 1);
        group.bench_function(BenchmarkId::new("ends", len), |b| {
            b.iter(|| {
                engine.remove_all_evidence();
                black_box(
                    engine
                        .joint_distribution(&[first.as_str(), last.as_str()], &[])
                        .expect("joint"),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_propagate, bench_join);
criterion_main!(benches);
