//! Benchmark for strategy selection and budget admission.
//!
//! TARGET: select over a 1,024-resource pool in under 20 µs
//!
//! Run with: cargo bench --package reservoir_core --bench strategy_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reservoir_core::{
    MemoryConfig, MemoryManager, Payload, Resource, ResourceId, ResourceKind, StrategyKind,
    Timestamp,
};

fn create_pool_snapshot(size: usize) -> Vec<Resource> {
    (0..size)
        .map(|i| {
            let created = Timestamp(i as u64 * 10);
            let mut resource = Resource::new(
                ResourceId::new(format!("res-{i:06}")),
                ResourceKind::Particle,
                64 + (i % 7) * 32,
                Payload::empty(ResourceKind::Particle),
                created,
            );
            // Uneven wear so the policies have something to rank.
            for use_at in 0..(i % 13) {
                let now = Timestamp(created.as_millis() + use_at as u64 + 1);
                if let Some(payload) = resource.check_out(now) {
                    let _ = resource.check_in(payload, now);
                }
            }
            resource
        })
        .collect()
}

fn benchmark_select(c: &mut Criterion) {
    let snapshot = create_pool_snapshot(1_024);
    let now = Timestamp(600_000);

    let mut group = c.benchmark_group("select_1024");
    group.throughput(Throughput::Elements(snapshot.len() as u64));

    for kind in [StrategyKind::Lru, StrategyKind::Frequency, StrategyKind::Adaptive] {
        let strategy = kind.build();
        group.bench_function(strategy.name(), |b| {
            b.iter(|| black_box(strategy.select(black_box(&snapshot), now)));
        });
    }

    group.finish();
}

fn benchmark_priority_refresh(c: &mut Criterion) {
    let snapshot = create_pool_snapshot(1_024);
    let strategy = StrategyKind::Adaptive.build();
    let now = Timestamp(600_000);

    c.bench_function("adaptive_priority_1024", |b| {
        b.iter(|| {
            let total: f64 = snapshot.iter().map(|r| strategy.priority(r, now)).sum();
            black_box(total)
        });
    });
}

fn benchmark_admission(c: &mut Criterion) {
    let budget = MemoryManager::new(MemoryConfig::with_limit(usize::MAX / 4));

    c.bench_function("try_reserve_and_release", |b| {
        b.iter(|| {
            if budget.try_reserve(black_box(4_096)) {
                budget.record_deallocation(4_096);
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_select,
    benchmark_priority_refresh,
    benchmark_admission
);
criterion_main!(benches);
