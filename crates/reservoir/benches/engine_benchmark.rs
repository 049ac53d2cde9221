//! Benchmark for the acquire/release hot path.
//!
//! TARGET: 1,000,000 acquire+release pairs per second on a warm pool
//!
//! Run with: cargo bench --package reservoir --bench engine_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reservoir::{PoolConfiguration, PoolingEngine, RecycleMode, ResourceKind};

fn warm_engine(recycle: RecycleMode) -> PoolingEngine {
    let engine = PoolingEngine::builder()
        .memory_limit(256 * 1024 * 1024)
        .without_maintenance()
        .build()
        .unwrap();
    engine
        .create_pool(
            "bench",
            PoolConfiguration {
                initial_size: 64,
                max_size: 64,
                preallocate: true,
                recycle,
                ..PoolConfiguration::new("bench", ResourceKind::Particle)
            },
        )
        .unwrap();
    engine
}

fn benchmark_hit_path(c: &mut Criterion) {
    let engine = warm_engine(RecycleMode::Never);

    c.bench_function("acquire_release_hit", |b| {
        b.iter(|| {
            let handle = engine.acquire(black_box("bench"), None).unwrap().unwrap();
            engine.release("bench", handle).unwrap();
        });
    });
}

fn benchmark_recycle_path(c: &mut Criterion) {
    let engine = warm_engine(RecycleMode::Always);

    let mut group = c.benchmark_group("recycle");
    group.throughput(Throughput::Elements(32));
    group.bench_function("32_release_then_drain", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..32)
                .map(|_| engine.acquire("bench", None).unwrap().unwrap())
                .collect();
            for handle in handles {
                engine.release("bench", handle).unwrap();
            }
            black_box(engine.drain_recycler())
        });
    });
    group.finish();
}

fn benchmark_status(c: &mut Criterion) {
    let engine = warm_engine(RecycleMode::Strategy);

    c.bench_function("status_snapshot", |b| {
        b.iter(|| black_box(engine.status()));
    });
}

criterion_group!(
    benches,
    benchmark_hit_path,
    benchmark_recycle_path,
    benchmark_status
);
criterion_main!(benches);
