//! Multi-threaded stress tests: exclusivity, capacity and memory accounting
//! under random acquire/release traffic with concurrent maintenance.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reservoir::{
    PoolConfiguration, PoolingEngine, RecycleMode, ResourceHandle, ResourceId, ResourceKind,
    StrategyKind,
};

const MAX_SIZE: usize = 16;

fn stress_engine() -> Arc<PoolingEngine> {
    let engine = PoolingEngine::builder()
        .memory_limit(64 * 1024 * 1024)
        .without_maintenance()
        .build()
        .unwrap();
    let pools = [
        ("sparks", ResourceKind::Particle, StrategyKind::Adaptive, RecycleMode::Strategy),
        ("scratch", ResourceKind::Buffer, StrategyKind::Lru, RecycleMode::Always),
        ("handles", ResourceKind::Handle, StrategyKind::Frequency, RecycleMode::Never),
    ];
    for (name, kind, strategy, recycle) in pools {
        engine
            .create_pool(
                name,
                PoolConfiguration {
                    initial_size: 4,
                    max_size: MAX_SIZE,
                    preallocate: true,
                    strategy,
                    recycle,
                    ..PoolConfiguration::new(name, kind)
                },
            )
            .unwrap();
    }
    Arc::new(engine)
}

#[test]
fn test_random_traffic_keeps_invariants() {
    let engine = stress_engine();
    let pools: Vec<String> = engine.pool_names();
    let checked_out: Arc<Mutex<HashSet<ResourceId>>> = Arc::new(Mutex::new(HashSet::new()));
    let stop = Arc::new(AtomicBool::new(false));
    let violations = Arc::new(AtomicUsize::new(0));

    // Maintenance and observers run alongside the workers.
    let maintainer = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        let violations = Arc::clone(&violations);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                engine.maintain();
                for pool in engine.status().pools {
                    if pool.len > pool.max_size {
                        violations.fetch_add(1, Ordering::Relaxed);
                    }
                }
                thread::sleep(Duration::from_micros(200));
            }
        })
    };

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let pools = pools.clone();
            let checked_out = Arc::clone(&checked_out);
            let violations = Arc::clone(&violations);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(0xC0FFEE + t);
                let mut held: Vec<ResourceHandle> = Vec::new();
                for _ in 0..2_000 {
                    if held.is_empty() || rng.gen_bool(0.5) {
                        let pool = &pools[rng.gen_range(0..pools.len())];
                        if let Some(mut handle) = engine.acquire(pool, None).unwrap() {
                            if !checked_out.lock().insert(handle.id().clone()) {
                                violations.fetch_add(1, Ordering::Relaxed);
                            }
                            if let Some(buffer) = handle.as_buffer_mut() {
                                buffer.data.push(t as u8);
                            }
                            held.push(handle);
                        }
                    } else {
                        let handle = held.swap_remove(rng.gen_range(0..held.len()));
                        checked_out.lock().remove(handle.id());
                        let pool = handle.pool().to_string();
                        engine.release(&pool, handle).unwrap();
                    }
                }
                for handle in held {
                    checked_out.lock().remove(handle.id());
                    let pool = handle.pool().to_string();
                    engine.release(&pool, handle).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    maintainer.join().unwrap();

    assert_eq!(violations.load(Ordering::Relaxed), 0);
    assert!(checked_out.lock().is_empty());

    engine.drain_recycler();
    let status = engine.status();
    let pool_bytes: usize = status.pools.iter().map(|p| p.bytes).sum();
    assert_eq!(status.memory.allocated, pool_bytes);
    for pool in &status.pools {
        assert!(pool.len <= MAX_SIZE);
        assert_eq!(pool.in_use, 0);
        assert_eq!(pool.recycling, 0);
        assert_eq!(pool.constructing, 0);
    }
    assert_eq!(status.recycler.queue_depth, 0);

    engine.destroy();
    assert_eq!(engine.status().memory.allocated, 0);
}

#[test]
fn test_contended_pool_never_exceeds_capacity() {
    let engine = PoolingEngine::builder()
        .memory_limit(64 * 1024 * 1024)
        .without_maintenance()
        .build()
        .unwrap();
    engine
        .create_pool(
            "tight",
            PoolConfiguration {
                initial_size: 0,
                max_size: 3,
                ..PoolConfiguration::new("tight", ResourceKind::Particle)
            },
        )
        .unwrap();
    let engine = Arc::new(engine);

    // Every thread grabs as much as it can and holds it.
    let held: Vec<Vec<ResourceHandle>> = (0..6)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut mine = Vec::new();
                for _ in 0..10 {
                    if let Some(handle) = engine.acquire("tight", None).unwrap() {
                        mine.push(handle);
                    }
                }
                mine
            })
        })
        .map(|t| t.join().unwrap())
        .collect();

    let total: usize = held.iter().map(Vec::len).sum();
    assert_eq!(total, 3);
    let ids: HashSet<_> = held.iter().flatten().map(|h| h.id().clone()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(engine.status().pool("tight").unwrap().len, 3);

    for handle in held.into_iter().flatten() {
        engine.release("tight", handle).unwrap();
    }
}

#[test]
fn test_destroy_races_with_traffic() {
    let engine = stress_engine();
    let pools = engine.pool_names();

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let pools = pools.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t);
                let mut held = Vec::new();
                loop {
                    let pool = &pools[rng.gen_range(0..pools.len())];
                    match engine.acquire(pool, None) {
                        Ok(Some(handle)) => held.push(handle),
                        Ok(None) => {}
                        Err(_) => break,
                    }
                    if held.len() > 4 {
                        let handle: ResourceHandle = held.swap_remove(0);
                        let pool = handle.pool().to_string();
                        if engine.release(&pool, handle).is_err() {
                            break;
                        }
                    }
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    engine.destroy();
    for worker in workers {
        worker.join().unwrap();
    }

    let status = engine.status();
    assert!(status.shutting_down);
    assert!(status.pools.is_empty());
    assert_eq!(status.memory.allocated, 0);
}
