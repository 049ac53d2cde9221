//! Integration tests for engine lifecycle: configuration loading, background
//! maintenance and teardown.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use reservoir::{
    EngineBuilder, EngineConfig, PoolConfiguration, PoolError, PoolingEngine, RecycleMode,
    ResetStrategy, Resource, ResourceHandle, ResourceKind,
};

fn sample_config_path() -> String {
    format!("{}/../../config/reservoir.toml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_sample_config_builds_engine() {
    let config = EngineConfig::load(sample_config_path()).unwrap();
    let engine = PoolingEngine::from_config(&config).unwrap();

    assert_eq!(
        engine.pool_names(),
        vec!["atlases", "handles", "scratch", "sparks"]
    );
    let status = engine.status();
    let sparks = status.pool("sparks").unwrap();
    assert_eq!(sparks.kind, ResourceKind::Particle);
    assert_eq!(sparks.available, 256);
    assert_eq!(sparks.strategy, "adaptive");
    assert_eq!(status.pool("scratch").unwrap().strategy, "lru");
    assert_eq!(status.memory.limit, config.memory.limit_bytes);

    engine.destroy();
    assert_eq!(engine.status().memory.allocated, 0);
}

#[test]
fn test_background_maintenance_drains_recycler() {
    let engine = PoolingEngine::builder()
        .memory_limit(1 << 20)
        .maintenance_interval(Duration::from_millis(5))
        .build()
        .unwrap();
    engine
        .create_pool(
            "bg",
            PoolConfiguration {
                recycle: RecycleMode::Always,
                cleanup_interval_ms: 1,
                ..PoolConfiguration::new("bg", ResourceKind::Buffer)
            },
        )
        .unwrap();

    let mut handle = engine.acquire("bg", None).unwrap().unwrap();
    handle.as_buffer_mut().unwrap().data.extend_from_slice(b"payload");
    engine.release("bg", handle).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let status = engine.status();
        let pool = status.pool("bg").unwrap();
        if pool.recycling == 0 && pool.available == 1 {
            break;
        }
        assert!(Instant::now() < deadline, "recycler was never drained");
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(engine.status().recycler.recycled, 1);
}

#[test]
fn test_destroy_is_idempotent_and_final() {
    let engine = PoolingEngine::builder()
        .memory_limit(1 << 20)
        .maintenance_interval(Duration::from_millis(5))
        .build()
        .unwrap();
    engine
        .create_pool(
            "x",
            PoolConfiguration {
                initial_size: 2,
                preallocate: true,
                recycle: RecycleMode::Always,
                ..PoolConfiguration::new("x", ResourceKind::Texture)
            },
        )
        .unwrap();

    let held = engine.acquire("x", None).unwrap().unwrap();
    let queued = engine.acquire("x", None).unwrap().unwrap();
    engine.release("x", queued).unwrap();
    assert!(engine.status().memory.allocated > 0);

    engine.destroy();
    engine.destroy();

    assert!(engine.is_destroyed());
    let status = engine.status();
    assert_eq!(status.memory.allocated, 0);
    assert!(status.pools.is_empty());
    assert_eq!(status.recycler.queue_depth, 0);

    assert_eq!(engine.release("x", held), Err(PoolError::ShuttingDown));
    assert_eq!(
        engine.acquire("x", None).unwrap_err(),
        PoolError::ShuttingDown
    );
    assert_eq!(
        engine.create_pool("y", PoolConfiguration::new("y", ResourceKind::Handle)),
        Err(PoolError::ShuttingDown)
    );
}

#[test]
fn test_destroy_pool_releases_memory() {
    let engine = PoolingEngine::builder()
        .memory_limit(1 << 20)
        .without_maintenance()
        .build()
        .unwrap();
    for (name, kind) in [("keep", ResourceKind::Handle), ("drop", ResourceKind::Buffer)] {
        engine
            .create_pool(
                name,
                PoolConfiguration {
                    initial_size: 3,
                    preallocate: true,
                    ..PoolConfiguration::new(name, kind)
                },
            )
            .unwrap();
    }
    let keep_bytes = engine.status().pool("keep").unwrap().bytes;

    engine.destroy_pool("drop").unwrap();

    assert_eq!(engine.pool_names(), vec!["keep".to_string()]);
    assert_eq!(engine.status().memory.allocated, keep_bytes);
    assert!(matches!(
        engine.acquire("drop", None),
        Err(PoolError::UnknownPool(_))
    ));
    assert_eq!(
        engine.destroy_pool("drop"),
        Err(PoolError::UnknownPool("drop".to_string()))
    );
}

#[test]
fn test_recycled_resource_of_destroyed_pool_is_disposed() {
    let engine = PoolingEngine::builder()
        .memory_limit(1 << 20)
        .without_maintenance()
        .build()
        .unwrap();
    engine
        .create_pool(
            "gone",
            PoolConfiguration {
                recycle: RecycleMode::Always,
                ..PoolConfiguration::new("gone", ResourceKind::Particle)
            },
        )
        .unwrap();

    let handle = engine.acquire("gone", None).unwrap().unwrap();
    engine.release("gone", handle).unwrap();
    engine.destroy_pool("gone").unwrap();

    let drained = engine.drain_recycler();
    assert_eq!(drained.recycled, 0);
    assert_eq!(drained.disposed, 1);
    assert_eq!(engine.status().memory.allocated, 0);
}

struct RejectEverything;

impl ResetStrategy for RejectEverything {
    fn validate(&self, _resource: &Resource) -> bool {
        false
    }

    fn cleanup(&self, _resource: &mut Resource) -> Result<(), PoolError> {
        Ok(())
    }
}

/// Recycles one texture out of "x", then replaces "x" with a one-slot buffer
/// pool that is fully checked out.
fn reuse_name_with_queued_texture(builder: EngineBuilder) -> (PoolingEngine, ResourceHandle) {
    let engine = builder
        .memory_limit(1 << 20)
        .without_maintenance()
        .build()
        .unwrap();
    engine
        .create_pool(
            "x",
            PoolConfiguration {
                recycle: RecycleMode::Always,
                ..PoolConfiguration::new("x", ResourceKind::Texture)
            },
        )
        .unwrap();
    let texture = engine.acquire("x", None).unwrap().unwrap();
    engine.release("x", texture).unwrap();
    engine.destroy_pool("x").unwrap();

    engine
        .create_pool(
            "x",
            PoolConfiguration {
                initial_size: 0,
                max_size: 1,
                ..PoolConfiguration::new("x", ResourceKind::Buffer)
            },
        )
        .unwrap();
    let buffer = engine.acquire("x", Some(ResourceKind::Buffer)).unwrap().unwrap();
    (engine, buffer)
}

#[test]
fn test_recycled_resource_never_joins_pool_with_reused_name() {
    let (engine, buffer) = reuse_name_with_queued_texture(PoolingEngine::builder());

    let drained = engine.drain_recycler();
    assert_eq!(drained.recycled, 0);
    assert_eq!(drained.disposed, 1);

    let status = engine.status();
    let pool = status.pool("x").unwrap();
    assert_eq!(pool.len, 1);
    assert!(pool.len <= pool.max_size);
    assert_eq!(pool.available, 0);
    assert_eq!(status.memory.allocated, pool.bytes);

    assert!(engine.acquire("x", Some(ResourceKind::Buffer)).unwrap().is_none());
    engine.release("x", buffer).unwrap();
    let again = engine.acquire("x", None).unwrap().unwrap();
    assert_eq!(again.kind(), ResourceKind::Buffer);
    engine.release("x", again).unwrap();
}

#[test]
fn test_failed_recycle_does_not_touch_pool_with_reused_name() {
    let builder =
        PoolingEngine::builder().reset_strategy(ResourceKind::Texture, Arc::new(RejectEverything));
    let (engine, buffer) = reuse_name_with_queued_texture(builder);
    let bytes_before = engine.status().pool("x").unwrap().bytes;

    let drained = engine.drain_recycler();
    assert_eq!(drained.disposed, 1);

    let status = engine.status();
    let pool = status.pool("x").unwrap();
    assert_eq!(pool.bytes, bytes_before);
    assert_eq!(pool.len, 1);
    assert_eq!(status.memory.allocated, pool.bytes);
    engine.release("x", buffer).unwrap();
}

#[test]
fn test_partial_preallocation_is_not_fatal() {
    // Room for two 4 KiB buffers under the 80% headroom, not for eight.
    let engine = PoolingEngine::builder()
        .memory_limit(12 * 1024)
        .without_maintenance()
        .build()
        .unwrap();
    engine
        .create_pool(
            "small",
            PoolConfiguration {
                initial_size: 8,
                max_size: 8,
                preallocate: true,
                ..PoolConfiguration::new("small", ResourceKind::Buffer)
            },
        )
        .unwrap();

    let status = engine.status();
    assert_eq!(status.pool("small").unwrap().available, 2);
    assert!(status.memory.allocated < status.memory.limit);
}
