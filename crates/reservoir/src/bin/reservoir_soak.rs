//! # RESERVOIR Soak Test
//!
//! Drives a pooling engine with a synthetic multi-threaded workload and prints
//! status snapshots while maintenance runs in the background.
//!
//! ## Usage
//!
//! ```bash
//! reservoir_soak --config config/reservoir.toml --threads 8 --cycles 5 --ops 2000
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reservoir::{EngineConfig, PoolConfiguration, PoolingEngine, ResourceHandle, ResourceKind};

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         RESERVOIR SOAK TEST                                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut threads = 4usize;
    let mut cycles = 3usize;
    let mut ops = 1_000usize;
    let mut seed = 0x5EED_u64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--threads" | "-t" => {
                if i + 1 < args.len() {
                    threads = args[i + 1].parse().unwrap_or(4);
                    i += 1;
                }
            }
            "--cycles" | "-n" => {
                if i + 1 < args.len() {
                    cycles = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--ops" | "-o" => {
                if i + 1 < args.len() {
                    ops = args[i + 1].parse().unwrap_or(1_000);
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    seed = args[i + 1].parse().unwrap_or(seed);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: reservoir_soak [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>     Engine config (default: built-in pools)");
                println!("  -t, --threads <NUM>     Worker threads (default: 4)");
                println!("  -n, --cycles <NUM>      Workload cycles (default: 3)");
                println!("  -o, --ops <NUM>         Operations per thread per cycle (default: 1000)");
                println!("  -s, --seed <NUM>        RNG seed");
                println!("  -h, --help              Show this help");
                return;
            }
            _ => {}
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        },
        None => builtin_config(),
    };

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Pools:              {}", config.pools.len());
    println!("│ Memory Limit:       {} bytes", config.memory.limit_bytes);
    println!("│ Maintenance:        {} ms", config.maintenance_interval_ms);
    println!("│ Threads:            {threads}");
    println!("│ Cycles:             {cycles}");
    println!("│ Ops/Thread/Cycle:   {ops}");
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let engine = match PoolingEngine::from_config(&config) {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    let pools: Arc<Vec<String>> = Arc::new(engine.pool_names());
    if pools.is_empty() {
        eprintln!("error: configuration defines no pools");
        std::process::exit(1);
    }

    let start = Instant::now();
    let mut exhausted_total = 0usize;

    for cycle in 1..=cycles {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let engine = Arc::clone(&engine);
                let pools = Arc::clone(&pools);
                let thread_seed = seed ^ ((cycle as u64) << 32) ^ t as u64;
                thread::spawn(move || run_worker(&engine, &pools, ops, thread_seed))
            })
            .collect();

        let mut exhausted = 0usize;
        for handle in handles {
            exhausted += handle.join().unwrap_or(0);
        }
        exhausted_total += exhausted;

        let drained = engine.drain_recycler();
        let report = engine.optimize();
        let status = engine.status();

        println!("┌─ CYCLE {cycle} ─────────────────────────────────────────────────────");
        println!("│ Exhausted acquires: {exhausted}");
        println!("│ Recycled/Disposed:  {}/{}", drained.recycled, drained.disposed);
        println!(
            "│ Evicted idle:       {}  shrunk: {}",
            report.evicted_idle(),
            report.shrunk()
        );
        for growth in &report.growth {
            println!(
                "│ Grow {}:{:>8} -> {}",
                growth.pool, growth.current_size, growth.target_size
            );
        }
        println!(
            "│ Memory:             {} / {} bytes ({:.1}% granted)",
            status.memory.allocated,
            status.memory.limit,
            status.memory.efficiency * 100.0
        );
        for pool in &status.pools {
            println!(
                "│ {:<10} len {:>5}  avail {:>5}  hit {:>5.1}%",
                pool.name,
                pool.len,
                pool.available,
                pool.hit_ratio * 100.0
            );
        }
        println!("└──────────────────────────────────────────────────────────────────");
        println!();
    }

    let status = engine.status();
    match status.to_toml() {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("status not serializable: {err}"),
    }

    engine.destroy();
    let after = engine.status();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    SOAK COMPLETE                                 ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Elapsed:            {:>10.2} s", start.elapsed().as_secs_f64());
    println!("║ Exhausted acquires: {exhausted_total:>10}");
    println!("║ Bytes after destroy:{:>10}", after.memory.allocated);
    println!("╚══════════════════════════════════════════════════════════════════╝");
}

/// Random acquire/release traffic. Returns how many acquires found the pool exhausted.
fn run_worker(engine: &PoolingEngine, pools: &[String], ops: usize, seed: u64) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut held: Vec<ResourceHandle> = Vec::new();
    let mut exhausted = 0;

    for _ in 0..ops {
        if held.is_empty() || rng.gen_bool(0.55) {
            let pool = &pools[rng.gen_range(0..pools.len())];
            match engine.acquire(pool, None) {
                Ok(Some(mut handle)) => {
                    touch(&mut handle, &mut rng);
                    held.push(handle);
                }
                Ok(None) => exhausted += 1,
                Err(err) => {
                    eprintln!("acquire failed: {err}");
                    break;
                }
            }
        } else {
            let handle = held.swap_remove(rng.gen_range(0..held.len()));
            let pool = handle.pool().to_string();
            if let Err(err) = engine.release(&pool, handle) {
                eprintln!("release failed: {err}");
            }
        }
        if rng.gen_ratio(1, 200) {
            thread::sleep(Duration::from_micros(50));
        }
    }

    for handle in held {
        let pool = handle.pool().to_string();
        if let Err(err) = engine.release(&pool, handle) {
            eprintln!("release failed: {err}");
        }
    }
    exhausted
}

/// Dirties the payload so recycling has something to reset.
fn touch(handle: &mut ResourceHandle, rng: &mut StdRng) {
    if let Some(particle) = handle.as_particle_mut() {
        particle.position_age = [rng.gen(), rng.gen(), rng.gen(), 0.0];
    } else if let Some(buffer) = handle.as_buffer_mut() {
        buffer.data.extend((0..rng.gen_range(1..64)).map(|_| rng.gen::<u8>()));
    } else if let Some(h) = handle.as_handle_mut() {
        h.raw = Some(rng.gen());
        h.generation += 1;
    } else if let Some(texture) = handle.as_texture_mut() {
        if let Some(px) = texture.pixels.first_mut() {
            *px = 0xFF;
        }
    }
}

fn builtin_config() -> EngineConfig {
    let mut config = EngineConfig {
        maintenance_interval_ms: 100,
        ..EngineConfig::default()
    };
    config.memory.limit_bytes = 8 * 1024 * 1024;
    config.pools = vec![
        PoolConfiguration {
            initial_size: 64,
            max_size: 1_024,
            preallocate: true,
            ..PoolConfiguration::new("sparks", ResourceKind::Particle)
        },
        PoolConfiguration {
            initial_size: 8,
            max_size: 256,
            recycle: reservoir::RecycleMode::Always,
            ..PoolConfiguration::new("scratch", ResourceKind::Buffer)
        },
    ];
    config
}
