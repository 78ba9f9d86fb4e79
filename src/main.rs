//! ttlcache-load - drives a cache from many threads and reports throughput
//!
//! Cache settings come from the `TTLCACHE_*` variables (see `CacheConfig`),
//! workload settings from `LOAD_*` variables. The report is printed as JSON.

use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttlcache::{CacheConfig, TtlCache};

/// Workload parameters.
#[derive(Debug, Clone, Copy)]
struct LoadConfig {
    /// Number of worker threads
    threads: usize,
    /// Operations issued by each thread
    ops_per_thread: usize,
    /// Number of distinct keys
    key_space: usize,
    /// TTL for written entries in seconds
    ttl_secs: u64,
}

impl LoadConfig {
    /// # Environment Variables
    /// - `LOAD_THREADS` - Worker threads (default: available parallelism)
    /// - `LOAD_OPS` - Operations per thread (default: 100000)
    /// - `LOAD_KEYS` - Distinct keys (default: 10000)
    /// - `LOAD_TTL` - Entry TTL in seconds (default: 60)
    fn from_env() -> Self {
        let default_threads = thread::available_parallelism().map_or(4, |n| n.get());
        Self {
            threads: parse_env::<usize>("LOAD_THREADS").unwrap_or(default_threads).max(1),
            ops_per_thread: parse_env::<usize>("LOAD_OPS").unwrap_or(100_000),
            key_space: parse_env::<usize>("LOAD_KEYS").unwrap_or(10_000).max(1),
            ttl_secs: parse_env::<u64>("LOAD_TTL").unwrap_or(60).max(1),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Outcome of one load run.
#[derive(Debug, Serialize)]
struct RunReport {
    threads: usize,
    ops_per_thread: usize,
    elapsed_ms: u128,
    ops_per_sec: f64,
    hits: u64,
    misses: u64,
    items: usize,
}

/// Runs the mixed workload: even operations write, odd operations read.
///
/// # Errors
/// Fails if any worker thread panicked; its counts would be missing from the
/// report.
fn run_load(cache: &TtlCache<String>, load: LoadConfig) -> anyhow::Result<RunReport> {
    let started = Instant::now();

    let results = thread::scope(|scope| {
        let workers: Vec<_> = (0..load.threads)
            .map(|worker| {
                scope.spawn(move || {
                    let (mut hits, mut misses) = (0u64, 0u64);
                    for i in 0..load.ops_per_thread {
                        let key = format!("small-{}", (i * (worker + 1)) % load.key_space);
                        if i % 2 == 0 {
                            cache.set(key, format!("value-{i}"), load.ttl_secs);
                        } else if cache.get(&key).is_some() {
                            hits += 1;
                        } else {
                            misses += 1;
                        }
                    }
                    (hits, misses)
                })
            })
            .collect();

        workers.into_iter().map(|w| w.join()).collect::<Vec<_>>()
    });
    let (hits, misses) = sum_worker_counts(results)?;

    let elapsed = started.elapsed();
    let total_ops = (load.threads * load.ops_per_thread) as f64;

    Ok(RunReport {
        threads: load.threads,
        ops_per_thread: load.ops_per_thread,
        elapsed_ms: elapsed.as_millis(),
        ops_per_sec: total_ops / elapsed.as_secs_f64().max(f64::EPSILON),
        hits,
        misses,
        items: cache.items(),
    })
}

/// Adds up per-worker (hits, misses), failing on the first panicked worker.
fn sum_worker_counts(results: Vec<thread::Result<(u64, u64)>>) -> anyhow::Result<(u64, u64)> {
    results
        .into_iter()
        .enumerate()
        .try_fold((0, 0), |(hits, misses), (worker, result)| {
            let (h, m) = result.map_err(|_| anyhow!("load worker {} panicked", worker))?;
            Ok((hits + h, misses + m))
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttlcache=info,ttlcache_load=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    let load = LoadConfig::from_env();
    info!(
        "Load run: threads={}, ops_per_thread={}, keys={}, ttl={}s",
        load.threads, load.ops_per_thread, load.key_space, load.ttl_secs
    );

    let cache: Arc<TtlCache<String>> =
        Arc::new(TtlCache::new(config).context("failed to build cache")?);

    let report = tokio::task::spawn_blocking({
        let cache = cache.clone();
        move || run_load(&cache, load)
    })
    .await
    .context("load run task failed")??;

    println!("{}", serde_json::to_string_pretty(&report)?);

    match Arc::try_unwrap(cache) {
        Ok(cache) => cache.shutdown(),
        Err(_) => warn!("Cache still shared at exit, background threads stop on drop"),
    }

    info!("Load run complete");
    Ok(())
}
