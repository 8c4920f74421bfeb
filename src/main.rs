//! Mem Vault demo
//!
//! Fills a cache past its memory bound and reports which keys survived.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mem_vault::{Cache, Config};

/// Room left in each third of the cache for key and header overhead.
const ENTRY_HEADROOM: usize = 1024;

/// Entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Fill the cache with three values of a third of its capacity each
/// 4. Insert a fourth value and check that the oldest key was evicted
/// 5. Print statistics as JSON
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mem_vault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!("Configuration loaded: capacity_mb={}", config.capacity_mb);

    let cache: Cache<String, String> =
        Cache::from_config(&config).context("failed to create cache")?;
    let chunk = "x".repeat((cache.capacity() / 3).saturating_sub(ENTRY_HEADROOM));

    for key in ["a", "b", "c"] {
        cache.set(key.to_string(), chunk.clone());
    }
    for key in ["a", "b", "c"] {
        info!("{}: {}", key, cache.get(key).is_some());
    }

    // 'a' is now least recently used
    cache.set("d".to_string(), chunk);
    info!("d: {}", cache.get("d").is_some());
    info!("a: {}", cache.get("a").is_some());

    let stats = serde_json::to_string_pretty(&cache.stats()).context("failed to encode stats")?;
    println!("{}", stats);

    Ok(())
}
