//! Background cache prewarming for frequently requested SKUs.
//!
//! A single spawned task sweeps on a fixed interval, refreshing the
//! cache entry for each target SKU through the full aggregation
//! pipeline. Until real traffic has accumulated, a seed list stands in
//! for the popularity ranking so a fresh process still warms something
//! useful.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::engine::AggregationEngine;
use crate::{SelectionStatus, Sku};

/// SKUs warmed before any popularity data exists.
pub const SEED_SKUS: [&str; 5] = ["ABC123", "XYZ789", "DEF456", "GHI012", "JKL345"];

#[derive(Debug, Clone)]
pub struct PrewarmConfig {
    pub interval: Duration,
    /// How many of the most-requested SKUs each sweep refreshes.
    pub top_n: usize,
    pub seed_skus: Vec<Sku>,
}

impl Default for PrewarmConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            top_n: 10,
            seed_skus: SEED_SKUS
                .iter()
                .filter_map(|raw| Sku::parse(raw).ok())
                .collect(),
        }
    }
}

/// Handle to the running prewarm task.
pub struct PrewarmScheduler {
    shutdown: watch::Sender<bool>,
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl PrewarmScheduler {
    /// Start sweeping. The first sweep runs immediately, then once per
    /// configured interval.
    pub fn spawn(engine: Arc<AggregationEngine>, config: PrewarmConfig) -> Self {
        let (shutdown, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_sweep(&engine, &config).await;
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("prewarm scheduler stopped");
        });

        Self {
            shutdown,
            handle: tokio::sync::Mutex::new(Some(handle)),
        }
    }

    /// Stop the sweep loop and wait for it to exit. Safe to call more
    /// than once.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }
}

/// The SKUs one sweep will refresh: the popularity top-N, or the seed
/// list while no requests have been counted yet.
fn sweep_targets(engine: &AggregationEngine, config: &PrewarmConfig) -> Vec<Sku> {
    let ranked = engine.popular_skus(config.top_n);
    if ranked.is_empty() {
        return config.seed_skus.clone();
    }
    ranked.into_iter().map(|(sku, _)| sku).collect()
}

async fn run_sweep(engine: &AggregationEngine, config: &PrewarmConfig) {
    let targets = sweep_targets(engine, config);
    tracing::debug!(count = targets.len(), "prewarm sweep starting");

    for sku in targets {
        let result = engine.refresh(&sku).await;
        if result.status == SelectionStatus::Unavailable {
            // Keep sweeping; one unreachable SKU must not starve the rest.
            tracing::warn!(sku = sku.as_str(), "prewarm found no usable vendor");
        } else {
            tracing::debug!(
                sku = sku.as_str(),
                vendors_usable = result.vendors_usable,
                "prewarmed"
            );
        }
    }
}
