//! Rolling observability counters: per-vendor call performance and
//! per-SKU request popularity. Read-only outward; neither affects
//! pipeline control flow.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::{Sku, UtcDateTime, VendorId};

/// Rolling per-vendor call statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorPerformance {
    pub vendor: VendorId,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_latency_ms: f64,
    pub last_failure: Option<UtcDateTime>,
}

impl VendorPerformance {
    fn new(vendor: VendorId) -> Self {
        Self {
            vendor,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            avg_latency_ms: 0.0,
            last_failure: None,
        }
    }

    pub fn success_rate_percent(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }
}

/// Append-only recorder of (vendor, latency, outcome) per attempt.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    inner: Mutex<HashMap<VendorId, VendorPerformance>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, vendor: VendorId, success: bool, latency_ms: f64) {
        let mut inner = self
            .inner
            .lock()
            .expect("performance tracker lock is not poisoned");
        let stats = inner
            .entry(vendor)
            .or_insert_with(|| VendorPerformance::new(vendor));

        stats.total_requests += 1;
        if success {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
            stats.last_failure = Some(UtcDateTime::now());
        }

        // Simple moving average over all recorded attempts.
        stats.avg_latency_ms = (stats.avg_latency_ms * (stats.total_requests - 1) as f64
            + latency_ms)
            / stats.total_requests as f64;
    }

    /// Snapshot for the admin surface, ordered by vendor id.
    pub fn snapshot(&self) -> Vec<VendorPerformance> {
        let inner = self
            .inner
            .lock()
            .expect("performance tracker lock is not poisoned");
        let mut stats = VendorId::ALL
            .iter()
            .map(|vendor| {
                inner
                    .get(vendor)
                    .cloned()
                    .unwrap_or_else(|| VendorPerformance::new(*vendor))
            })
            .collect::<Vec<_>>();
        stats.sort_by_key(|s| s.vendor);
        stats
    }
}

/// Per-SKU request counter feeding the prewarm scheduler.
#[derive(Debug, Default)]
pub struct PopularityTracker {
    inner: Mutex<HashMap<Sku, u64>>,
}

impl PopularityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sku: &Sku) {
        let mut inner = self
            .inner
            .lock()
            .expect("popularity tracker lock is not poisoned");
        *inner.entry(sku.clone()).or_insert(0) += 1;
    }

    /// Top `n` SKUs by request count, count descending then SKU
    /// ascending so equal counts stay stable across snapshots.
    pub fn top(&self, n: usize) -> Vec<(Sku, u64)> {
        let inner = self
            .inner
            .lock()
            .expect("popularity tracker lock is not poisoned");
        let mut entries = inner
            .iter()
            .map(|(sku, count)| (sku.clone(), *count))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_average_is_a_running_mean() {
        let tracker = PerformanceTracker::new();
        tracker.record(VendorId::Shopwave, true, 10.0);
        tracker.record(VendorId::Shopwave, true, 30.0);

        let snapshot = tracker.snapshot();
        let shopwave = snapshot
            .iter()
            .find(|s| s.vendor == VendorId::Shopwave)
            .expect("shopwave stats present");
        assert_eq!(shopwave.total_requests, 2);
        assert!((shopwave.avg_latency_ms - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failures_record_last_failure_timestamp() {
        let tracker = PerformanceTracker::new();
        tracker.record(VendorId::Mercantile, false, 5.0);

        let snapshot = tracker.snapshot();
        let mercantile = snapshot
            .iter()
            .find(|s| s.vendor == VendorId::Mercantile)
            .expect("mercantile stats present");
        assert_eq!(mercantile.failed_requests, 1);
        assert!(mercantile.last_failure.is_some());
        assert_eq!(mercantile.success_rate_percent(), 0.0);
    }

    #[test]
    fn snapshot_covers_all_vendors_even_without_traffic() {
        let tracker = PerformanceTracker::new();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), VendorId::ALL.len());
        assert!(snapshot.iter().all(|s| s.total_requests == 0));
    }

    #[test]
    fn popularity_top_orders_by_count_then_sku() {
        let tracker = PopularityTracker::new();
        let abc = Sku::parse("ABC123").expect("valid sku");
        let xyz = Sku::parse("XYZ789").expect("valid sku");
        let def = Sku::parse("DEF456").expect("valid sku");

        tracker.record(&abc);
        tracker.record(&abc);
        tracker.record(&xyz);
        tracker.record(&def);

        let top = tracker.top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], (abc, 2));
        assert_eq!(top[1], (def, 1));
    }
}
