//! Behavior-driven tests for vendor call resilience
//!
//! These tests verify HOW the engine protects itself from a misbehaving
//! vendor: retry budgets, per-attempt timeouts, and the circuit breaker
//! lifecycle as observed through real lookups.

use std::time::Duration;

use offergrid_core::{
    Backoff, CircuitBreaker, CircuitBreakerConfig, CircuitState, EngineBuilder, EngineConfig,
    PerformanceTracker, RetryConfig, RetryingCaller, SelectionStatus, Sku, VendorErrorKind,
    VendorId,
};
use offergrid_tests::{shopwave_offer, Arc, ScriptedVendor, VendorError};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        attempt_timeout: Duration::from_millis(200),
        backoff: Backoff::Linear {
            step: Duration::from_millis(1),
        },
    }
}

fn sku() -> Sku {
    Sku::parse("ABC123").expect("valid sku")
}

// =============================================================================
// Circuit Breaker Lifecycle
// =============================================================================

#[tokio::test]
async fn when_a_vendor_keeps_failing_its_circuit_opens() {
    // Given: a vendor that fails every call, threshold 3
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 3,
        cooldown: Duration::from_secs(30),
    }));
    let caller = RetryingCaller::new(
        Arc::new(ScriptedVendor::always_failing(VendorId::Depotline)),
        breaker.clone(),
        fast_retry(),
    );
    let tracker = PerformanceTracker::new();

    // When: one call exhausts its 3-attempt budget
    let err = caller.call(&sku(), &tracker).await.expect_err("all attempts fail");

    // Then: the third consecutive failure opened the circuit
    assert_eq!(err.kind(), VendorErrorKind::Transport);
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn while_open_calls_are_rejected_without_touching_the_vendor() {
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 1,
        cooldown: Duration::from_secs(30),
    }));
    let caller = RetryingCaller::new(
        Arc::new(ScriptedVendor::always_failing(VendorId::Depotline)),
        breaker.clone(),
        RetryConfig {
            max_retries: 0,
            ..fast_retry()
        },
    );
    let tracker = PerformanceTracker::new();

    caller.call(&sku(), &tracker).await.expect_err("opens the circuit");
    let attempts_while_opening = tracker.snapshot()[0].total_requests;

    let err = caller.call(&sku(), &tracker).await.expect_err("must reject");

    assert_eq!(err.kind(), VendorErrorKind::CircuitOpen);
    // Rejections are not attempts; nothing further was recorded.
    let stats = tracker.snapshot();
    let depotline = stats
        .iter()
        .find(|s| s.vendor == VendorId::Depotline)
        .expect("stats present");
    assert_eq!(depotline.total_requests, attempts_while_opening);
    assert_eq!(breaker.consecutive_failures(), 1);
}

#[tokio::test]
async fn after_the_cooldown_a_successful_probe_closes_the_circuit() {
    // Given: an open circuit with a short cooldown and a vendor that
    // has recovered
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 1,
        cooldown: Duration::from_millis(30),
    }));
    let caller = RetryingCaller::new(
        Arc::new(ScriptedVendor::sequence(
            VendorId::Shopwave,
            vec![
                Err(VendorError::transport(VendorId::Shopwave, "outage")),
                Ok(shopwave_offer("ABC123", 19.99, Some(10))),
            ],
        )),
        breaker.clone(),
        RetryConfig {
            max_retries: 0,
            ..fast_retry()
        },
    );
    let tracker = PerformanceTracker::new();

    caller.call(&sku(), &tracker).await.expect_err("opens the circuit");
    assert_eq!(breaker.state(), CircuitState::Open);

    // When: the cooldown elapses and the next call probes
    tokio::time::sleep(Duration::from_millis(50)).await;
    let raw = caller.call(&sku(), &tracker).await.expect("probe succeeds");

    // Then: the circuit is fully closed again
    assert_eq!(raw.vendor(), VendorId::Shopwave);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[tokio::test]
async fn a_failed_probe_reopens_the_circuit_immediately() {
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 1,
        cooldown: Duration::from_millis(30),
    }));
    let caller = RetryingCaller::new(
        Arc::new(ScriptedVendor::always_failing(VendorId::Mercantile)),
        breaker.clone(),
        RetryConfig {
            max_retries: 0,
            ..fast_retry()
        },
    );
    let tracker = PerformanceTracker::new();

    caller.call(&sku(), &tracker).await.expect_err("opens the circuit");
    tokio::time::sleep(Duration::from_millis(50)).await;

    caller.call(&sku(), &tracker).await.expect_err("probe fails");

    assert_eq!(breaker.state(), CircuitState::Open);
    let err = caller.call(&sku(), &tracker).await.expect_err("must reject");
    assert_eq!(err.kind(), VendorErrorKind::CircuitOpen);
}

// =============================================================================
// Engine-Level Degradation
// =============================================================================

#[tokio::test]
async fn an_open_circuit_drops_the_vendor_from_aggregation_not_the_answer() {
    // Given: one healthy vendor and one that is permanently down, with
    // a tight retry budget so the circuit opens on the first lookup
    let engine = EngineBuilder::new()
        .with_config(EngineConfig {
            retry: RetryConfig {
                max_retries: 2,
                attempt_timeout: Duration::from_millis(200),
                backoff: Backoff::Linear {
                    step: Duration::from_millis(1),
                },
            },
            ..EngineConfig::default()
        })
        .with_vendor_clients(vec![
            Arc::new(ScriptedVendor::steady(shopwave_offer("ABC123", 19.99, Some(10)))),
            Arc::new(ScriptedVendor::always_failing(VendorId::Depotline)),
        ])
        .build();

    // When: the first lookup burns the failing vendor's attempt budget
    let first = engine.lookup("ABC123", "caller-a").await.expect("lookup ok");
    assert_eq!(first.status, SelectionStatus::Available);
    assert_eq!(first.vendors_checked, 1);

    // Then: its circuit is open and later lookups skip it outright
    let snapshots = engine.circuit_snapshots();
    let depotline = snapshots
        .iter()
        .find(|s| s.vendor == VendorId::Depotline)
        .expect("snapshot present");
    assert_eq!(depotline.state, CircuitState::Open);

    let second = engine.lookup("XYZ789", "caller-a").await.expect("lookup ok");
    assert_eq!(second.vendors_checked, 1);
    assert_eq!(second.best_vendor, Some(VendorId::Shopwave));
}

#[tokio::test]
async fn vendor_latency_and_failures_are_tracked_per_vendor() {
    let engine = EngineBuilder::new()
        .with_config(EngineConfig {
            retry: RetryConfig {
                max_retries: 0,
                attempt_timeout: Duration::from_millis(200),
                backoff: Backoff::Linear {
                    step: Duration::from_millis(1),
                },
            },
            ..EngineConfig::default()
        })
        .with_vendor_clients(vec![
            Arc::new(ScriptedVendor::steady(shopwave_offer("ABC123", 19.99, Some(10)))),
            Arc::new(ScriptedVendor::always_failing(VendorId::Depotline)),
        ])
        .build();

    engine.lookup("ABC123", "caller-a").await.expect("lookup ok");

    let stats = engine.performance_snapshot();
    let shopwave = stats
        .iter()
        .find(|s| s.vendor == VendorId::Shopwave)
        .expect("stats present");
    let depotline = stats
        .iter()
        .find(|s| s.vendor == VendorId::Depotline)
        .expect("stats present");

    assert_eq!(shopwave.successful_requests, 1);
    assert_eq!(shopwave.failed_requests, 0);
    assert_eq!(depotline.successful_requests, 0);
    assert_eq!(depotline.failed_requests, 1);
    assert!(depotline.last_failure.is_some());
    assert!(shopwave.last_failure.is_none());
}
