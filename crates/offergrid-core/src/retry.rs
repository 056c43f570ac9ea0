//! Bounded retries with backoff under a per-attempt timeout, gated by
//! the vendor's circuit breaker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::circuit_breaker::CircuitBreaker;
use crate::tracking::PerformanceTracker;
use crate::vendor::{RawVendorOffer, VendorClient, VendorError};
use crate::Sku;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Delay grows by a fixed step per attempt: `step`, `2*step`, ...
    Linear {
        step: Duration,
    },
    /// Delay is `base * (factor ^ attempt)`, capped at `max`, with
    /// optional +/- 50% jitter.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            step: Duration::from_millis(100),
        }
    }
}

impl Backoff {
    /// Delay before the retry following attempt number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Linear { step } => step.saturating_mul(attempt.saturating_add(1)),
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Configuration for retrying vendor calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Additional attempts after the first. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Hard timeout applied to every individual attempt.
    pub attempt_timeout: Duration,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(2),
            backoff: Backoff::default(),
        }
    }
}

/// Wraps one vendor client with timeout, bounded retries and circuit
/// breaker consultation.
///
/// Every real attempt is reported to the breaker and the performance
/// tracker; open-circuit rejections consume no retry budget and are
/// reported to neither.
pub struct RetryingCaller {
    client: Arc<dyn VendorClient>,
    breaker: Arc<CircuitBreaker>,
    config: RetryConfig,
}

impl RetryingCaller {
    pub fn new(
        client: Arc<dyn VendorClient>,
        breaker: Arc<CircuitBreaker>,
        config: RetryConfig,
    ) -> Self {
        Self {
            client,
            breaker,
            config,
        }
    }

    pub fn vendor(&self) -> crate::VendorId {
        self.client.id()
    }

    /// Call the vendor, retrying on failure or timeout. Exhausting the
    /// budget yields the last failure as a value; the aggregation
    /// simply proceeds with one fewer offer.
    pub async fn call(
        &self,
        sku: &Sku,
        tracker: &PerformanceTracker,
    ) -> Result<RawVendorOffer, VendorError> {
        let vendor = self.client.id();
        let mut last_error = VendorError::circuit_open(vendor);

        for attempt in 0..=self.config.max_retries {
            if !self.breaker.allow_request() {
                return Err(VendorError::circuit_open(vendor));
            }

            let started = Instant::now();
            let outcome =
                tokio::time::timeout(self.config.attempt_timeout, self.client.fetch(sku)).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;

            let result = match outcome {
                Ok(result) => result,
                Err(_) => Err(VendorError::timeout(
                    vendor,
                    format!(
                        "attempt exceeded {}ms timeout",
                        self.config.attempt_timeout.as_millis()
                    ),
                )),
            };

            match result {
                Ok(raw) => {
                    self.breaker.record_success();
                    tracker.record(vendor, true, latency_ms);
                    return Ok(raw);
                }
                Err(error) => {
                    self.breaker.record_failure();
                    tracker.record(vendor, false, latency_ms);
                    tracing::debug!(
                        vendor = vendor.as_str(),
                        attempt,
                        error = %error,
                        "vendor call attempt failed"
                    );
                    last_error = error;
                }
            }

            if attempt < self.config.max_retries {
                tokio::time::sleep(self.config.backoff.delay(attempt)).await;
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::{CircuitBreakerConfig, CircuitState};
    use crate::vendor::VendorErrorKind;
    use crate::VendorId;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedVendor {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    impl ScriptedVendor {
        fn failing_first(failures_before_success: u32) -> Self {
            Self {
                failures_before_success,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl VendorClient for ScriptedVendor {
        fn id(&self) -> VendorId {
            VendorId::Shopwave
        }

        fn fetch<'a>(
            &'a self,
            sku: &'a Sku,
        ) -> Pin<Box<dyn Future<Output = Result<RawVendorOffer, VendorError>> + Send + 'a>>
        {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = call < self.failures_before_success;
            Box::pin(async move {
                if fail {
                    Err(VendorError::transport(VendorId::Shopwave, "scripted failure"))
                } else {
                    Ok(RawVendorOffer::Shopwave(crate::vendor::ShopwavePayload {
                        product_id: sku.as_str().to_owned(),
                        availability: String::from("IN_STOCK"),
                        inventory_count: Some(10),
                        unit_price: 19.99,
                        last_updated: crate::UtcDateTime::now().format_rfc3339(),
                    }))
                }
            })
        }
    }

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            attempt_timeout: Duration::from_millis(200),
            backoff: Backoff::Linear {
                step: Duration::from_millis(1),
            },
        }
    }

    #[test]
    fn linear_backoff_grows_per_attempt() {
        let backoff = Backoff::Linear {
            step: Duration::from_millis(100),
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(300));
    }

    #[test]
    fn exponential_backoff_caps_at_max() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let caller = RetryingCaller::new(
            Arc::new(ScriptedVendor::failing_first(2)),
            Arc::new(CircuitBreaker::default()),
            fast_config(),
        );
        let tracker = PerformanceTracker::new();
        let sku = Sku::parse("ABC123").expect("valid sku");

        let raw = caller.call(&sku, &tracker).await.expect("third attempt wins");
        assert_eq!(raw.vendor(), VendorId::Shopwave);

        let stats = tracker.snapshot();
        let shopwave = stats
            .iter()
            .find(|s| s.vendor == VendorId::Shopwave)
            .expect("stats present");
        assert_eq!(shopwave.total_requests, 3);
        assert_eq!(shopwave.failed_requests, 2);
    }

    #[tokio::test]
    async fn exhausted_retries_yield_last_failure() {
        let caller = RetryingCaller::new(
            Arc::new(ScriptedVendor::failing_first(10)),
            Arc::new(CircuitBreaker::default()),
            fast_config(),
        );
        let tracker = PerformanceTracker::new();
        let sku = Sku::parse("ABC123").expect("valid sku");

        let err = caller.call(&sku, &tracker).await.expect_err("budget exhausted");
        assert_eq!(err.kind(), VendorErrorKind::Transport);
    }

    #[tokio::test]
    async fn open_circuit_short_circuits_without_attempting() {
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            cooldown: Duration::from_secs(30),
        }));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        let vendor = Arc::new(ScriptedVendor::failing_first(0));
        let caller = RetryingCaller::new(vendor.clone(), breaker, fast_config());
        let tracker = PerformanceTracker::new();
        let sku = Sku::parse("ABC123").expect("valid sku");

        let err = caller.call(&sku, &tracker).await.expect_err("must reject");
        assert_eq!(err.kind(), VendorErrorKind::CircuitOpen);
        assert_eq!(vendor.calls.load(Ordering::SeqCst), 0);

        // No real attempt happened, so nothing was recorded.
        let stats = tracker.snapshot();
        assert!(stats.iter().all(|s| s.total_requests == 0));
    }

    #[tokio::test]
    async fn slow_vendor_attempt_times_out() {
        struct SlowVendor;
        impl VendorClient for SlowVendor {
            fn id(&self) -> VendorId {
                VendorId::Mercantile
            }

            fn fetch<'a>(
                &'a self,
                _sku: &'a Sku,
            ) -> Pin<Box<dyn Future<Output = Result<RawVendorOffer, VendorError>> + Send + 'a>>
            {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Err(VendorError::transport(VendorId::Mercantile, "unreachable"))
                })
            }
        }

        let caller = RetryingCaller::new(
            Arc::new(SlowVendor),
            Arc::new(CircuitBreaker::default()),
            RetryConfig {
                max_retries: 0,
                attempt_timeout: Duration::from_millis(10),
                backoff: Backoff::default(),
            },
        );
        let tracker = PerformanceTracker::new();
        let sku = Sku::parse("ABC123").expect("valid sku");

        let err = caller.call(&sku, &tracker).await.expect_err("must time out");
        assert_eq!(err.kind(), VendorErrorKind::Timeout);
    }
}
