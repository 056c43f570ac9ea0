//! The aggregation engine: rate gate, cache, fan-out, normalize,
//! select, store.
//!
//! One `lookup` drives the whole pipeline for a SKU. The three vendor
//! calls run as independently spawned tasks, each bounded by its own
//! timeout and retry budget, so the overall wait is bounded by the
//! slowest vendor's worst case rather than the sum.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::adapters::{DepotlineClient, MercantileClient, ShopwaveClient};
use crate::cache::{CacheMode, MemoryStore, SelectionStore};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot};
use crate::http_client::{HttpAuth, ReqwestHttpClient};
use crate::normalize::{normalize, DEFAULT_FRESHNESS_WINDOW};
use crate::rate_limit::{RateDecision, RateLimitConfig, RateLimiter};
use crate::retry::{RetryConfig, RetryingCaller};
use crate::select::select_best;
use crate::tracking::{PerformanceTracker, PopularityTracker, VendorPerformance};
use crate::vendor::VendorClient;
use crate::{SelectionResult, Sku, UtcDateTime, ValidationError, VendorId};

/// Default TTL for cached selection results.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(120);

/// Client-facing rejections raised before any pipeline work begins.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    #[error(transparent)]
    InvalidSku(#[from] ValidationError),
    #[error("rate limit exceeded for caller '{caller}'")]
    RateLimited { caller: String },
}

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub retry: RetryConfig,
    pub circuit: CircuitBreakerConfig,
    pub rate_limit: RateLimitConfig,
    pub freshness_window: Duration,
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            circuit: CircuitBreakerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl EngineConfig {
    /// Read overrides from `OFFERGRID_*` environment variables, keeping
    /// coded defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = env_u64("OFFERGRID_MAX_RETRIES") {
            config.retry.max_retries = value as u32;
        }
        if let Some(value) = env_u64("OFFERGRID_ATTEMPT_TIMEOUT_MS") {
            config.retry.attempt_timeout = Duration::from_millis(value);
        }
        if let Some(value) = env_u64("OFFERGRID_CIRCUIT_THRESHOLD") {
            config.circuit.failure_threshold = value as u32;
        }
        if let Some(value) = env_u64("OFFERGRID_CIRCUIT_COOLDOWN_SECS") {
            config.circuit.cooldown = Duration::from_secs(value);
        }
        if let Some(value) = env_u64("OFFERGRID_RATE_LIMIT") {
            config.rate_limit.max_requests = value as u32;
        }
        if let Some(value) = env_u64("OFFERGRID_RATE_WINDOW_SECS") {
            config.rate_limit.window = Duration::from_secs(value);
        }
        if let Some(value) = env_u64("OFFERGRID_FRESHNESS_SECS") {
            config.freshness_window = Duration::from_secs(value);
        }
        if let Some(value) = env_u64("OFFERGRID_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(value);
        }

        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|raw| raw.parse().ok())
}

struct VendorLane {
    id: VendorId,
    breaker: Arc<CircuitBreaker>,
    caller: Arc<RetryingCaller>,
}

/// Vendor aggregation and resilience engine.
pub struct AggregationEngine {
    lanes: Vec<VendorLane>,
    store: Arc<dyn SelectionStore>,
    limiter: RateLimiter,
    performance: Arc<PerformanceTracker>,
    popularity: PopularityTracker,
    freshness_window: Duration,
    cache_ttl: Duration,
}

impl AggregationEngine {
    /// Answer one caller request for a SKU.
    ///
    /// Order is fixed: SKU validation, rate gate, popularity count,
    /// cache read, fan-out. A validation or throttling rejection
    /// performs no cache reads and no vendor calls.
    pub async fn lookup(
        &self,
        sku: &str,
        caller_id: &str,
    ) -> Result<SelectionResult, LookupError> {
        self.lookup_with_mode(sku, caller_id, CacheMode::Use).await
    }

    /// [`lookup`](Self::lookup) with explicit cache interaction:
    /// `Refresh` always recomputes and overwrites, `Bypass` never
    /// touches the store.
    pub async fn lookup_with_mode(
        &self,
        sku: &str,
        caller_id: &str,
        mode: CacheMode,
    ) -> Result<SelectionResult, LookupError> {
        let sku = Sku::parse(sku)?;

        if self.limiter.check(caller_id) == RateDecision::Throttled {
            return Err(LookupError::RateLimited {
                caller: caller_id.to_owned(),
            });
        }

        self.popularity.record(&sku);

        if mode == CacheMode::Use {
            if let Some(mut hit) = self.cache_get(&sku).await {
                hit.cache_hit = true;
                return Ok(hit);
            }
        }

        let result = self.compute(&sku).await;
        if mode != CacheMode::Bypass {
            self.cache_put(&sku, &result).await;
        }
        Ok(result)
    }

    /// Recompute a SKU and overwrite its cache entry, skipping the
    /// validation, rate-limit and cache-read stages. Used by the
    /// prewarm scheduler.
    pub async fn refresh(&self, sku: &Sku) -> SelectionResult {
        let result = self.compute(sku).await;
        self.cache_put(sku, &result).await;
        result
    }

    async fn compute(&self, sku: &Sku) -> SelectionResult {
        let mut handles = Vec::with_capacity(self.lanes.len());
        for lane in &self.lanes {
            let caller = lane.caller.clone();
            let tracker = self.performance.clone();
            let sku = sku.clone();
            handles.push(tokio::spawn(async move {
                caller.call(&sku, &tracker).await
            }));
        }

        let mut raws = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Ok(raw)) => raws.push(raw),
                Ok(Err(error)) => {
                    tracing::debug!(
                        vendor = error.vendor().as_str(),
                        error = %error,
                        "vendor dropped from aggregation"
                    );
                }
                Err(join_error) => {
                    tracing::warn!(error = %join_error, "vendor task panicked");
                }
            }
        }

        let now = UtcDateTime::now();
        let vendors_checked = raws.len() as u32;
        let offers = raws
            .iter()
            .map(|raw| normalize(raw, now, self.freshness_window))
            .filter_map(|normalized| normalized.offer().cloned())
            .collect::<Vec<_>>();

        select_best(sku, &offers, vendors_checked, now)
    }

    async fn cache_get(&self, sku: &Sku) -> Option<SelectionResult> {
        match self.store.get(sku).await {
            Ok(hit) => hit,
            Err(error) => {
                tracing::warn!(sku = sku.as_str(), error = %error, "cache read failed; computing directly");
                None
            }
        }
    }

    async fn cache_put(&self, sku: &Sku, result: &SelectionResult) {
        if let Err(error) = self.store.put(sku, result.clone(), self.cache_ttl).await {
            tracing::warn!(sku = sku.as_str(), error = %error, "cache write failed; serving uncached result");
        }
    }

    /// Vendors this engine fans out to, in id order.
    pub fn vendors(&self) -> Vec<VendorId> {
        self.lanes.iter().map(|lane| lane.id).collect()
    }

    pub fn performance_snapshot(&self) -> Vec<VendorPerformance> {
        self.performance.snapshot()
    }

    pub fn circuit_snapshots(&self) -> Vec<CircuitSnapshot> {
        self.lanes
            .iter()
            .map(|lane| lane.breaker.snapshot(lane.id))
            .collect()
    }

    pub fn popular_skus(&self, n: usize) -> Vec<(Sku, u64)> {
        self.popularity.top(n)
    }
}

/// Builder for an [`AggregationEngine`].
///
/// Defaults to mock mode: the no-op transport with deterministic
/// fixture payloads, suitable for offline runs and tests. Real mode
/// wires the reqwest transport with per-vendor base URLs and API keys
/// from the environment:
///
/// | Vendor | Base URL | API key |
/// |--------|----------|---------|
/// | shopwave | `OFFERGRID_SHOPWAVE_URL` | `OFFERGRID_SHOPWAVE_API_KEY` |
/// | depotline | `OFFERGRID_DEPOTLINE_URL` | `OFFERGRID_DEPOTLINE_API_KEY` |
/// | mercantile | `OFFERGRID_MERCANTILE_URL` | `OFFERGRID_MERCANTILE_API_KEY` |
#[derive(Default)]
pub struct EngineBuilder {
    use_real_clients: bool,
    config: Option<EngineConfig>,
    store: Option<Arc<dyn SelectionStore>>,
    clients: Option<Vec<Arc<dyn VendorClient>>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire reqwest transports from `OFFERGRID_*` environment variables.
    pub fn with_real_clients(mut self) -> Self {
        self.use_real_clients = true;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SelectionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the vendor set entirely. Intended for tests injecting
    /// scripted vendor doubles.
    pub fn with_vendor_clients(mut self, clients: Vec<Arc<dyn VendorClient>>) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn build(self) -> AggregationEngine {
        let config = self.config.unwrap_or_default();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn SelectionStore>);

        let clients = self.clients.unwrap_or_else(|| {
            if self.use_real_clients {
                real_clients()
            } else {
                vec![
                    Arc::new(ShopwaveClient::default()),
                    Arc::new(DepotlineClient::default()),
                    Arc::new(MercantileClient::default()),
                ]
            }
        });

        let mut lanes = clients
            .into_iter()
            .map(|client| {
                let breaker = Arc::new(CircuitBreaker::new(config.circuit));
                let caller = Arc::new(RetryingCaller::new(
                    client.clone(),
                    breaker.clone(),
                    config.retry.clone(),
                ));
                VendorLane {
                    id: client.id(),
                    breaker,
                    caller,
                }
            })
            .collect::<Vec<_>>();
        lanes.sort_by_key(|lane| lane.id);

        AggregationEngine {
            lanes,
            store,
            limiter: RateLimiter::new(config.rate_limit),
            performance: Arc::new(PerformanceTracker::new()),
            popularity: PopularityTracker::new(),
            freshness_window: config.freshness_window,
            cache_ttl: config.cache_ttl,
        }
    }
}

fn real_clients() -> Vec<Arc<dyn VendorClient>> {
    let transport = Arc::new(ReqwestHttpClient::new());

    let auth = |key_var: &str| -> HttpAuth {
        match env::var(key_var) {
            Ok(value) if !value.is_empty() => HttpAuth::Header {
                name: String::from("X-API-Key"),
                value,
            },
            _ => HttpAuth::None,
        }
    };
    let url = |url_var: &str, default: &str| -> String {
        env::var(url_var).unwrap_or_else(|_| default.to_owned())
    };

    vec![
        Arc::new(ShopwaveClient::with_http_client(
            transport.clone(),
            url("OFFERGRID_SHOPWAVE_URL", "http://localhost:8002"),
            auth("OFFERGRID_SHOPWAVE_API_KEY"),
        )),
        Arc::new(DepotlineClient::with_http_client(
            transport.clone(),
            url("OFFERGRID_DEPOTLINE_URL", "http://localhost:8003"),
            auth("OFFERGRID_DEPOTLINE_API_KEY"),
        )),
        Arc::new(MercantileClient::with_http_client(
            transport,
            url("OFFERGRID_MERCANTILE_URL", "http://localhost:8004"),
            auth("OFFERGRID_MERCANTILE_API_KEY"),
        )),
    ]
}
