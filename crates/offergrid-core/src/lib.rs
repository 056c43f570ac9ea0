//! # Offergrid Core
//!
//! Vendor aggregation and resilience engine for product offer lookups.
//!
//! ## Overview
//!
//! This crate provides the building blocks of the Offergrid service:
//!
//! - **Canonical domain models** for SKUs, offers, and selection results
//! - **Vendor adapters** for the Shopwave, Depotline, and Mercantile feeds
//! - **Circuit breaker** and **retrying caller** for resilient vendor calls
//! - **Normalization** of heterogeneous vendor payloads into one shape
//! - **Deterministic best-offer selection** across vendors
//! - **TTL cache**, **rate limiting**, and **prewarming** around the pipeline
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Vendor adapters (Shopwave, Depotline, Mercantile) |
//! | [`cache`] | Selection-result store contract and in-memory TTL store |
//! | [`circuit_breaker`] | Per-vendor circuit breaker |
//! | [`domain`] | Domain models (Sku, CanonicalOffer, SelectionResult) |
//! | [`engine`] | The aggregation pipeline and its builder |
//! | [`error`] | Validation and store error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalize`] | Vendor payload normalization and freshness checks |
//! | [`prewarm`] | Background cache prewarming |
//! | [`rate_limit`] | Per-caller fixed-window rate limiting |
//! | [`retry`] | Timeout, retry, and backoff around vendor calls |
//! | [`select`] | Deterministic best-offer selection |
//! | [`tracking`] | Vendor performance and SKU popularity counters |
//! | [`vendor`] | Vendor identifiers, raw payloads, and the client trait |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use offergrid_core::engine::EngineBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Mock mode: deterministic fixture payloads, no network.
//!     let engine = EngineBuilder::new().build();
//!
//!     let result = engine.lookup("ABC123", "anonymous").await?;
//!     if let (Some(vendor), Some(price)) = (result.best_vendor, result.price) {
//!         println!("{} best offer: {} at ${:.2}", result.sku, vendor, price);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  HTTP Service   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Aggregation     │────▶│ Rate Limiter     │
//! │ Engine          │────▶│ TTL Cache        │
//! └────────┬────────┘     └──────────────────┘
//!          │ fan-out (one task per vendor)
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Retrying Caller │────▶│ Circuit Breaker  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Vendor Adapter  │────▶│ HTTP Client      │
//! └────────┬────────┘     │ (reqwest/none)   │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Normalize +     │
//! │ Select Best     │
//! └─────────────────┘
//! ```
//!
//! ## Security
//!
//! - Vendor API keys are read from environment variables only (never logged)
//! - Input validation on all domain types

pub mod adapters;
pub mod cache;
pub mod circuit_breaker;
pub mod domain;
pub mod engine;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod prewarm;
pub mod rate_limit;
pub mod retry;
pub mod select;
pub mod tracking;
pub mod vendor;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{DepotlineClient, MercantileClient, ShopwaveClient};

// Caching
pub use cache::{CacheMode, MemoryStore, SelectionStore};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState};

// Domain models
pub use domain::{
    CanonicalOffer, OfferStatus, SelectionResult, SelectionStatus, Sku, UtcDateTime, VendorId,
};

// Engine
pub use engine::{AggregationEngine, EngineBuilder, EngineConfig, LookupError};

// Error types
pub use error::{StoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Normalization
pub use normalize::{DiscardReason, Normalized};

// Prewarming
pub use prewarm::{PrewarmConfig, PrewarmScheduler};

// Rate limiting
pub use rate_limit::{RateDecision, RateLimitConfig, RateLimiter};

// Retry logic
pub use retry::{Backoff, RetryConfig, RetryingCaller};

// Tracking
pub use tracking::{PerformanceTracker, PopularityTracker, VendorPerformance};

// Vendor contracts
pub use vendor::{RawVendorOffer, VendorClient, VendorError, VendorErrorKind};
