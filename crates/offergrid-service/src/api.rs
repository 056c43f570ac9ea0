//! HTTP surface: offer lookup, health, and admin endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use offergrid_core::{
    AggregationEngine, CircuitSnapshot, SelectionResult, VendorId, VendorPerformance,
};

use crate::error::ApiError;

/// Caller identity assigned to requests that carry no `X-API-Key`.
pub const ANONYMOUS_CALLER: &str = "anonymous";

const POPULAR_SKUS_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AggregationEngine>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/products/:sku", get(get_product))
        .route("/health", get(get_health))
        .route("/admin/performance", get(get_performance))
        .route("/admin/circuit-breakers", get(get_circuit_breakers))
        .route("/admin/popular-skus", get(get_popular_skus))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The rate-limit identity for a request: its `X-API-Key` header value,
/// or a shared anonymous bucket when absent or non-ASCII.
fn caller_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_CALLER)
}

async fn get_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SelectionResult>, ApiError> {
    let result = state.engine.lookup(&sku, caller_id(&headers)).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    vendors: Vec<VendorId>,
}

async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        vendors: state.engine.vendors(),
    })
}

async fn get_performance(State(state): State<AppState>) -> Json<Vec<VendorPerformance>> {
    Json(state.engine.performance_snapshot())
}

async fn get_circuit_breakers(State(state): State<AppState>) -> Json<Vec<CircuitSnapshot>> {
    Json(state.engine.circuit_snapshots())
}

#[derive(Debug, Serialize)]
struct PopularSku {
    sku: String,
    requests: u64,
}

async fn get_popular_skus(State(state): State<AppState>) -> Json<Vec<PopularSku>> {
    let ranked = state
        .engine
        .popular_skus(POPULAR_SKUS_LIMIT)
        .into_iter()
        .map(|(sku, requests)| PopularSku {
            sku: sku.to_string(),
            requests,
        })
        .collect();
    Json(ranked)
}
