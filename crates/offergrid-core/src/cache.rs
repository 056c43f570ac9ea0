//! TTL-keyed store for computed selection results.
//!
//! The store is an accelerator, never a source of truth: every error
//! it raises is swallowed by the engine, which falls back to direct
//! computation. Concurrent writers for the same SKU may race;
//! last-writer-wins is acceptable because both computed from inputs
//! within the same TTL window.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{SelectionResult, Sku, StoreError};

/// Defines how a lookup interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Read through: serve a non-expired entry, otherwise compute and
    /// store. (Default)
    Use,
    /// Always compute and overwrite the entry. Used by prewarming.
    Refresh,
    /// Compute without reading or writing the cache.
    Bypass,
}

impl Default for CacheMode {
    fn default() -> Self {
        Self::Use
    }
}

/// Shared key-value store contract for selection results.
///
/// Both operations are fallible so test doubles can simulate an
/// unreachable backing store.
pub trait SelectionStore: Send + Sync {
    fn get<'a>(
        &'a self,
        sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SelectionResult>, StoreError>> + Send + 'a>>;

    fn put<'a>(
        &'a self,
        sku: &'a Sku,
        result: SelectionResult,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    result: SelectionResult,
    expires_at: Instant,
}

/// In-memory TTL store. Entries past their expiry read as absent.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<tokio::sync::RwLock<HashMap<Sku, StoredEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.inner
            .write()
            .await
            .retain(|_, entry| entry.expires_at > now);
    }
}

impl SelectionStore for MemoryStore {
    fn get<'a>(
        &'a self,
        sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SelectionResult>, StoreError>> + Send + 'a>>
    {
        Box::pin(async move {
            let store = self.inner.read().await;
            let hit = store.get(sku).and_then(|entry| {
                if Instant::now() <= entry.expires_at {
                    Some(entry.result.clone())
                } else {
                    None
                }
            });
            Ok(hit)
        })
    }

    fn put<'a>(
        &'a self,
        sku: &'a Sku,
        result: SelectionResult,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let entry = StoredEntry {
                result,
                expires_at: Instant::now() + ttl,
            };
            self.inner.write().await.insert(sku.clone(), entry);
            Ok(())
        })
    }
}
