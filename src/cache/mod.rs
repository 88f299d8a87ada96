//! Bounded, TTL-aware embedding cache.
//!
//! Vectors already computed by an embedding provider are kept in a
//! hash-shaped remote store, keyed by content fingerprint. The cache is a
//! pure optimization: every backing-store failure is swallowed and
//! surfaced only as a miss or no-op, so a broken cache can slow a
//! similarity query down but never fail one.
//!
//! Store layout under a namespace `ns`:
//! - `ns:vectors` — hash, fingerprint → JSON vector payload
//! - `ns:meta`    — hash, fingerprint → JSON `{ts, ttl}`
//! - `ns:config`  — string, JSON [`CacheConfig`]

pub mod fingerprint;
pub mod store;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::transport::Transport;

pub use fingerprint::Fingerprint;
pub use store::HashStore;

/// Effective cache configuration, lazily created with defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Soft bound on the number of cached vectors.
    pub max_size: usize,
    /// TTL applied to new entries, in seconds.
    pub default_ttl_secs: u64,
    /// Master switch; a disabled cache misses on every read and drops
    /// every write.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl_secs: 86_400,
            enabled: true,
        }
    }
}

/// A partial configuration update; `None` fields keep their prior value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfigPatch {
    /// New soft size bound.
    pub max_size: Option<usize>,
    /// New default TTL in seconds.
    pub default_ttl_secs: Option<u64>,
    /// Enable or disable the cache.
    pub enabled: Option<bool>,
}

impl CacheConfig {
    fn merged(mut self, patch: &CacheConfigPatch) -> Self {
        if let Some(max_size) = patch.max_size {
            self.max_size = max_size;
        }
        if let Some(ttl) = patch.default_ttl_secs {
            self.default_ttl_secs = ttl;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        self
    }
}

/// Per-entry metadata kept in the side index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    /// Unix timestamp of the last write.
    ts: u64,
    /// TTL in seconds recorded at write time.
    ttl: u64,
}

/// The embedding cache manager.
pub struct EmbeddingCache<T: Transport + ?Sized> {
    store: HashStore<T>,
    vectors_key: String,
    meta_key: String,
    config_key: String,
    clock: Box<dyn Fn() -> u64 + Send + Sync>,
}

impl<T: Transport + ?Sized> EmbeddingCache<T> {
    /// Create a cache manager over the given transport, namespaced under
    /// `namespace` in the backing store.
    pub fn new(transport: Arc<T>, namespace: impl Into<String>) -> Self {
        let ns = namespace.into();
        Self {
            store: HashStore::new(transport),
            vectors_key: format!("{}:vectors", ns),
            meta_key: format!("{}:meta", ns),
            config_key: format!("{}:config", ns),
            clock: Box::new(unix_now),
        }
    }

    /// Replace the clock used for entry timestamps and TTL judgment.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Look up a cached vector. No side effects.
    ///
    /// Misses on: disabled cache, absent entry, expired entry (TTL is
    /// judged lazily here; there is no background sweep), malformed
    /// payload, or any store failure.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<f32>> {
        let config = self.effective_config().await;
        if !config.enabled {
            return None;
        }

        let payload = match self.store.hget(&self.vectors_key, fingerprint.as_str()).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        if self.is_expired(fingerprint).await {
            return None;
        }

        match serde_json::from_slice::<Vec<f32>>(&payload) {
            Ok(vector) => Some(vector),
            Err(e) => {
                debug!(error = %e, "cache payload unparseable, treating as miss");
                None
            }
        }
    }

    /// Store a vector, then evict oldest-first if the size bound was
    /// crossed. Returns false when the write did not happen (disabled
    /// cache or store failure).
    pub async fn put(&self, fingerprint: &Fingerprint, vector: &[f32]) -> bool {
        let config = self.effective_config().await;
        if !config.enabled {
            return false;
        }

        let payload = match serde_json::to_vec(vector) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "vector not serializable, skipping cache write");
                return false;
            }
        };
        let meta = EntryMeta {
            ts: (self.clock)(),
            ttl: config.default_ttl_secs,
        };
        let meta_payload = match serde_json::to_vec(&meta) {
            Ok(p) => p,
            Err(_) => return false,
        };

        let wrote = self
            .store
            .hset(&self.vectors_key, fingerprint.as_str(), &payload)
            .await
            .and(
                self.store
                    .hset(&self.meta_key, fingerprint.as_str(), &meta_payload)
                    .await,
            );
        if let Err(e) = wrote {
            debug!(error = %e, "cache write failed, skipping");
            return false;
        }

        self.evict_if_over(config.max_size).await;
        true
    }

    /// Merge a partial update into the stored configuration and persist
    /// the result. The merged config is returned even when persisting
    /// failed.
    pub async fn configure(&self, patch: &CacheConfigPatch) -> CacheConfig {
        let merged = self.effective_config().await.merged(patch);
        match serde_json::to_vec(&merged) {
            Ok(payload) => {
                if let Err(e) = self.store.set(&self.config_key, &payload).await {
                    warn!(error = %e, "cache config write failed");
                }
            }
            Err(e) => warn!(error = %e, "cache config not serializable"),
        }
        merged
    }

    /// Drop the value store and the metadata index together. Returns the
    /// number of entries removed.
    pub async fn clear(&self) -> u64 {
        let removed = self
            .store
            .hlen(&self.vectors_key)
            .await
            .unwrap_or_default()
            .max(0) as u64;
        if let Err(e) = self
            .store
            .del(&[self.vectors_key.as_str(), self.meta_key.as_str()])
            .await
        {
            debug!(error = %e, "cache clear failed");
            return 0;
        }
        removed
    }

    /// Read-through embedding: consult the cache, call the provider on a
    /// miss, write the result back.
    ///
    /// Provider failures propagate; cache store failures only ever cost
    /// a recompute.
    pub async fn resolve(
        &self,
        content: &str,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Vec<f32>> {
        let fingerprint = Fingerprint::compute(content, provider.identity());
        if let Some(vector) = self.get(&fingerprint).await {
            return Ok(vector);
        }
        let vector = provider
            .embed(content)
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        self.put(&fingerprint, &vector).await;
        Ok(vector)
    }

    async fn effective_config(&self) -> CacheConfig {
        match self.store.get(&self.config_key).await {
            Ok(Some(payload)) => match serde_json::from_slice(&payload) {
                Ok(config) => config,
                Err(e) => {
                    debug!(error = %e, "cache config unparseable, using defaults");
                    CacheConfig::default()
                }
            },
            Ok(None) => CacheConfig::default(),
            Err(e) => {
                debug!(error = %e, "cache config read failed, using defaults");
                CacheConfig::default()
            }
        }
    }

    async fn is_expired(&self, fingerprint: &Fingerprint) -> bool {
        let meta = match self.store.hget(&self.meta_key, fingerprint.as_str()).await {
            Ok(Some(payload)) => match serde_json::from_slice::<EntryMeta>(&payload) {
                Ok(meta) => meta,
                // An unreadable side record does not invalidate the value.
                Err(_) => return false,
            },
            _ => return false,
        };
        (self.clock)().saturating_sub(meta.ts) > meta.ttl
    }

    /// Oldest-write-first eviction of everything past the size bound.
    ///
    /// Ties on equal timestamps fall back to the store's enumeration
    /// order, which is not guaranteed stable.
    async fn evict_if_over(&self, max_size: usize) {
        let count = match self.store.hlen(&self.vectors_key).await {
            Ok(n) => n.max(0) as usize,
            Err(_) => return,
        };
        if count <= max_size {
            return;
        }
        let overflow = count - max_size;

        let metas = match self.store.hgetall(&self.meta_key).await {
            Ok(pairs) => pairs,
            Err(e) => {
                debug!(error = %e, "eviction scan failed, size bound deferred");
                return;
            }
        };

        let mut aged: Vec<(String, u64)> = metas
            .into_iter()
            .map(|(field, payload)| {
                // Corrupt metadata sorts as oldest and is evicted first.
                let ts = serde_json::from_slice::<EntryMeta>(&payload)
                    .map(|m| m.ts)
                    .unwrap_or(0);
                (field, ts)
            })
            .collect();
        aged.sort_by_key(|(_, ts)| *ts);

        let victims: Vec<String> = aged
            .into_iter()
            .take(overflow)
            .map(|(field, _)| field)
            .collect();
        if victims.is_empty() {
            return;
        }

        let dropped = self.store.hdel(&self.vectors_key, &victims).await;
        let dropped_meta = self.store.hdel(&self.meta_key, &victims).await;
        match (dropped, dropped_meta) {
            (Ok(n), Ok(_)) => debug!(evicted = n, "embedding cache eviction"),
            (r1, r2) => {
                if let Err(e) = r1.and(r2) {
                    debug!(error = %e, "eviction delete failed");
                }
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_merge_keeps_omitted_fields() {
        let patch = CacheConfigPatch {
            max_size: Some(50),
            ..Default::default()
        };
        let merged = CacheConfig::default().merged(&patch);
        assert_eq!(merged.max_size, 50);
        assert_eq!(merged.default_ttl_secs, 86_400);
        assert!(merged.enabled);
    }

    #[test]
    fn config_merge_is_idempotent() {
        let patch = CacheConfigPatch {
            max_size: Some(2),
            default_ttl_secs: Some(60),
            enabled: Some(false),
        };
        let once = CacheConfig::default().merged(&patch);
        let twice = once.clone().merged(&patch);
        assert_eq!(once, twice);
    }
}
