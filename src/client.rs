//! The async client facade.
//!
//! Wraps a pool-backed transport and exposes the typed surface: a
//! similarity builder, collection management, and an embedding-cache
//! handle. Construction is lazy — connections are opened on first use.

use std::sync::Arc;

use bytes::Bytes;

use crate::cache::EmbeddingCache;
use crate::commands::collections;
use crate::connection::ConnectionConfig;
use crate::error::{Error, Phase, Result};
use crate::handle::VectorSetHandle;
use crate::pool::PoolConfig;
use crate::query::{PlannedCommand, QueryExecutor, SimilarityRequest, SimilaritySearch};
use crate::reply::{Reply, ToArg};
use crate::transport::{PooledTransport, Transport};

/// An asynchronous vector-set client.
///
/// # Examples
///
/// ```ignore
/// use vset_rs::{Client, SimilarityRequest, VectorSetHandle};
///
/// let client = Client::connect("127.0.0.1", 6379);
/// let docs = VectorSetHandle::new("docs", 384)?;
///
/// let found = client
///     .similarity(&docs, SimilarityRequest::by_element("doc:17").count(5))
///     .with_attributes()
///     .execute()
///     .await?;
/// for hit in &found.hits {
///     println!("{} {:.3}", hit.id, hit.score);
/// }
/// ```
pub struct Client {
    transport: Arc<PooledTransport>,
    executor: QueryExecutor<PooledTransport>,
}

impl Client {
    /// Create a client for the given host and port with default pooling.
    pub fn connect(host: impl Into<String>, port: u16) -> Self {
        Self::connect_pooled(PoolConfig {
            connection: ConnectionConfig::from_addr(host, port),
            ..Default::default()
        })
    }

    /// Create a client from a full [`ConnectionConfig`].
    pub fn connect_with(config: ConnectionConfig) -> Self {
        Self::connect_pooled(PoolConfig {
            connection: config,
            ..Default::default()
        })
    }

    /// Create a client from a full [`PoolConfig`].
    pub fn connect_pooled(config: PoolConfig) -> Self {
        let transport = PooledTransport::new(config);
        let executor = QueryExecutor::new(Arc::clone(&transport));
        Self {
            transport,
            executor,
        }
    }

    // ── Similarity queries ──────────────────────────────────────────────

    /// Begin a similarity query against `handle`.
    pub fn similarity<'a>(
        &'a self,
        handle: &'a VectorSetHandle,
        request: SimilarityRequest,
    ) -> SimilarityCall<'a> {
        SimilarityCall {
            executor: &self.executor,
            handle,
            request,
        }
    }

    // ── Collection management ───────────────────────────────────────────

    /// Insert or overwrite one element.
    pub async fn add_element(
        &self,
        handle: &VectorSetHandle,
        id: &str,
        vector: &[f32],
        attributes: Option<&serde_json::Value>,
    ) -> Result<bool> {
        collections::add_element(&*self.transport, handle, id, vector, attributes).await
    }

    /// Remove one element.
    pub async fn remove_element(&self, handle: &VectorSetHandle, id: &str) -> Result<bool> {
        collections::remove_element(&*self.transport, handle, id).await
    }

    /// Replace one element's attributes.
    pub async fn set_attributes(
        &self,
        handle: &VectorSetHandle,
        id: &str,
        attributes: &serde_json::Value,
    ) -> Result<()> {
        collections::set_attributes(&*self.transport, handle, id, attributes).await
    }

    /// Read one element's attributes.
    pub async fn attributes(
        &self,
        handle: &VectorSetHandle,
        id: &str,
    ) -> Result<Option<serde_json::Value>> {
        collections::get_attributes(&*self.transport, handle, id).await
    }

    /// Read one element's stored vector, dequantized.
    pub async fn vector(
        &self,
        handle: &VectorSetHandle,
        id: &str,
    ) -> Result<Option<Vec<f32>>> {
        collections::get_vector(&*self.transport, handle, id).await
    }

    /// Number of elements in a collection.
    pub async fn cardinality(&self, collection: &str) -> Result<i64> {
        collections::cardinality(&*self.transport, collection).await
    }

    /// Dimensionality of a collection.
    pub async fn dimension(&self, collection: &str) -> Result<i64> {
        collections::dimension(&*self.transport, collection).await
    }

    /// Engine-reported facts about a collection.
    pub async fn describe(&self, collection: &str) -> Result<Vec<(String, Reply)>> {
        collections::describe(&*self.transport, collection).await
    }

    // ── Embedding cache ─────────────────────────────────────────────────

    /// An embedding cache namespaced under `namespace` in this engine.
    pub fn embedding_cache(&self, namespace: impl Into<String>) -> EmbeddingCache<PooledTransport> {
        EmbeddingCache::new(Arc::clone(&self.transport), namespace)
    }

    // ── Raw access ──────────────────────────────────────────────────────

    /// Submit an arbitrary command, for operations not covered by the
    /// typed API. Error replies are promoted to [`Error::Engine`].
    pub async fn execute(&self, args: &[impl ToArg]) -> Result<Reply> {
        let raw: Vec<Bytes> = args.iter().map(|a| a.to_arg()).collect();
        match self.transport.request(&raw).await {
            Err(e) => Err(Error::engine_unavailable(Phase::Primary, e)),
            Ok(Reply::Error(message)) => Err(Error::Engine {
                phase: Phase::Primary,
                kind: crate::reply::ReplyErrorKind::classify(&message),
                message,
            }),
            Ok(reply) => Ok(reply),
        }
    }
}

/// A similarity query bound to a client, handle, and request.
///
/// Request options can still be adjusted before executing; `plan()`
/// returns the would-be command without engine traffic.
pub struct SimilarityCall<'a> {
    executor: &'a QueryExecutor<PooledTransport>,
    handle: &'a VectorSetHandle,
    request: SimilarityRequest,
}

impl<'a> SimilarityCall<'a> {
    /// Set the result count.
    pub fn count(mut self, k: usize) -> Self {
        self.request = self.request.count(k);
        self
    }

    /// Set an attribute filter predicate.
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.request = self.request.filter(predicate);
        self
    }

    /// Override the exploration factor.
    pub fn ef(mut self, ef: u32) -> Self {
        self.request = self.request.ef(ef);
        self
    }

    /// Override the filter-phase exploration factor.
    pub fn filter_ef(mut self, ef: u32) -> Self {
        self.request = self.request.filter_ef(ef);
        self
    }

    /// Request stored vectors on each hit.
    pub fn with_vectors(mut self) -> Self {
        self.request = self.request.with_vectors();
        self
    }

    /// Request attributes on each hit.
    pub fn with_attributes(mut self) -> Self {
        self.request = self.request.with_attributes();
        self
    }

    /// Force an exact scan.
    pub fn exact(mut self) -> Self {
        self.request = self.request.exact();
        self
    }

    /// Disable engine-side parallelism.
    pub fn no_parallel(mut self) -> Self {
        self.request = self.request.no_parallel();
        self
    }

    /// Return the would-be primary command without executing it.
    pub fn plan(&self) -> Result<PlannedCommand> {
        self.executor.plan(self.handle, &self.request)
    }

    /// Execute the query.
    pub async fn execute(self) -> Result<SimilaritySearch> {
        self.executor.search(self.handle, &self.request).await
    }
}
