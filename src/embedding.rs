//! The embedding-provider seam.
//!
//! Providers turn raw content into vectors; their internals (HTTP calls,
//! local models, latency, failure modes) are opaque to this crate. The
//! trait exists so the cache's read-through path and tests can plug in
//! anything with an identity and an `embed` function.

use async_trait::async_trait;

/// Failures reported by an embedding provider.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The content cannot be embedded (empty, too long, wrong modality).
    #[error("input rejected: {0}")]
    InvalidInput(String),

    /// The provider itself failed (network, model, quota).
    #[error("provider failure: {0}")]
    Provider(String),
}

/// A content-to-vector function with a stable identity.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identity for cache keying, e.g. `"openai/text-embedding-3-small"`.
    ///
    /// Two providers that would produce different vectors for the same
    /// content must report different identities.
    fn identity(&self) -> &str;

    /// Embed `content` into a vector.
    async fn embed(&self, content: &str) -> Result<Vec<f32>, EmbeddingError>;
}
