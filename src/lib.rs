//! # vset-rs — Rust client SDK for vector-set similarity engines
//!
//! A control-plane client for engines that store named vector collections
//! and answer nearest-neighbor queries over a RESP2-compatible wire
//! protocol.
//!
//! ## Features
//!
//! - **Async-first** — built on Tokio with pooled TCP connections
//! - **Query composition** — one request type compiles to the right wire
//!   command; an engine that rejects the inline-attribute variant is
//!   transparently demoted to a base query plus a batched secondary fetch
//! - **Order-preserving enrichment** — stored vectors and attributes are
//!   fetched as one pipelined round trip and zipped back positionally
//! - **Embedding cache** — bounded, TTL-aware cache of provider-computed
//!   vectors, keyed by content fingerprint, living in the engine itself
//! - **Testable seams** — the transport is an injected trait; every layer
//!   above the socket runs against an in-memory fake
//!
//! ## Quick start
//!
//! ```ignore
//! use vset_rs::{Client, SimilarityRequest, VectorSetHandle};
//!
//! #[tokio::main]
//! async fn main() -> vset_rs::Result<()> {
//!     let client = Client::connect("127.0.0.1", 6379);
//!     let docs = VectorSetHandle::new("docs", 384)?;
//!
//!     let found = client
//!         .similarity(&docs, SimilarityRequest::by_vector(vec![0.1; 384]))
//!         .count(10)
//!         .with_attributes()
//!         .execute()
//!         .await?;
//!
//!     for hit in &found.hits {
//!         println!("{} {:.3}", hit.id, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod commands;
pub mod connection;
pub mod embedding;
pub mod enrich;
pub mod error;
pub mod handle;
pub mod pool;
pub mod query;
pub mod reply;
pub mod resp;
pub mod transport;

// ── Re-exports for ergonomic top-level usage ────────────────────────────────

pub use cache::{CacheConfig, CacheConfigPatch, EmbeddingCache, Fingerprint};
pub use client::{Client, SimilarityCall};
pub use connection::ConnectionConfig;
pub use embedding::{EmbeddingError, EmbeddingProvider};
pub use enrich::BatchFetcher;
pub use error::{Error, Phase, Result, TransportError};
pub use handle::{Quantization, VectorSetHandle};
pub use pool::PoolConfig;
pub use query::{
    CommandVariant, PlannedCommand, QueryExecutor, QueryTarget, SimilarityHit,
    SimilarityRequest, SimilaritySearch,
};
pub use reply::{Reply, ReplyErrorKind, ToArg};
pub use transport::{PooledTransport, Transport};
