//! The command-submission seam.
//!
//! Everything above the socket — the query executor, the batch fetcher,
//! the embedding cache — talks to the engine through [`Transport`], an
//! explicit handle injected at construction. Production code uses
//! [`PooledTransport`]; tests use an in-memory fake implementing the same
//! two methods.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::pool::{Pool, PoolConfig};
use crate::reply::Reply;

/// Minimal command-submission capability.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit one command and return its reply frame.
    ///
    /// An engine error reply is returned as [`Reply::Error`], not as an
    /// `Err`; `Err` is reserved for transport-level failures.
    async fn request(&self, args: &[Bytes]) -> Result<Reply, TransportError>;

    /// Submit a batch of commands as one pipelined round trip.
    ///
    /// Replies are positional: `replies[i]` answers `commands[i]`.
    async fn request_pipeline(&self, commands: &[Vec<Bytes>])
        -> Result<Vec<Reply>, TransportError>;
}

/// Pool-backed TCP transport.
pub struct PooledTransport {
    pool: Pool,
}

impl PooledTransport {
    /// Create a transport over a fresh pool.
    pub fn new(config: PoolConfig) -> Arc<Self> {
        Arc::new(Self {
            pool: Pool::new(config),
        })
    }

    /// Number of idle pooled connections, for introspection.
    pub fn idle_connections(&self) -> usize {
        self.pool.idle_count()
    }
}

#[async_trait]
impl Transport for PooledTransport {
    async fn request(&self, args: &[Bytes]) -> Result<Reply, TransportError> {
        let mut pooled = self.pool.get().await?;
        match pooled.conn().request(args).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                pooled.discard();
                Err(e)
            }
        }
    }

    async fn request_pipeline(
        &self,
        commands: &[Vec<Bytes>],
    ) -> Result<Vec<Reply>, TransportError> {
        let mut pooled = self.pool.get().await?;
        match pooled.conn().request_pipeline(commands).await {
            Ok(replies) => Ok(replies),
            Err(e) => {
                pooled.discard();
                Err(e)
            }
        }
    }
}
