//! Connection pooling.
//!
//! A semaphore bounds the number of live connections; idle connections are
//! stacked for reuse and returned on drop. A connection that saw a
//! transport error is discarded instead of being returned, so the pool
//! never hands out a socket in an unknown state.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::connection::{Connection, ConnectionConfig};
use crate::error::TransportError;

/// Pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connection settings shared by all pooled connections.
    pub connection: ConnectionConfig,
    /// Maximum number of live connections.
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            max_size: 8,
        }
    }
}

/// A bounded pool of engine connections.
pub struct Pool {
    config: ConnectionConfig,
    idle: parking_lot::Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    max_size: usize,
}

impl Pool {
    /// Create a pool; connections are opened lazily on first checkout.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config: config.connection,
            idle: parking_lot::Mutex::new(Vec::with_capacity(config.max_size)),
            permits: Arc::new(Semaphore::new(config.max_size)),
            max_size: config.max_size,
        }
    }

    /// Check out a connection, reusing an idle one when available.
    pub async fn get(&self) -> Result<PooledConnection<'_>, TransportError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| TransportError::PoolExhausted {
                max_size: self.max_size,
            })?;

        let reused = { self.idle.lock().pop() };
        let conn = match reused {
            Some(c) => c,
            None => Connection::connect(&self.config).await?,
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
            _permit: permit,
        })
    }

    /// Number of idle connections currently held.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn put_back(&self, conn: Connection) {
        self.idle.lock().push(conn);
    }
}

/// A connection checked out from the pool.
///
/// Returned to the pool on drop unless [`discard`](Self::discard) was
/// called first.
pub struct PooledConnection<'a> {
    conn: Option<Connection>,
    pool: &'a Pool,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl<'a> PooledConnection<'a> {
    /// Access the underlying connection.
    pub fn conn(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection taken")
    }

    /// Drop the socket instead of returning it to the pool.
    ///
    /// Call after a transport error left the connection with replies of
    /// unknown parity in flight.
    pub fn discard(mut self) {
        self.conn.take();
    }
}

impl<'a> Drop for PooledConnection<'a> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.put_back(conn);
        }
    }
}
