//! Hash-shaped remote store adapter.
//!
//! A thin, generic get/set/delete surface over the engine's hash and
//! string commands, used only by the embedding cache. Error replies are
//! promoted to `Err` here — the cache manager above swallows them all.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::TransportError;
use crate::reply::{Reply, ToArg};
use crate::transport::Transport;

/// Generic access to one remote hash/string namespace.
pub struct HashStore<T: Transport + ?Sized> {
    transport: Arc<T>,
}

impl<T: Transport + ?Sized> HashStore<T> {
    /// Create a store adapter over the given transport handle.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// HGET key field.
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>, TransportError> {
        let reply = self
            .request(&[Bytes::from("HGET"), key.to_arg(), field.to_arg()])
            .await?;
        match reply {
            Reply::Bulk(b) => Ok(Some(b)),
            Reply::Nil => Ok(None),
            other => Err(unexpected("bulk string", &other)),
        }
    }

    /// HSET key field value.
    pub async fn hset(&self, key: &str, field: &str, value: &[u8]) -> Result<(), TransportError> {
        self.request(&[
            Bytes::from("HSET"),
            key.to_arg(),
            field.to_arg(),
            Bytes::copy_from_slice(value),
        ])
        .await?;
        Ok(())
    }

    /// HDEL key field [field ...]; returns the number of removed fields.
    pub async fn hdel(&self, key: &str, fields: &[String]) -> Result<i64, TransportError> {
        if fields.is_empty() {
            return Ok(0);
        }
        let mut args = vec![Bytes::from("HDEL"), key.to_arg()];
        args.extend(fields.iter().map(|f| f.to_arg()));
        self.request(&args).await?.into_integer()
    }

    /// HLEN key.
    pub async fn hlen(&self, key: &str) -> Result<i64, TransportError> {
        self.request(&[Bytes::from("HLEN"), key.to_arg()])
            .await?
            .into_integer()
    }

    /// HGETALL key, as (field, value) pairs in the engine's enumeration
    /// order.
    pub async fn hgetall(&self, key: &str) -> Result<Vec<(String, Bytes)>, TransportError> {
        let items = self
            .request(&[Bytes::from("HGETALL"), key.to_arg()])
            .await?
            .into_array()?;
        let mut pairs = Vec::with_capacity(items.len() / 2);
        for chunk in items.chunks_exact(2) {
            let field = chunk[0]
                .as_str()
                .ok_or_else(|| unexpected("bulk string", &chunk[0]))?
                .to_string();
            let value = match &chunk[1] {
                Reply::Bulk(b) => b.clone(),
                other => return Err(unexpected("bulk string", other)),
            };
            pairs.push((field, value));
        }
        Ok(pairs)
    }

    /// GET key.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, TransportError> {
        let reply = self.request(&[Bytes::from("GET"), key.to_arg()]).await?;
        match reply {
            Reply::Bulk(b) => Ok(Some(b)),
            Reply::Nil => Ok(None),
            other => Err(unexpected("bulk string", &other)),
        }
    }

    /// SET key value.
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<(), TransportError> {
        self.request(&[
            Bytes::from("SET"),
            key.to_arg(),
            Bytes::copy_from_slice(value),
        ])
        .await?;
        Ok(())
    }

    /// DEL key [key ...]; returns the number of removed keys.
    pub async fn del(&self, keys: &[&str]) -> Result<i64, TransportError> {
        let mut args = vec![Bytes::from("DEL")];
        args.extend(keys.iter().map(|k| k.to_arg()));
        self.request(&args).await?.into_integer()
    }

    async fn request(&self, args: &[Bytes]) -> Result<Reply, TransportError> {
        match self.transport.request(args).await? {
            Reply::Error(message) => Err(TransportError::Protocol(format!(
                "store error reply: {}",
                message
            ))),
            reply => Ok(reply),
        }
    }
}

fn unexpected(expected: &'static str, got: &Reply) -> TransportError {
    TransportError::UnexpectedReply {
        expected,
        actual: got.kind_name(),
    }
}
