//! Batched, order-preserving enrichment fetches.
//!
//! The engine has no multi-id lookup, so the fetcher builds one
//! `VECTOR-OF` / `ATTRIBUTES-OF` instruction per id and submits them as a
//! single pipelined round trip. Replies map back by positional index —
//! never by content matching — so `output[i]` always answers `input[i]`.
//!
//! Enrichment is secondary data: an absent element, a malformed reply, or
//! even a transport failure of the whole batch degrades to `None` rather
//! than surfacing an error. The caller's ranked ids are already in hand.

use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use crate::reply::{Reply, ToArg};
use crate::transport::Transport;

/// Pipelined per-element fetcher for stored vectors and attributes.
pub struct BatchFetcher<T: Transport + ?Sized> {
    transport: Arc<T>,
}

impl<T: Transport + ?Sized> BatchFetcher<T> {
    /// Create a fetcher over the given transport handle.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Fetch the stored vector of each id, in input order.
    pub async fn vectors(&self, collection: &str, ids: &[String]) -> Vec<Option<Vec<f32>>> {
        self.fetch(collection, "VECTOR-OF", ids, parse_vector).await
    }

    /// Fetch the attributes of each id, in input order.
    pub async fn attributes(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Vec<Option<serde_json::Value>> {
        self.fetch(collection, "ATTRIBUTES-OF", ids, parse_attributes)
            .await
    }

    async fn fetch<V>(
        &self,
        collection: &str,
        command: &'static str,
        ids: &[String],
        parse: fn(&Reply) -> Option<V>,
    ) -> Vec<Option<V>> {
        if ids.is_empty() {
            return Vec::new();
        }

        let commands: Vec<Vec<Bytes>> = ids
            .iter()
            .map(|id| vec![Bytes::from(command), collection.to_arg(), id.to_arg()])
            .collect();

        let replies = match self.transport.request_pipeline(&commands).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!(command, count = ids.len(), error = %e, "enrichment batch failed");
                return ids.iter().map(|_| None).collect();
            }
        };

        // A short reply set still maps positionally; missing tails are None.
        let mut out: Vec<Option<V>> = replies.iter().map(parse).collect();
        out.resize_with(ids.len(), || None);
        out
    }
}

/// `VECTOR-OF` reply: an array of float bulk strings, or nil when absent.
pub(crate) fn parse_vector(reply: &Reply) -> Option<Vec<f32>> {
    let items = reply.as_array()?;
    let mut vector = Vec::with_capacity(items.len());
    for item in items {
        vector.push(item.as_f64()? as f32);
    }
    Some(vector)
}

/// `ATTRIBUTES-OF` reply: a JSON bulk string, or nil when absent.
fn parse_attributes(reply: &Reply) -> Option<serde_json::Value> {
    serde_json::from_str(reply.as_str()?).ok()
}
