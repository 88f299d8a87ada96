//! Similarity query composition and execution.
//!
//! A [`SimilarityRequest`] describes what the caller wants; the
//! [`executor::QueryExecutor`] turns it into the right wire command,
//! handles the one bounded fallback when the enriched variant is
//! unsupported, and merges enrichment data positionally.

pub mod command;
pub mod executor;
pub mod parse;

use std::time::Duration;

use crate::error::{Error, Result};
use crate::handle::VectorSetHandle;

pub use command::{CommandVariant, PlannedCommand};
pub use executor::QueryExecutor;

/// What the query is anchored on: a literal vector or an existing element.
///
/// The enum makes "exactly one of" structural: a request cannot carry
/// both or neither.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    /// Search near this literal vector.
    Vector(Vec<f32>),
    /// Search near the stored vector of this element.
    Element(String),
}

/// A nearest-neighbor request against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRequest {
    /// Query anchor.
    pub target: QueryTarget,
    /// Number of results wanted (≥ 1).
    pub k: usize,
    /// Optional attribute filter predicate.
    pub filter: Option<String>,
    /// Optional exploration-factor override.
    pub ef: Option<u32>,
    /// Optional filter-phase exploration-factor override.
    pub filter_ef: Option<u32>,
    /// Attach stored vectors to the hits.
    pub with_vectors: bool,
    /// Attach attributes to the hits.
    pub with_attributes: bool,
    /// Force an exact linear scan instead of the approximate index.
    pub exact: bool,
    /// Disable engine-side parallelism for this query.
    pub no_parallel: bool,
}

impl SimilarityRequest {
    /// A request anchored on a literal vector, with defaults (`k = 10`).
    pub fn by_vector(vector: Vec<f32>) -> Self {
        Self::new(QueryTarget::Vector(vector))
    }

    /// A request anchored on an existing element's stored vector.
    pub fn by_element(id: impl Into<String>) -> Self {
        Self::new(QueryTarget::Element(id.into()))
    }

    fn new(target: QueryTarget) -> Self {
        Self {
            target,
            k: 10,
            filter: None,
            ef: None,
            filter_ef: None,
            with_vectors: false,
            with_attributes: false,
            exact: false,
            no_parallel: false,
        }
    }

    /// Set the result count.
    pub fn count(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set an attribute filter predicate.
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filter = Some(predicate.into());
        self
    }

    /// Override the exploration factor.
    pub fn ef(mut self, ef: u32) -> Self {
        self.ef = Some(ef);
        self
    }

    /// Override the filter-phase exploration factor.
    pub fn filter_ef(mut self, ef: u32) -> Self {
        self.filter_ef = Some(ef);
        self
    }

    /// Request stored vectors on each hit.
    pub fn with_vectors(mut self) -> Self {
        self.with_vectors = true;
        self
    }

    /// Request attributes on each hit.
    pub fn with_attributes(mut self) -> Self {
        self.with_attributes = true;
        self
    }

    /// Force an exact scan.
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    /// Disable engine-side parallelism.
    pub fn no_parallel(mut self) -> Self {
        self.no_parallel = true;
        self
    }

    /// Fail fast on malformed requests, before any engine traffic.
    pub fn validate(&self, handle: &VectorSetHandle) -> Result<()> {
        if self.k == 0 {
            return Err(Error::Validation("COUNT must be at least 1".into()));
        }
        match &self.target {
            QueryTarget::Vector(v) => handle.check_vector(v)?,
            QueryTarget::Element(id) => {
                if id.is_empty() {
                    return Err(Error::Validation("element id must not be empty".into()));
                }
            }
        }
        if let Some(f) = &self.filter {
            if f.trim().is_empty() {
                return Err(Error::Validation("filter predicate must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// One scored hit, possibly enriched.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    /// Element identifier.
    pub id: String,
    /// Similarity score as reported by the engine.
    pub score: f64,
    /// Stored vector, when vector enrichment was requested and available.
    pub vector: Option<Vec<f32>>,
    /// Attributes, when attribute enrichment was requested and available.
    pub attributes: Option<serde_json::Value>,
}

/// The outcome of one similarity search.
///
/// Hits preserve exactly the engine's returned order; this layer never
/// re-sorts.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilaritySearch {
    /// Ordered hits, length ≤ the requested count.
    pub hits: Vec<SimilarityHit>,
    /// The command variant that actually produced the reply.
    pub variant: CommandVariant,
    /// True if the enriched variant was rejected and the base variant ran.
    pub fallback_used: bool,
    /// Wall-clock time spent, including enrichment.
    pub elapsed: Duration,
}
