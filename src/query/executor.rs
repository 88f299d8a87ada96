//! Similarity query planning and execution.
//!
//! The executor is stateless across calls; every request walks the same
//! decision tree: validate, build the primary command, execute, demote
//! once if the enriched variant is rejected, parse, enrich, return.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::enrich::BatchFetcher;
use crate::error::{Error, Phase, Result};
use crate::handle::VectorSetHandle;
use crate::query::command::{self, CommandVariant, PlannedCommand};
use crate::query::parse::{parse_similarity_reply, ParsedReply};
use crate::query::{SimilarityHit, SimilarityRequest, SimilaritySearch};
use crate::reply::{Reply, ReplyErrorKind};
use crate::transport::Transport;

/// Outcome of issuing one command, consumed by the single bounded retry.
enum ExecOutcome {
    /// The engine answered with a data reply.
    Completed(Reply),
    /// The engine rejected the enriched variant's argument shape.
    UnsupportedVariant,
    /// Anything else; surfaced to the caller as-is.
    Fatal(Error),
}

/// Plans and executes similarity queries over an injected transport.
pub struct QueryExecutor<T: Transport + ?Sized> {
    transport: Arc<T>,
    fetcher: BatchFetcher<T>,
}

impl<T: Transport + ?Sized> QueryExecutor<T> {
    /// Create an executor over the given transport handle.
    pub fn new(transport: Arc<T>) -> Self {
        let fetcher = BatchFetcher::new(Arc::clone(&transport));
        Self { transport, fetcher }
    }

    /// Validate the request and return the would-be primary command
    /// without executing it.
    pub fn plan(
        &self,
        handle: &VectorSetHandle,
        request: &SimilarityRequest,
    ) -> Result<PlannedCommand> {
        request.validate(handle)?;
        Ok(command::build(handle, request, primary_variant(request)))
    }

    /// Execute the request and return normalized, enriched hits.
    pub async fn search(
        &self,
        handle: &VectorSetHandle,
        request: &SimilarityRequest,
    ) -> Result<SimilaritySearch> {
        request.validate(handle)?;
        let started = Instant::now();

        let primary = command::build(handle, request, primary_variant(request));
        let (reply, variant, fallback_used) = match self.issue(&primary, Phase::Primary).await {
            ExecOutcome::Completed(reply) => (reply, primary.variant, false),
            ExecOutcome::Fatal(e) => return Err(e),
            ExecOutcome::UnsupportedVariant => {
                debug!(
                    collection = handle.name(),
                    "inline attributes unsupported, demoting to base variant"
                );
                let fallback = command::build(handle, request, CommandVariant::Base);
                match self.issue(&fallback, Phase::Fallback).await {
                    ExecOutcome::Completed(reply) => (reply, CommandVariant::Base, true),
                    // A syntax rejection of the base variant too means the
                    // engine lacks the similarity command altogether.
                    ExecOutcome::Fatal(Error::Engine {
                        kind: ReplyErrorKind::Syntax,
                        ..
                    })
                    | ExecOutcome::UnsupportedVariant => {
                        return Err(Error::UnsupportedFeature {
                            command: fallback.render(),
                        })
                    }
                    ExecOutcome::Fatal(e) => return Err(e),
                }
            }
        };

        let parse_phase = if fallback_used {
            Phase::Fallback
        } else {
            Phase::Primary
        };
        let parsed = parse_similarity_reply(reply, variant, parse_phase)?;

        let mut hits: Vec<SimilarityHit> = match parsed {
            ParsedReply::Pairs(items) => items
                .into_iter()
                .map(|(id, score)| SimilarityHit {
                    id,
                    score,
                    vector: None,
                    attributes: None,
                })
                .collect(),
            ParsedReply::Triples(items) => items
                .into_iter()
                .map(|(id, score, attributes)| SimilarityHit {
                    id,
                    score,
                    vector: None,
                    attributes,
                })
                .collect(),
        };

        // Attributes are already satisfied when the enriched variant ran.
        let need_attributes =
            request.with_attributes && variant != CommandVariant::WithAttributes;
        if request.with_vectors || need_attributes {
            let ids: Vec<String> = hits.iter().map(|h| h.id.clone()).collect();
            let collection = handle.name();

            if request.with_vectors && need_attributes {
                let (vectors, attributes) = tokio::join!(
                    self.fetcher.vectors(collection, &ids),
                    self.fetcher.attributes(collection, &ids),
                );
                merge_vectors(&mut hits, vectors);
                merge_attributes(&mut hits, attributes);
            } else if request.with_vectors {
                let vectors = self.fetcher.vectors(collection, &ids).await;
                merge_vectors(&mut hits, vectors);
            } else {
                let attributes = self.fetcher.attributes(collection, &ids).await;
                merge_attributes(&mut hits, attributes);
            }
        }

        Ok(SimilaritySearch {
            hits,
            variant,
            fallback_used,
            elapsed: started.elapsed(),
        })
    }

    async fn issue(&self, cmd: &PlannedCommand, phase: Phase) -> ExecOutcome {
        match self.transport.request(&cmd.argv).await {
            Err(e) => ExecOutcome::Fatal(Error::engine_unavailable(phase, e)),
            Ok(Reply::Error(message)) => {
                let kind = ReplyErrorKind::classify(&message);
                // Only an argument-shaped rejection of the enriched variant
                // means "variant unsupported"; data errors stay fatal.
                if kind == ReplyErrorKind::Syntax
                    && cmd.variant == CommandVariant::WithAttributes
                {
                    ExecOutcome::UnsupportedVariant
                } else {
                    ExecOutcome::Fatal(Error::Engine {
                        phase,
                        kind,
                        message,
                    })
                }
            }
            Ok(reply) => ExecOutcome::Completed(reply),
        }
    }
}

fn primary_variant(request: &SimilarityRequest) -> CommandVariant {
    if request.with_attributes {
        CommandVariant::WithAttributes
    } else {
        CommandVariant::Base
    }
}

/// Positional zip: `values[i]` belongs to `hits[i]` by the fetcher's
/// ordering guarantee.
fn merge_vectors(hits: &mut [SimilarityHit], values: Vec<Option<Vec<f32>>>) {
    for (hit, value) in hits.iter_mut().zip(values) {
        hit.vector = value;
    }
}

fn merge_attributes(hits: &mut [SimilarityHit], values: Vec<Option<serde_json::Value>>) {
    for (hit, value) in hits.iter_mut().zip(values) {
        hit.attributes = value;
    }
}
