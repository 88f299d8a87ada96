//! Wire-command construction for similarity queries.
//!
//! Grammar:
//!
//! ```text
//! SIMILARITY <collection> {BY-VECTOR <f1> ... <fn> | BY-ELEMENT <id>}
//!   [FILTER <predicate>] WITH-SCORES [WITH-ATTRIBUTES]
//!   COUNT <k> [EF <n>] [FILTER-EF <n>] [EXACT] [NO-PARALLEL]
//! ```
//!
//! `WITH-SCORES` is always sent; `WITH-ATTRIBUTES` only in the enriched
//! variant. Each vector component is its own argv entry.

use bytes::Bytes;
use std::fmt;

use crate::handle::VectorSetHandle;
use crate::query::{QueryTarget, SimilarityRequest};
use crate::reply::ToArg;

/// Which shape of the similarity command is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandVariant {
    /// `WITH-SCORES` only; attributes need a secondary fetch.
    Base,
    /// `WITH-SCORES WITH-ATTRIBUTES`; attributes come inline.
    WithAttributes,
}

impl fmt::Display for CommandVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandVariant::Base => write!(f, "base"),
            CommandVariant::WithAttributes => write!(f, "with-attributes"),
        }
    }
}

/// A fully built command, ready to execute or to hand back for plan-only
/// inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCommand {
    /// The argv to submit.
    pub argv: Vec<Bytes>,
    /// Which variant the argv encodes.
    pub variant: CommandVariant,
}

impl PlannedCommand {
    /// Render the argv as a space-joined string for logs and tooling.
    pub fn render(&self) -> String {
        self.argv
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the similarity command for `handle` in the given variant.
///
/// Assumes the request already passed validation.
pub fn build(
    handle: &VectorSetHandle,
    request: &SimilarityRequest,
    variant: CommandVariant,
) -> PlannedCommand {
    let mut argv: Vec<Bytes> = Vec::with_capacity(8 + vector_arity(request));
    argv.push(Bytes::from("SIMILARITY"));
    argv.push(handle.name().to_arg());

    match &request.target {
        QueryTarget::Vector(v) => {
            argv.push(Bytes::from("BY-VECTOR"));
            argv.extend(v.iter().map(|f| f.to_arg()));
        }
        QueryTarget::Element(id) => {
            argv.push(Bytes::from("BY-ELEMENT"));
            argv.push(id.to_arg());
        }
    }

    if let Some(predicate) = &request.filter {
        argv.push(Bytes::from("FILTER"));
        argv.push(predicate.to_arg());
    }

    argv.push(Bytes::from("WITH-SCORES"));
    if variant == CommandVariant::WithAttributes {
        argv.push(Bytes::from("WITH-ATTRIBUTES"));
    }

    argv.push(Bytes::from("COUNT"));
    argv.push(request.k.to_arg());

    if let Some(ef) = request.ef {
        argv.push(Bytes::from("EF"));
        argv.push(ef.to_arg());
    }
    if let Some(ef) = request.filter_ef {
        argv.push(Bytes::from("FILTER-EF"));
        argv.push(ef.to_arg());
    }
    if request.exact {
        argv.push(Bytes::from("EXACT"));
    }
    if request.no_parallel {
        argv.push(Bytes::from("NO-PARALLEL"));
    }

    PlannedCommand { argv, variant }
}

fn vector_arity(request: &SimilarityRequest) -> usize {
    match &request.target {
        QueryTarget::Vector(v) => v.len(),
        QueryTarget::Element(_) => 1,
    }
}
