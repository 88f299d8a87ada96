//! Reply parsing for similarity queries.
//!
//! The engine replies with a flat array: alternating (id, score) pairs in
//! the base variant, (id, score, attributes) triples in the enriched one.
//! The shape is decided once, from the variant that actually ran, and the
//! structural checks (arity, score parse) all live here.

use tracing::debug;

use crate::error::{Error, Phase, Result, TransportError};
use crate::query::command::CommandVariant;
use crate::reply::Reply;

/// A reply parsed into its tagged shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    /// (id, score) pairs from the base variant.
    Pairs(Vec<(String, f64)>),
    /// (id, score, attributes) triples from the enriched variant.
    Triples(Vec<(String, f64, Option<serde_json::Value>)>),
}

impl ParsedReply {
    /// Number of hits carried.
    pub fn len(&self) -> usize {
        match self {
            ParsedReply::Pairs(items) => items.len(),
            ParsedReply::Triples(items) => items.len(),
        }
    }

    /// True when the reply carried no hits.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a similarity reply according to the executed variant.
///
/// `phase` attributes structural failures to the primary or fallback
/// attempt. A nil reply (unknown collection) parses as zero hits, which
/// is how the engine reports an empty set.
pub fn parse_similarity_reply(
    reply: Reply,
    variant: CommandVariant,
    phase: Phase,
) -> Result<ParsedReply> {
    let items = reply
        .into_array()
        .map_err(|e| Error::engine_unavailable(phase, e))?;

    match variant {
        CommandVariant::Base => {
            expect_arity(items.len(), 2, phase)?;
            let mut pairs = Vec::with_capacity(items.len() / 2);
            for chunk in items.chunks_exact(2) {
                pairs.push((parse_id(&chunk[0], phase)?, parse_score(&chunk[1], phase)?));
            }
            Ok(ParsedReply::Pairs(pairs))
        }
        CommandVariant::WithAttributes => {
            expect_arity(items.len(), 3, phase)?;
            let mut triples = Vec::with_capacity(items.len() / 3);
            for chunk in items.chunks_exact(3) {
                triples.push((
                    parse_id(&chunk[0], phase)?,
                    parse_score(&chunk[1], phase)?,
                    parse_attributes(&chunk[2]),
                ));
            }
            Ok(ParsedReply::Triples(triples))
        }
    }
}

fn expect_arity(len: usize, stride: usize, phase: Phase) -> Result<()> {
    if len % stride != 0 {
        return Err(Error::engine_unavailable(
            phase,
            TransportError::Protocol(format!(
                "similarity reply length {} is not a multiple of {}",
                len, stride
            )),
        ));
    }
    Ok(())
}

fn parse_id(frame: &Reply, phase: Phase) -> Result<String> {
    frame
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::engine_unavailable(
                phase,
                TransportError::Protocol(format!(
                    "similarity reply id slot holds {}",
                    frame.kind_name()
                )),
            )
        })
}

fn parse_score(frame: &Reply, phase: Phase) -> Result<f64> {
    frame.as_f64().ok_or_else(|| {
        Error::engine_unavailable(
            phase,
            TransportError::Protocol(format!(
                "similarity reply score slot holds {}",
                frame.kind_name()
            )),
        )
    })
}

/// Inline attributes: a JSON bulk string or a nil marker.
///
/// Unparseable JSON degrades to `None` like any other missing attribute
/// payload; the hit itself is still valid.
fn parse_attributes(frame: &Reply) -> Option<serde_json::Value> {
    if frame.is_nil() {
        return None;
    }
    let text = frame.as_str()?;
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "discarding unparseable inline attributes");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn bulk(s: &str) -> Reply {
        Reply::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }

    #[test]
    fn parses_pairs() {
        let reply = Reply::Array(vec![bulk("e1"), bulk("0.9"), bulk("e2"), bulk("0.7")]);
        let parsed = parse_similarity_reply(reply, CommandVariant::Base, Phase::Primary).unwrap();
        assert_eq!(
            parsed,
            ParsedReply::Pairs(vec![("e1".into(), 0.9), ("e2".into(), 0.7)])
        );
    }

    #[test]
    fn parses_triples_with_nil_and_json() {
        let reply = Reply::Array(vec![
            bulk("e1"),
            bulk("0.9"),
            bulk(r#"{"year":2021}"#),
            bulk("e2"),
            bulk("0.7"),
            Reply::Nil,
        ]);
        let parsed =
            parse_similarity_reply(reply, CommandVariant::WithAttributes, Phase::Primary).unwrap();
        match parsed {
            ParsedReply::Triples(items) => {
                assert_eq!(items[0].2, Some(serde_json::json!({"year": 2021})));
                assert_eq!(items[1].2, None);
            }
            other => panic!("expected triples, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_inline_attributes_degrade_to_none() {
        let reply = Reply::Array(vec![bulk("e1"), bulk("0.9"), bulk("{not json")]);
        let parsed =
            parse_similarity_reply(reply, CommandVariant::WithAttributes, Phase::Primary).unwrap();
        assert_eq!(
            parsed,
            ParsedReply::Triples(vec![("e1".into(), 0.9, None)])
        );
    }

    #[test]
    fn arity_mismatch_is_fatal_with_phase() {
        let reply = Reply::Array(vec![bulk("e1"), bulk("0.9"), bulk("e2")]);
        let err =
            parse_similarity_reply(reply, CommandVariant::Base, Phase::Fallback).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Fallback));
    }

    #[test]
    fn score_must_parse() {
        let reply = Reply::Array(vec![bulk("e1"), Reply::Nil]);
        assert!(parse_similarity_reply(reply, CommandVariant::Base, Phase::Primary).is_err());
    }

    #[test]
    fn nil_reply_is_empty() {
        let parsed =
            parse_similarity_reply(Reply::Nil, CommandVariant::Base, Phase::Primary).unwrap();
        assert!(parsed.is_empty());
    }
}
