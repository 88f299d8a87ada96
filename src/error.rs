//! Error types for the vector-set client.
//!
//! Two layers: [`TransportError`] covers everything that can go wrong
//! between this process and the engine socket (I/O, protocol framing,
//! pool exhaustion), while [`Error`] is the crate-level taxonomy with
//! the request phase attached, so callers and tests can branch on *where*
//! a failure happened rather than on message text.

use std::fmt;

use crate::reply::ReplyErrorKind;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The phase of a similarity request that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Request validation, before any engine traffic.
    Validate,
    /// The primary similarity command.
    Primary,
    /// The demoted re-issue after an unsupported-variant rejection.
    Fallback,
    /// Secondary per-element enrichment fetches.
    Enrich,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Validate => write!(f, "validate"),
            Phase::Primary => write!(f, "primary"),
            Phase::Fallback => write!(f, "fallback"),
            Phase::Enrich => write!(f, "enrich"),
        }
    }
}

/// Errors raised by the transport layer (socket, framing, pool).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred during communication.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The wire data was malformed or unexpected.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The reply type did not match what the command expects.
    #[error("unexpected reply: expected {expected}, got {actual}")]
    UnexpectedReply {
        /// The expected frame kind.
        expected: &'static str,
        /// The actual frame kind.
        actual: &'static str,
    },

    /// The connection to the engine was closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// The connection pool has no free slots.
    #[error("connection pool exhausted (max size: {max_size})")]
    PoolExhausted {
        /// The maximum pool size.
        max_size: usize,
    },

    /// Authentication failed on connect.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Errors surfaced by the client to its callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was malformed; no engine call was issued.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The engine could not be reached, or its reply could not be decoded.
    #[error("engine unavailable in {phase} phase: {source}")]
    EngineUnavailable {
        /// The request phase that failed.
        phase: Phase,
        /// The transport failure that caused it.
        #[source]
        source: TransportError,
    },

    /// The engine answered with an error reply.
    #[error("engine error in {phase} phase: {message}")]
    Engine {
        /// The request phase that failed.
        phase: Phase,
        /// Error category parsed from the reply's code token.
        kind: ReplyErrorKind,
        /// The full error message as sent by the engine.
        message: String,
    },

    /// The engine rejected the command variant on both attempts.
    #[error("engine does not support command: {command}")]
    UnsupportedFeature {
        /// Rendered form of the rejected command.
        command: String,
    },

    /// An embedding provider failed to produce a vector.
    #[error("embedding provider error: {0}")]
    Embedding(String),
}

impl Error {
    /// The phase this error is attributed to, if it carries one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Validation(_) => Some(Phase::Validate),
            Error::EngineUnavailable { phase, .. } | Error::Engine { phase, .. } => Some(*phase),
            Error::UnsupportedFeature { .. } => Some(Phase::Fallback),
            Error::Embedding(_) => None,
        }
    }

    /// True if this error was produced before any engine traffic.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub(crate) fn engine_unavailable(phase: Phase, source: TransportError) -> Self {
        Error::EngineUnavailable { phase, source }
    }
}
