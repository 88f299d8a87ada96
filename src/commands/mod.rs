//! Command builders for collection management.

pub mod collections;

use bytes::Bytes;

use crate::error::{Error, Phase, Result, TransportError};
use crate::reply::{Reply, ReplyErrorKind};
use crate::transport::Transport;

/// Submit one management command and promote error replies to [`Error`].
pub(crate) async fn exec<T: Transport + ?Sized>(transport: &T, args: Vec<Bytes>) -> Result<Reply> {
    match transport.request(&args).await {
        Err(e) => Err(Error::engine_unavailable(Phase::Primary, e)),
        Ok(Reply::Error(message)) => Err(Error::Engine {
            phase: Phase::Primary,
            kind: ReplyErrorKind::classify(&message),
            message,
        }),
        Ok(reply) => Ok(reply),
    }
}

pub(crate) fn lift(result: std::result::Result<i64, TransportError>) -> Result<i64> {
    result.map_err(|e| Error::engine_unavailable(Phase::Primary, e))
}
