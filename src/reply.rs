//! Reply frames and command-argument conversion.
//!
//! [`Reply`] mirrors the RESP2 frame types. Error frames decode into
//! [`Reply::Error`] rather than an `Err`, so a pipelined batch can carry
//! per-slot failures without aborting the whole round trip; callers that
//! issue a single command convert error frames at their own boundary.

use bytes::Bytes;
use std::fmt;

use crate::error::TransportError;

/// A single frame returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A simple status line (`+OK`).
    Simple(String),
    /// An error line (`-ERR ...`), carried as a value.
    Error(String),
    /// An integer (`:42`).
    Integer(i64),
    /// A bulk string (`$5\r\nhello`).
    Bulk(Bytes),
    /// An array of frames (`*2 ...`).
    Array(Vec<Reply>),
    /// A null bulk string or null array.
    Nil,
}

impl Reply {
    /// Borrow the frame as UTF-8 text, for simple and bulk strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Simple(s) => Some(s.as_str()),
            Reply::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Borrow the frame as raw bytes, for bulk strings.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer frame.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Parse the frame as a float. Engines send scores as bulk strings.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_str().and_then(|s| s.parse().ok())
    }

    /// Borrow the frame's elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    /// True for the null frame.
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Consume the frame as an array; a null array becomes empty.
    pub fn into_array(self) -> Result<Vec<Reply>, TransportError> {
        match self {
            Reply::Array(items) => Ok(items),
            Reply::Nil => Ok(Vec::new()),
            other => Err(TransportError::UnexpectedReply {
                expected: "array",
                actual: other.kind_name(),
            }),
        }
    }

    /// Consume the frame as an integer.
    pub fn into_integer(self) -> Result<i64, TransportError> {
        match self {
            Reply::Integer(n) => Ok(n),
            other => Err(TransportError::UnexpectedReply {
                expected: "integer",
                actual: other.kind_name(),
            }),
        }
    }

    /// A short name for the frame kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Reply::Simple(_) => "simple string",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk string",
            Reply::Array(_) => "array",
            Reply::Nil => "nil",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(s) => write!(f, "{}", s),
            Reply::Error(e) => write!(f, "(error) {}", e),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "<binary {} bytes>", b.len()),
            },
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
            Reply::Nil => write!(f, "(nil)"),
        }
    }
}

/// Category of an engine error reply, parsed once from its code token.
///
/// The fallback decision in the query executor branches on this category,
/// never on raw message text: only [`ReplyErrorKind::Syntax`] counts as an
/// argument-shaped rejection that may mean "variant not supported".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyErrorKind {
    /// The engine rejected the command's argument shape.
    Syntax,
    /// The key holds a value of the wrong type.
    WrongType,
    /// A named element or collection does not exist.
    NotFound,
    /// Any other engine-side failure (data errors, limits, internal).
    Other,
}

impl ReplyErrorKind {
    /// Classify an error reply by its leading code token and shape.
    ///
    /// This is the single place where reply text is inspected; everything
    /// downstream consumes the category.
    pub fn classify(message: &str) -> Self {
        let mut parts = message.splitn(2, ' ');
        let code = parts.next().unwrap_or("");
        let detail = parts.next().unwrap_or("").trim_start();

        match code {
            "WRONGTYPE" => ReplyErrorKind::WrongType,
            "ERR" => {
                let lowered = detail.to_ascii_lowercase();
                if lowered.starts_with("syntax error")
                    || lowered.starts_with("unknown argument")
                    || lowered.starts_with("unknown option")
                {
                    ReplyErrorKind::Syntax
                } else if lowered.contains("not found") || lowered.contains("no such") {
                    ReplyErrorKind::NotFound
                } else {
                    ReplyErrorKind::Other
                }
            }
            _ => ReplyErrorKind::Other,
        }
    }
}

/// Types that can be encoded as a command argument.
pub trait ToArg {
    /// Encode this value as a bulk-string argument.
    fn to_arg(&self) -> Bytes;
}

impl ToArg for &str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for &String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

impl ToArg for &[u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for i64 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for u64 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for u32 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for usize {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for f32 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for f64 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_syntax_rejection() {
        assert_eq!(
            ReplyErrorKind::classify("ERR syntax error in SIMILARITY command"),
            ReplyErrorKind::Syntax
        );
        assert_eq!(
            ReplyErrorKind::classify("ERR unknown argument WITH-ATTRIBUTES"),
            ReplyErrorKind::Syntax
        );
    }

    #[test]
    fn classify_data_errors_are_not_syntax() {
        assert_eq!(
            ReplyErrorKind::classify("ERR invalid FILTER expression"),
            ReplyErrorKind::Other
        );
        assert_eq!(
            ReplyErrorKind::classify("ERR element not found in set"),
            ReplyErrorKind::NotFound
        );
        assert_eq!(
            ReplyErrorKind::classify("WRONGTYPE Operation against a key holding the wrong kind of value"),
            ReplyErrorKind::WrongType
        );
    }

    #[test]
    fn classify_without_detail() {
        assert_eq!(ReplyErrorKind::classify("ERR"), ReplyErrorKind::Other);
        assert_eq!(ReplyErrorKind::classify(""), ReplyErrorKind::Other);
    }

    #[test]
    fn reply_accessors() {
        assert_eq!(Reply::Bulk(Bytes::from("0.75")).as_f64(), Some(0.75));
        assert_eq!(Reply::Simple("OK".into()).as_str(), Some("OK"));
        assert!(Reply::Nil.is_nil());
        assert_eq!(Reply::Integer(3).into_integer().unwrap(), 3);
        assert!(Reply::Bulk(Bytes::from("x")).into_integer().is_err());
    }

    #[test]
    fn nil_into_array_is_empty() {
        assert!(Reply::Nil.into_array().unwrap().is_empty());
    }
}
