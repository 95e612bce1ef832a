//! Decoded reply values.

use std::fmt;

/// One reply from the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Simple status line, e.g. `+OK`.
    Status(String),
    /// Signed 64-bit integer, e.g. `:1`.
    Integer(i64),
    /// Bulk string. `None` is the null reply (`$-1`), which is not the same
    /// thing as an empty string (`$0`).
    Bulk(Option<String>),
    /// Error line, e.g. `-ERR unknown command`.
    Error(String),
}

impl Reply {
    /// Short name of the reply type, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Integer(_) => "integer",
            Reply::Bulk(Some(_)) => "bulk string",
            Reply::Bulk(None) => "null",
            Reply::Error(_) => "error",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "+{}", s),
            Reply::Integer(n) => write!(f, ":{}", n),
            Reply::Bulk(Some(s)) => write!(f, "\"{}\"", s),
            Reply::Bulk(None) => write!(f, "(nil)"),
            Reply::Error(e) => write!(f, "-{}", e),
        }
    }
}
