use std::fmt::Display;

use crate::http::method::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    StartLine,
    Query,
    Headers,
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::StartLine => "start line",
            Self::Query => "query",
            Self::Headers => "headers",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    PathBytes,
}

impl Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::PathBytes => "path bytes",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    InvalidMethod,
    UnsupportedMethod(Method),
    InvalidTarget,
    InvalidVersion,
    MalformedRequestLine,
    TooLarge {
        what: LimitKind,
        limit: usize,
        actual: usize,
    },
    IncompleteMessage,
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMethod => f.write_str("invalid method"),
            Self::UnsupportedMethod(method) => write!(f, "unsupported method {}", method),
            Self::InvalidTarget => f.write_str("invalid target"),
            Self::InvalidVersion => f.write_str("invalid version"),
            Self::MalformedRequestLine => f.write_str("malformed request line"),
            Self::TooLarge {
                what,
                limit,
                actual,
            } => write!(
                f,
                "limit {} exceeded (limit: {}, actual: {})",
                what, limit, actual
            ),
            Self::IncompleteMessage => f.write_str("incomplete message"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpParseError {
    pub kind: ParseErrorKind,
    pub location: Location,
    /// Byte offset into the received head where the error was noticed.
    pub offset: usize,
}

impl HttpParseError {
    pub(crate) fn new(kind: ParseErrorKind, location: Location, offset: usize) -> Self {
        Self {
            kind,
            location,
            offset,
        }
    }
}

impl Display for HttpParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "http parse error: {} while parsing {} at offset {}",
            self.kind, self.location, self.offset
        )
    }
}

impl std::error::Error for HttpParseError {}
