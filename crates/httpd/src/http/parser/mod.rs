//! Request-line parser for the GET-only subset the server speaks.
//!
//! The whole request is expected in the first receive. Only the request line
//! is parsed eagerly; header lines are looked up lazily through
//! [`Request::header`](crate::http::request::Request::header).

use std::ops::Range;

use bytes::Bytes;
use memchr::{memchr, memchr2};

mod error;
mod line;
pub use error::*;
pub use line::RequestLine;

use crate::http::{query::QueryList, request::Request, uri::url_decode};

pub type HttpParseResult<T> = Result<T, HttpParseError>;

/// A cursor over one line of the received head, CRLF excluded.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    buf: &'a [u8],
    line_start: usize,
    line_end: usize,
}

impl<'a> Line<'a> {
    /// Splits the line starting at `start` off `buf`.
    /// Returns the line and the offset of the following one, if any.
    pub fn at(buf: &'a [u8], start: usize) -> Option<(Self, Option<usize>)> {
        if start >= buf.len() {
            return None;
        }
        let (end, next) = match memchr(b'\n', &buf[start..]) {
            Some(nl_rel) => {
                let nl = start + nl_rel;
                let end = if nl > start && buf[nl - 1] == b'\r' {
                    nl - 1
                } else {
                    nl
                };
                (end, Some(nl + 1))
            }
            None => {
                let end = if buf.last() == Some(&b'\r') {
                    buf.len() - 1
                } else {
                    buf.len()
                };
                (end.max(start), None)
            }
        };
        Some((
            Self {
                buf,
                line_start: start,
                line_end: end,
            },
            next,
        ))
    }

    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    pub fn start(&self) -> usize {
        self.line_start
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_slice(&self) -> &'a [u8] {
        &self.buf[self.range()]
    }

    pub fn range(&self) -> Range<usize> {
        self.line_start..self.line_end
    }

    /// Returns the range of the next word (everything before the next space, or the end of the
    /// line), and advances the start of the line
    pub fn next_word(&mut self) -> Option<Range<usize>> {
        if self.line_start >= self.line_end {
            return None;
        }

        let start = self.line_start;
        if let Some(sp) = memchr2(b' ', b'\t', self.as_slice()) {
            self.line_start += sp + 1;
            Some(start..start + sp)
        } else {
            self.line_start = self.line_end;
            Some(start..self.line_end)
        }
    }

    /// Returns the range up to `byte` and advances past it.
    pub fn next(&mut self, byte: u8) -> Option<Range<usize>> {
        if self.line_start >= self.line_end {
            return None;
        }
        let start = self.line_start;
        let split = memchr(byte, self.as_slice())? + start;
        self.line_start = split + 1;
        Some(start..split)
    }

    pub fn trim(&self) -> Range<usize> {
        const WHITESPACE: &[u8] = b" \t";
        let mut start = self.line_start;
        let mut end = self.line_end;
        while start < end && WHITESPACE.contains(&self.buf[start]) {
            start += 1;
        }

        while end > start && WHITESPACE.contains(&self.buf[end - 1]) {
            end -= 1;
        }

        start..end
    }
}

/// Lower-cased suffix of the last path segment: everything after its first dot.
pub(crate) fn suffix_of(path: &str) -> Option<String> {
    let name = &path[path.rfind('/').map_or(0, |slash| slash + 1)..];
    let dot = name.find('.')?;
    let suffix = &name[dot + 1..];
    (!suffix.is_empty()).then(|| suffix.to_ascii_lowercase())
}

/// Parses the head of a request received on a fresh connection.
pub fn parse_request(head: Bytes, max_path: usize) -> HttpParseResult<Request> {
    let (line, _) = Line::at(&head, 0).ok_or_else(|| {
        HttpParseError::new(ParseErrorKind::IncompleteMessage, Location::StartLine, 0)
    })?;
    let request_line = RequestLine::parse(line, max_path)?;

    let uri = url_decode(&head[request_line.path.clone()]).map_err(|_| {
        HttpParseError::new(
            ParseErrorKind::InvalidTarget,
            Location::StartLine,
            request_line.path.start,
        )
    })?;
    let suffix = suffix_of(&uri);
    let query = match &request_line.query {
        Some(range) => QueryList::parse(&head[range.clone()]),
        None => QueryList::new(),
    };

    Ok(Request::new(
        request_line.method,
        uri,
        suffix,
        query,
        request_line.version,
        head,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpVersion;

    mod line {
        use super::*;

        #[test]
        fn line_next_word() {
            let content = b"this is a test a\n";
            let (mut line, next) = Line::at(content, 0).unwrap();
            assert_eq!(next, Some(content.len()));
            assert_eq!(line.next_word(), Some(0..4));
            assert_eq!(line.next_word(), Some(5..7));
            assert_eq!(line.next_word(), Some(8..9));
            assert_eq!(line.next_word(), Some(10..14));
            assert_eq!(line.next_word(), Some(15..16));
            assert_eq!(line.next_word(), None);
        }

        #[test]
        fn line_next() {
            let content = b"name: value: a\r\n";
            let (mut line, _) = Line::at(content, 0).unwrap();
            assert_eq!(line.next(b':'), Some(0..4));
            assert_eq!(line.as_slice(), b" value: a");
        }

        #[test]
        fn line_trim() {
            let content = b" \t\tvalue with spaces\t \t\n";
            let (line, _) = Line::at(content, 0).unwrap();
            assert_eq!(line.trim(), 3..20);
        }

        #[test]
        fn lines_without_terminator() {
            let content = b"GET / HTTP/1.1\r\nHost: x";
            let (first, next) = Line::at(content, 0).unwrap();
            assert_eq!(first.as_slice(), b"GET / HTTP/1.1");
            let (second, next) = Line::at(content, next.unwrap()).unwrap();
            assert_eq!(second.as_slice(), b"Host: x");
            assert_eq!(next, None);
        }
    }

    fn parse(raw: &'static [u8]) -> HttpParseResult<Request> {
        parse_request(Bytes::from_static(raw), 64)
    }

    #[test]
    fn query_pairs_and_no_suffix() {
        let req = parse(b"GET /x?a=1&b=two HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.uri, "/x");
        assert_eq!(req.suffix, None);
        assert_eq!(req.version, HttpVersion::HTTP_1_1);
        assert_eq!(req.query.get("a"), Some("1"));
        assert_eq!(req.query.get("b"), Some("two"));
        assert_eq!(req.query.len(), 2);
    }

    #[test]
    fn suffix_is_lowercased() {
        let req = parse(b"GET /img/Logo.PNG HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.uri, "/img/Logo.PNG");
        assert_eq!(req.suffix.as_deref(), Some("png"));
    }

    #[test]
    fn dot_in_directory_is_not_a_suffix() {
        let req = parse(b"GET /v1.2/readme HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.suffix, None);
        let req = parse(b"GET /lib/jquery.min.js HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.suffix.as_deref(), Some("min.js"));
        assert_eq!(crate::http::mime::content_type(req.suffix.as_deref()), "text/html");
    }

    #[test]
    fn rejects_other_methods() {
        let err = parse(b"POST /form.lua HTTP/1.1\r\n\r\n").unwrap_err();
        let ParseErrorKind::UnsupportedMethod(method) = &err.kind else {
            panic!("expected an unsupported method, got {:?}", err.kind);
        };
        assert_eq!(method.to_string(), "POST");
        assert_eq!(err.location, Location::StartLine);
    }

    #[test]
    fn rejects_oversized_path() {
        let err = parse_request(
            Bytes::from_static(b"GET /a/very/long/path/indeed.htm HTTP/1.1\r\n"),
            8,
        )
        .unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::TooLarge {
                what: LimitKind::PathBytes,
                limit: 8,
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse(b"").unwrap_err().kind, ParseErrorKind::IncompleteMessage);
        assert_eq!(parse(b"GET").unwrap_err().kind, ParseErrorKind::MalformedRequestLine);
        assert_eq!(
            parse(b"GET index.htm HTTP/1.1\r\n").unwrap_err().kind,
            ParseErrorKind::InvalidTarget
        );
        assert_eq!(
            parse(b"GET / HTTP/one\r\n").unwrap_err().kind,
            ParseErrorKind::InvalidVersion
        );
        assert_eq!(
            parse(b"GET / HTTP/1.1 trailing\r\n").unwrap_err().kind,
            ParseErrorKind::MalformedRequestLine
        );
    }

    #[test]
    fn version_is_optional() {
        let req = parse(b"GET /\r\n").unwrap();
        assert_eq!(req.uri, "/");
        assert_eq!(req.version, HttpVersion::HTTP_1_0);
    }
}
