use std::ops::Range;

use httpd_hal::ascii::AsciiStr;

use crate::http::{
    HttpVersion,
    method::Method,
    parser::{HttpParseError, HttpParseResult, LimitKind, Line, Location, ParseErrorKind},
};

/// Byte ranges of one request line, relative to the received head.
#[derive(Debug)]
pub struct RequestLine {
    pub method: Method,
    pub path: Range<usize>,
    pub query: Option<Range<usize>>,
    pub version: HttpVersion,
}

impl RequestLine {
    // OBNF: request-line = method SP request-target SP HTTP-version
    // HTTP/0.9 style lines without a version are accepted and treated as 1.0.
    pub fn parse(mut line: Line<'_>, max_path: usize) -> HttpParseResult<Self> {
        let make_err =
            |kind: ParseErrorKind, offset: usize| HttpParseError::new(kind, Location::StartLine, offset);

        let method_range = line
            .next(b' ')
            .ok_or_else(|| make_err(ParseErrorKind::MalformedRequestLine, line.start()))?;
        let method = Method::try_from(&line.buf()[method_range.clone()])
            .map_err(|_| make_err(ParseErrorKind::InvalidMethod, method_range.start))?;
        if method != Method::GET {
            return Err(make_err(
                ParseErrorKind::UnsupportedMethod(method),
                method_range.start,
            ));
        }

        let target = line
            .next_word()
            .ok_or_else(|| make_err(ParseErrorKind::MalformedRequestLine, line.start()))?;
        let buf = line.buf();
        if buf.get(target.start) != Some(&b'/') {
            return Err(make_err(ParseErrorKind::InvalidTarget, target.start));
        }

        let (path, query) = match memchr::memchr(b'?', &buf[target.clone()]) {
            Some(q) => (
                target.start..target.start + q,
                Some(target.start + q + 1..target.end),
            ),
            None => (target.clone(), None),
        };
        if path.len() > max_path {
            return Err(make_err(
                ParseErrorKind::TooLarge {
                    what: LimitKind::PathBytes,
                    limit: max_path,
                    actual: path.len(),
                },
                path.start,
            ));
        }
        AsciiStr::from_ascii(&buf[target.clone()])
            .map_err(|_| make_err(ParseErrorKind::InvalidTarget, target.start))?;

        let version = match line.next_word() {
            None => HttpVersion::HTTP_1_0,
            Some(range) => AsciiStr::from_ascii(&buf[range.clone()])
                .map_err(|_| make_err(ParseErrorKind::InvalidVersion, range.start))?
                .as_str()
                .parse::<HttpVersion>()
                .map_err(|_| make_err(ParseErrorKind::InvalidVersion, range.start))?,
        };

        if !line.is_empty() {
            return Err(make_err(ParseErrorKind::MalformedRequestLine, line.start()));
        }

        Ok(Self {
            method,
            path,
            query,
            version,
        })
    }
}
