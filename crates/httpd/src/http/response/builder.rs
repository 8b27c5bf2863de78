use std::fmt::{Display, Write};

use bytes::{Bytes, BytesMut};
use smallvec::SmallVec;

use crate::http::{HttpVersion, response::StatusCode};

/// Builds a response head. Headers are written in the order they were added.
pub struct ResponseBuilder {
    version: HttpVersion,
    status: StatusCode,
    headers: SmallVec<[(&'static str, String); 4]>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: HttpVersion::HTTP_1_1,
            status,
            headers: SmallVec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Display) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn content_type(self, mime: &str) -> Self {
        self.header("Content-type", mime)
    }

    pub fn content_length(self, len: u64) -> Self {
        self.header("Content-Length", len)
    }

    pub fn close(self) -> Self {
        self.header("Connection", "close")
    }

    fn write_head(&self, buf: &mut BytesMut) {
        // BytesMut grows on demand, so formatting into it cannot fail
        let _ = write!(
            buf,
            "{} {} {}\r\n",
            self.version,
            self.status,
            self.status.canonical_reason().unwrap_or("Unknown Reason")
        );
        for (name, value) in &self.headers {
            let _ = write!(buf, "{}: {}\r\n", name, value);
        }
        buf.extend_from_slice(b"\r\n");
    }

    /// The head alone, terminated by the blank line.
    pub fn build(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(128);
        self.write_head(&mut buf);
        buf.freeze()
    }

    /// Head plus a body of known length.
    pub fn body(self, body: &[u8]) -> Bytes {
        let builder = self.content_length(body.len() as u64).close();
        let mut buf = BytesMut::with_capacity(128 + body.len());
        builder.write_head(&mut buf);
        buf.extend_from_slice(body);
        buf.freeze()
    }
}
