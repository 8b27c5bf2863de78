use bytes::Bytes;

use crate::http::{HttpVersion, header, method::Method, query::QueryList};

/// A parsed GET request. Owned by its connection slot and dropped with it.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Decoded path, without the query string.
    pub uri: String,
    /// Lower-cased file suffix of the last path segment.
    pub suffix: Option<String>,
    pub query: QueryList,
    pub version: HttpVersion,
    head: Bytes,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        uri: String,
        suffix: Option<String>,
        query: QueryList,
        version: HttpVersion,
        head: Bytes,
    ) -> Self {
        Self {
            method,
            uri,
            suffix,
            query,
            version,
            head,
        }
    }

    pub fn header(&self, name: &str) -> Option<&[u8]> {
        header::find(&self.head, name)
    }

    /// `Upgrade: websocket` is present.
    pub fn wants_websocket(&self) -> bool {
        self.header(header::UPGRADE)
            .is_some_and(|value| value.eq_ignore_ascii_case(b"websocket"))
    }
}
