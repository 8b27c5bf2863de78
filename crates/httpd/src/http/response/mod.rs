use std::fmt::Display;

use bytes::Bytes;
mod builder;
pub use builder::ResponseBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const SWITCHING_PROTOCOLS: Self = Self(101);
    pub const OK: Self = Self(200);
    pub const NOT_FOUND: Self = Self(404);

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    pub const fn canonical_reason(&self) -> Option<&'static str> {
        Some(match self.0 {
            101 => "Switching Protocols",
            200 => "OK",
            404 => "Not Found",
            _ => return None,
        })
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// `200 OK` head. Without a length the body runs until the connection closes.
pub fn content_head(mime: &str, length: Option<u64>) -> Bytes {
    let builder = ResponseBuilder::new(StatusCode::OK).content_type(mime);
    let builder = match length {
        Some(len) => builder.content_length(len),
        None => builder,
    };
    builder.close().build()
}

pub fn switching_protocols(accept: &str) -> Bytes {
    ResponseBuilder::new(StatusCode::SWITCHING_PROTOCOLS)
        .header("Upgrade", "websocket")
        .header("Connection", "Upgrade")
        .header("Sec-WebSocket-Accept", accept)
        .build()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// The 404 page, with uptime and free heap for a quick look at the board's health.
pub fn not_found(url: &str, uptime_secs: u64, free_heap: usize) -> Bytes {
    let body = format!(
        "<html><head><title>404 Not Found</title></head><body>\
         <h1>Not Found</h1>\
         <p>The requested URL {} was not found on this server.</p>\
         <hr><p>uptime: {} s, free heap: {} bytes</p>\
         </body></html>",
        escape_html(url),
        uptime_secs,
        free_heap
    );
    ResponseBuilder::new(StatusCode::NOT_FOUND)
        .content_type(super::mime::DEFAULT_CONTENT_TYPE)
        .body(body.as_bytes())
}
