//! Lazy header lookup over the received head.
//!
//! Only the handful of headers the WebSocket handshake needs are ever read,
//! so nothing is indexed up front.

use unicase::UniCase;

use crate::http::parser::Line;

pub const UPGRADE: &str = "Upgrade";
pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";

/// Returns the trimmed value of the first header called `name`.
pub fn find<'a>(head: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let wanted = UniCase::ascii(name);
    // skip the request line
    let (_, mut next) = Line::at(head, 0)?;
    while let Some((mut line, following)) = next.and_then(|start| Line::at(head, start)) {
        if line.is_empty() {
            break;
        }
        next = following;
        let Some(name_range) = line.next(b':') else {
            continue;
        };
        let Ok(field) = std::str::from_utf8(&head[name_range]) else {
            continue;
        };
        if UniCase::ascii(field) == wanted {
            return Some(&head[line.trim()]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD: &[u8] = b"GET /chat HTTP/1.1\r\n\
        Host: esp\r\n\
        upgrade:   websocket \r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        \r\n\
        Ignored: body\r\n";

    #[test]
    fn case_insensitive_lookup() {
        assert_eq!(find(HEAD, UPGRADE), Some(&b"websocket"[..]));
        assert_eq!(
            find(HEAD, "sec-websocket-key"),
            Some(&b"dGhlIHNhbXBsZSBub25jZQ=="[..])
        );
        assert_eq!(find(HEAD, "host"), Some(&b"esp"[..]));
    }

    #[test]
    fn stops_at_blank_line() {
        assert_eq!(find(HEAD, "Ignored"), None);
        assert_eq!(find(b"GET / HTTP/1.1\r\n", UPGRADE), None);
    }
}
