use std::ops::Deref;

use httpd_hal::QueryParam;
use smallvec::SmallVec;

use crate::http::uri::url_decode;

/// Name/value pairs of one request's query string, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryList(SmallVec<[QueryParam; 4]>);

fn decode(raw: &[u8]) -> String {
    url_decode(raw).unwrap_or_else(|_| String::from_utf8_lossy(raw).into_owned())
}

impl QueryList {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Parses `a=1&b=two`. A pair without `=` gets an empty value, empty names are skipped.
    pub fn parse(raw: &[u8]) -> Self {
        let mut list = Self::new();
        for pair in raw.split(|b| *b == b'&') {
            let (name, value) = match memchr::memchr(b'=', pair) {
                Some(eq) => (&pair[..eq], &pair[eq + 1..]),
                None => (pair, &b""[..]),
            };
            if name.is_empty() {
                continue;
            }
            list.0.push(QueryParam::new(decode(name), decode(value)));
        }
        list
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value.as_str())
    }
}

impl Deref for QueryList {
    type Target = [QueryParam];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_in_order() {
        let list = QueryList::parse(b"a=1&b=two");
        assert_eq!(
            &list[..],
            &[QueryParam::new("a", "1"), QueryParam::new("b", "two")]
        );
    }

    #[test]
    fn odd_pairs() {
        let list = QueryList::parse(b"flag&=x&&msg=hello%20world&bad=%ZZ");
        assert_eq!(list.len(), 3);
        assert_eq!(list.get("flag"), Some(""));
        assert_eq!(list.get("msg"), Some("hello world"));
        assert_eq!(list.get("bad"), Some("%ZZ"));
        assert_eq!(list.get("missing"), None);
    }

    #[test]
    fn empty_query() {
        assert!(QueryList::parse(b"").is_empty());
    }
}
