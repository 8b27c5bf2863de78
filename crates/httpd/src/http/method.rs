use std::fmt::{Debug, Display};

use bytes::Bytes;
use httpd_hal::ascii::{AsciiStr, InvalidAsciiError};

/// Request method. Anything but `GET` is kept verbatim so a rejected
/// request can still be logged by name.
#[derive(Clone, PartialEq, Eq)]
pub struct Method(Repr);

impl Method {
    pub const GET: Self = Self(Repr::Get);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr {
    Get,
    Other(Bytes),
}

// the unit variant sits in the niche of `Bytes`
static_assertions::assert_eq_size!(Repr, Bytes);

impl TryFrom<&[u8]> for Method {
    type Error = InvalidAsciiError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let name = AsciiStr::from_ascii(value)?;
        Ok(match name.as_str() {
            "GET" => Method::GET,
            _ => Method(Repr::Other(Bytes::copy_from_slice(value))),
        })
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Repr::Get => f.write_str("GET"),
            Repr::Other(name) => f.write_str(&String::from_utf8_lossy(name)),
        }
    }
}

impl Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
