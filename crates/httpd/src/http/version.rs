use std::str::FromStr;

/// HTTP Version
/// RFC 9110 2.5. Protocol Version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpVersion {
    pub major: u8,
    pub minor: u8,
}

impl HttpVersion {
    pub const HTTP_1_0: Self = Self { major: 1, minor: 0 };
    pub const HTTP_1_1: Self = Self { major: 1, minor: 1 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseHttpVersionError;

impl std::fmt::Display for ParseHttpVersionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid HTTP version")
    }
}

impl std::error::Error for ParseHttpVersionError {}

impl FromStr for HttpVersion {
    type Err = ParseHttpVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("HTTP/").ok_or(ParseHttpVersionError)?;
        let (major, minor) = s.split_once('.').ok_or(ParseHttpVersionError)?;
        let major = major.parse::<u8>().map_err(|_| ParseHttpVersionError)?;
        let minor = minor.parse::<u8>().map_err(|_| ParseHttpVersionError)?;
        Ok(HttpVersion { major, minor })
    }
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}
