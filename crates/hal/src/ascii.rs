use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAsciiError;

impl fmt::Display for InvalidAsciiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid ascii")
    }
}

impl std::error::Error for InvalidAsciiError {}

pub fn bytes_are_ascii(bytes: &[u8]) -> Result<(), InvalidAsciiError> {
    if bytes.is_ascii() {
        Ok(())
    } else {
        Err(InvalidAsciiError)
    }
}

#[repr(transparent)]
#[derive(PartialEq, Eq, Hash)]
pub struct AsciiStr([u8]);

impl fmt::Debug for AsciiStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.as_str())
    }
}

impl fmt::Display for AsciiStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsciiStr {
    pub fn from_ascii(bytes: &[u8]) -> Result<&AsciiStr, InvalidAsciiError> {
        bytes_are_ascii(bytes)?;
        // SAFETY: every byte was checked above
        Ok(unsafe { Self::from_ascii_unchecked(bytes) })
    }

    /// # Safety
    ///
    /// `bytes` must only contain values below 0x80.
    pub const unsafe fn from_ascii_unchecked(bytes: &[u8]) -> &AsciiStr {
        unsafe { std::mem::transmute(bytes) }
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: valid ascii is valid UTF-8
        unsafe { std::str::from_utf8_unchecked(&self.0) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for &'_ AsciiStr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

pub trait AsAsciiStr {
    fn as_ascii_str(&self) -> Result<&AsciiStr, InvalidAsciiError>;
}

impl AsAsciiStr for &'_ str {
    fn as_ascii_str(&self) -> Result<&AsciiStr, InvalidAsciiError> {
        AsciiStr::from_ascii(self.as_bytes())
    }
}

impl AsAsciiStr for &'_ [u8] {
    fn as_ascii_str(&self) -> Result<&AsciiStr, InvalidAsciiError> {
        AsciiStr::from_ascii(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_high_bytes() {
        assert!(AsciiStr::from_ascii(b"/index.htm").is_ok());
        assert_eq!(
            AsciiStr::from_ascii(&[b'/', 0xC3, 0xA9]),
            Err(InvalidAsciiError)
        );
    }

    #[test]
    fn as_ascii_str_on_slices() {
        let bytes: &[u8] = b"GET";
        assert_eq!(bytes.as_ascii_str().unwrap().as_str(), "GET");
        assert_eq!("lua".as_ascii_str().unwrap().len(), 3);
    }
}
