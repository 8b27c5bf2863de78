use std::string::FromUtf8Error;

#[derive(Debug, thiserror::Error)]
pub enum UrlDecodeError {
    #[error("malformed encoding")]
    MalformedEncoding, // e.g., `%G1`, `%A`
    #[error(transparent)]
    InvalidUtf8(#[from] FromUtf8Error), // e.g., `%FF` if expecting String output
}

pub fn url_decode(input: &[u8]) -> Result<String, UrlDecodeError> {
    let mut decoded = Vec::with_capacity(input.len());

    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'%' => {
                if i + 2 >= input.len() {
                    return Err(UrlDecodeError::MalformedEncoding);
                }
                decoded.push(parse_hex_byte(&input[i + 1..i + 3])?);
                i += 3;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    Ok(String::from_utf8(decoded)?)
}

fn parse_hex_byte(hex_slice: &[u8]) -> Result<u8, UrlDecodeError> {
    if hex_slice.len() != 2 {
        return Err(UrlDecodeError::MalformedEncoding);
    }
    let high = hex_to_digit(hex_slice[0])?;
    let low = hex_to_digit(hex_slice[1])?;
    Ok((high << 4) | low)
}

fn hex_to_digit(c: u8) -> Result<u8, UrlDecodeError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(UrlDecodeError::MalformedEncoding),
    }
}

/// Maps a request path onto the flash filesystem, e.g. `/foo/bar.lua` under
/// `/html` becomes `/html/foo/bar.lua`.
///
/// Returns `None` for paths that try to climb out of the content root.
pub fn content_path(root: &str, uri: &str) -> Option<String> {
    if uri.split('/').any(|segment| segment == "..") {
        return None;
    }
    let root = root.trim_end_matches('/');
    let mut path = String::with_capacity(root.len() + uri.len() + 1);
    path.push_str(root);
    if !uri.starts_with('/') {
        path.push('/');
    }
    path.push_str(uri);
    Some(path)
}
