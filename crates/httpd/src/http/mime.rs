//! Suffix to content-type table.

pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

const SCRIPT_SUFFIXES: &[&str] = &["lua", "cgi"];

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ssi", "text/html"),
    ("lua", "text/html"),
    ("cgi", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("xml", "text/xml"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
];

/// Content type for a lower-cased suffix; HTML when unknown or absent.
pub fn content_type(suffix: Option<&str>) -> &'static str {
    suffix
        .and_then(|suffix| {
            CONTENT_TYPES
                .iter()
                .find(|(known, _)| *known == suffix)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Suffixes executed by the script bridge instead of being served as files.
pub fn is_script(suffix: &str) -> bool {
    SCRIPT_SUFFIXES.contains(&suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types() {
        assert_eq!(content_type(Some("jpg")), "image/jpeg");
        assert_eq!(content_type(Some("png")), "image/png");
        assert_eq!(content_type(Some("gif")), "image/gif");
        assert_eq!(content_type(Some("css")), "text/css");
        assert_eq!(content_type(Some("js")), "application/javascript");
        assert_eq!(content_type(Some("lua")), "text/html");
    }

    #[test]
    fn unknown_defaults_to_html() {
        assert_eq!(content_type(Some("exe")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type(None), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn scripts() {
        assert!(is_script("lua"));
        assert!(is_script("cgi"));
        assert!(!is_script("htm"));
        assert!(!is_script("ssi"));
    }
}
