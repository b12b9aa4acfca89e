//! URL shape validation
//!
//! Only the shape of a URL is checked: a scheme, a host and a path must be
//! present. An empty path is read as `/`. Full URL grammar is not enforced.

use once_cell::sync::Lazy;
use regex::Regex;

/// RFC 3986 appendix B splitter, with the authority broken into host and port
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*):)?(?://(?:[^@/?#]*@)?(?P<host>\[[^\]]*\]|[^:/?#]*)(?::(?P<port>[0-9]*))?)?(?P<path>[^?#]*)(?:\?(?P<query>[^#]*))?(?:#(?P<fragment>.*))?$",
    )
    .expect("URL pattern is valid")
});

/// Components of a parsed URL; absent parts are `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

/// Split a string into URL components
pub fn parse_url(input: &str) -> UrlParts {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    match URL_PATTERN.captures(input) {
        Some(caps) => {
            let path = caps.name("path").map(|m| m.as_str()).unwrap_or("");
            UrlParts {
                scheme: caps.name("scheme").and_then(|m| non_empty(m.as_str())),
                host: caps.name("host").and_then(|m| non_empty(m.as_str())),
                port: caps.name("port").and_then(|m| m.as_str().parse().ok()),
                path: if path.is_empty() { "/".to_string() } else { path.to_string() },
                query: caps.name("query").map(|m| m.as_str().to_string()),
                fragment: caps.name("fragment").map(|m| m.as_str().to_string()),
            }
        }
        None => UrlParts {
            scheme: None,
            host: None,
            port: None,
            path: "/".to_string(),
            query: None,
            fragment: None,
        },
    }
}

/// Accept a string only if scheme, host and path are all present
pub fn validate_url(input: &str) -> Result<(), String> {
    let parts = parse_url(input);
    if parts.scheme.is_none() {
        return Err(format!("missing URL scheme in '{}'", input));
    }
    if parts.host.is_none() {
        return Err(format!("missing URL host in '{}'", input));
    }
    if parts.path.is_empty() {
        return Err(format!("missing URL path in '{}'", input));
    }
    Ok(())
}
