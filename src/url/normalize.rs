use crate::UrlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Scheme assumed when a URL is written without one
pub const SCHEME_HTTP: &str = "http";

/// Canonical, hashable identity of a crawled resource
///
/// Equality and hashing are based on the decomposed components only, so two
/// spellings of a URL collide when (and only when) their components are
/// literally equal after parsing. No semantic path rewriting happens here
/// beyond what [`Url`] parsing and relative resolution already perform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedUrl {
    scheme: String,
    /// `host[:port]`, the port only when it is not the scheme default
    host: String,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl NormalizedUrl {
    /// Decomposes a parsed URL. User info is not part of the identity.
    pub fn from_url(url: &Url) -> Result<Self, UrlError> {
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(UrlError::Parse(format!("URL has no host: {}", url))),
        };

        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The network location, `host[:port]`
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Returns `host[:port]` followed by the path, e.g. `example.com/docs/`
    pub fn host_and_path(&self) -> String {
        format!("{}{}", self.host, self.path)
    }

    /// Returns the same URL with the fragment removed
    ///
    /// Fragments never reach the server, so this is what a fetch actually
    /// requests.
    pub fn without_fragment(&self) -> Self {
        Self {
            fragment: None,
            ..self.clone()
        }
    }

    /// Re-parses the canonical string form into a [`Url`]
    pub fn to_url(&self) -> Result<Url, UrlError> {
        Url::parse(&self.to_string()).map_err(|e| UrlError::Parse(format!("{}: {}", self, e)))
    }

    /// Resolves a possibly relative reference against this URL
    pub fn join(&self, reference: &str) -> Result<Self, UrlError> {
        let resolved = self
            .to_url()?
            .join(reference)
            .map_err(|e| UrlError::Parse(format!("{}: {}", reference, e)))?;
        Self::from_url(&resolved)
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

/// Normalizes a raw URL string into a [`NormalizedUrl`]
///
/// # Normalization Steps
///
/// 1. Reject empty (or whitespace-only) input with [`UrlError::Empty`]
/// 2. Infer the `http` scheme when none is given: `//host/path` and
///    `host/path` both become `http://host/path`
/// 3. Parse with the `url` crate (lowercases the host, drops default ports,
///    gives special schemes a `/` root path)
/// 4. Decompose into scheme, host, path, query and fragment
///
/// # Examples
///
/// ```
/// use linkcrawl::url::normalize_url;
///
/// let a = normalize_url("example.com").unwrap();
/// let b = normalize_url("//example.com").unwrap();
/// let c = normalize_url("http://example.com").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(b, c);
/// assert_eq!(c.to_string(), "http://example.com/");
/// ```
pub fn normalize_url(raw: &str) -> Result<NormalizedUrl, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = parse_with_inferred_scheme(raw)?;
    NormalizedUrl::from_url(&url)
}

fn parse_with_inferred_scheme(raw: &str) -> Result<Url, UrlError> {
    let parse = |candidate: &str| {
        Url::parse(candidate).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))
    };

    // Protocol-relative: keep the authority, only add the scheme
    if raw.starts_with("//") {
        return parse(&format!("{}:{}", SCHEME_HTTP, raw));
    }

    match Url::parse(raw) {
        Ok(url) if url.has_host() => Ok(url),
        // `localhost:8080/page` parses as scheme `localhost`
        Ok(_) if looks_like_host_with_port(raw) => parse(&format!("{}://{}", SCHEME_HTTP, raw)),
        Ok(url) => Err(UrlError::Parse(format!("URL has no host: {}", url))),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            parse(&format!("{}://{}", SCHEME_HTTP, raw))
        }
        Err(e) => Err(UrlError::Parse(format!("{}: {}", raw, e))),
    }
}

fn looks_like_host_with_port(raw: &str) -> bool {
    raw.split_once(':')
        .map(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(false)
}
