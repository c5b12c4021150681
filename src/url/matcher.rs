/// Checks if a host matches an accepted-host pattern
///
/// Hosts are compared in their `host[:port]` form. Two kinds of patterns
/// are supported:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use linkcrawl::url::matches_host;
///
/// assert!(matches_host("example.com", "example.com"));
/// assert!(!matches_host("example.com", "example.com:8080"));
///
/// assert!(matches_host("*.example.com", "example.com"));
/// assert!(matches_host("*.example.com", "api.v2.example.com"));
/// assert!(!matches_host("*.example.com", "example.org"));
/// ```
pub fn matches_host(pattern: &str, host: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        host == pattern
    }
}
