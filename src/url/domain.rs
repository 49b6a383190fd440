use url::Url;

/// Extracts the domain from a URL
///
/// The host is lowercased and a leading `www.` is removed, so
/// `https://www.Example.com/` and `https://example.com/` share a domain.
///
/// # Returns
///
/// * `Some(String)` - The normalized domain
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_search::url::extract_domain;
///
/// let url = Url::parse("https://www.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(strip_www)
}

/// Extracts the domain from a URL string, falling back to `unknown`
pub fn domain_of(url_str: &str) -> String {
    Url::parse(url_str)
        .ok()
        .and_then(|url| extract_domain(&url))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Lowercases a host and removes a leading `www.`
pub fn strip_www(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
