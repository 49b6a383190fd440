use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical crawl key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than `http` and `https`
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after #)
///
/// Scheme, host, path and query are kept as the parser canonicalised them
/// (lowercase host, empty path becomes `/`).
///
/// # Examples
///
/// ```
/// use ripple_search::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/page?q=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?q=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    url.set_fragment(None);

    Ok(url)
}
