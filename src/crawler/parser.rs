//! HTML parser for extracting page text, title and links
//!
//! This module handles parsing HTML content to extract:
//! - Page title
//! - Visible text, with boilerplate subtrees removed
//! - Links to follow (from <a> tags)

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Subtrees whose text never counts as page content
const SKIPPED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Visible text with whitespace collapsed to single spaces
    pub text: String,

    /// All links found on the page (absolute, fragment-free, first occurrence order)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts title, text and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// Duplicate links are reported once. Domain policy is not applied here.
///
/// # Example
///
/// ```
/// use ripple_search::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let text = extract_text(&document);
    let links = extract_links(&document, base_url);

    ParsedPage { title, text, links }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Extracts visible text, skipping script/style/nav/header/footer/aside subtrees
fn extract_text(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !SKIPPED_TAGS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

/// Collapses all whitespace runs to single spaces and trims
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    if !links.contains(&absolute_url) {
                        links.push(absolute_url);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute, fragment-free URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = "<html><head><title>\n  Test   Page  </title></head><body></body></html>";
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_text_strips_boilerplate() {
        let html = r#"
            <html>
            <head>
                <title>Test Page Title</title>
                <style>.test { color: red; }</style>
                <script>console.log('test');</script>
            </head>
            <body>
                <nav>Navigation</nav>
                <header>Site Header</header>
                <h1>Main Heading</h1>
                <p>This is the   main content.</p>
                <aside>Related links</aside>
                <footer>Footer text</footer>
            </body>
            </html>
        "#;
        let parsed = parse_html(html, &base_url());

        assert!(parsed.text.contains("Main Heading"));
        assert!(parsed.text.contains("This is the main content."));
        assert!(!parsed.text.contains("Navigation"));
        assert!(!parsed.text.contains("Site Header"));
        assert!(!parsed.text.contains("Related links"));
        assert!(!parsed.text.contains("Footer text"));
        assert!(!parsed.text.contains("console.log"));
        assert!(!parsed.text.contains(".test"));
    }

    #[test]
    fn test_text_whitespace_collapsed() {
        let html = "<html><body><p>one\n\n   two</p>\t<p>three</p></body></html>";
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.text, "one two three");
    }

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let html = r#"<html><body><a href="other">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_link_fragment_dropped() {
        let html = r#"<html><body><a href="/other#part">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_duplicate_links_reported_once() {
        let html = r#"
            <html><body>
                <a href="/a">A</a>
                <a href="/b">B</a>
                <a href="/a#again">A again</a>
                <a href="https://example.com/a">A absolute</a>
            </body></html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            parsed.links,
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string()
            ]
        );
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r#"
            <html><body>
                <a href="javascript:void(0)">JS</a>
                <a href="mailto:test@example.com">Email</a>
                <a href="tel:+1234567890">Call</a>
                <a href="data:text/html,<h1>Test</h1>">Data</a>
                <a href="ftp://example.com/file">FTP</a>
            </body></html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.zip" download>Download</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#section">Jump</a></body></html>"##;
        let parsed = parse_html(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_links_inside_nav_are_followed() {
        let html = r#"<html><body><nav><a href="/menu">Menu</a></nav></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/menu".to_string()]);
        assert!(!parsed.text.contains("Menu"));
    }
}
