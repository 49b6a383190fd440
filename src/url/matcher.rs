use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// Checks if a host falls under an allowed domain
///
/// A host matches when it equals the domain or is any subdomain of it.
/// Both sides should already be lowercase with `www.` removed.
///
/// # Examples
///
/// ```
/// use ripple_search::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(matches_domain("example.com", "blog.example.com"));
/// assert!(!matches_domain("example.com", "myexample.com"));
/// ```
pub fn matches_domain(allowed: &str, host: &str) -> bool {
    if allowed.is_empty() {
        return false;
    }
    host == allowed
        || (host.len() > allowed.len()
            && host.ends_with(allowed)
            && host.as_bytes()[host.len() - allowed.len() - 1] == b'.')
}

/// Builds a glob in which `*` spans any run of characters, including `/`
///
/// Only `*` is a wildcard; every other character matches itself.
fn exclude_glob(pattern: &str) -> Result<Glob, globset::Error> {
    let escaped: Vec<String> = pattern.split('*').map(globset::escape).collect();
    GlobBuilder::new(&escaped.join("*"))
        .literal_separator(false)
        .build()
}

/// Compiled exclude patterns
///
/// Patterns containing `*` are globs matched against the whole path.
/// Patterns without a wildcard match when they occur anywhere in the path.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    globs: GlobSet,
    literals: Vec<String>,
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self {
            globs: GlobSet::empty(),
            literals: Vec::new(),
        }
    }
}

impl ExcludeSet {
    pub fn new(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut literals = Vec::new();

        for pattern in patterns.iter().filter(|p| !p.is_empty()) {
            if !pattern.contains('*') {
                literals.push(pattern.clone());
                continue;
            }
            match exclude_glob(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    tracing::warn!("Treating exclude pattern {:?} as literal: {}", pattern, e);
                    literals.push(pattern.clone());
                }
            }
        }

        let globs = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Exclude globs disabled: {}", e);
            GlobSet::empty()
        });

        Self { globs, literals }
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty() && self.literals.is_empty()
    }

    /// Returns true if any pattern catches `path`
    pub fn is_match(&self, path: &str) -> bool {
        self.globs.is_match(path) || self.literals.iter().any(|l| path.contains(l.as_str()))
    }
}

/// Checks if a URL path is caught by a single exclude pattern
///
/// # Examples
///
/// ```
/// use ripple_search::url::matches_exclude_pattern;
///
/// assert!(matches_exclude_pattern("*.pdf", "/files/report.pdf"));
/// assert!(matches_exclude_pattern("*.doc*", "/files/report.docx"));
/// assert!(matches_exclude_pattern("/admin/", "/site/admin/users"));
/// assert!(!matches_exclude_pattern("*.pdf", "/files/report.html"));
/// ```
pub fn matches_exclude_pattern(pattern: &str, path: &str) -> bool {
    ExcludeSet::new(&[pattern.to_string()]).is_match(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_domain() {
        assert!(matches_domain("example.com", "example.com"));
        assert!(!matches_domain("example.com", "other.com"));
    }

    #[test]
    fn test_subdomains() {
        assert!(matches_domain("example.com", "sub.example.com"));
        assert!(matches_domain("example.com", "api.v2.example.com"));
        assert!(matches_domain("upi.edu", "fpmipa.upi.edu"));
    }

    #[test]
    fn test_no_partial_suffix() {
        assert!(!matches_domain("example.com", "myexample.com"));
        assert!(!matches_domain("example.com", "example.com.org"));
        assert!(!matches_domain("sub.example.com", "example.com"));
    }

    #[test]
    fn test_empty_domain_never_matches() {
        assert!(!matches_domain("", "example.com"));
        assert!(!matches_domain("example.com", ""));
    }

    #[test]
    fn test_glob_extension() {
        assert!(matches_exclude_pattern("*.pdf", "/report.pdf"));
        assert!(matches_exclude_pattern("*.pdf", "/a/b/c.pdf"));
        assert!(!matches_exclude_pattern("*.pdf", "/report.pdf.html"));
    }

    #[test]
    fn test_glob_trailing_star() {
        assert!(matches_exclude_pattern("*.doc*", "/x.doc"));
        assert!(matches_exclude_pattern("*.xls*", "/data/sheet.xlsx"));
        assert!(!matches_exclude_pattern("*.ppt*", "/slides.key"));
    }

    #[test]
    fn test_substring_pattern() {
        assert!(matches_exclude_pattern("/login/", "/login/"));
        assert!(matches_exclude_pattern("/login/", "/app/login/form"));
        assert!(!matches_exclude_pattern("/login/", "/login"));
        assert!(!matches_exclude_pattern("", "/anything"));
    }

    #[test]
    fn test_glob_metacharacters_are_literal() {
        assert!(matches_exclude_pattern("/page?id=*", "/page?id=7"));
        assert!(!matches_exclude_pattern("/page?id=*", "/pagexid=7"));
        assert!(matches_exclude_pattern("*[draft]*", "/notes/[draft]/a"));
        assert!(!matches_exclude_pattern("*[draft]*", "/notes/d"));
        assert!(matches_exclude_pattern("/{tmp}/*", "/{tmp}/x"));
    }

    #[test]
    fn test_exclude_set_mixes_globs_and_literals() {
        let set = ExcludeSet::new(&[
            "*.pdf".to_string(),
            "/admin/".to_string(),
            "".to_string(),
        ]);
        assert!(set.is_match("/a/b.pdf"));
        assert!(set.is_match("/x/admin/y"));
        assert!(!set.is_match("/docs/index.html"));
        assert!(ExcludeSet::default().is_empty());
        assert!(!ExcludeSet::default().is_match("/anything"));
    }

    #[test]
    fn test_glob_multiple_stars() {
        assert!(matches_exclude_pattern("/private/*/*.txt", "/private/a/b.txt"));
        assert!(!matches_exclude_pattern("/private/*/*.txt", "/public/a/b.txt"));
    }
}
