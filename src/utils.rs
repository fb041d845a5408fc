//! Small helpers shared by the fetcher, the discovery strategies and the jobs.
//!
//! - Log-friendly truncation of large strings (page bodies, service errors)
//! - Link normalization for candidate URLs that come back without a scheme

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Give a discovered link a scheme so it can be fetched.
///
/// Links already starting with `http://` or `https://` are returned as-is.
/// Scheme-relative links (`//host/path`) get `https:`; anything else is
/// assumed to be a bare host and path and gets `https://`.
pub fn normalize_link(link: &str) -> String {
    let link = link.trim();
    let lower = link.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        link.to_string()
    } else if let Some(rest) = link.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("https://{link}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // 'é' is two bytes, so a cut at byte 3 falls inside the second one
        let s = "éééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with('é'));
        assert!(result.ends_with("…(+6 bytes)"));
    }

    #[test]
    fn test_normalize_link_keeps_absolute_urls() {
        assert_eq!(normalize_link("https://a.test/x"), "https://a.test/x");
        assert_eq!(normalize_link("http://a.test/x"), "http://a.test/x");
        assert_eq!(normalize_link("HTTPS://a.test/x"), "HTTPS://a.test/x");
    }

    #[test]
    fn test_normalize_link_scheme_relative() {
        assert_eq!(normalize_link("//cdn.a.test/story"), "https://cdn.a.test/story");
    }

    #[test]
    fn test_normalize_link_bare_host() {
        assert_eq!(normalize_link("news.a.test/story/1"), "https://news.a.test/story/1");
        assert_eq!(normalize_link("  news.a.test  "), "https://news.a.test");
    }

    #[test]
    fn test_normalize_link_does_not_trust_http_prefix_alone() {
        // A host that merely begins with "http" still needs a scheme
        assert_eq!(normalize_link("httpbin.test/get"), "https://httpbin.test/get");
    }
}
