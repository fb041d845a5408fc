//! Search URL rendering for a single news outlet.
//!
//! Each outlet stores a search URL template containing a placeholder token
//! (`QUERY_HERE` or `KEYWORDS_HERE`). The free-text query is escaped the way
//! HTML forms escape it (spaces become `+`) and substituted for the token.
//!
//! # Example
//!
//! ```text
//! template: http://a.test/search?q=QUERY_HERE
//! query:    fish and chips
//! result:   http://a.test/search?q=fish+and+chips
//! ```

use tracing::{error, info, instrument};

/// Placeholder tokens recognized inside outlet URL templates.
pub const QUERY_PLACEHOLDERS: [&str; 2] = ["QUERY_HERE", "KEYWORDS_HERE"];

/// Render the search URL for one outlet.
///
/// All three inputs are trimmed first. If any of them is empty the outlet is
/// skipped: the offending field is logged and `None` is returned, which the
/// caller treats as "do not create a job for this outlet".
#[instrument(level = "debug", skip_all, fields(outlet = %outlet_name.trim()))]
pub fn build_query_url(outlet_name: &str, query: &str, url_template: &str) -> Option<String> {
    let outlet_name = outlet_name.trim();
    if outlet_name.is_empty() {
        error!("news outlet name cannot be empty");
        return None;
    }

    let query = query.trim();
    if query.is_empty() {
        error!(outlet = outlet_name, "query param cannot be empty");
        return None;
    }

    let url_template = url_template.trim();
    if url_template.is_empty() {
        error!(outlet = outlet_name, "query url template cannot be empty");
        return None;
    }

    let encoded = encode_query(query);
    let final_url = QUERY_PLACEHOLDERS
        .iter()
        .fold(url_template.to_string(), |url, token| url.replace(token, &encoded));

    info!(outlet = outlet_name, url = %final_url, "Generated outlet query url");
    Some(final_url)
}

/// Percent-encode a query, keeping unreserved characters and writing spaces as `+`.
fn encode_query(query: &str) -> String {
    urlencoding::encode(query).replace("%20", "+")
}
