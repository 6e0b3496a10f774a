//! Root locator parsing.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use docground_shared::{DocgroundError, Result};

/// Extract the numeric page id from a page URL such as
/// `https://acme.atlassian.net/wiki/spaces/ENG/pages/327681/Architecture`.
///
/// The id must be a whole path segment directly after `/pages/`.
pub fn parse_page_id(locator: &str) -> Result<String> {
    static PAGE_ID_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"/pages/(\d+)(?:/|$)").expect("valid regex"));

    let invalid =
        || DocgroundError::validation(format!("could not extract a page id from URL: {locator}"));

    let url = Url::parse(locator.trim()).map_err(|_| invalid())?;

    PAGE_ID_RE
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(invalid)
}
