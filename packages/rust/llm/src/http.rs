//! HTTP plumbing shared by the REST providers.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use docground_shared::{DocgroundError, Result};

const USER_AGENT: &str = concat!("docground/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT_SECS: u64 = 20;
const MAX_ERROR_BODY: usize = 500;

/// Build the client used for provider calls, with a per-call timeout.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocgroundError::Model(format!("failed to build HTTP client: {e}")))
}

/// Append path segments to a provider base URL, percent-encoding each one.
pub(crate) fn endpoint(label: &str, base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base.trim())
        .map_err(|e| DocgroundError::config(format!("invalid {label} base URL '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|()| DocgroundError::config(format!("{label} base URL '{base}' cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send a prepared request and decode a JSON reply.
///
/// Transport faults, non-2xx statuses and undecodable bodies all become
/// [`DocgroundError::Model`] prefixed with the provider label. The request
/// URL is stripped from reqwest errors so query credentials never reach the
/// message.
pub(crate) async fn send_json<T: DeserializeOwned>(label: &str, request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| DocgroundError::Model(format!("{label} request failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        return Err(DocgroundError::Model(format!(
            "{label} request failed: {status} - {body}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| {
            DocgroundError::Model(format!("{label} returned an invalid body: {}", e.without_url()))
        })
}

/// Reject absent or blank answer text.
pub(crate) fn require_text(label: &str, text: Option<String>) -> Result<String> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(DocgroundError::Model(format!(
            "{label} response had no text output"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_rejects_blank() {
        assert!(require_text("X", None).is_err());
        assert!(require_text("X", Some("  \n".into())).is_err());
        assert_eq!(require_text("X", Some("ok".into())).unwrap(), "ok");
    }

    #[test]
    fn endpoint_encodes_each_segment_as_a_path_segment() {
        let url = endpoint("X", "https://host.example.com/", &["model", "my model/v1:0", "converse"]).unwrap();
        assert_eq!(url.path(), "/model/my%20model%2Fv1:0/converse");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = endpoint("X", "https://host.example.com/gitlab/", &["api", "v4"]).unwrap();
        assert_eq!(url.as_str(), "https://host.example.com/gitlab/api/v4");
    }

    #[test]
    fn endpoint_rejects_unparseable_base() {
        let err = endpoint("X", "not a url", &["a"]).unwrap_err();
        assert!(matches!(err, DocgroundError::Config { .. }));
    }
}
