use super::ProviderError;
use reqwest::{
    header::{
        HeaderMap,
        HeaderValue,
        ACCEPT,
    },
    Client,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; E4GL; PlayerCountLogger)";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Longest error body kept in a [`ProviderError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// One client per adapter, reused across ticks. gzip/deflate are negotiated by reqwest.
pub(crate) fn build_client(user_agent: Option<&str>, timeout: Duration) -> Result<Client, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .timeout(timeout)
        .build()
        .map_err(ProviderError::Transport)
}

/// Joins `path` onto `base` without dropping a path prefix of the base URL.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, ProviderError> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
    Ok(Url::parse(&joined)?)
}

/// Sends the request and parses the JSON body. Any status >= 300 is a failure.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(|e| classify(e, timeout))?;
    let status = response.status();
    if status.as_u16() >= 300 {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: truncate(body),
        });
    }

    let bytes = response.bytes().await.map_err(|e| classify(e, timeout))?;
    decode_json(&bytes)
}

/// Some providers prefix their JSON with a UTF-8 byte order mark.
pub(crate) fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProviderError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    Ok(serde_json::from_slice(bytes)?)
}

fn classify(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        err.into()
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
