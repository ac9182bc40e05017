use std::collections::HashMap;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use super::request::SynthesizedRequest;
use super::response::HttpResponse;

pub fn build_headers(input: &HashMap<String, String>) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        if key.is_empty() {
            continue;
        }

        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| format!("Invalid header name `{key}`: {err}"))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| format!("Invalid header value for `{key}`: {err}"))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Execute a synthesized request and capture the response as text. Malformed
/// URLs or headers surface here, at execution time, not during synthesis.
pub async fn send_request(request: &SynthesizedRequest) -> Result<HttpResponse, String> {
    let client = reqwest::Client::new();
    let method: reqwest::Method = request.method.into();
    let url = reqwest::Url::parse(&request.url).map_err(|err| format!("Invalid URL: {err}"))?;

    let mut headers = build_headers(&request.headers)?;

    let mut req_builder = client.request(method, url);
    if let Some(payload) = &request.body {
        if !headers.contains_key(CONTENT_TYPE) {
            let value = HeaderValue::from_str(&payload.content_type)
                .map_err(|err| format!("Invalid content type `{}`: {err}", payload.content_type))?;
            headers.insert(CONTENT_TYPE, value);
        }
        req_builder = req_builder.body(payload.content.clone());
    }
    req_builder = req_builder.headers(headers);

    debug!(method = %request.method, url = %request.url, "sending request");

    let started = Instant::now();
    let response = req_builder
        .send()
        .await
        .map_err(|err| format!("Request failed: {err}"))?;
    let elapsed = started.elapsed().as_millis();

    let status = response.status();
    let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();

    let mut response_headers = HashMap::new();
    for (key, value) in response.headers() {
        response_headers.insert(
            key.to_string(),
            value.to_str().unwrap_or_default().to_string(),
        );
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| format!("Failed to read response: {err}"))?;
    let size_bytes = bytes.len();
    let body = String::from_utf8_lossy(&bytes).into_owned();

    debug!(status = status.as_u16(), size_bytes, elapsed_ms = elapsed as u64, "response received");

    Ok(HttpResponse {
        status: status.as_u16(),
        status_text,
        headers: response_headers,
        body,
        duration_ms: elapsed,
        size_bytes,
    })
}
