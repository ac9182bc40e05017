//! Request synthesis: turn a session's URL template and request
//! configuration, plus optional per-test overrides, into a concrete request
//! description. Pure; nothing here touches the network.

use std::collections::HashMap;

use crate::http::request::{RequestPayload, SynthesizedRequest};
use crate::session::{RequestBody, Session, TestCase};
use crate::variables::{VariableContext, is_set};

/// Assemble the request for `session`, applying `test` overrides when given.
/// `auth_headers` is merged over the configured headers and wins on key
/// collision; pass an empty map for tests that opt out of auth.
pub fn build_request(
    session: &Session,
    test: Option<&TestCase>,
    globals: &HashMap<String, String>,
    auth_headers: &HashMap<String, String>,
) -> SynthesizedRequest {
    let config = &session.request_config;
    let variables = VariableContext::new(
        globals,
        &session.shared_variables,
        session.url_data.environment,
    );

    // Path overrides first: a non-empty test value claims the `{param}`
    // token before general variable resolution sees it.
    let mut url = session.url_data.built_url.clone();
    for segment in &session.url_data.segments {
        if !segment.is_dynamic || segment.param_name.is_empty() {
            continue;
        }
        if let Some(value) = test.and_then(|t| t.path_overrides.get(&segment.param_name)) {
            if is_set(value) {
                url = url.replace(&format!("${{{}}}", segment.param_name), value);
                url = url.replace(&format!("{{{}}}", segment.param_name), value);
            }
        }
    }
    url = variables.interpolate(&url);

    let query = build_query_string(config, test);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    let mut headers: HashMap<String, String> = config
        .headers
        .iter()
        .filter(|header| !header.key.trim().is_empty())
        .map(|header| (header.key.clone(), header.value.clone()))
        .collect();
    headers.extend(
        auth_headers
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    let body = if config.method.is_body_capable() {
        build_body(&config.body, test)
    } else {
        None
    };

    SynthesizedRequest {
        method: config.method,
        url,
        headers,
        body,
    }
}

fn build_query_string(
    config: &crate::session::RequestConfig,
    test: Option<&TestCase>,
) -> String {
    let mut pairs = Vec::new();
    for param in &config.query_params {
        if param.key.trim().is_empty() {
            continue;
        }
        let value = test
            .and_then(|t| t.query_overrides.get(&param.key))
            .filter(|value| is_set(value))
            .map(String::as_str)
            .unwrap_or(&param.value);
        pairs.push(format!("{}={}", param.key, encode_component(value)));
    }
    pairs.join("&")
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn build_body(body: &RequestBody, test: Option<&TestCase>) -> Option<RequestPayload> {
    let override_body = test
        .map(|t| t.body_override.as_str())
        .filter(|value| is_set(value));

    match body {
        RequestBody::None => None,
        RequestBody::Json { json } => Some(RequestPayload {
            content: override_body.unwrap_or(json).to_string(),
            content_type: "application/json".to_string(),
        }),
        RequestBody::Form { fields } => {
            let content = match override_body {
                Some(raw) => raw.to_string(),
                None => {
                    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                    for field in fields {
                        if !field.key.trim().is_empty() {
                            serializer.append_pair(&field.key, &field.value);
                        }
                    }
                    serializer.finish()
                }
            };
            Some(RequestPayload {
                content,
                content_type: "application/x-www-form-urlencoded".to_string(),
            })
        }
        RequestBody::Text { text } => Some(RequestPayload {
            content: override_body.unwrap_or(text).to_string(),
            content_type: "text/plain".to_string(),
        }),
    }
}

/// The auth headers to use for one test run: the session's synthesized map,
/// or nothing when the test opts out.
pub fn auth_headers_for(session: &Session, test: Option<&TestCase>) -> HashMap<String, String> {
    match test {
        Some(test) if !test.use_auth => HashMap::new(),
        _ => session.auth.headers(),
    }
}
