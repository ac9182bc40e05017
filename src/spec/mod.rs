//! OpenAPI/YAML document generation from an observed response plus the
//! session's request configuration and test metadata.

pub mod schema;
pub mod yaml;

use serde_json::Value;
use tracing::warn;

use crate::auth::mask_secret;
use crate::session::{RequestBody, Session, TestCase};
use yaml::{YamlEmitter, YamlEntry, YamlValue};

/// Output shape of the generated document. All three share the same
/// parameter and response assembly; they differ in the document envelope and
/// the casing of the method key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpecDialect {
    /// Condensed custom dialect, version `0.9.7.1`: no envelope, uppercase
    /// method key.
    Condensed,
    /// OpenAPI 2.0 (`swagger: "2.0"`).
    OpenApi2,
    /// OpenAPI 3.0.
    #[default]
    OpenApi3,
}

impl SpecDialect {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "0.9.7.1" | "condensed" => Some(SpecDialect::Condensed),
            "2.0" | "swagger" => Some(SpecDialect::OpenApi2),
            "3.0" | "openapi" => Some(SpecDialect::OpenApi3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpecOptions {
    pub dialect: SpecDialect,
}

/// Generate the YAML document for `session` from a sample response body.
/// Parse failures never abort generation; unparseable content is replaced by
/// a string-typed schema or skipped, with a logged warning.
pub fn generate(response_body: &str, session: &Session, options: &SpecOptions) -> String {
    let body_schema = match serde_json::from_str::<Value>(response_body) {
        Ok(value) => schema::infer_schema(&value),
        Err(err) => {
            warn!(session = %session.name, %err, "response body is not valid JSON, using string schema");
            schema::string_schema()
        }
    };

    let mut method_entries = parameters_section(session);
    method_entries.push(YamlValue::pair(
        "responses",
        responses_section(session, body_schema, options.dialect),
    ));

    let method_value = YamlValue::Mapping(method_entries);
    let document = match options.dialect {
        SpecDialect::Condensed => condensed_envelope(session, method_value),
        SpecDialect::OpenApi2 => openapi2_envelope(session, method_value),
        SpecDialect::OpenApi3 => openapi3_envelope(session, method_value),
    };

    YamlEmitter::new().emit(&document)
}

// ─── Parameter assembly ───────────────────────────────────────────────────────

fn parameter(name: &str, location: &str, required: bool) -> Vec<YamlEntry> {
    vec![
        YamlValue::pair("name", YamlValue::string(name)),
        YamlValue::pair("in", YamlValue::raw(location)),
        YamlValue::pair("required", YamlValue::raw(required.to_string())),
    ]
}

fn push_optional(entries: &mut Vec<YamlEntry>, key: &str, value: &str) {
    if !value.is_empty() {
        entries.push(YamlValue::pair(key, YamlValue::string(value)));
    }
}

/// Fixed assembly order: path segments, headers (auth examples masked),
/// query parameters, form fields — followed by a commented block of
/// test-derived override examples.
fn parameters_section(session: &Session) -> Vec<YamlEntry> {
    let config = &session.request_config;
    let mut items = Vec::new();

    for segment in &session.url_data.segments {
        if !segment.is_dynamic || segment.param_name.is_empty() {
            continue;
        }
        let mut entries = parameter(&segment.param_name, "path", true);
        entries.push(YamlValue::pair("type", YamlValue::raw("string")));
        push_optional(&mut entries, "description", &segment.description);
        items.push(YamlValue::Mapping(entries));
    }

    for header in &config.headers {
        if header.key.trim().is_empty() {
            continue;
        }
        let mut entries = parameter(&header.key, "header", header.required);
        entries.push(YamlValue::pair("type", YamlValue::raw("string")));
        push_optional(&mut entries, "description", &header.description);
        push_optional(&mut entries, "example", &header.value);
        items.push(YamlValue::Mapping(entries));
    }

    // Synthesized auth headers are documented too, with their example values
    // masked so generated specs never carry live credentials.
    let mut auth_headers: Vec<(String, String)> = session.auth.headers().into_iter().collect();
    auth_headers.sort();
    for (key, value) in auth_headers {
        let mut entries = parameter(&key, "header", true);
        entries.push(YamlValue::pair("type", YamlValue::raw("string")));
        entries.push(YamlValue::pair(
            "example",
            YamlValue::string(&mask_secret(&value)),
        ));
        items.push(YamlValue::Mapping(entries));
    }

    for param in &config.query_params {
        if param.key.trim().is_empty() {
            continue;
        }
        let param_type = if param.param_type.is_empty() {
            "string"
        } else {
            &param.param_type
        };
        let mut entries = parameter(&param.key, "query", param.required);
        entries.push(YamlValue::pair("type", YamlValue::raw(param_type)));
        push_optional(&mut entries, "description", &param.description);
        push_optional(&mut entries, "example", &param.value);
        items.push(YamlValue::Mapping(entries));
    }

    if let RequestBody::Form { fields } = &config.body {
        for field in fields {
            if field.key.trim().is_empty() {
                continue;
            }
            let mut entries = parameter(&field.key, "formData", field.required);
            entries.push(YamlValue::pair("type", YamlValue::raw("string")));
            push_optional(&mut entries, "description", &field.description);
            push_optional(&mut entries, "example", &field.value);
            items.push(YamlValue::Mapping(entries));
        }
    }

    let mut section = vec![YamlValue::pair("parameters", YamlValue::Sequence(items))];
    for comment in override_comments(&session.tests) {
        section.push(YamlEntry::Comment(comment));
    }
    section
}

/// Per-test override examples, kept as comments for traceability.
fn override_comments(tests: &[TestCase]) -> Vec<String> {
    let mut comments = Vec::new();
    for test in tests {
        let mut pairs: Vec<String> = Vec::new();
        let mut path_keys: Vec<&String> = test.path_overrides.keys().collect();
        path_keys.sort();
        for key in path_keys {
            pairs.push(format!("{key}={}", test.path_overrides[key]));
        }
        let mut query_keys: Vec<&String> = test.query_overrides.keys().collect();
        query_keys.sort();
        for key in query_keys {
            pairs.push(format!("{key}={}", test.query_overrides[key]));
        }
        if !pairs.is_empty() {
            comments.push(format!("{}: {}", test.name, pairs.join(", ")));
        }
    }
    if !comments.is_empty() {
        comments.insert(0, "test overrides:".to_string());
    }
    comments
}

// ─── Response assembly ────────────────────────────────────────────────────────

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn wrap_schema(schema: YamlValue, dialect: SpecDialect) -> YamlEntry {
    match dialect {
        SpecDialect::OpenApi3 => YamlValue::pair(
            "content",
            YamlValue::Mapping(vec![YamlValue::pair(
                "application/json",
                YamlValue::Mapping(vec![YamlValue::pair("schema", schema)]),
            )]),
        ),
        _ => YamlValue::pair("schema", schema),
    }
}

fn responses_section(session: &Session, body_schema: YamlValue, dialect: SpecDialect) -> YamlValue {
    let mut entries = vec![YamlValue::pair(
        "200",
        YamlValue::Mapping(vec![
            YamlValue::pair("description", YamlValue::string("Successful response")),
            wrap_schema(body_schema, dialect),
        ]),
    )];

    // One block per distinct non-200 expected status; every test sharing the
    // status lands in the same block.
    let mut grouped: Vec<(&str, Vec<&TestCase>)> = Vec::new();
    for test in &session.tests {
        let status = test.expected_status.trim();
        if status.is_empty() || status == "200" {
            continue;
        }
        match grouped.iter_mut().find(|(existing, _)| *existing == status) {
            Some((_, tests)) => tests.push(test),
            None => grouped.push((status, vec![test])),
        }
    }

    for (status, tests) in &grouped {
        let names: Vec<&str> = tests.iter().map(|test| test.name.as_str()).collect();
        let mut block = vec![YamlValue::pair(
            "description",
            YamlValue::string(&names.join("; ")),
        )];

        if let Some(example_schema) = tests.iter().find_map(|test| {
            if test.expected_response.is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(&test.expected_response) {
                Ok(value) => Some(schema::infer_schema(&value)),
                Err(err) => {
                    warn!(test = %test.name, %err, "expected response is not valid JSON, skipping schema");
                    None
                }
            }
        }) {
            block.push(wrap_schema(example_schema, dialect));
        }

        let examples: Vec<YamlEntry> = tests
            .iter()
            .map(|test| {
                YamlValue::pair(
                    &sanitize_name(&test.name),
                    YamlValue::string(&test.expected_response),
                )
            })
            .collect();
        block.push(YamlValue::pair("examples", YamlValue::Mapping(examples)));

        entries.push(YamlValue::pair(status, YamlValue::Mapping(block)));
    }

    // Residual response conditions, description only.
    for condition in &session.response_conditions {
        let status = condition.status.trim();
        if !condition.include || status.is_empty() || status == "200" {
            continue;
        }
        if grouped.iter().any(|(existing, _)| *existing == status) {
            continue;
        }
        let description = if condition.description.is_empty() {
            "Documented response"
        } else {
            &condition.description
        };
        entries.push(YamlValue::pair(
            status,
            YamlValue::Mapping(vec![YamlValue::pair(
                "description",
                YamlValue::string(description),
            )]),
        ));
    }

    YamlValue::Mapping(entries)
}

// ─── Envelopes ────────────────────────────────────────────────────────────────

fn path_string(session: &Session) -> String {
    let segments: Vec<String> = session
        .url_data
        .segments
        .iter()
        .map(|segment| {
            if segment.is_dynamic && !segment.param_name.is_empty() {
                format!("{{{}}}", segment.param_name)
            } else {
                segment.value.clone()
            }
        })
        .filter(|rendered| !rendered.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

fn info_entries(session: &Session) -> Vec<YamlEntry> {
    let mut entries = vec![
        YamlValue::pair("title", YamlValue::string(&session.name)),
        YamlValue::pair("version", YamlValue::string("1.0.0")),
    ];
    if !session.url_data.session_description.is_empty() {
        entries.push(YamlValue::pair(
            "description",
            YamlValue::string(&session.url_data.session_description),
        ));
    }
    entries
}

fn condensed_envelope(session: &Session, method_value: YamlValue) -> YamlValue {
    YamlValue::Mapping(vec![
        YamlValue::pair("format", YamlValue::string("0.9.7.1")),
        YamlValue::pair("url", YamlValue::string(&session.url_data.built_url)),
        YamlValue::pair(
            &session.request_config.method.to_string(),
            method_value,
        ),
    ])
}

fn openapi2_envelope(session: &Session, method_value: YamlValue) -> YamlValue {
    let method_key = session.request_config.method.to_string().to_lowercase();
    let mut entries = vec![
        YamlValue::pair("swagger", YamlValue::string("2.0")),
        YamlValue::pair("info", YamlValue::Mapping(info_entries(session))),
    ];
    if !session.url_data.base_url.is_empty() {
        entries.push(YamlValue::pair(
            "host",
            YamlValue::string(&session.url_data.base_url),
        ));
    }
    if !session.url_data.protocol.is_empty() {
        entries.push(YamlValue::pair(
            "schemes",
            YamlValue::Sequence(vec![YamlValue::raw(session.url_data.protocol.clone())]),
        ));
    }
    entries.push(YamlValue::pair(
        "paths",
        YamlValue::Mapping(vec![YamlValue::pair(
            &path_string(session),
            YamlValue::Mapping(vec![YamlValue::pair(&method_key, method_value)]),
        )]),
    ));
    YamlValue::Mapping(entries)
}

fn openapi3_envelope(session: &Session, method_value: YamlValue) -> YamlValue {
    let method_key = session.request_config.method.to_string().to_lowercase();
    let mut entries = vec![
        YamlValue::pair("openapi", YamlValue::raw("3.0.0")),
        YamlValue::pair("info", YamlValue::Mapping(info_entries(session))),
    ];
    if !session.url_data.base_url.is_empty() {
        let server = if session.url_data.protocol.is_empty() {
            session.url_data.base_url.clone()
        } else {
            format!("{}://{}", session.url_data.protocol, session.url_data.base_url)
        };
        entries.push(YamlValue::pair(
            "servers",
            YamlValue::Sequence(vec![YamlValue::Mapping(vec![YamlValue::pair(
                "url",
                YamlValue::string(&server),
            )])]),
        ));
    }
    entries.push(YamlValue::pair(
        "paths",
        YamlValue::Mapping(vec![YamlValue::pair(
            &path_string(session),
            YamlValue::Mapping(vec![YamlValue::pair(&method_key, method_value)]),
        )]),
    ));
    YamlValue::Mapping(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::http::method::HttpMethod;
    use crate::session::{
        HeaderEntry, PathSegment, QueryParam, RequestConfig, ResponseCondition, UrlData,
    };

    fn sample_session() -> Session {
        Session {
            id: "s1".into(),
            name: "user lookup".into(),
            url_data: UrlData {
                protocol: "https".into(),
                base_url: "api.example.com".into(),
                segments: vec![
                    PathSegment {
                        value: "users".into(),
                        ..PathSegment::default()
                    },
                    PathSegment {
                        value: "{userId}".into(),
                        is_dynamic: true,
                        param_name: "userId".into(),
                        ..PathSegment::default()
                    },
                ],
                built_url: "https://api.example.com/users/{userId}".into(),
                ..UrlData::default()
            },
            request_config: RequestConfig {
                method: HttpMethod::Get,
                headers: vec![HeaderEntry {
                    key: "Accept".into(),
                    value: "application/json".into(),
                    required: true,
                    ..HeaderEntry::default()
                }],
                query_params: vec![QueryParam {
                    key: "limit".into(),
                    value: "10".into(),
                    ..QueryParam::default()
                }],
                ..RequestConfig::default()
            },
            ..Session::default()
        }
    }

    fn failing_test(id: &str, name: &str, status: &str, response: &str) -> TestCase {
        TestCase {
            id: id.into(),
            name: name.into(),
            expected_status: status.into(),
            expected_response: response.into(),
            ..TestCase::default()
        }
    }

    #[test]
    fn same_status_tests_share_one_response_block() {
        let mut session = sample_session();
        session.tests.push(failing_test(
            "t1",
            "bad limit",
            "400",
            r#"{"error":"limit"}"#,
        ));
        session.tests.push(failing_test(
            "t2",
            "bad id",
            "400",
            r#"{"error":"id"}"#,
        ));

        let text = generate(r#"{"id":1}"#, &session, &SpecOptions::default());
        assert_eq!(text.matches("400:").count(), 1);
        assert!(text.contains("bad_limit:"));
        assert!(text.contains("bad_id:"));
        assert!(text.contains("\"bad limit; bad id\""));
    }

    #[test]
    fn auth_header_examples_are_masked() {
        let mut session = sample_session();
        session.auth = AuthConfig::Bearer {
            token: "aaa.bbb.ccc".into(),
        };

        let text = generate("{}", &session, &SpecOptions::default());
        assert!(text.contains("\"xxx.xxx.xxx\""));
        assert!(!text.contains("aaa.bbb.ccc"));
    }

    #[test]
    fn path_parameters_come_from_dynamic_segments() {
        let session = sample_session();
        let text = generate("{}", &session, &SpecOptions::default());
        assert!(text.contains("- name: \"userId\"\n          in: path\n          required: true"));
        assert!(text.contains("/users/{userId}:"));
    }

    #[test]
    fn dialect_envelopes_differ() {
        let session = sample_session();

        let condensed = generate(
            "{}",
            &session,
            &SpecOptions {
                dialect: SpecDialect::Condensed,
            },
        );
        assert!(condensed.starts_with("format: \"0.9.7.1\""));
        assert!(condensed.contains("GET:"));

        let v2 = generate(
            "{}",
            &session,
            &SpecOptions {
                dialect: SpecDialect::OpenApi2,
            },
        );
        assert!(v2.starts_with("swagger: \"2.0\""));
        assert!(v2.contains("    get:"));
        assert!(!v2.contains("content:"));

        let v3 = generate(
            "{}",
            &session,
            &SpecOptions {
                dialect: SpecDialect::OpenApi3,
            },
        );
        assert!(v3.starts_with("openapi: 3.0.0"));
        assert!(v3.contains("    get:"));
        assert!(v3.contains("application/json:"));
    }

    #[test]
    fn included_response_conditions_are_appended_when_uncovered() {
        let mut session = sample_session();
        session.tests.push(failing_test("t1", "missing", "404", ""));
        session.response_conditions.push(ResponseCondition {
            status: "404".into(),
            description: "duplicate of test".into(),
            include: true,
        });
        session.response_conditions.push(ResponseCondition {
            status: "429".into(),
            description: "rate limited".into(),
            include: true,
        });
        session.response_conditions.push(ResponseCondition {
            status: "500".into(),
            description: "excluded".into(),
            include: false,
        });

        let text = generate("{}", &session, &SpecOptions::default());
        // 404 is covered by a test; the condition must not duplicate it.
        assert_eq!(text.matches("404:").count(), 1);
        assert!(text.contains("429:"));
        assert!(text.contains("\"rate limited\""));
        assert!(!text.contains("500:"));
    }

    #[test]
    fn unparseable_sample_body_falls_back_to_string_schema() {
        let session = sample_session();
        let text = generate("not json", &session, &SpecOptions::default());
        assert!(text.contains("schema:\n                type: string"));
    }

    #[test]
    fn override_comments_list_test_values() {
        let mut session = sample_session();
        let mut test = failing_test("t1", "small page", "200", "");
        test.query_overrides.insert("limit".into(), "5".into());
        session.tests.push(test);

        let text = generate("{}", &session, &SpecOptions::default());
        assert!(text.contains("# test overrides:"));
        assert!(text.contains("# small page: limit=5"));
    }
}
