//! Session data model: URL templates, request configuration, test cases and
//! the persisted workspace that holds them.

use std::collections::HashMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;
use crate::http::method::HttpMethod;

// ─── Environments ─────────────────────────────────────────────────────────────

/// Target environment a session's URL template is bound to. Also used as the
/// `_<environment>` suffix when looking up environment-scoped globals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentTag {
    #[default]
    Development,
    Staging,
    Production,
}

impl EnvironmentTag {
    pub const ALL: [EnvironmentTag; 3] = [
        EnvironmentTag::Development,
        EnvironmentTag::Staging,
        EnvironmentTag::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentTag::Development => "development",
            EnvironmentTag::Staging => "staging",
            EnvironmentTag::Production => "production",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.as_str() == input)
    }
}

impl Display for EnvironmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── URL template ─────────────────────────────────────────────────────────────

/// One segment of the URL path. Dynamic segments are addressed by
/// `param_name` and rendered as `{param_name}` in the built URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegment {
    pub value: String,
    #[serde(default)]
    pub is_dynamic: bool,
    #[serde(default)]
    pub param_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlData {
    pub protocol: String,
    pub base_url: String,
    #[serde(default)]
    pub segments: Vec<PathSegment>,
    /// Pre-built URL template, placeholders included. The synthesizer starts
    /// from this string.
    pub built_url: String,
    #[serde(default)]
    pub environment: EnvironmentTag,
    #[serde(default)]
    pub session_description: String,
}

// ─── Request configuration ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderEntry {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParam {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// Request body, discriminated by the persisted `bodyType` field. Exactly one
/// variant is active; stale sibling payload fields in old session files are
/// ignored on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "bodyType", rename_all = "lowercase")]
pub enum RequestBody {
    #[default]
    None,
    Json {
        #[serde(rename = "jsonBody", default)]
        json: String,
    },
    Form {
        #[serde(rename = "formData", default)]
        fields: Vec<FormField>,
    },
    Text {
        #[serde(rename = "textBody", default)]
        text: String,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default)]
    pub query_params: Vec<QueryParam>,
    #[serde(flatten)]
    pub body: RequestBody,
}

// ─── Test cases ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestVerdict {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub name: String,
    /// Expected HTTP status, kept as a string and compared by string
    /// equality against the observed status.
    #[serde(default)]
    pub expected_status: String,
    #[serde(default)]
    pub expected_response: String,
    #[serde(default)]
    pub expected_partial_response: bool,
    #[serde(default)]
    pub path_overrides: HashMap<String, String>,
    #[serde(default)]
    pub query_overrides: HashMap<String, String>,
    #[serde(default)]
    pub body_override: String,
    #[serde(default = "default_true")]
    pub use_auth: bool,
    #[serde(default = "default_true")]
    pub include_in_prompt: bool,
    /// Verdict of the most recent run. Not reset when the request
    /// configuration changes; stale verdicts persist until the next run.
    #[serde(default)]
    pub last_result: Option<TestVerdict>,
    #[serde(default)]
    pub server_status: Option<u16>,
    #[serde(default)]
    pub server_response: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A user-declared extra status code to document in the generated spec,
/// independent of test cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCondition {
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub include: bool,
}

// ─── Session & workspace ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url_data: UrlData,
    #[serde(default)]
    pub request_config: RequestConfig,
    #[serde(default)]
    pub tests: Vec<TestCase>,
    #[serde(default)]
    pub response_conditions: Vec<ResponseCondition>,
    #[serde(default)]
    pub shared_variables: HashMap<String, String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub generated_yaml: String,
}

impl Session {
    pub fn find_test(&self, test_id: &str) -> Option<&TestCase> {
        self.tests.iter().find(|test| test.id == test_id)
    }
}

/// The persisted unit: every saved session plus the project-wide variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub saved_sessions: Vec<Session>,
    #[serde(default)]
    pub global_variables: HashMap<String, String>,
}

impl Workspace {
    pub fn find_session(&self, name_or_id: &str) -> Option<&Session> {
        self.saved_sessions
            .iter()
            .find(|session| session.id == name_or_id || session.name == name_or_id)
    }

    pub fn find_session_mut(&mut self, name_or_id: &str) -> Option<&mut Session> {
        self.saved_sessions
            .iter_mut()
            .find(|session| session.id == name_or_id || session.name == name_or_id)
    }
}
