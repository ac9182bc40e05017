//! Authentication configuration and header synthesis.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Supported authentication methods. The selected method is rendered into
/// headers that the request synthesizer merges over the configured ones;
/// tests can opt out per case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "authType", rename_all = "lowercase")]
pub enum AuthConfig {
    #[default]
    None,
    Bearer {
        #[serde(default)]
        token: String,
    },
    Basic {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    ApiKey {
        #[serde(default)]
        key: String,
        #[serde(default)]
        value: String,
    },
}

impl AuthConfig {
    /// Render the configured method as request headers. Blank credentials
    /// produce no headers rather than malformed ones.
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        match self {
            AuthConfig::None => {}
            AuthConfig::Bearer { token } => {
                let token = token.trim();
                if !token.is_empty() {
                    headers.insert("Authorization".to_string(), format!("Bearer {token}"));
                }
            }
            AuthConfig::Basic { username, password } => {
                let username = username.trim();
                if !username.is_empty() {
                    let credentials = STANDARD.encode(format!("{username}:{}", password.trim()));
                    headers.insert("Authorization".to_string(), format!("Basic {credentials}"));
                }
            }
            AuthConfig::ApiKey { key, value } => {
                let key = key.trim();
                if !key.is_empty() {
                    headers.insert(key.to_string(), value.trim().to_string());
                }
            }
        }
        headers
    }
}

/// Mask a secret value for display in generated documents: each dot-separated
/// segment becomes `xxx`, so a JWT keeps its three-part shape without leaking
/// content.
pub fn mask_secret(value: &str) -> String {
    value
        .split('.')
        .map(|_| "xxx")
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_renders_authorization_header() {
        let auth = AuthConfig::Bearer {
            token: "abc123".into(),
        };
        let headers = auth.headers();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer abc123");
    }

    #[test]
    fn basic_encodes_credentials() {
        let auth = AuthConfig::Basic {
            username: "user".into(),
            password: "pass".into(),
        };
        let headers = auth.headers();
        // base64("user:pass")
        assert_eq!(headers.get("Authorization").unwrap(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn blank_credentials_produce_no_headers() {
        let auth = AuthConfig::Bearer { token: "  ".into() };
        assert!(auth.headers().is_empty());

        let auth = AuthConfig::ApiKey {
            key: String::new(),
            value: "v".into(),
        };
        assert!(auth.headers().is_empty());
    }

    #[test]
    fn mask_secret_preserves_dot_structure() {
        assert_eq!(mask_secret("eyJhbGci.eyJzdWIi.sig"), "xxx.xxx.xxx");
        assert_eq!(mask_secret("plain-token"), "xxx");
    }
}
