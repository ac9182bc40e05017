//! Layered variable resolution for `{name}` / `${name}` placeholders.
//!
//! Precedence, highest first: session-shared variable, environment-suffixed
//! global (`<name>_<environment>`), plain global. Test-local per-segment
//! overrides sit above all of these but are applied by the request
//! synthesizer before interpolation runs. Unknown placeholders pass through
//! unchanged.

use std::collections::HashMap;

use crate::session::EnvironmentTag;

/// Override values that are empty or whitespace-only count as unset and fall
/// through to the next layer, so an operator can blank an override to get
/// the configured default back without deleting it.
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

#[derive(Debug, Clone)]
pub struct VariableContext<'a> {
    globals: &'a HashMap<String, String>,
    session_vars: &'a HashMap<String, String>,
    environment: EnvironmentTag,
}

impl<'a> VariableContext<'a> {
    pub fn new(
        globals: &'a HashMap<String, String>,
        session_vars: &'a HashMap<String, String>,
        environment: EnvironmentTag,
    ) -> Self {
        Self {
            globals,
            session_vars,
            environment,
        }
    }

    /// Look up a placeholder name through the scope layers. Returns `None`
    /// when no layer holds a usable value; the caller leaves the original
    /// placeholder text in place.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.session_vars.get(name) {
            if is_set(value) {
                return Some(value);
            }
        }

        let suffixed = format!("{name}_{}", self.environment);
        if let Some(value) = self.globals.get(&suffixed) {
            if is_set(value) {
                return Some(value);
            }
        }

        if let Some(value) = self.globals.get(name) {
            if is_set(value) {
                return Some(value);
            }
        }

        None
    }

    /// Merge the scope layers into one map, lower layers first so higher
    /// layers overwrite on key collision. Environment-suffixed globals are
    /// folded in under their stripped name.
    fn merged(&self) -> HashMap<String, String> {
        let mut variables = HashMap::new();
        let suffix = format!("_{}", self.environment);

        for (key, value) in self.globals {
            if !key.ends_with(&suffix) && is_set(value) {
                variables.insert(key.clone(), value.clone());
            }
        }

        for (key, value) in self.globals {
            if let Some(stripped) = key.strip_suffix(&suffix) {
                if is_set(value) {
                    variables.insert(stripped.to_string(), value.clone());
                }
            }
        }

        for (key, value) in self.session_vars {
            if is_set(value) {
                variables.insert(key.clone(), value.clone());
            }
        }

        variables
    }

    /// Rewrite every `${key}` and `{key}` placeholder the merged scopes know
    /// about. `${key}` is replaced first since `{key}` is a substring of it.
    pub fn interpolate(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (key, value) in self.merged() {
            result = result.replace(&format!("${{{key}}}"), &value);
            result = result.replace(&format!("{{{key}}}"), &value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globals() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("host".into(), "api.example.com".into());
        map.insert("host_staging".into(), "staging.example.com".into());
        map.insert("token".into(), "global-token".into());
        map
    }

    #[test]
    fn session_variable_wins_over_globals() {
        let globals = globals();
        let mut session = HashMap::new();
        session.insert("host".into(), "session.example.com".into());

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Staging);
        assert_eq!(ctx.resolve("host"), Some("session.example.com"));
    }

    #[test]
    fn environment_suffixed_global_wins_over_plain() {
        let globals = globals();
        let session = HashMap::new();

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Staging);
        assert_eq!(ctx.resolve("host"), Some("staging.example.com"));

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Production);
        assert_eq!(ctx.resolve("host"), Some("api.example.com"));
    }

    #[test]
    fn blank_values_fall_through_to_next_layer() {
        let globals = globals();
        let mut session = HashMap::new();
        session.insert("host".into(), "   ".into());

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Development);
        assert_eq!(ctx.resolve("host"), Some("api.example.com"));
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        let globals = globals();
        let session = HashMap::new();

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Development);
        assert_eq!(ctx.resolve("missing"), None);
    }

    #[test]
    fn interpolate_handles_both_placeholder_forms() {
        let globals = globals();
        let session = HashMap::new();

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Development);
        let result = ctx.interpolate("https://{host}/v1?auth=${token}");
        assert_eq!(result, "https://api.example.com/v1?auth=global-token");
    }

    #[test]
    fn interpolate_leaves_unknown_placeholders() {
        let globals = HashMap::new();
        let session = HashMap::new();

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Development);
        assert_eq!(ctx.interpolate("{unknown}/${also}"), "{unknown}/${also}");
    }

    #[test]
    fn interpolate_uses_environment_suffix() {
        let globals = globals();
        let session = HashMap::new();

        let ctx = VariableContext::new(&globals, &session, EnvironmentTag::Staging);
        assert_eq!(ctx.interpolate("{host}"), "staging.example.com");
    }
}
