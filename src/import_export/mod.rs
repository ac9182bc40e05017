//! Workspace import with selectable merge strategies, and the AI-prompt
//! export built from a session's opted-in tests.

use std::fmt::Write as _;

use crate::session::{Session, Workspace};

/// How an imported workspace document is folded into the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStrategy {
    /// Keep everything already present; only new session ids and new
    /// variable keys are taken from the import.
    Additive,
    /// The imported document wins wholesale.
    Replace,
    /// Only the explicitly selected items are taken; selected items
    /// overwrite same-id sessions and same-key variables.
    Manual {
        session_ids: Vec<String>,
        variable_keys: Vec<String>,
    },
}

pub fn merge_workspace(current: &mut Workspace, incoming: Workspace, strategy: &ImportStrategy) {
    match strategy {
        ImportStrategy::Additive => {
            for session in incoming.saved_sessions {
                if !current.saved_sessions.iter().any(|s| s.id == session.id) {
                    current.saved_sessions.push(session);
                }
            }
            for (key, value) in incoming.global_variables {
                current.global_variables.entry(key).or_insert(value);
            }
        }
        ImportStrategy::Replace => {
            *current = incoming;
        }
        ImportStrategy::Manual {
            session_ids,
            variable_keys,
        } => {
            for session in incoming.saved_sessions {
                if !session_ids.contains(&session.id) {
                    continue;
                }
                match current
                    .saved_sessions
                    .iter_mut()
                    .find(|s| s.id == session.id)
                {
                    Some(existing) => *existing = session,
                    None => current.saved_sessions.push(session),
                }
            }
            for (key, value) in incoming.global_variables {
                if variable_keys.contains(&key) {
                    current.global_variables.insert(key, value);
                }
            }
        }
    }
}

/// Render the session and its opted-in tests as a plain-text prompt block.
pub fn ai_prompt(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "API under test: {} {}",
        session.request_config.method, session.url_data.built_url
    );
    if !session.url_data.session_description.is_empty() {
        let _ = writeln!(out, "Description: {}", session.url_data.session_description);
    }

    let included: Vec<_> = session
        .tests
        .iter()
        .filter(|test| test.include_in_prompt)
        .collect();
    let _ = writeln!(out, "Test cases ({}):", included.len());

    for test in included {
        let _ = writeln!(out, "- {} (expect status {})", test.name, test.expected_status);
        if !test.expected_response.is_empty() {
            let kind = if test.expected_partial_response {
                "partial match"
            } else {
                "exact match"
            };
            let _ = writeln!(out, "  expected response ({kind}): {}", test.expected_response);
        }
        for (key, value) in &test.path_overrides {
            let _ = writeln!(out, "  path {key}={value}");
        }
        for (key, value) in &test.query_overrides {
            let _ = writeln!(out, "  query {key}={value}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TestCase;

    fn session(id: &str, name: &str) -> Session {
        Session {
            id: id.into(),
            name: name.into(),
            ..Session::default()
        }
    }

    fn workspace_with(sessions: Vec<Session>, vars: &[(&str, &str)]) -> Workspace {
        let mut workspace = Workspace {
            saved_sessions: sessions,
            ..Workspace::default()
        };
        for (key, value) in vars {
            workspace
                .global_variables
                .insert((*key).into(), (*value).into());
        }
        workspace
    }

    #[test]
    fn additive_skips_existing_ids_and_keys() {
        let mut current = workspace_with(vec![session("s1", "old name")], &[("host", "old")]);
        let incoming = workspace_with(
            vec![session("s1", "new name"), session("s2", "added")],
            &[("host", "new"), ("token", "t")],
        );

        merge_workspace(&mut current, incoming, &ImportStrategy::Additive);

        assert_eq!(current.saved_sessions.len(), 2);
        assert_eq!(current.find_session("s1").unwrap().name, "old name");
        assert_eq!(current.global_variables.get("host").unwrap(), "old");
        assert_eq!(current.global_variables.get("token").unwrap(), "t");
    }

    #[test]
    fn replace_takes_the_import_wholesale() {
        let mut current = workspace_with(vec![session("s1", "old")], &[("host", "old")]);
        let incoming = workspace_with(vec![session("s2", "new")], &[]);

        merge_workspace(&mut current, incoming, &ImportStrategy::Replace);

        assert_eq!(current.saved_sessions.len(), 1);
        assert!(current.find_session("s2").is_some());
        assert!(current.global_variables.is_empty());
    }

    #[test]
    fn manual_takes_only_selected_items_and_overwrites() {
        let mut current = workspace_with(vec![session("s1", "old name")], &[("host", "old")]);
        let incoming = workspace_with(
            vec![session("s1", "new name"), session("s2", "ignored")],
            &[("host", "new"), ("token", "ignored")],
        );

        merge_workspace(
            &mut current,
            incoming,
            &ImportStrategy::Manual {
                session_ids: vec!["s1".into()],
                variable_keys: vec!["host".into()],
            },
        );

        assert_eq!(current.saved_sessions.len(), 1);
        assert_eq!(current.find_session("s1").unwrap().name, "new name");
        assert_eq!(current.global_variables.get("host").unwrap(), "new");
        assert!(!current.global_variables.contains_key("token"));
    }

    #[test]
    fn prompt_lists_only_opted_in_tests() {
        let mut s = session("s1", "users");
        s.tests.push(TestCase {
            id: "t1".into(),
            name: "happy path".into(),
            expected_status: "200".into(),
            include_in_prompt: true,
            ..TestCase::default()
        });
        s.tests.push(TestCase {
            id: "t2".into(),
            name: "internal probe".into(),
            expected_status: "500".into(),
            include_in_prompt: false,
            ..TestCase::default()
        });

        let prompt = ai_prompt(&s);
        assert!(prompt.contains("Test cases (1):"));
        assert!(prompt.contains("happy path"));
        assert!(!prompt.contains("internal probe"));
    }
}
