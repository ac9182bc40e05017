//! Test execution and verdict evaluation.
//!
//! Execution never propagates an error to its caller: transport failures
//! become `fail` verdicts with status `0` and the error message as the
//! recorded body. Status comparison is string equality against the
//! configured expected-status text, and exact body matching compares the
//! re-serialized actual JSON against the expected literal.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;

use crate::http::client;
use crate::session::{Session, TestCase, TestVerdict};
use crate::synth;

/// Result of one test run, applied back onto the session by test id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub test_id: String,
    pub test_name: String,
    pub verdict: TestVerdict,
    pub status: u16,
    pub body: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u128,
    pub outcomes: Vec<TestOutcome>,
}

/// Deep-subset containment: every key/element the expected value carries
/// must be present in the actual value. Extra keys and extra array elements
/// on the actual side are ignored. Array elements match order- and
/// multiplicity-independently. Type mismatches fail immediately.
pub fn is_deep_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            expected_map.iter().all(|(key, expected_value)| {
                actual_map
                    .get(key)
                    .is_some_and(|actual_value| is_deep_subset(expected_value, actual_value))
            })
        }
        (Value::Array(expected_items), Value::Array(actual_items)) => {
            expected_items.iter().all(|expected_item| {
                actual_items
                    .iter()
                    .any(|actual_item| is_deep_subset(expected_item, actual_item))
            })
        }
        (Value::Object(_), _) | (Value::Array(_), _) => false,
        (expected, actual) => expected == actual,
    }
}

/// Pure verdict computation over an observed status and body.
pub fn evaluate(test: &TestCase, actual_status: u16, actual_body: &str) -> TestVerdict {
    let status_match = actual_status.to_string() == test.expected_status;

    let response_match = if test.expected_response.is_empty() {
        true
    } else if test.expected_partial_response {
        match (
            serde_json::from_str::<Value>(&test.expected_response),
            serde_json::from_str::<Value>(actual_body),
        ) {
            (Ok(expected), Ok(actual)) => is_deep_subset(&expected, &actual),
            _ => false,
        }
    } else {
        match serde_json::from_str::<Value>(actual_body) {
            // Compare the expected literal against the re-serialized actual
            // value, not the raw body text.
            Ok(actual) => match serde_json::to_string(&actual) {
                Ok(canonical) => canonical == test.expected_response,
                Err(_) => false,
            },
            Err(_) => actual_body == test.expected_response,
        }
    };

    if status_match && response_match {
        TestVerdict::Pass
    } else {
        TestVerdict::Fail
    }
}

/// Run a single test: synthesize, send, evaluate. All failure paths resolve
/// to a `fail` outcome; this function cannot error.
pub async fn execute(
    session: &Session,
    test: &TestCase,
    globals: &HashMap<String, String>,
) -> TestOutcome {
    let auth_headers = synth::auth_headers_for(session, Some(test));
    let request = synth::build_request(session, Some(test), globals, &auth_headers);

    match client::send_request(&request).await {
        Ok(response) => TestOutcome {
            test_id: test.id.clone(),
            test_name: test.name.clone(),
            verdict: evaluate(test, response.status, &response.body),
            status: response.status,
            body: response.body,
        },
        Err(message) => TestOutcome {
            test_id: test.id.clone(),
            test_name: test.name.clone(),
            verdict: TestVerdict::Fail,
            status: 0,
            body: message,
        },
    }
}

/// Merge one outcome into the session by test id. Only the matching entry is
/// replaced; sibling tests keep whatever state a concurrent run gave them.
pub fn apply_outcome(session: &mut Session, outcome: &TestOutcome) {
    session.tests = session
        .tests
        .iter()
        .map(|test| {
            if test.id == outcome.test_id {
                let mut updated = test.clone();
                updated.last_result = Some(outcome.verdict);
                updated.server_status = Some(outcome.status);
                updated.server_response = Some(outcome.body.clone());
                updated
            } else {
                test.clone()
            }
        })
        .collect();
}

/// Dispatch one task per selected test, all at once, and merge each outcome
/// as it lands. Completion order is arbitrary; there is no concurrency cap,
/// cancellation, or timeout beyond what the transport enforces.
pub async fn run_tests(
    session: &mut Session,
    globals: &HashMap<String, String>,
    only_failed: bool,
) -> RunReport {
    let selected: Vec<TestCase> = session
        .tests
        .iter()
        .filter(|test| !only_failed || test.last_result == Some(TestVerdict::Fail))
        .cloned()
        .collect();

    let started = Instant::now();
    let mut set = JoinSet::new();
    for test in selected {
        let session = session.clone();
        let globals = globals.clone();
        set.spawn(async move { execute(&session, &test, &globals).await });
    }

    let mut report = RunReport::default();
    while let Some(joined) = set.join_next().await {
        if let Ok(outcome) = joined {
            apply_outcome(session, &outcome);
            report.total += 1;
            match outcome.verdict {
                TestVerdict::Pass => report.passed += 1,
                TestVerdict::Fail => report.failed += 1,
            }
            report.outcomes.push(outcome);
        }
    }
    report.duration_ms = started.elapsed().as_millis();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_with(expected_status: &str, expected_response: &str, partial: bool) -> TestCase {
        TestCase {
            id: "t1".into(),
            name: "sample".into(),
            expected_status: expected_status.into(),
            expected_response: expected_response.into(),
            expected_partial_response: partial,
            ..TestCase::default()
        }
    }

    #[test]
    fn subset_accepts_extra_keys_and_elements() {
        let expected = json!({"error": true});
        let actual = json!({"error": true, "code": 5});
        assert!(is_deep_subset(&expected, &actual));

        let expected = json!({"items": [{"id": 2}]});
        let actual = json!({"items": [{"id": 1}, {"id": 2, "name": "b"}]});
        assert!(is_deep_subset(&expected, &actual));
    }

    #[test]
    fn subset_rejects_missing_keys() {
        let expected = json!({"error": true, "code": 5});
        let actual = json!({"error": true});
        assert!(!is_deep_subset(&expected, &actual));
    }

    #[test]
    fn subset_rejects_unmatched_array_elements() {
        let expected = json!([1, 2, 9]);
        let actual = json!([1, 2, 3]);
        assert!(!is_deep_subset(&expected, &actual));
    }

    #[test]
    fn subset_is_order_independent_for_arrays() {
        let expected = json!([3, 1]);
        let actual = json!([1, 2, 3]);
        assert!(is_deep_subset(&expected, &actual));
    }

    #[test]
    fn subset_rejects_type_mismatch() {
        assert!(!is_deep_subset(&json!({"a": 1}), &json!([1])));
        assert!(!is_deep_subset(&json!([1]), &json!(1)));
        assert!(!is_deep_subset(&json!("1"), &json!(1)));
    }

    #[test]
    fn empty_expected_response_passes_on_status_alone() {
        let test = test_with("200", "", false);
        assert_eq!(evaluate(&test, 200, "anything"), TestVerdict::Pass);
        assert_eq!(evaluate(&test, 500, "anything"), TestVerdict::Fail);
    }

    #[test]
    fn status_comparison_is_string_equality() {
        // A stray space in the configured status is a real mismatch.
        let test = test_with("200 ", "", false);
        assert_eq!(evaluate(&test, 200, ""), TestVerdict::Fail);
    }

    #[test]
    fn partial_match_passes_on_subset_body() {
        let test = test_with("404", r#"{"error":true}"#, true);
        assert_eq!(
            evaluate(&test, 404, r#"{"error":true,"code":5}"#),
            TestVerdict::Pass
        );
    }

    #[test]
    fn partial_match_fails_on_unparseable_body() {
        let test = test_with("200", r#"{"a":1}"#, true);
        assert_eq!(evaluate(&test, 200, "not json"), TestVerdict::Fail);
    }

    #[test]
    fn exact_match_compares_reserialized_actual() {
        let test = test_with("200", r#"{"a":1,"b":2}"#, false);
        // Whitespace in the wire body does not matter; it is re-serialized.
        assert_eq!(
            evaluate(&test, 200, "{ \"a\": 1, \"b\": 2 }"),
            TestVerdict::Pass
        );
        // But the expected literal itself is compared as text.
        let test = test_with("200", r#"{ "a": 1, "b": 2 }"#, false);
        assert_eq!(
            evaluate(&test, 200, r#"{"a":1,"b":2}"#),
            TestVerdict::Fail
        );
    }

    #[test]
    fn exact_match_falls_back_to_raw_string_for_non_json() {
        let test = test_with("200", "plain text body", false);
        assert_eq!(evaluate(&test, 200, "plain text body"), TestVerdict::Pass);
        assert_eq!(evaluate(&test, 200, "other"), TestVerdict::Fail);
    }

    #[test]
    fn apply_outcome_touches_only_the_matching_test() {
        let mut session = Session {
            id: "s".into(),
            name: "s".into(),
            tests: vec![
                test_with("200", "", false),
                TestCase {
                    id: "t2".into(),
                    name: "other".into(),
                    last_result: Some(TestVerdict::Pass),
                    ..TestCase::default()
                },
            ],
            ..Session::default()
        };

        let outcome = TestOutcome {
            test_id: "t1".into(),
            test_name: "sample".into(),
            verdict: TestVerdict::Fail,
            status: 500,
            body: "boom".into(),
        };
        apply_outcome(&mut session, &outcome);

        let first = session.find_test("t1").unwrap();
        assert_eq!(first.last_result, Some(TestVerdict::Fail));
        assert_eq!(first.server_status, Some(500));
        assert_eq!(first.server_response.as_deref(), Some("boom"));

        let second = session.find_test("t2").unwrap();
        assert_eq!(second.last_result, Some(TestVerdict::Pass));
        assert_eq!(second.server_status, None);
    }

    #[tokio::test]
    async fn transport_errors_become_fail_with_status_zero() {
        let mut session = Session {
            id: "s".into(),
            name: "s".into(),
            ..Session::default()
        };
        session.url_data.built_url = "not a url".into();
        let test = test_with("200", "", false);

        let outcome = execute(&session, &test, &HashMap::new()).await;
        assert_eq!(outcome.verdict, TestVerdict::Fail);
        assert_eq!(outcome.status, 0);
        assert!(outcome.body.contains("Invalid URL"));
    }
}
