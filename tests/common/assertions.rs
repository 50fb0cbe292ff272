//! Domain-specific assertion macros for logtap harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear which publishing invariant was violated.

use std::sync::LazyLock;

use regex::Regex;

static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{6}Z$").unwrap());

// ---------------------------------------------------------------------------
// Payload assertions
// ---------------------------------------------------------------------------

/// Assert that a published payload is byte-identical to the input line.
///
/// ```rust,ignore
/// assert_passed_through!(payload, r#"{"already":"structured"}"#);
/// ```
#[macro_export]
macro_rules! assert_passed_through {
    ($payload:expr, $line:expr) => {{
        let payload: &[u8] = $payload.as_ref();
        let line: &str = $line;
        if payload != line.as_bytes() {
            panic!(
                "assert_passed_through! failed: payload was modified.\n  input:   {:?}\n  payload: {:?}",
                line,
                String::from_utf8_lossy(payload)
            );
        }
    }};
}

/// Assert that a published payload is an envelope wrapping `line`, and
/// return it parsed for further checks.
///
/// ```rust,ignore
/// let env = assert_wraps!(payload, "hello world");
/// assert_eq!(env["data"]["service"], "y");
/// ```
#[macro_export]
macro_rules! assert_wraps {
    ($payload:expr, $line:expr) => {{
        let payload: &[u8] = $payload.as_ref();
        let line: &str = $line;
        let env: serde_json::Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => panic!(
                "assert_wraps! failed: payload is not JSON ({e}).\n  payload: {:?}",
                String::from_utf8_lossy(payload)
            ),
        };
        pretty_assertions::assert_eq!(env["data"]["msg"], line, "data.msg must be the input line");
        pretty_assertions::assert_eq!(env["data"]["severity"], "raw", "data.severity must be raw");
        $crate::common::assertions::assert_timestamp_format(&env);
        env
    }};
}

// ---------------------------------------------------------------------------
// Envelope invariant helpers
// ---------------------------------------------------------------------------

/// Assert `data.timestamp` is `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn assert_timestamp_format(env: &serde_json::Value) {
    let ts = env["data"]["timestamp"].as_str().unwrap_or_default();
    assert!(
        TIMESTAMP.is_match(ts),
        "envelope timestamp {ts:?} does not match YYYY-MM-DDTHH:MM:SS.ffffffZ"
    );
}

/// Assert every envelope carries the same context id in all three places,
/// and that id is the same across the whole run. Returns the id.
pub fn assert_constant_identity(envs: &[serde_json::Value]) -> String {
    let first = envs
        .first()
        .and_then(|e| e["meta"]["process_ctx_id"].as_str())
        .expect("at least one envelope with meta.process_ctx_id")
        .to_string();
    for env in envs {
        for field in [
            &env["meta"]["process_ctx_id"],
            &env["meta"]["ctx_id"],
            &env["data"]["parent_ctx_id"],
        ] {
            assert_eq!(
                field.as_str(),
                Some(first.as_str()),
                "identity changed within a run: {env}"
            );
        }
    }
    first
}
