//! Normalizer — turns one raw input line into the bytes that get published.
//!
//! A line that already parses as a JSON document (anything but `null`) is
//! passed through untouched, byte for byte. Everything else is wrapped in a
//! [`LogEnvelope`](crate::LogEnvelope) with severity `raw`.
//!
//! The JSON check is shallow: a bare number or an unrelated
//! object passes through exactly like a well-formed envelope would.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::bytes::Regex;
use serde::de::IgnoredAny;

use crate::error::NormalizeError;
use crate::identity::ProcessIdentity;
use crate::types::{LogEnvelope, TIMESTAMP_FORMAT};

// ASCII space, tab, newline, form feed and carriage return only. Vertical tab
// and Unicode spaces are content.
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\t\n\x0C\r ]*$").expect("blank-line pattern must compile")
});

/// `true` for empty and whitespace-only lines, which are never published.
pub fn is_blank(line: &[u8]) -> bool {
    BLANK_LINE.is_match(line)
}

/// `true` if `line` is a complete JSON document other than `null`.
pub fn is_structured(line: &[u8]) -> bool {
    matches!(
        serde_json::from_slice::<Option<IgnoredAny>>(line),
        Ok(Some(_))
    )
}

/// What the normalizer decided for a line, carrying the payload to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The original line, unmodified.
    PassThrough(Vec<u8>),
    /// A serialized envelope wrapping the line.
    Wrapped(Vec<u8>),
}

impl Normalized {
    pub fn payload(&self) -> &[u8] {
        match self {
            Normalized::PassThrough(bytes) | Normalized::Wrapped(bytes) => bytes,
        }
    }

    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Normalized::PassThrough(bytes) | Normalized::Wrapped(bytes) => bytes,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Normalized::PassThrough(_))
    }
}

/// Builds envelopes for one process: identity, service and application are
/// fixed at construction.
#[derive(Debug, Clone)]
pub struct Normalizer {
    identity: ProcessIdentity,
    service: String,
    application: String,
}

impl Normalizer {
    pub fn new(
        identity: ProcessIdentity,
        service: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            service: service.into(),
            application: application.into(),
        }
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    /// Normalize `line`, stamping wrapped envelopes with the current time.
    pub fn normalize(&self, line: Vec<u8>) -> Result<Normalized, NormalizeError> {
        self.normalize_at(line, Utc::now())
    }

    /// Normalize `line` as if it were sent at `now`.
    pub fn normalize_at(
        &self,
        line: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<Normalized, NormalizeError> {
        if is_structured(&line) {
            return Ok(Normalized::PassThrough(line));
        }

        let envelope = LogEnvelope::raw(
            &self.identity,
            &self.service,
            &self.application,
            format_timestamp(now),
            String::from_utf8_lossy(&line).into_owned(),
        );
        Ok(Normalized::Wrapped(serde_json::to_vec(&envelope)?))
    }
}

/// Format `ts` as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
