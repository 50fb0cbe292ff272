//! Core types for logtap-core.
//!
//! This module defines the wire shape of the structured [`LogEnvelope`] that
//! wraps raw (non-JSON) log lines. Field names and their order are the
//! contract consumers on the broker side depend on, so the serde attributes
//! here must not drift.

use serde::{Deserialize, Serialize};

use crate::identity::ProcessIdentity;

/// Severity stamped on every envelope built from a raw line.
pub const RAW_SEVERITY: &str = "raw";

/// `chrono` format for [`Data::timestamp`]: fixed width, microseconds, and a
/// literal `Z` suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// The structured record published in place of a raw, non-JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEnvelope {
    pub meta: Meta,
    pub data: Data,
}

/// Context identifiers. Both fields carry the process identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub process_ctx_id: String,
    pub ctx_id: String,
}

/// Payload half of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    /// Always equal to `meta.ctx_id`.
    pub parent_ctx_id: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub hostname: String,
    pub timestamp: String,
    pub severity: String,
    pub application: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_file: Option<String>,
    #[serde(rename = "msg")]
    pub message: String,
}

impl LogEnvelope {
    /// Wrap `message` for the given identity and service/application names.
    ///
    /// `timestamp` must already be formatted with [`TIMESTAMP_FORMAT`].
    pub fn raw(
        identity: &ProcessIdentity,
        service: &str,
        application: &str,
        timestamp: String,
        message: String,
    ) -> Self {
        Self {
            meta: Meta {
                process_ctx_id: identity.id().to_string(),
                ctx_id: identity.id().to_string(),
            },
            data: Data {
                parent_ctx_id: identity.id().to_string(),
                service: service.to_string(),
                environment: None,
                hostname: identity.hostname().to_string(),
                timestamp,
                severity: RAW_SEVERITY.to_string(),
                application: application.to_string(),
                caller_line: None,
                caller_file: None,
                message,
            },
        }
    }
}
