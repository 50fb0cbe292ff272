//! Process identity — the hostname and unique id stamped into every envelope.
//!
//! Resolved once at startup by [`ProcessIdentity::resolve`] and never mutated
//! afterwards; the pipeline borrows it for the life of the process.

use std::io;
use std::process::Command;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    hostname: String,
    id: String,
}

impl ProcessIdentity {
    /// Build an identity from known values (tests, benches).
    pub fn new(hostname: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            id: id.into(),
        }
    }

    /// Look up the hostname and generate a fresh v4 UUID.
    ///
    /// A failed hostname lookup is logged and leaves the hostname empty; it
    /// never prevents startup.
    pub fn resolve() -> Self {
        let hostname = match hostname() {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(error = %e, "could not determine hostname");
                String::new()
            }
        };
        Self {
            hostname,
            id: Uuid::new_v4().to_string(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Hostname from the `hostname` utility, then `/etc/hostname`, then the
/// `HOSTNAME` / `HOST` environment variables.
fn hostname() -> io::Result<String> {
    if let Ok(output) = Command::new("hostname").output() {
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() && !name.is_empty() {
            return Ok(name);
        }
    }

    if let Ok(content) = std::fs::read_to_string("/etc/hostname") {
        let name = content.trim();
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }

    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "could not determine hostname"))
}
