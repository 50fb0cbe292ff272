//! Configuration types for logtap.
//!
//! [`Settings::load`] layers, lowest precedence first: the embedded defaults,
//! an optional TOML file, `LOGTAP_*` environment variables, and finally the
//! command-line overrides. [`Settings::defaults`] returns the embedded
//! defaults without touching the filesystem (useful in tests).
//!
//! Loading does not validate. Call [`Settings::validate`] once at startup to
//! check the endpoint and coerce the topic into its ephemeral form.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
topic    = "log.raw#ephemeral"
endpoint = ""
app      = ""
svc      = ""

[publish]
retries             = 0
dial_timeout_ms     = 1000
response_timeout_ms = 60000
"#;

/// Suffix every topic is coerced to end with.
pub const EPHEMERAL_SUFFIX: &str = "ephemeral";

static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}:[0-9]{1,5}$")
        .expect("endpoint pattern must compile")
});

static TOPIC_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[.a-zA-Z0-9_-]+(#ephemeral)?$").expect("topic pattern must compile")
});

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level settings, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_topic")]
    pub topic: String,
    /// NSQ daemon TCP address, `host:port`.
    #[serde(default)]
    pub endpoint: String,
    /// Application name stamped into every envelope.
    #[serde(default)]
    pub app: String,
    /// Service name stamped into every envelope.
    #[serde(default)]
    pub svc: String,
    #[serde(default)]
    pub publish: PublishSettings,
}

/// `[publish]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishSettings {
    /// Extra attempts after a failed publish. `0` is fire-and-forget.
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_dial_timeout_ms")]
    pub dial_timeout_ms: u64,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn default_topic() -> String { "log.raw#ephemeral".to_string() }
fn default_dial_timeout_ms() -> u64 { 1000 }
fn default_response_timeout_ms() -> u64 { 60_000 }

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            retries: 0,
            dial_timeout_ms: default_dial_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl PublishSettings {
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Command-line values layered on top of every other source. `None` leaves
/// the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub topic: Option<String>,
    pub endpoint: Option<String>,
    pub app: Option<String>,
    pub svc: Option<String>,
    pub retries: Option<u32>,
}

/// Result of [`Settings::validate`]: the settings with a normalized topic,
/// plus the original topic name if it had to be rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub settings: Settings,
    pub renamed_from: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Settings {
    /// Load settings from every source.
    ///
    /// `path` selects the config file; without it the XDG location is tried.
    /// A missing file is not an error, an unreadable or malformed one is.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

        let settings = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix("LOGTAP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("topic", overrides.topic.clone())?
            .set_override_option("endpoint", overrides.endpoint.clone())?
            .set_override_option("app", overrides.app.clone())?
            .set_override_option("svc", overrides.svc.clone())?
            .set_override_option("publish.retries", overrides.retries.map(u64::from))?
            .build()?
            .try_deserialize()?;

        tracing::debug!(path = %path.display(), ?settings, "configuration loaded");
        Ok(settings)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    /// Check the endpoint, then coerce the topic to end with `#ephemeral`.
    pub fn validate(self) -> Result<Validated, ConfigError> {
        validate_endpoint(&self.endpoint)?;

        let topic = ephemeral_topic(&self.topic);
        if !is_valid_topic_name(&topic) {
            return Err(ConfigError::InvalidTopic(topic));
        }

        let renamed_from = (topic != self.topic).then(|| self.topic.clone());
        Ok(Validated {
            settings: Settings { topic, ..self },
            renamed_from,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Accept `d.d.d.d:port` shaped endpoints (1-3 digit groups, 1-5 digit port).
/// Only the shape is checked, not the address range.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    if ENDPOINT.is_match(endpoint) {
        Ok(())
    } else {
        Err(ConfigError::InvalidEndpoint(endpoint.to_string()))
    }
}

/// Force `topic` to carry the `#ephemeral` suffix.
///
/// Anything after the first `#` that is not `ephemeral` is replaced; a topic
/// with no suffix gets one appended.
pub fn ephemeral_topic(topic: &str) -> String {
    let mut topic = match topic.split_once('#') {
        Some((base, suffix)) if suffix != EPHEMERAL_SUFFIX => {
            format!("{base}#{EPHEMERAL_SUFFIX}")
        }
        _ => topic.to_string(),
    };

    if !topic.ends_with("#ephemeral") {
        topic.push_str("#ephemeral");
    }
    topic
}

/// NSQ topic name rules: `[.a-zA-Z0-9_-]+` with an optional `#ephemeral`,
/// 64 bytes at most in total.
pub fn is_valid_topic_name(topic: &str) -> bool {
    (1..=64).contains(&topic.len()) && TOPIC_NAME.is_match(topic)
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("logtap")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
