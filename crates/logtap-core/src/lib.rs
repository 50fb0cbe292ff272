//! logtap-core — envelope, identity, normalizer and settings for logtap.
//!
//! # Pipeline
//!
//! ```text
//! stdin ──► LineFeed ──► Normalizer ──► stdout tee + Publisher (NSQ)
//! ```
//!
//! This crate holds everything that does not touch I/O: the wire shape of
//! the [`LogEnvelope`], the once-per-process [`ProcessIdentity`], the
//! [`Normalizer`] that decides between pass-through and wrapping, and the
//! layered [`Settings`](config::Settings).

pub mod config;
pub mod error;
pub mod identity;
pub mod normalizer;
pub mod types;

pub use error::{ConfigError, NormalizeError};
pub use identity::ProcessIdentity;
pub use normalizer::{Normalized, Normalizer};
pub use types::{Data, LogEnvelope, Meta};
