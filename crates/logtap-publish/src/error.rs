//! Error types for logtap-publish.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// A single publish attempt failed. Never fatal to the pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("timed out connecting to {addr} after {timeout:?}")]
    DialTimeout { addr: String, timeout: Duration },

    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    /// An `E_*` error frame from nsqd.
    #[error("nsqd returned {0}")]
    Broker(String),

    #[error("no response from nsqd within {0:?}")]
    ResponseTimeout(Duration),

    #[error("connection to nsqd closed")]
    ConnectionClosed,

    #[error("unexpected frame from nsqd: {0}")]
    UnexpectedFrame(String),
}
