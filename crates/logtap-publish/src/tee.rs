//! Stdout tee — echo every payload before publishing it.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};

use crate::{PublishError, Publisher};

/// Writes `payload + "\n"` to `echo`, then publishes through `inner`.
///
/// A failed echo is logged and does not stop the publish.
pub struct Tee<P, W> {
    inner: P,
    echo: W,
}

impl<P> Tee<P, Stdout> {
    pub fn stdout(inner: P) -> Self {
        Self::new(inner, tokio::io::stdout())
    }
}

impl<P, W> Tee<P, W> {
    pub fn new(inner: P, echo: W) -> Self {
        Self { inner, echo }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_parts(self) -> (P, W) {
        (self.inner, self.echo)
    }
}

impl<P, W: AsyncWrite + Unpin> Tee<P, W> {
    async fn echo_line(&mut self, payload: &[u8]) -> std::io::Result<()> {
        self.echo.write_all(payload).await?;
        self.echo.write_all(b"\n").await?;
        self.echo.flush().await
    }
}

impl<P: Publisher, W: AsyncWrite + Unpin> Publisher for Tee<P, W> {
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        if let Err(e) = self.echo_line(&payload).await {
            tracing::warn!(error = %e, "failed to echo payload");
        }
        self.inner.publish(topic, payload).await
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.inner.close().await
    }
}
