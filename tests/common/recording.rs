//! In-memory publishers for pipeline tests.

use std::collections::HashSet;

use bytes::Bytes;
use logtap_publish::{PublishError, Publisher};

/// Records every publish call. Calls whose zero-based index is in `fail_on`
/// return an error instead (and are still recorded as attempts).
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub sent: Vec<(String, Bytes)>,
    pub attempts: usize,
    pub fail_on: HashSet<usize>,
    pub closed: bool,
}

impl RecordingPublisher {
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Payloads of successful publishes, as UTF-8 strings.
    pub fn payloads(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|(_, p)| String::from_utf8(p.to_vec()).expect("payload must be UTF-8"))
            .collect()
    }
}

impl Publisher for RecordingPublisher {
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        let call = self.attempts;
        self.attempts += 1;
        if self.fail_on.contains(&call) {
            return Err(PublishError::ConnectionClosed);
        }
        self.sent.push((topic.to_string(), payload));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.closed = true;
        Ok(())
    }
}

/// An `AsyncRead` that always fails, for chaining after real input.
pub struct BrokenReader;

impl tokio::io::AsyncRead for BrokenReader {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        _buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdin went away",
        )))
    }
}
