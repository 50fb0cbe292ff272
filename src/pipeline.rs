//! Pipeline — the publish loop: feed → normalizer → publisher, one line at a
//! time.
//!
//! Each line is fully published before the next one is read, so publish
//! order always equals input order. Nothing in here is fatal: a read error
//! ends the loop, a serialization error drops the line, and a publish error
//! is logged before moving on.

use bytes::Bytes;
use logtap_core::{Normalized, Normalizer};
use logtap_feeds::LineFeed;
use logtap_publish::Publisher;
use tokio::io::AsyncBufRead;

/// Counters for one run of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines read from the feed, blank ones included.
    pub lines: u64,
    pub blank: u64,
    pub passed_through: u64,
    pub wrapped: u64,
    /// Lines that produced no payload (serialization failure or empty).
    pub dropped: u64,
    pub published: u64,
    /// Lines the publisher reported as failed.
    pub publish_failures: u64,
    /// The error that ended the run early, if any.
    pub read_error: Option<String>,
}

pub struct Pipeline<P> {
    normalizer: Normalizer,
    publisher: P,
    topic: String,
}

impl<P: Publisher> Pipeline<P> {
    pub fn new(normalizer: Normalizer, publisher: P, topic: impl Into<String>) -> Self {
        Self {
            normalizer,
            publisher,
            topic: topic.into(),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Drain `feed` until end of input or the first read error.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, feed: &mut LineFeed<R>) -> RunSummary {
        let mut summary = RunSummary::default();

        loop {
            match feed.next_line().await {
                Ok(Some(line)) => self.handle_line(line, &mut summary).await,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "reading standard input");
                    summary.read_error = Some(e.to_string());
                    break;
                }
            }
        }

        let stats = feed.stats();
        summary.lines = stats.lines;
        summary.blank = stats.blank;
        summary
    }

    async fn handle_line(&mut self, line: Vec<u8>, summary: &mut RunSummary) {
        let normalized = match self.normalizer.normalize(line) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::error!(error = %e, "dropping line");
                summary.dropped += 1;
                return;
            }
        };

        match normalized {
            Normalized::PassThrough(_) => summary.passed_through += 1,
            Normalized::Wrapped(_) => summary.wrapped += 1,
        }
        tracing::debug!(pass_through = normalized.is_pass_through(), "normalized line");

        let payload = normalized.into_payload();
        if payload.is_empty() {
            summary.dropped += 1;
            return;
        }

        match self.publisher.publish(&self.topic, Bytes::from(payload)).await {
            Ok(()) => summary.published += 1,
            Err(e) => {
                tracing::warn!(error = %e, topic = %self.topic, "publish failed; continuing");
                summary.publish_failures += 1;
            }
        }
    }
}
