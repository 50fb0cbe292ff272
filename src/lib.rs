//! logtap — tap stdin log lines into an NSQ topic.
//!
//! Every non-blank line read from stdin is either passed through unchanged
//! (it is already JSON) or wrapped in a [`LogEnvelope`](logtap_core::LogEnvelope),
//! then echoed to stdout and published.
//!
//! # Architecture
//!
//! ```text
//! LineFeed ──► Normalizer ──► Tee ──► Retrying ──► NsqProducer
//!  (stdin)                    │
//!                             └──► stdout
//! ```
//!
//! Everything runs on one task, one line at a time. The only other task is
//! the NSQ connection's reader, which answers heartbeats.

pub mod pipeline;

pub use logtap_core as core;
pub use logtap_feeds as feeds;
pub use logtap_publish as publish;
pub use pipeline::{Pipeline, RunSummary};

use logtap_core::config::Settings;
use logtap_core::{Normalizer, ProcessIdentity};
use logtap_feeds::LineFeed;
use logtap_publish::{NsqConfig, NsqProducer, Publisher, Retrying, Tee};

/// Run the full pipeline against stdin until end of input.
///
/// `settings` must already have been through
/// [`Settings::validate`](logtap_core::config::Settings::validate).
pub async fn tap_stdin(settings: &Settings) -> anyhow::Result<RunSummary> {
    let identity = ProcessIdentity::resolve();
    tracing::debug!(hostname = identity.hostname(), id = identity.id(), "process identity");

    let producer = NsqProducer::new(
        &settings.endpoint,
        NsqConfig::new(&settings.publish, &identity),
    );
    let publisher = Tee::stdout(Retrying::new(producer, settings.publish.retries));
    let normalizer = Normalizer::new(identity, &settings.svc, &settings.app);

    let mut pipeline = Pipeline::new(normalizer, publisher, &settings.topic);
    let summary = pipeline.run(&mut LineFeed::stdin()).await;
    pipeline.into_publisher().close().await?;

    tracing::info!(
        lines = summary.lines,
        blank = summary.blank,
        passed_through = summary.passed_through,
        wrapped = summary.wrapped,
        published = summary.published,
        publish_failures = summary.publish_failures,
        dropped = summary.dropped,
        "input finished"
    );
    Ok(summary)
}
