//! logtap-publish — publisher adapters for logtap.
//!
//! The pipeline only needs one operation from the broker side:
//! [`Publisher::publish`]. [`nsq::NsqProducer`] speaks the NSQ TCP protocol,
//! [`retry::Retrying`] re-attempts failed publishes, and [`tee::Tee`] echoes
//! each payload to a writer (stdout in production) before handing it on.
//!
//! Production wiring is `Tee(Retrying(NsqProducer))`, so a payload is echoed
//! once no matter how many attempts its publish takes.

pub mod codec;
pub mod error;
pub mod nsq;
pub mod retry;
pub mod tee;

pub use error::PublishError;
pub use nsq::{NsqConfig, NsqProducer};
pub use retry::Retrying;
pub use tee::Tee;

use bytes::Bytes;

/// Something that can deliver a payload to a named topic.
///
/// Calls are made one at a time and awaited before the next line is read,
/// so implementations see payloads in input order.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError>;

    /// Release the connection, if any. Further publishes may reconnect.
    async fn close(&mut self) -> Result<(), PublishError> {
        Ok(())
    }
}
