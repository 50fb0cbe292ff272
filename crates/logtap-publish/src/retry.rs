//! Retrying publisher — re-attempts a failed publish a fixed number of times.

use bytes::Bytes;

use crate::{PublishError, Publisher};

/// Wraps a publisher and retries each failed publish up to `retries` extra
/// times. With `retries == 0` it behaves exactly like the inner publisher.
///
/// Retries happen back to back; [`NsqProducer`](crate::NsqProducer)
/// reconnects on the attempt after a connection failure.
pub struct Retrying<P> {
    inner: P,
    retries: u32,
}

impl<P> Retrying<P> {
    pub fn new(inner: P, retries: u32) -> Self {
        Self { inner, retries }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Publisher> Publisher for Retrying<P> {
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        let mut attempt = 0;
        loop {
            match self.inner.publish(topic, payload.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(error = %e, attempt, "retrying publish");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.inner.close().await
    }
}
