//! NSQ producer over a single TCP connection.
//!
//! The connection is opened lazily on the first publish and re-opened on the
//! next publish after any failure. Once connected, a background task owns the
//! read half: it answers `_heartbeat_` with `NOP` and forwards every other
//! frame to the publisher, which waits for exactly one response per `PUB`.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use logtap_core::config::PublishSettings;
use logtap_core::ProcessIdentity;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::{Command, Frame, NsqCodec, HEARTBEAT, MAGIC_V2, OK};
use crate::{PublishError, Publisher};

const USER_AGENT: &str = concat!("logtap/", env!("CARGO_PKG_VERSION"));

/// Connection parameters for [`NsqProducer`].
#[derive(Debug, Clone)]
pub struct NsqConfig {
    pub dial_timeout: Duration,
    /// How long to wait for nsqd to answer a command.
    pub response_timeout: Duration,
    /// Interval nsqd should use for heartbeats on this connection.
    pub heartbeat_interval: Duration,
    pub client_id: String,
    pub hostname: String,
}

impl Default for NsqConfig {
    fn default() -> Self {
        let publish = PublishSettings::default();
        Self {
            dial_timeout: publish.dial_timeout(),
            response_timeout: publish.response_timeout(),
            heartbeat_interval: Duration::from_secs(30),
            client_id: String::new(),
            hostname: String::new(),
        }
    }
}

impl NsqConfig {
    pub fn new(publish: &PublishSettings, identity: &ProcessIdentity) -> Self {
        let hostname = identity.hostname().to_string();
        Self {
            dial_timeout: publish.dial_timeout(),
            response_timeout: publish.response_timeout(),
            client_id: hostname.split('.').next().unwrap_or_default().to_string(),
            hostname,
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct IdentifyBody<'a> {
    client_id: &'a str,
    hostname: &'a str,
    user_agent: &'a str,
    heartbeat_interval: u64,
    feature_negotiation: bool,
}

type Writer = Arc<Mutex<FramedWrite<OwnedWriteHalf, NsqCodec>>>;

/// One live connection to nsqd.
struct Connection {
    writer: Writer,
    responses: mpsc::UnboundedReceiver<Frame>,
    reader: JoinHandle<()>,
}

impl Connection {
    async fn open(addr: &str, config: &NsqConfig) -> Result<Self, PublishError> {
        let stream = tokio::time::timeout(config.dial_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PublishError::DialTimeout {
                addr: addr.to_string(),
                timeout: config.dial_timeout,
            })??;
        stream.set_nodelay(true)?;

        let (read, mut write) = stream.into_split();
        write.write_all(MAGIC_V2).await?;

        let writer: Writer = Arc::new(Mutex::new(FramedWrite::new(write, NsqCodec::default())));
        let (tx, responses) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(
            FramedRead::new(read, NsqCodec::default()),
            Arc::clone(&writer),
            tx,
        ));

        let mut conn = Self {
            writer,
            responses,
            reader,
        };

        let body = serde_json::to_vec(&IdentifyBody {
            client_id: &config.client_id,
            hostname: &config.hostname,
            user_agent: USER_AGENT,
            heartbeat_interval: config.heartbeat_interval.as_millis() as u64,
            feature_negotiation: false,
        })
        .map_err(|e| PublishError::Io(e.into()))?;
        conn.send(Command::Identify(Bytes::from(body))).await?;
        conn.expect_ok(config.response_timeout).await?;

        tracing::debug!(addr, "connected to nsqd");
        Ok(conn)
    }

    async fn send(&mut self, cmd: Command) -> Result<(), PublishError> {
        self.writer.lock().await.send(cmd).await?;
        Ok(())
    }

    async fn expect_ok(&mut self, timeout: Duration) -> Result<(), PublishError> {
        match tokio::time::timeout(timeout, self.responses.recv()).await {
            Err(_) => Err(PublishError::ResponseTimeout(timeout)),
            Ok(None) => Err(PublishError::ConnectionClosed),
            Ok(Some(Frame::Response(data))) if data.as_ref() == OK => Ok(()),
            Ok(Some(Frame::Error(data))) => {
                Err(PublishError::Broker(String::from_utf8_lossy(&data).into_owned()))
            }
            Ok(Some(other)) => Err(PublishError::UnexpectedFrame(format!("{other:?}"))),
        }
    }

    async fn shutdown(self) {
        if let Err(e) = self.writer.lock().await.close().await {
            tracing::debug!(error = %e, "error closing nsqd connection");
        }
        // `Drop` stops the reader task.
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut frames: FramedRead<tokio::net::tcp::OwnedReadHalf, NsqCodec>,
    writer: Writer,
    tx: mpsc::UnboundedSender<Frame>,
) {
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Frame::Response(data)) if data.as_ref() == HEARTBEAT => {
                tracing::trace!("heartbeat from nsqd");
                if let Err(e) = writer.lock().await.send(Command::Nop).await {
                    tracing::warn!(error = %e, "failed to answer nsqd heartbeat");
                    return;
                }
            }
            Ok(frame) => {
                if tx.send(frame).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "nsqd connection read failed");
                return;
            }
        }
    }
    tracing::debug!("nsqd closed the connection");
}

/// Publishes to one nsqd over TCP.
pub struct NsqProducer {
    addr: String,
    config: NsqConfig,
    conn: Option<Connection>,
}

impl NsqProducer {
    /// No connection is made until the first publish.
    pub fn new(addr: impl Into<String>, config: NsqConfig) -> Self {
        Self {
            addr: addr.into(),
            config,
            conn: None,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }
}

impl Publisher for NsqProducer {
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => Connection::open(&self.addr, &self.config).await?,
        };

        let result = async {
            conn.send(Command::Pub {
                topic: topic.to_string(),
                body: payload,
            })
            .await?;
            conn.expect_ok(self.config.response_timeout).await
        }
        .await;

        match &result {
            Ok(()) => self.conn = Some(conn),
            Err(e) => {
                tracing::debug!(error = %e, addr = %self.addr, "dropping nsqd connection");
                conn.shutdown().await;
            }
        }
        result
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        if let Some(conn) = self.conn.take() {
            conn.shutdown().await;
        }
        Ok(())
    }
}
