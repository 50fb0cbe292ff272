//! Fake nsqd for integration tests.
//!
//! Listens on a random TCP port bound to 127.0.0.1 and speaks just enough of
//! the NSQ V2 protocol for a producer: magic, `IDENTIFY`, `PUB` and `NOP`.
//! Everything it receives is recorded for assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! let nsqd = FakeNsqd::start(FakeNsqdOptions::default()).await.unwrap();
//! let mut producer = NsqProducer::new(nsqd.endpoint(), NsqConfig::default());
//! producer.publish("t#ephemeral", Bytes::from_static(b"hi")).await.unwrap();
//! assert_eq!(nsqd.published(), vec![("t#ephemeral".into(), b"hi".to_vec())]);
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Behaviour switches for the fake server.
#[derive(Debug, Clone, Default)]
pub struct FakeNsqdOptions {
    /// Send a `_heartbeat_` frame before answering each `PUB`.
    pub heartbeat_before_response: bool,
    /// Answer `PUB` to this topic with `E_BAD_TOPIC` and close the connection.
    pub reject_topic: Option<String>,
    /// On the first connection only, swallow the first `PUB` and hang up
    /// without answering.
    pub hang_up_on_first_pub: bool,
}

#[derive(Debug, Default)]
struct Recorded {
    connections: usize,
    identifies: Vec<serde_json::Value>,
    published: Vec<(String, Vec<u8>)>,
    nops: usize,
}

/// Handle to the running fake nsqd.
pub struct FakeNsqd {
    addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
    task: JoinHandle<()>,
}

impl Drop for FakeNsqd {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl FakeNsqd {
    /// Start listening. Returns once the socket is bound.
    pub async fn start(options: FakeNsqdOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let recorded = Arc::new(Mutex::new(Recorded::default()));

        let state = Arc::clone(&recorded);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let connection = {
                    let mut rec = state.lock().unwrap();
                    rec.connections += 1;
                    rec.connections
                };
                let state = Arc::clone(&state);
                let options = options.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, connection, options, state).await;
                });
            }
        });

        Ok(Self {
            addr,
            recorded,
            task,
        })
    }

    /// `127.0.0.1:<port>`, shaped like a valid logtap endpoint.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.recorded.lock().unwrap().published.clone()
    }

    pub fn identifies(&self) -> Vec<serde_json::Value> {
        self.recorded.lock().unwrap().identifies.clone()
    }

    pub fn connections(&self) -> usize {
        self.recorded.lock().unwrap().connections
    }

    pub fn nops(&self) -> usize {
        self.recorded.lock().unwrap().nops
    }

    /// Poll until `pred` holds or one second passes.
    pub async fn wait_for(&self, pred: impl Fn(&FakeNsqd) -> bool) -> bool {
        for _ in 0..100 {
            if pred(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        pred(self)
    }
}

fn frame(frame_type: u32, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len());
    out.extend_from_slice(&((data.len() + 4) as u32).to_be_bytes());
    out.extend_from_slice(&frame_type.to_be_bytes());
    out.extend_from_slice(data);
    out
}

async fn read_body<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let size = reader.read_u32().await? as usize;
    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

async fn serve(
    stream: TcpStream,
    connection: usize,
    options: FakeNsqdOptions,
    state: Arc<Mutex<Recorded>>,
) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).await?;
    if &magic != b"  V2" {
        return Ok(());
    }

    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let command = String::from_utf8_lossy(&line).trim_end().to_string();

        if command == "IDENTIFY" {
            let body = read_body(&mut reader).await?;
            let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            state.lock().unwrap().identifies.push(json);
            write.write_all(&frame(0, b"OK")).await?;
        } else if command == "NOP" {
            state.lock().unwrap().nops += 1;
        } else if let Some(topic) = command.strip_prefix("PUB ") {
            let body = read_body(&mut reader).await?;

            if options.hang_up_on_first_pub && connection == 1 {
                return Ok(());
            }
            if options.reject_topic.as_deref() == Some(topic) {
                write.write_all(&frame(1, b"E_BAD_TOPIC PUB topic rejected")).await?;
                return Ok(());
            }

            state
                .lock()
                .unwrap()
                .published
                .push((topic.to_string(), body));
            if options.heartbeat_before_response {
                write.write_all(&frame(0, b"_heartbeat_")).await?;
            }
            write.write_all(&frame(0, b"OK")).await?;
        } else {
            write.write_all(&frame(1, b"E_INVALID unknown command")).await?;
            return Ok(());
        }
    }
}
