//! NSQ TCP protocol (V2) framing.
//!
//! Commands go out as a text line, optionally followed by a 4-byte
//! big-endian body size and the body. Everything nsqd sends back is a frame:
//!
//! ```text
//! [ size: u32 BE ][ frame type: u32 BE ][ data: size - 4 bytes ]
//! ```

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Sent once, raw, before any framed traffic.
pub const MAGIC_V2: &[u8; 4] = b"  V2";

/// Response data nsqd uses to ping idle clients.
pub const HEARTBEAT: &[u8] = b"_heartbeat_";

/// Response data acknowledging `IDENTIFY` and `PUB`.
pub const OK: &[u8] = b"OK";

const FRAME_TYPE_RESPONSE: u32 = 0;
const FRAME_TYPE_ERROR: u32 = 1;
const FRAME_TYPE_MESSAGE: u32 = 2;

/// Default upper bound for an incoming frame (nsqd's default max message
/// size plus headroom).
pub const DEFAULT_MAX_FRAME: usize = 1024 * 1024 + 64;

/// Client-to-server commands used by a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `IDENTIFY` with a JSON body.
    Identify(Bytes),
    Pub { topic: String, body: Bytes },
    Nop,
}

/// Server-to-client frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Response(Bytes),
    Error(Bytes),
    Message(Bytes),
}

#[derive(Debug, Clone)]
pub struct NsqCodec {
    max_frame: usize,
}

impl Default for NsqCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME)
    }
}

impl NsqCodec {
    pub fn new(max_frame: usize) -> Self {
        Self { max_frame }
    }
}

fn put_body(dst: &mut BytesMut, body: &[u8]) -> io::Result<()> {
    let size = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "body larger than 4 GiB"))?;
    dst.put_u32(size);
    dst.extend_from_slice(body);
    Ok(())
}

impl Encoder<Command> for NsqCodec {
    type Error = io::Error;

    fn encode(&mut self, cmd: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match cmd {
            Command::Identify(body) => {
                dst.reserve(9 + 4 + body.len());
                dst.extend_from_slice(b"IDENTIFY\n");
                put_body(dst, &body)?;
            }
            Command::Pub { topic, body } => {
                dst.reserve(4 + topic.len() + 1 + 4 + body.len());
                dst.extend_from_slice(b"PUB ");
                dst.extend_from_slice(topic.as_bytes());
                dst.put_u8(b'\n');
                put_body(dst, &body)?;
            }
            Command::Nop => dst.extend_from_slice(b"NOP\n"),
        }
        Ok(())
    }
}

impl Decoder for NsqCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let size = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if size < 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame size {size} too small"),
            ));
        }
        if size > self.max_frame {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame size {size} exceeds limit {}", self.max_frame),
            ));
        }
        if src.len() < 4 + size {
            src.reserve(4 + size - src.len());
            return Ok(None);
        }

        src.advance(4);
        let frame_type = src.get_u32();
        let data = src.split_to(size - 4).freeze();
        match frame_type {
            FRAME_TYPE_RESPONSE => Ok(Some(Frame::Response(data))),
            FRAME_TYPE_ERROR => Ok(Some(Frame::Error(data))),
            FRAME_TYPE_MESSAGE => Ok(Some(Frame::Message(data))),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown frame type {other}"),
            )),
        }
    }
}
