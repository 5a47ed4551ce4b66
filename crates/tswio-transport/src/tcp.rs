//! Length-prefixed frames over TCP.
//!
//! Each frame is a `u16` little-endian byte count followed by the payload.
//! Network-attached boards and the serial-to-TCP bridges used in development
//! both speak this.

use std::io::ErrorKind;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::debug;
use tswio_errors::TransportError;

use crate::{DeviceTransport, TransportResult};

pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Write one frame. Fails with [`TransportError::FrameTooLarge`] above
/// [`MAX_FRAME_LEN`] without touching the writer.
pub async fn write_frame<W>(writer: &mut W, name: &str, frame: &[u8]) -> TransportResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let len = u16::try_from(frame.len())
        .ok()
        .ok_or(TransportError::FrameTooLarge(frame.len()))?;
    let mut buf = Vec::with_capacity(frame.len().saturating_add(2));
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(frame);
    writer
        .write_all(&buf)
        .await
        .map_err(|e| io_error(name, &e))?;
    writer.flush().await.map_err(|e| io_error(name, &e))
}

/// Read one frame. A clean EOF before the length prefix maps to
/// [`TransportError::Closed`]; EOF inside a frame is an I/O error.
pub async fn read_frame<R>(reader: &mut R, name: &str) -> TransportResult<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; 2];
    let mut read = 0usize;
    while read < header.len() {
        let chunk = header.get_mut(read..).unwrap_or_default();
        let n = reader.read(chunk).await.map_err(|e| io_error(name, &e))?;
        if n == 0 {
            if read == 0 {
                return Err(TransportError::Closed(name.to_string()));
            }
            return Err(TransportError::io(name, "frame header truncated"));
        }
        read = read.saturating_add(n);
    }

    let len = usize::from(u16::from_le_bytes(header));
    if len == 0 {
        return Err(TransportError::io(name, "zero-length frame"));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            TransportError::io(name, "frame body truncated")
        } else {
            io_error(name, &e)
        }
    })?;
    Ok(body)
}

fn io_error(name: &str, err: &std::io::Error) -> TransportError {
    TransportError::io(name, err.to_string())
}

/// A board reachable over TCP.
#[derive(Debug)]
pub struct TcpTransport {
    name: String,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> TransportResult<Self> {
        let name = format!("tcp://{addr}");
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| io_error(&name, &e))?;
        debug!(transport = %name, "Connected");
        Ok(Self::from_stream(name, stream))
    }

    pub fn from_stream(name: impl Into<String>, stream: TcpStream) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "Could not disable Nagle");
        }
        let (reader, writer) = stream.into_split();
        Self {
            name: name.into(),
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl DeviceTransport for TcpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, frame: &[u8]) -> TransportResult<()> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &self.name, frame).await
    }

    async fn recv(&self) -> TransportResult<Vec<u8>> {
        let mut reader = self.reader.lock().await;
        read_frame(&mut *reader, &self.name).await
    }
}
