#![cfg(feature = "std")]

//! TCP bridge link.
//!
//! Carries the GATT exchange over a TCP stream to a BLE gateway (or the
//! bundled simulator). Each link message is a big-endian `u32` length
//! followed by the bincode encoding of a [`LinkMessage`]. The device side
//! speaks first with an [`LinkMessage::Advertisement`].

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::config::{DEFAULT_WRITE_TIMEOUT, MAX_LINK_MESSAGE_SIZE};
use crate::error::DiscoveryError;
use crate::transport::{Adapter, CommandChannel, DeviceInfo, Link, NotificationStream, ScanFilter};

/// Envelope exchanged on the bridge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LinkMessage {
    /// Device identity, sent once by the device side on accept.
    Advertisement(DeviceInfo),
    /// Central enables notifications on the status characteristic.
    Subscribe,
    /// One status notification frame.
    Notify(Vec<u8>),
    /// One command written to the command characteristic.
    Write(Vec<u8>),
}

fn io_error(e: std::io::Error, op: &str) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
            anyhow::anyhow!("Connection reset by peer")
        }
        _ => anyhow::anyhow!("{} error: {}", op, e),
    }
}

/// Write one length-prefixed link message.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg: &LinkMessage,
    max_message_size: u32,
) -> anyhow::Result<()> {
    let data = bincode::serialize(msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
    if data.len() as u64 > max_message_size as u64 {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            data.len(),
            max_message_size
        ));
    }
    let mut frame = (data.len() as u32).to_be_bytes().to_vec();
    frame.extend_from_slice(&data);
    writer.write_all(&frame).await.map_err(|e| io_error(e, "Write"))?;
    writer.flush().await.map_err(|e| io_error(e, "Write"))?;
    Ok(())
}

/// Read one link message. `Ok(None)` when the peer closed the stream
/// between messages.
pub async fn read_message<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_message_size: u32,
) -> anyhow::Result<Option<LinkMessage>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(io_error(e, "Read")),
    }

    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(anyhow::anyhow!("Invalid message length: 0"));
    }
    if len > max_message_size {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            len,
            max_message_size
        ));
    }

    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|e| io_error(e, "Read"))?;
    let msg = bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))?;
    Ok(Some(msg))
}

/// Central side of the bridge.
pub struct TcpAdapter {
    addr: String,
    timeout_duration: Duration,
    max_message_size: u32,
    discovered: Option<(TcpStream, DeviceInfo)>,
}

impl TcpAdapter {
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_timeout(addr, DEFAULT_WRITE_TIMEOUT)
    }

    pub fn with_timeout(addr: impl Into<String>, timeout_duration: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout_duration,
            max_message_size: MAX_LINK_MESSAGE_SIZE,
            discovered: None,
        }
    }
}

#[async_trait::async_trait]
impl Adapter for TcpAdapter {
    async fn discover(&mut self, filter: &ScanFilter) -> Result<DeviceInfo, DiscoveryError> {
        let mut stream = timeout(self.timeout_duration, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| DiscoveryError::Timeout)?
            .map_err(|e| DiscoveryError::Transport(format!("{}: {}", self.addr, e)))?;

        let first = read_message(&mut stream, self.max_message_size)
            .await
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?;
        match first {
            Some(LinkMessage::Advertisement(device)) if filter.matches(&device) => {
                log::debug!("Discovered {} ({}) via {}", device.display_name(), device.id, self.addr);
                self.discovered = Some((stream, device.clone()));
                Ok(device)
            }
            Some(LinkMessage::Advertisement(device)) => {
                Err(DiscoveryError::NoMatch(device.display_name().to_string()))
            }
            Some(other) => Err(DiscoveryError::Transport(format!(
                "expected advertisement, got {:?}",
                other
            ))),
            None => Err(DiscoveryError::Transport("Connection closed by peer".to_string())),
        }
    }

    async fn connect(&mut self, device: &DeviceInfo) -> anyhow::Result<Link> {
        let (stream, discovered) = self
            .discovered
            .take()
            .ok_or_else(|| anyhow::anyhow!("Device {} has not been discovered", device.id))?;
        if discovered.id != device.id {
            return Err(anyhow::anyhow!(
                "Device {} has not been discovered (bridge offers {})",
                device.id,
                discovered.id
            ));
        }
        discovered.require_characteristics()?;
        let _ = stream.set_nodelay(true);
        let (reader, writer) = stream.into_split();
        let writer = Arc::new(Mutex::new(writer));
        Ok(Link {
            commands: Box::new(TcpCommands {
                writer: writer.clone(),
                timeout_duration: self.timeout_duration,
                max_message_size: self.max_message_size,
            }),
            notifications: Box::new(TcpNotifications {
                reader,
                writer,
                timeout_duration: self.timeout_duration,
                max_message_size: self.max_message_size,
            }),
        })
    }
}

async fn send_with_timeout(
    writer: &Mutex<OwnedWriteHalf>,
    msg: LinkMessage,
    timeout_duration: Duration,
    max_message_size: u32,
) -> anyhow::Result<()> {
    let send_op = async {
        let mut writer = writer.lock().await;
        write_message(&mut *writer, &msg, max_message_size).await
    };
    timeout(timeout_duration, send_op)
        .await
        .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", timeout_duration))?
}

struct TcpCommands {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    timeout_duration: Duration,
    max_message_size: u32,
}

#[async_trait::async_trait]
impl CommandChannel for TcpCommands {
    async fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        send_with_timeout(
            &self.writer,
            LinkMessage::Write(data.to_vec()),
            self.timeout_duration,
            self.max_message_size,
        )
        .await
    }
}

struct TcpNotifications {
    reader: OwnedReadHalf,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    timeout_duration: Duration,
    max_message_size: u32,
}

#[async_trait::async_trait]
impl NotificationStream for TcpNotifications {
    async fn subscribe(&mut self) -> anyhow::Result<()> {
        send_with_timeout(
            &self.writer,
            LinkMessage::Subscribe,
            self.timeout_duration,
            self.max_message_size,
        )
        .await
    }

    async fn next_frame(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        loop {
            match read_message(&mut self.reader, self.max_message_size).await? {
                Some(LinkMessage::Notify(frame)) => return Ok(Some(frame)),
                Some(other) => log::debug!("Ignoring link message {:?}", other),
                None => return Ok(None),
            }
        }
    }
}

/// Device side of the bridge, used by the simulator.
pub struct TcpPeripheral {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    max_message_size: u32,
}

impl TcpPeripheral {
    /// Accept one central on `listener` and advertise `device` to it.
    pub async fn accept(listener: &TcpListener, device: &DeviceInfo) -> anyhow::Result<Self> {
        let (stream, peer) = listener.accept().await?;
        log::info!("Central connected from {}", peer);
        let _ = stream.set_nodelay(true);
        let (reader, mut writer) = stream.into_split();
        write_message(
            &mut writer,
            &LinkMessage::Advertisement(device.clone()),
            MAX_LINK_MESSAGE_SIZE,
        )
        .await?;
        Ok(Self {
            reader,
            writer,
            max_message_size: MAX_LINK_MESSAGE_SIZE,
        })
    }

    /// Next message from the central, `None` once it hung up.
    pub async fn recv(&mut self) -> anyhow::Result<Option<LinkMessage>> {
        read_message(&mut self.reader, self.max_message_size).await
    }

    pub async fn notify(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        write_message(
            &mut self.writer,
            &LinkMessage::Notify(frame.to_vec()),
            self.max_message_size,
        )
        .await
    }
}
