//! Transport adapter contract.
//!
//! An adapter discovers a device, connects to it and hands back a [`Link`]:
//! a write primitive for commands plus a subscribable stream of raw
//! notification frames. The core never sees how either is implemented.

use crate::config::{COMMAND_CHAR_UUID, DEVICE_NAME_PREFIX, SERVICE_UUID, STATUS_CHAR_UUID};
use crate::error::DiscoveryError;

use tokio::sync::watch;

/// Identity of a discovered peripheral.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: Option<String>,
    /// Advertised service UUIDs.
    pub services: Vec<String>,
    /// Characteristic UUIDs exposed by the telemetry service.
    pub characteristics: Vec<String>,
}

impl DeviceInfo {
    /// A device exposing the telemetry service and both of its
    /// characteristics under `name`.
    pub fn rocc(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            services: vec![SERVICE_UUID.to_string()],
            characteristics: vec![STATUS_CHAR_UUID.to_string(), COMMAND_CHAR_UUID.to_string()],
        }
    }

    /// Name for display, `Unknown` when the device did not advertise one.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn has_characteristic(&self, uuid: &str) -> bool {
        self.characteristics.iter().any(|c| c.eq_ignore_ascii_case(uuid))
    }

    /// Fail unless both the status and the command characteristic exist.
    /// Adapters call this before handing out a [`Link`].
    pub fn require_characteristics(&self) -> anyhow::Result<()> {
        if !self.has_characteristic(STATUS_CHAR_UUID) {
            return Err(anyhow::anyhow!("Status characteristic not available on {}", self.id));
        }
        if !self.has_characteristic(COMMAND_CHAR_UUID) {
            return Err(anyhow::anyhow!("Command characteristic not available on {}", self.id));
        }
        Ok(())
    }
}

/// Which devices discovery accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    pub name_prefix: String,
    /// Service the device must expose. Empty accepts any.
    pub service: String,
}

impl ScanFilter {
    pub fn new(name_prefix: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            service: service.into(),
        }
    }

    pub fn matches(&self, device: &DeviceInfo) -> bool {
        let name_ok = device
            .name
            .as_deref()
            .is_some_and(|name| name.starts_with(&self.name_prefix));
        let service_ok = self.service.is_empty()
            || device
                .services
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&self.service));
        name_ok && service_ok
    }
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self::new(DEVICE_NAME_PREFIX, SERVICE_UUID)
    }
}

/// Writable command characteristic.
#[async_trait::async_trait]
pub trait CommandChannel: Send {
    async fn write(&mut self, data: &[u8]) -> anyhow::Result<()>;
}

/// Notifying status characteristic.
#[async_trait::async_trait]
pub trait NotificationStream: Send {
    /// Start notifications.
    async fn subscribe(&mut self) -> anyhow::Result<()>;

    /// Next raw frame, or `None` once the peripheral has disconnected.
    async fn next_frame(&mut self) -> anyhow::Result<Option<Vec<u8>>>;
}

/// The two characteristics of an open connection.
pub struct Link {
    pub commands: Box<dyn CommandChannel>,
    pub notifications: Box<dyn NotificationStream>,
}

/// Discovery and connection for one kind of transport.
#[async_trait::async_trait]
pub trait Adapter: Send {
    async fn discover(&mut self, filter: &ScanFilter) -> Result<DeviceInfo, DiscoveryError>;
    async fn connect(&mut self, device: &DeviceInfo) -> anyhow::Result<Link>;
}

/// Cancellation signal shared between a caller and a running operation.
#[derive(Debug, Clone)]
pub struct Cancellation {
    tx: std::sync::Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as `self`, so this only errors on drop.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

pub mod in_memory;
pub mod tcp;
