#![cfg(feature = "std")]

use crate::core::Command;
use crate::error::CommandError;
use crate::sender;
use crate::transport::{CommandChannel, DeviceInfo, Link, NotificationStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Owner of the command and status handles of one peripheral.
///
/// Both handles are present while connected and absent otherwise; senders
/// and the notification loop borrow them from here.
pub struct Connection {
    device: Option<DeviceInfo>,
    commands: Option<Box<dyn CommandChannel>>,
    notifications: Option<Box<dyn NotificationStream>>,
}

impl Connection {
    pub fn disconnected() -> Self {
        Self {
            device: None,
            commands: None,
            notifications: None,
        }
    }

    /// Take ownership of an open link.
    pub fn attach(&mut self, device: DeviceInfo, link: Link) {
        self.device = Some(device);
        self.commands = Some(link.commands);
        self.notifications = Some(link.notifications);
    }

    /// Drop both handles.
    pub fn detach(&mut self) {
        if let Some(device) = self.device.take() {
            log::info!("Disconnected from {}", device.display_name());
        }
        self.commands = None;
        self.notifications = None;
    }

    pub fn state(&self) -> ConnectionState {
        if self.commands.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    pub async fn send(&mut self, command: &Command) -> Result<(), CommandError> {
        sender::send(self.commands.as_deref_mut(), command).await
    }

    pub async fn enable_telemetry(&mut self) -> Result<(), CommandError> {
        sender::enable_telemetry(self.commands.as_deref_mut()).await
    }

    pub async fn subscribe(&mut self) -> anyhow::Result<()> {
        match self.notifications.as_deref_mut() {
            Some(stream) => stream.subscribe().await,
            None => Err(anyhow::anyhow!("Status characteristic not available")),
        }
    }

    /// Next raw frame; `None` when disconnected or the peripheral hung up.
    pub async fn next_frame(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        match self.notifications.as_deref_mut() {
            Some(stream) => stream.next_frame().await,
            None => Ok(None),
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::disconnected()
    }
}
