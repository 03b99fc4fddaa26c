#![cfg(feature = "std")]

//! In-process link to a simulated peripheral.
//!
//! [`pair`] returns the central-side [`InMemoryAdapter`] and the
//! device-side [`SimulatedPeripheral`]. The peripheral advertises, pushes
//! notification frames and observes every command written to it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch, Notify};

use crate::error::DiscoveryError;
use crate::transport::{Adapter, CommandChannel, DeviceInfo, Link, NotificationStream, ScanFilter};

struct Shared {
    written: Mutex<Vec<Vec<u8>>>,
    pending: Mutex<VecDeque<Vec<u8>>>,
    write_ready: Notify,
    fail_writes: AtomicBool,
    subscribed: AtomicBool,
    connected: AtomicBool,
}

/// Create a connected adapter/peripheral pair.
pub fn pair() -> (InMemoryAdapter, SimulatedPeripheral) {
    let (advertise_tx, advertise_rx) = watch::channel(None);
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        written: Mutex::new(Vec::new()),
        pending: Mutex::new(VecDeque::new()),
        write_ready: Notify::new(),
        fail_writes: AtomicBool::new(false),
        subscribed: AtomicBool::new(false),
        connected: AtomicBool::new(true),
    });
    (
        InMemoryAdapter {
            advertised: advertise_rx,
            frames: Some(frames_rx),
            shared: shared.clone(),
        },
        SimulatedPeripheral {
            advertise: advertise_tx,
            frames: Some(frames_tx),
            shared,
        },
    )
}

pub struct InMemoryAdapter {
    advertised: watch::Receiver<Option<DeviceInfo>>,
    frames: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    shared: Arc<Shared>,
}

#[async_trait::async_trait]
impl Adapter for InMemoryAdapter {
    async fn discover(&mut self, filter: &ScanFilter) -> Result<DeviceInfo, DiscoveryError> {
        let mut rx = self.advertised.clone();
        let device = rx
            .wait_for(|adv| adv.as_ref().is_some_and(|d| filter.matches(d)))
            .await
            .map(|adv| (*adv).clone())
            .map_err(|_| DiscoveryError::Transport("peripheral went away".to_string()))?;
        device.ok_or(DiscoveryError::Timeout)
    }

    async fn connect(&mut self, device: &DeviceInfo) -> anyhow::Result<Link> {
        let advertised = (*self.advertised.borrow()).clone();
        if advertised.as_ref().map(|d| &d.id) != Some(&device.id) {
            return Err(anyhow::anyhow!("Device {} is not advertising", device.id));
        }
        device.require_characteristics()?;
        let frames = self
            .frames
            .take()
            .ok_or_else(|| anyhow::anyhow!("Device {} is already connected", device.id))?;
        Ok(Link {
            commands: Box::new(InMemoryCommands {
                shared: self.shared.clone(),
            }),
            notifications: Box::new(InMemoryNotifications {
                frames,
                shared: self.shared.clone(),
            }),
        })
    }
}

struct InMemoryCommands {
    shared: Arc<Shared>,
}

#[async_trait::async_trait]
impl CommandChannel for InMemoryCommands {
    async fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Device disconnected"));
        }
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("GATT operation failed"));
        }
        self.shared.written.lock().unwrap().push(data.to_vec());
        self.shared.pending.lock().unwrap().push_back(data.to_vec());
        self.shared.write_ready.notify_one();
        Ok(())
    }
}

struct InMemoryNotifications {
    frames: mpsc::UnboundedReceiver<Vec<u8>>,
    shared: Arc<Shared>,
}

#[async_trait::async_trait]
impl NotificationStream for InMemoryNotifications {
    async fn subscribe(&mut self) -> anyhow::Result<()> {
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Device disconnected"));
        }
        self.shared.subscribed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn next_frame(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.frames.recv().await)
    }
}

/// Device side of an in-memory link.
pub struct SimulatedPeripheral {
    advertise: watch::Sender<Option<DeviceInfo>>,
    frames: Option<mpsc::UnboundedSender<Vec<u8>>>,
    shared: Arc<Shared>,
}

impl SimulatedPeripheral {
    /// Start advertising `device`; a pending discovery sees it immediately.
    pub fn advertise(&self, device: DeviceInfo) {
        self.advertise.send_replace(Some(device));
    }

    /// Push one notification frame to the central.
    pub fn notify(&self, frame: impl Into<Vec<u8>>) -> anyhow::Result<()> {
        let frames = self
            .frames
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Peripheral is disconnected"))?;
        frames
            .send(frame.into())
            .map_err(|_| anyhow::anyhow!("Central dropped the notification stream"))
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared.subscribed.load(Ordering::SeqCst)
    }

    /// Every command written so far, oldest first.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.shared.written.lock().unwrap().clone()
    }

    /// Wait for the next written command. `None` after disconnect.
    pub async fn next_write(&self) -> Option<Vec<u8>> {
        loop {
            let notified = self.shared.write_ready.notified();
            let next = self.shared.pending.lock().unwrap().pop_front();
            if let Some(data) = next {
                return Some(data);
            }
            if !self.shared.connected.load(Ordering::SeqCst) {
                return None;
            }
            notified.await;
        }
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Drop the link. The central's notification stream ends.
    pub fn disconnect(&mut self) {
        self.frames = None;
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.write_ready.notify_one();
    }
}

impl Drop for SimulatedPeripheral {
    fn drop(&mut self) {
        self.disconnect();
    }
}
