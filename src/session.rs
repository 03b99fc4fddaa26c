#![cfg(feature = "std")]

use tokio::time::timeout;

use crate::{
    config::ClientConfig,
    connection::Connection,
    core::{Command, DispatchOutcome, Dispatcher, NotificationSink},
    error::{CommandError, DiscoveryError},
    transport::{Adapter, Cancellation, DeviceInfo, ScanFilter},
};

/// Per-outcome counters of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub decoded: usize,
    pub recognized: usize,
    pub unknown: usize,
    pub truncated: usize,
}

impl SessionStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Decoded { .. } => self.decoded += 1,
            DispatchOutcome::Recognized(_) => self.recognized += 1,
            DispatchOutcome::UnknownTag(_) => self.unknown += 1,
            DispatchOutcome::Truncated { .. } => self.truncated += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.decoded + self.recognized + self.unknown + self.truncated
    }
}

/// One monitoring session against one peripheral.
///
/// Owns the adapter, the connection handles and the consumer. Nothing is
/// retried: a failed discovery or connect is logged and returned, and the
/// caller decides whether to start over.
pub struct Session<A: Adapter, S: NotificationSink> {
    adapter: A,
    sink: S,
    config: ClientConfig,
    dispatcher: Dispatcher<'static>,
    connection: Connection,
    stats: SessionStats,
}

impl<A: Adapter, S: NotificationSink + Send> Session<A, S> {
    pub fn new(adapter: A, sink: S, config: ClientConfig) -> Self {
        Self {
            adapter,
            sink,
            config,
            dispatcher: Dispatcher::standard(),
            connection: Connection::disconnected(),
            stats: SessionStats::default(),
        }
    }

    /// Discover a matching device, or fail on timeout or cancellation.
    pub async fn discover(&mut self, cancel: &Cancellation) -> Result<DeviceInfo, DiscoveryError> {
        let filter = ScanFilter::new(self.config.name_prefix.clone(), self.config.service_uuid.clone());
        let discovery_timeout = self.config.discovery_timeout;
        let adapter = &mut self.adapter;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
            res = timeout(discovery_timeout, adapter.discover(&filter)) => {
                res.unwrap_or(Err(DiscoveryError::Timeout))
            }
        };
        match &result {
            Ok(device) => log::info!("Found {} (ID: {})", device.display_name(), device.id),
            Err(e) => log::error!("Scan failed or cancelled: {}", e),
        }
        result
    }

    /// Discover, connect, subscribe to status and enable telemetry.
    ///
    /// A failed enable command is logged and does not fail the connect; the
    /// session keeps listening.
    pub async fn connect(&mut self, cancel: &Cancellation) -> anyhow::Result<DeviceInfo> {
        let device = self.discover(cancel).await?;

        let link = match self.adapter.connect(&device).await {
            Ok(link) => link,
            Err(e) => {
                log::error!("Connection failed: {:#}", e);
                return Err(e);
            }
        };
        self.connection.attach(device.clone(), link);

        if let Err(e) = self.connection.subscribe().await {
            log::error!("Connection failed: {:#}", e);
            self.connection.detach();
            return Err(e);
        }
        log::info!("Connected to {}", device.display_name());

        if self.config.enable_telemetry && self.connection.enable_telemetry().await.is_err() {
            log::warn!("Failed to enable OpsLog.");
        }
        Ok(device)
    }

    /// Process notifications until the peripheral disconnects or `cancel`
    /// fires. Frames are dispatched one at a time, in arrival order.
    pub async fn run(&mut self, cancel: &Cancellation) -> anyhow::Result<SessionStats> {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::info!("Session cancelled");
                    break;
                }
                next = self.connection.next_frame() => next,
            };
            match next {
                Ok(Some(frame)) => {
                    log::trace!("Notification received: {}", crate::core::to_hex(&frame));
                    let outcome = self.dispatcher.dispatch(&frame, &mut self.sink);
                    self.stats.record(&outcome);
                }
                Ok(None) => {
                    log::info!("Peripheral disconnected");
                    break;
                }
                Err(e) => {
                    log::error!("Notification stream failed: {:#}", e);
                    self.connection.detach();
                    return Err(e);
                }
            }
        }
        self.connection.detach();
        Ok(self.stats)
    }

    /// Write an arbitrary command on the open connection.
    pub async fn send(&mut self, command: &Command) -> Result<(), CommandError> {
        self.connection.send(command).await
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
