#![cfg(feature = "std")]

//! Peripheral simulator.
//!
//! Plays the device side of a link: waits for the enable-telemetry command,
//! then streams OpsLog frames with an occasional event in between.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::time::{interval, Duration};

use crate::config::DEFAULT_TELEMETRY_INTERVAL;
use crate::core::{encode_frame, EncodeError, FieldValue, MessageTag, Opcode, OPS_LOG_SCHEMA};
use crate::transport::in_memory::SimulatedPeripheral;
use crate::transport::tcp::{LinkMessage, TcpPeripheral};

/// Device side of a link, as seen by the simulator.
#[async_trait::async_trait]
pub trait PeripheralPort: Send {
    /// Next command written by the central, `None` once it is gone.
    async fn next_command(&mut self) -> anyhow::Result<Option<Vec<u8>>>;
    async fn notify(&mut self, frame: &[u8]) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl PeripheralPort for SimulatedPeripheral {
    async fn next_command(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.next_write().await)
    }

    async fn notify(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        SimulatedPeripheral::notify(self, frame.to_vec())
    }
}

#[async_trait::async_trait]
impl PeripheralPort for TcpPeripheral {
    async fn next_command(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        loop {
            match self.recv().await? {
                Some(LinkMessage::Write(data)) => return Ok(Some(data)),
                Some(LinkMessage::Subscribe) => log::debug!("Central subscribed to status"),
                Some(other) => log::debug!("Ignoring link message {:?}", other),
                None => return Ok(None),
            }
        }
    }

    async fn notify(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        TcpPeripheral::notify(self, frame).await
    }
}

/// Generates plausible telemetry and events.
pub struct TelemetryGenerator {
    rng: SmallRng,
    state: u8,
}

impl TelemetryGenerator {
    /// Seeded generator; `None` draws a seed from the thread RNG.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => {
                let mut seed_rng = rand::rng();
                SmallRng::from_rng(&mut seed_rng)
            }
        };
        Self { rng, state: 0 }
    }

    /// One complete OpsLog frame.
    pub fn ops_log_frame(&mut self) -> Result<Vec<u8>, EncodeError> {
        let rng = &mut self.rng;
        let mut values = Vec::with_capacity(OPS_LOG_SCHEMA.fields().len());
        for _ in 0..2 {
            // therm1, therm2, sink temp (°C), peltier current (A)
            values.push(FieldValue::Float(rng.random_range(18.0..38.0)));
            values.push(FieldValue::Float(rng.random_range(18.0..38.0)));
            values.push(FieldValue::Float(rng.random_range(20.0..45.0)));
            values.push(FieldValue::Float(rng.random_range(0.0..3.0)));
        }
        // battery millivolts
        values.push(FieldValue::Unsigned(rng.random_range(3_300..4_200)));
        values.push(FieldValue::Float(rng.random_range(15.0..35.0)));
        values.push(FieldValue::Float(rng.random_range(20.0..80.0)));
        values.push(FieldValue::Unsigned(rng.random_range(0..12_000)));
        values.push(FieldValue::Unsigned(rng.random_range(0..12_000)));
        values.push(FieldValue::Unsigned(rng.random_range(0..2_000)));

        encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &values)
    }

    /// An event frame: a state change, accelerometer event or user switch.
    pub fn event_frame(&mut self) -> Vec<u8> {
        match self.rng.random_range(0..3) {
            0 => {
                self.state = self.state.wrapping_add(1) % 8;
                vec![MessageTag::StateChange.byte(), self.state]
            }
            1 => vec![MessageTag::AccelEvent.byte(), self.rng.random_range(0..4)],
            _ => vec![MessageTag::UserSwitch.byte()],
        }
    }
}

/// Simulation pacing.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub interval: Duration,
    /// Stop after this many OpsLog frames; `None` runs until the central leaves.
    pub count: Option<usize>,
    /// Emit an event frame after every n-th OpsLog frame. Zero disables events.
    pub event_every: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TELEMETRY_INTERVAL,
            count: None,
            event_every: 5,
        }
    }
}

/// Serve one central over `port`.
///
/// Returns the number of OpsLog frames sent.
pub async fn run<P: PeripheralPort + ?Sized>(
    port: &mut P,
    generator: &mut TelemetryGenerator,
    config: &SimulatorConfig,
) -> anyhow::Result<usize> {
    loop {
        match port.next_command().await? {
            Some(cmd) if cmd.first().copied().and_then(Opcode::from_byte) == Some(Opcode::EnableTelemetry) => {
                log::info!("Telemetry enabled by central");
                break;
            }
            Some(cmd) => log::warn!("Unsupported command: {:02x?}", cmd),
            None => {
                log::info!("Central left before enabling telemetry");
                return Ok(0);
            }
        }
    }

    let mut ticker = interval(config.interval);
    let mut sent = 0;
    while config.count.map_or(true, |count| sent < count) {
        ticker.tick().await;
        let frame = generator.ops_log_frame()?;
        if let Err(e) = port.notify(&frame).await {
            log::info!("Central gone after {} frames: {:#}", sent, e);
            return Ok(sent);
        }
        sent += 1;
        if config.event_every > 0 && sent % config.event_every == 0 {
            if let Err(e) = port.notify(&generator.event_frame()).await {
                log::info!("Central gone after {} frames: {:#}", sent, e);
                return Ok(sent);
            }
        }
    }
    Ok(sent)
}
