use core::time::Duration;

use alloc::string::{String, ToString};

/// Primary GATT service exposed by the peripheral.
pub const SERVICE_UUID: &str = "d973f2e0-b19e-11e2-9e96-0800200c9a66";
/// Notify characteristic carrying status frames.
pub const STATUS_CHAR_UUID: &str = "d973f2e1-b19e-11e2-9e96-0800200c9a66";
/// Write characteristic accepting commands.
pub const COMMAND_CHAR_UUID: &str = "d973f2e2-b19e-11e2-9e96-0800200c9a66";

/// Advertised name prefix of compatible devices.
pub const DEVICE_NAME_PREFIX: &str = "NRS-ROCC";

/// How long discovery waits for a matching device.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);
/// Upper bound on a single command write or link operation.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Simulator telemetry period.
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Largest link message accepted on the TCP bridge (64 KiB).
pub const MAX_LINK_MESSAGE_SIZE: u32 = 64 * 1024;

/// Client-side settings for a monitoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Only devices whose name starts with this prefix are accepted.
    pub name_prefix: String,
    /// Service the device must advertise.
    pub service_uuid: String,
    pub discovery_timeout: Duration,
    pub write_timeout: Duration,
    /// Send the enable-telemetry command right after subscribing.
    pub enable_telemetry: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name_prefix: DEVICE_NAME_PREFIX.to_string(),
            service_uuid: SERVICE_UUID.to_string(),
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            enable_telemetry: true,
        }
    }
}
