//! Error types for the connection and command paths.

use alloc::string::String;
use core::fmt;

/// Failure of a command write. `is_ok()` on the send result is the plain
/// success flag; this value is the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No command channel is available.
    NotConnected,
    /// The transport rejected or failed the write.
    WriteFailed(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotConnected => write!(f, "Command characteristic not available"),
            CommandError::WriteFailed(detail) => write!(f, "Failed to write command: {}", detail),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

/// Failure of the discovery step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The user (or caller) cancelled the scan.
    Cancelled,
    /// No matching device appeared before the deadline.
    Timeout,
    /// A device answered but did not match the scan filter.
    NoMatch(String),
    /// The underlying transport failed.
    Transport(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Cancelled => write!(f, "discovery cancelled"),
            DiscoveryError::Timeout => write!(f, "no matching device found before timeout"),
            DiscoveryError::NoMatch(name) => write!(f, "device {} does not match the scan filter", name),
            DiscoveryError::Transport(detail) => write!(f, "transport error: {}", detail),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DiscoveryError {}
