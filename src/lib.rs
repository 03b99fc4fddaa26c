#![cfg_attr(not(feature = "std"), no_std)]

//! Client for the ROCC peripheral's status/command GATT service.
//!
//! The protocol core (tag registry, frame codec, dispatcher, command
//! encoding) lives in [`core`] and builds without `std`. With the `std`
//! feature the crate adds the transport contract and adapters, the command
//! sender, session lifecycle, rendering sinks and a device simulator.

extern crate alloc;

pub mod config;
pub mod core;
pub mod error;
#[cfg(feature = "std")]
pub mod connection;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod render;
#[cfg(feature = "std")]
pub mod sender;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod simulator;
#[cfg(feature = "std")]
pub mod transport;

pub use crate::config::*;
pub use crate::core::{
    Command, DecodedRecord, DispatchOutcome, Dispatcher, FieldValue, MessageTag, NotificationSink,
    Opcode, Payload, Registry,
};
pub use crate::error::{CommandError, DiscoveryError};
#[cfg(feature = "std")]
pub use connection::{Connection, ConnectionState};
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use render::{render_card, CardSink, JsonSink, LogSink};
#[cfg(feature = "std")]
pub use session::{Session, SessionStats};
#[cfg(feature = "std")]
pub use transport::{
    in_memory::InMemoryAdapter, tcp::TcpAdapter, Adapter, Cancellation, CommandChannel, DeviceInfo,
    Link, NotificationStream, ScanFilter,
};
