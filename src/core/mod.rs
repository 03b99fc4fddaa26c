//! Protocol core (no_std compatible)
//!
//! Tag registry, fixed-layout frame codec, notification dispatcher and
//! command encoding. Nothing here performs I/O or holds mutable state, so it
//! builds without the `std` feature and can be reused on a gateway MCU.

pub mod codec;
pub mod command;
pub mod dispatch;
pub mod registry;
pub mod schema;
pub mod tag;

// Re-export commonly used types
pub use codec::{decode, encode_command, encode_frame, to_hex, DecodedRecord, EncodeError, FieldValue};
pub use command::{Command, Opcode};
pub use dispatch::{DispatchOutcome, Dispatcher, NotificationSink, Payload};
pub use registry::{DecodeStrategy, Registry, RegistryEntry};
pub use schema::{FieldKind, FieldSpec, RecordSchema, OPS_LOG_LEN, OPS_LOG_SCHEMA};
pub use tag::MessageTag;
