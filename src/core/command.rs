//! Outbound commands written to the command characteristic.

use alloc::vec::Vec;

use super::codec::encode_command;

/// Command opcodes understood by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Start streaming OpsLog telemetry.
    EnableTelemetry = 0x80,
}

impl Opcode {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x80 => Some(Opcode::EnableTelemetry),
            _ => None,
        }
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// `[opcode][args..]`, built right before it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    bytes: Vec<u8>,
}

impl Command {
    pub fn new(opcode: Opcode) -> Self {
        Self::with_args(opcode, &[])
    }

    pub fn with_args(opcode: Opcode, args: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(1 + args.len());
        bytes.push(opcode.byte());
        bytes.extend_from_slice(args);
        Self { bytes }
    }

    /// The zero-argument "enable telemetry" command.
    pub fn enable_telemetry() -> Self {
        Self::new(Opcode::EnableTelemetry)
    }

    pub fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    pub fn args(&self) -> &[u8] {
        &self.bytes[1..]
    }

    /// Wire representation handed to the transport write.
    pub fn encode(&self) -> Vec<u8> {
        encode_command(&self.bytes)
    }
}

impl From<Opcode> for Command {
    fn from(opcode: Opcode) -> Self {
        Command::new(opcode)
    }
}
