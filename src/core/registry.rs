//! Static table of known notification kinds.

use super::schema::{RecordSchema, OPS_LOG_SCHEMA};
use super::tag::MessageTag;

/// How the payload after the tag byte is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Full fixed-layout record.
    Schema(&'static RecordSchema),
    /// A single status byte at offset 1.
    StatusByte,
    /// The tag alone carries the event; nothing follows.
    Event,
    /// Recognized but not decoded.
    Unhandled,
}

impl DecodeStrategy {
    /// Minimum frame length the strategy needs, tag byte included.
    pub const fn min_len(self) -> usize {
        match self {
            DecodeStrategy::Schema(schema) => schema.min_len(),
            DecodeStrategy::StatusByte => 2,
            DecodeStrategy::Event | DecodeStrategy::Unhandled => 1,
        }
    }
}

/// Registry row for one known tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub tag: MessageTag,
    pub name: &'static str,
    pub min_len: usize,
    pub strategy: DecodeStrategy,
}

impl RegistryEntry {
    const fn new(tag: MessageTag, name: &'static str, strategy: DecodeStrategy) -> Self {
        Self {
            tag,
            name,
            min_len: strategy.min_len(),
            strategy,
        }
    }
}

/// Immutable tag → entry table. Lookups are a single match plus an index.
#[derive(Debug)]
pub struct Registry {
    entries: [RegistryEntry; MessageTag::COUNT],
}

static STANDARD: Registry = Registry {
    entries: [
        RegistryEntry::new(
            MessageTag::OpsLog,
            "OpsLog",
            DecodeStrategy::Schema(&OPS_LOG_SCHEMA),
        ),
        RegistryEntry::new(MessageTag::UserSwitch, "UserSwitch", DecodeStrategy::Event),
        RegistryEntry::new(MessageTag::StateChange, "StateChange", DecodeStrategy::StatusByte),
        RegistryEntry::new(MessageTag::SystemInfo, "SystemInfo", DecodeStrategy::Unhandled),
        RegistryEntry::new(MessageTag::AccelEvent, "AccelEvent", DecodeStrategy::StatusByte),
        RegistryEntry::new(
            MessageTag::BatteryChargerStatus,
            "BatteryChargerStatus",
            DecodeStrategy::Unhandled,
        ),
    ],
};

impl Registry {
    /// The protocol's fixed registry.
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    /// Entry for a raw tag byte, or `None` when the tag is unknown.
    pub fn lookup(&self, byte: u8) -> Option<&RegistryEntry> {
        MessageTag::from_byte(byte).map(|tag| self.entry(tag))
    }

    /// Entry for a known tag.
    pub fn entry(&self, tag: MessageTag) -> &RegistryEntry {
        &self.entries[tag.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }
}
