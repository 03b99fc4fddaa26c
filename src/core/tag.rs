//! Leading tag byte of every status notification.

use core::fmt;

/// Known notification kinds, keyed by their tag byte.
///
/// Any other byte value is an *unknown* tag. That is an expected runtime
/// outcome (newer firmware may add kinds), so conversion from `u8` hands the
/// raw byte back instead of raising a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageTag {
    /// Periodic operational parameters (telemetry).
    OpsLog = 0xA0,
    /// The user switch was pressed.
    UserSwitch = 0xA1,
    /// Device state machine transition, new state in byte 1.
    StateChange = 0xA2,
    SystemInfo = 0xA3,
    /// Accelerometer event, status in byte 1.
    AccelEvent = 0xA4,
    BatteryChargerStatus = 0xA5,
}

impl MessageTag {
    /// Number of known tags.
    pub const COUNT: usize = 6;

    /// Every known tag, in ascending byte order.
    pub const ALL: [MessageTag; Self::COUNT] = [
        MessageTag::OpsLog,
        MessageTag::UserSwitch,
        MessageTag::StateChange,
        MessageTag::SystemInfo,
        MessageTag::AccelEvent,
        MessageTag::BatteryChargerStatus,
    ];

    /// Classify a raw tag byte. Returns `None` for unknown tags.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xA0 => Some(MessageTag::OpsLog),
            0xA1 => Some(MessageTag::UserSwitch),
            0xA2 => Some(MessageTag::StateChange),
            0xA3 => Some(MessageTag::SystemInfo),
            0xA4 => Some(MessageTag::AccelEvent),
            0xA5 => Some(MessageTag::BatteryChargerStatus),
            _ => None,
        }
    }

    /// Wire value of the tag.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Dense index into per-tag tables.
    pub(crate) const fn index(self) -> usize {
        (self as u8 - MessageTag::OpsLog as u8) as usize
    }
}

impl TryFrom<u8> for MessageTag {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        MessageTag::from_byte(byte).ok_or(byte)
    }
}

impl From<MessageTag> for u8 {
    fn from(tag: MessageTag) -> u8 {
        tag.byte()
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = crate::core::registry::Registry::standard().entry(*self).name;
        write!(f, "{} (0x{:02X})", name, self.byte())
    }
}
