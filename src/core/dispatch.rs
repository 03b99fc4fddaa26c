//! Tag dispatch for incoming notifications.

use super::codec::{self, DecodedRecord};
use super::registry::{DecodeStrategy, Registry};
use super::tag::MessageTag;

/// Decoded payload of a handled notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Full schema decode.
    Record(DecodedRecord),
    /// Single status byte.
    Status(u8),
    /// The tag itself is the event.
    Event,
}

/// Result of handling one raw frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Decoded { tag: MessageTag, payload: Payload },
    /// Known tag that is intentionally not decoded.
    Recognized(MessageTag),
    /// Tag byte missing from the registry.
    UnknownTag(u8),
    /// Frame shorter than the registry minimum. `tag` is `None` for an
    /// empty frame.
    Truncated {
        tag: Option<MessageTag>,
        actual: usize,
        min: usize,
    },
}

impl DispatchOutcome {
    pub fn is_decoded(&self) -> bool {
        matches!(self, DispatchOutcome::Decoded { .. })
    }

    /// Hand the outcome to the matching consumer callback.
    pub fn deliver<S: NotificationSink + ?Sized>(&self, sink: &mut S) {
        match self {
            DispatchOutcome::Decoded { tag, payload } => sink.on_decoded(*tag, payload),
            DispatchOutcome::Recognized(tag) => sink.on_recognized_unhandled(*tag),
            DispatchOutcome::UnknownTag(byte) => sink.on_unknown_tag(*byte),
            DispatchOutcome::Truncated { tag, actual, min } => {
                sink.on_truncated_frame(*tag, *actual, *min)
            }
        }
    }
}

/// Consumer of dispatch outcomes (rendering, logging).
pub trait NotificationSink {
    fn on_decoded(&mut self, tag: MessageTag, payload: &Payload);
    fn on_recognized_unhandled(&mut self, tag: MessageTag);
    fn on_unknown_tag(&mut self, tag: u8);
    fn on_truncated_frame(&mut self, tag: Option<MessageTag>, actual: usize, min: usize);
}

impl<S: NotificationSink + ?Sized> NotificationSink for &mut S {
    fn on_decoded(&mut self, tag: MessageTag, payload: &Payload) {
        (**self).on_decoded(tag, payload)
    }

    fn on_recognized_unhandled(&mut self, tag: MessageTag) {
        (**self).on_recognized_unhandled(tag)
    }

    fn on_unknown_tag(&mut self, tag: u8) {
        (**self).on_unknown_tag(tag)
    }

    fn on_truncated_frame(&mut self, tag: Option<MessageTag>, actual: usize, min: usize) {
        (**self).on_truncated_frame(tag, actual, min)
    }
}

/// Stateless router from raw frames to outcomes.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
}

impl Dispatcher<'static> {
    /// Dispatcher over the protocol's standard registry.
    pub fn standard() -> Self {
        Self::new(Registry::standard())
    }
}

impl Default for Dispatcher<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Classify and decode one frame. Never panics, whatever the input.
    pub fn handle(&self, frame: &[u8]) -> DispatchOutcome {
        let Some(&byte) = frame.first() else {
            return DispatchOutcome::Truncated {
                tag: None,
                actual: 0,
                min: 1,
            };
        };
        let Some(entry) = self.registry.lookup(byte) else {
            return DispatchOutcome::UnknownTag(byte);
        };
        if frame.len() < entry.min_len {
            return DispatchOutcome::Truncated {
                tag: Some(entry.tag),
                actual: frame.len(),
                min: entry.min_len,
            };
        }
        let tag = entry.tag;
        match entry.strategy {
            DecodeStrategy::Schema(schema) => DispatchOutcome::Decoded {
                tag,
                payload: Payload::Record(codec::decode(tag, frame, schema)),
            },
            DecodeStrategy::StatusByte => DispatchOutcome::Decoded {
                tag,
                payload: Payload::Status(frame[1]),
            },
            DecodeStrategy::Event => DispatchOutcome::Decoded {
                tag,
                payload: Payload::Event,
            },
            DecodeStrategy::Unhandled => DispatchOutcome::Recognized(tag),
        }
    }

    /// Handle `frame` and deliver the outcome to `sink`.
    pub fn dispatch<S: NotificationSink + ?Sized>(&self, frame: &[u8], sink: &mut S) -> DispatchOutcome {
        let outcome = self.handle(frame);
        outcome.deliver(sink);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::OPS_LOG_LEN;

    #[derive(Default)]
    struct Counts {
        decoded: usize,
        recognized: usize,
        unknown: usize,
        truncated: usize,
    }

    impl NotificationSink for Counts {
        fn on_decoded(&mut self, _: MessageTag, _: &Payload) {
            self.decoded += 1;
        }
        fn on_recognized_unhandled(&mut self, _: MessageTag) {
            self.recognized += 1;
        }
        fn on_unknown_tag(&mut self, _: u8) {
            self.unknown += 1;
        }
        fn on_truncated_frame(&mut self, _: Option<MessageTag>, _: usize, _: usize) {
            self.truncated += 1;
        }
    }

    #[test]
    fn empty_frame_is_truncated() {
        let outcome = Dispatcher::standard().handle(&[]);
        assert_eq!(
            outcome,
            DispatchOutcome::Truncated { tag: None, actual: 0, min: 1 }
        );
    }

    #[test]
    fn state_change_carries_status() {
        let outcome = Dispatcher::standard().handle(&[0xA2, 7]);
        assert_eq!(
            outcome,
            DispatchOutcome::Decoded {
                tag: MessageTag::StateChange,
                payload: Payload::Status(7)
            }
        );
    }

    #[test]
    fn short_ops_log_is_truncated() {
        let frame = [0xA0; 45];
        assert_eq!(
            Dispatcher::standard().handle(&frame),
            DispatchOutcome::Truncated {
                tag: Some(MessageTag::OpsLog),
                actual: 45,
                min: OPS_LOG_LEN
            }
        );
    }

    #[test]
    fn unhandled_and_event_tags() {
        let dispatcher = Dispatcher::standard();
        assert_eq!(
            dispatcher.handle(&[0xA3, 1, 2, 3]),
            DispatchOutcome::Recognized(MessageTag::SystemInfo)
        );
        assert_eq!(
            dispatcher.handle(&[0xA5]),
            DispatchOutcome::Recognized(MessageTag::BatteryChargerStatus)
        );
        assert_eq!(
            dispatcher.handle(&[0xA1]),
            DispatchOutcome::Decoded {
                tag: MessageTag::UserSwitch,
                payload: Payload::Event
            }
        );
    }

    #[test]
    fn dispatch_routes_to_one_callback() {
        let dispatcher = Dispatcher::standard();
        let mut counts = Counts::default();
        dispatcher.dispatch(&[0xA2, 1], &mut counts);
        dispatcher.dispatch(&[0xA3], &mut counts);
        dispatcher.dispatch(&[0x10], &mut counts);
        dispatcher.dispatch(&[0xA4], &mut counts);
        dispatcher.dispatch(&[], &mut counts);
        assert_eq!(counts.decoded, 1);
        assert_eq!(counts.recognized, 1);
        assert_eq!(counts.unknown, 1);
        assert_eq!(counts.truncated, 2);
    }
}
