#![cfg(feature = "std")]

//! Consumers of dispatch outcomes: log lines, a text card for telemetry and
//! JSON lines for machine consumption.

use std::io::Write;

use crate::core::{DecodedRecord, MessageTag, NotificationSink, Payload};

/// Logs one line per outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn on_decoded(&mut self, tag: MessageTag, payload: &Payload) {
        match (tag, payload) {
            (MessageTag::OpsLog, Payload::Record(record)) => log::debug!("OpsLog: {}", record),
            (MessageTag::UserSwitch, _) => log::info!("UserSw Event Triggered"),
            (MessageTag::StateChange, Payload::Status(state)) => {
                log::info!("State Changed to: {}", state)
            }
            (MessageTag::AccelEvent, Payload::Status(status)) => log::info!("Accel Event: {}", status),
            (tag, payload) => log::info!("{}: {:?}", tag, payload),
        }
    }

    fn on_recognized_unhandled(&mut self, tag: MessageTag) {
        match tag {
            MessageTag::SystemInfo => log::info!("System Info received (not handled)"),
            MessageTag::BatteryChargerStatus => {
                log::info!("Battery/Charger status received (not handled)")
            }
            other => log::info!("{} received (not handled)", other),
        }
    }

    fn on_unknown_tag(&mut self, tag: u8) {
        log::warn!("Unknown BLE status: 0x{:02X}", tag);
    }

    fn on_truncated_frame(&mut self, tag: Option<MessageTag>, actual: usize, min: usize) {
        match tag {
            Some(tag) => log::warn!("{} too short: {} bytes (need {})", tag, actual, min),
            None => log::warn!("Empty notification dropped"),
        }
    }
}

const LEFT: [&str; 5] = [
    "LeftTherm1",
    "LeftTherm2",
    "LeftSinkTemp",
    "LeftPeltCurrent",
    "LeftPeltVolt",
];
const RIGHT: [&str; 5] = [
    "RightTherm1",
    "RightTherm2",
    "RightSinkTemp",
    "RightPeltCurrent",
    "RightPeltVolt",
];
const SYSTEM: [&str; 4] = ["BattVolt", "AmbTemperature", "AmbHumidity", "DischargeCurrent"];

/// Render an OpsLog record as the "Operation Parameters" card.
///
/// Fields are grouped into Left, Right and System sections and printed with
/// two decimals. Fields missing from the record are skipped.
pub fn render_card(record: &DecodedRecord) -> String {
    let mut out = String::from("== Operation Parameters ==\n");
    for (title, names) in [("Left", &LEFT[..]), ("Right", &RIGHT[..]), ("System", &SYSTEM[..])] {
        out.push_str(title);
        out.push('\n');
        for name in names {
            if let Some(value) = record.get(name) {
                out.push_str(&format!("  {}: {:.2}\n", name, value.as_f64()));
            }
        }
    }
    out
}

/// Writes a card for every OpsLog record and logs everything else.
pub struct CardSink<W: Write> {
    out: W,
    log: LogSink,
}

impl<W: Write> CardSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, log: LogSink }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotificationSink for CardSink<W> {
    fn on_decoded(&mut self, tag: MessageTag, payload: &Payload) {
        if let Payload::Record(record) = payload {
            if tag == MessageTag::OpsLog {
                let card = render_card(record);
                if let Err(e) = self.out.write_all(card.as_bytes()).and_then(|_| self.out.flush()) {
                    log::warn!("Failed to render OpsLog card: {}", e);
                }
                return;
            }
        }
        self.log.on_decoded(tag, payload);
    }

    fn on_recognized_unhandled(&mut self, tag: MessageTag) {
        self.log.on_recognized_unhandled(tag);
    }

    fn on_unknown_tag(&mut self, tag: u8) {
        self.log.on_unknown_tag(tag);
    }

    fn on_truncated_frame(&mut self, tag: Option<MessageTag>, actual: usize, min: usize) {
        self.log.on_truncated_frame(tag, actual, min);
    }
}

/// One JSON object per outcome, newline separated.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: serde_json::Value) {
        let written = serde_json::to_writer(&mut self.out, &value)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush());
        if let Err(e) = written {
            log::warn!("Failed to write JSON line: {}", e);
        }
    }
}

fn tag_name(tag: MessageTag) -> &'static str {
    crate::core::Registry::standard().entry(tag).name
}

impl<W: Write> NotificationSink for JsonSink<W> {
    fn on_decoded(&mut self, tag: MessageTag, payload: &Payload) {
        let value = match payload {
            Payload::Record(record) => serde_json::json!({
                "event": "decoded",
                "tag": tag_name(tag),
                "record": record,
            }),
            Payload::Status(status) => serde_json::json!({
                "event": "decoded",
                "tag": tag_name(tag),
                "status": status,
            }),
            Payload::Event => serde_json::json!({
                "event": "decoded",
                "tag": tag_name(tag),
            }),
        };
        self.emit(value);
    }

    fn on_recognized_unhandled(&mut self, tag: MessageTag) {
        self.emit(serde_json::json!({ "event": "recognized", "tag": tag_name(tag) }));
    }

    fn on_unknown_tag(&mut self, tag: u8) {
        self.emit(serde_json::json!({ "event": "unknown_tag", "tag": tag }));
    }

    fn on_truncated_frame(&mut self, tag: Option<MessageTag>, actual: usize, min: usize) {
        self.emit(serde_json::json!({
            "event": "truncated",
            "tag": tag.map(tag_name),
            "actual": actual,
            "min": min,
        }));
    }
}
