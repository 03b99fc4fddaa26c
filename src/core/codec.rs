//! Frame codec: schema-driven decoding of notifications and materialization
//! of outbound command bytes.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write as _};

use super::schema::{FieldKind, RecordSchema};
use super::tag::MessageTag;

/// A decoded numeric field. No scaling or sign extension is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Unsigned(u32),
}

impl FieldValue {
    /// Widened value for display.
    pub fn as_f64(self) -> f64 {
        match self {
            FieldValue::Float(v) => v as f64,
            FieldValue::Unsigned(v) => v as f64,
        }
    }

    pub fn as_u32(self) -> Option<u32> {
        match self {
            FieldValue::Unsigned(v) => Some(v),
            FieldValue::Float(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Unsigned(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(feature = "std")]
impl serde::Serialize for FieldValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Float(v) => serializer.serialize_f32(*v),
            FieldValue::Unsigned(v) => serializer.serialize_u32(*v),
        }
    }
}

/// Named field values of one notification, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    tag: MessageTag,
    fields: Vec<(&'static str, FieldValue)>,
}

impl DecodedRecord {
    pub fn tag(&self) -> MessageTag {
        self.tag
    }

    /// Value of the named field, if the schema declares it.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    pub fn fields(&self) -> &[(&'static str, FieldValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

#[cfg(feature = "std")]
impl serde::Serialize for DecodedRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Read cursor over a frame, advancing by field width.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.buf.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read(&mut self, kind: FieldKind) -> Option<FieldValue> {
        let value = match kind {
            FieldKind::F32 => FieldValue::Float(f32::from_le_bytes(self.take()?)),
            FieldKind::U32 => FieldValue::Unsigned(u32::from_le_bytes(self.take()?)),
            FieldKind::U16 => FieldValue::Unsigned(u16::from_le_bytes(self.take()?) as u32),
            FieldKind::U8 => FieldValue::Unsigned(self.take::<1>()?[0] as u32),
        };
        Some(value)
    }
}

/// Decode `frame` with `schema`, starting right after the tag byte.
///
/// The caller guarantees `frame.len() >= schema.min_len()`. Bytes past the
/// schema are ignored. If the guarantee is broken, decoding stops at the
/// first field that does not fit and the record comes back short.
pub fn decode(tag: MessageTag, frame: &[u8], schema: &RecordSchema) -> DecodedRecord {
    let mut cursor = Cursor::new(frame, 1);
    let mut fields = Vec::with_capacity(schema.fields().len());
    for spec in schema.fields() {
        let Some(value) = cursor.read(spec.kind) else {
            break;
        };
        fields.push((spec.name, value));
    }
    DecodedRecord { tag, fields }
}

/// Materialize command bytes in their wire form.
pub fn encode_command(bytes: &[u8]) -> Vec<u8> {
    bytes.to_vec()
}

/// Errors raised while building a frame from values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Number of values does not match the schema.
    FieldCount { expected: usize, actual: usize },
    /// A float was given for an integer field or the other way round.
    KindMismatch { field: &'static str },
    /// An unsigned value does not fit the field width.
    OutOfRange { field: &'static str, value: u32 },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::FieldCount { expected, actual } => {
                write!(f, "expected {} field values, got {}", expected, actual)
            }
            EncodeError::KindMismatch { field } => {
                write!(f, "value kind does not match field {}", field)
            }
            EncodeError::OutOfRange { field, value } => {
                write!(f, "value {} out of range for field {}", value, field)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Build a frame for `tag`: the tag byte followed by `values` in schema order.
pub fn encode_frame(
    tag: MessageTag,
    schema: &RecordSchema,
    values: &[FieldValue],
) -> Result<Vec<u8>, EncodeError> {
    let specs = schema.fields();
    if specs.len() != values.len() {
        return Err(EncodeError::FieldCount {
            expected: specs.len(),
            actual: values.len(),
        });
    }
    let mut frame = Vec::with_capacity(schema.min_len());
    frame.push(tag.byte());
    for (spec, value) in specs.iter().zip(values) {
        match (spec.kind, *value) {
            (FieldKind::F32, FieldValue::Float(v)) => frame.extend_from_slice(&v.to_le_bytes()),
            (FieldKind::U32, FieldValue::Unsigned(v)) => frame.extend_from_slice(&v.to_le_bytes()),
            (FieldKind::U16, FieldValue::Unsigned(v)) => {
                let v = u16::try_from(v).map_err(|_| EncodeError::OutOfRange {
                    field: spec.name,
                    value: v,
                })?;
                frame.extend_from_slice(&v.to_le_bytes());
            }
            (FieldKind::U8, FieldValue::Unsigned(v)) => {
                let v = u8::try_from(v).map_err(|_| EncodeError::OutOfRange {
                    field: spec.name,
                    value: v,
                })?;
                frame.push(v);
            }
            _ => return Err(EncodeError::KindMismatch { field: spec.name }),
        }
    }
    Ok(frame)
}

/// Lowercase, space separated hex dump (`"a0 01 ff"`).
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{FieldSpec, OPS_LOG_LEN, OPS_LOG_SCHEMA};

    fn ops_log_values() -> Vec<FieldValue> {
        let mut values = vec![FieldValue::Float(1.0); 8];
        values.push(FieldValue::Unsigned(3_700));
        values.extend([FieldValue::Float(1.0); 2]);
        values.extend([
            FieldValue::Unsigned(2),
            FieldValue::Unsigned(2),
            FieldValue::Unsigned(3),
        ]);
        values
    }

    #[test]
    fn decode_reads_fields_in_order() {
        let frame = encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &ops_log_values()).unwrap();
        assert_eq!(frame.len(), OPS_LOG_LEN);

        let record = decode(MessageTag::OpsLog, &frame, &OPS_LOG_SCHEMA);
        assert_eq!(record.len(), 14);
        assert_eq!(record.get("LeftTherm1"), Some(FieldValue::Float(1.0)));
        assert_eq!(record.get("BattVolt"), Some(FieldValue::Unsigned(3_700)));
        assert_eq!(record.get("LeftPeltVolt"), Some(FieldValue::Unsigned(2)));
        assert_eq!(record.get("DischargeCurrent"), Some(FieldValue::Unsigned(3)));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut frame = encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &ops_log_values()).unwrap();
        let exact = decode(MessageTag::OpsLog, &frame, &OPS_LOG_SCHEMA);
        frame.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let padded = decode(MessageTag::OpsLog, &frame, &OPS_LOG_SCHEMA);
        assert_eq!(exact, padded);
    }

    #[test]
    fn decode_stops_on_short_buffer() {
        let frame = encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &ops_log_values()).unwrap();
        let record = decode(MessageTag::OpsLog, &frame[..10], &OPS_LOG_SCHEMA);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn u8_fields_take_one_byte() {
        const FIELDS: [FieldSpec; 2] = [
            FieldSpec::new("a", FieldKind::U8),
            FieldSpec::new("b", FieldKind::U16),
        ];
        let schema = RecordSchema::new(&FIELDS);
        let record = decode(MessageTag::SystemInfo, &[0xA3, 7, 0x34, 0x12], &schema);
        assert_eq!(record.get("a"), Some(FieldValue::Unsigned(7)));
        assert_eq!(record.get("b"), Some(FieldValue::Unsigned(0x1234)));
    }

    #[test]
    fn encode_frame_rejects_bad_values() {
        let mut values = ops_log_values();
        values.pop();
        assert_eq!(
            encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &values),
            Err(EncodeError::FieldCount { expected: 14, actual: 13 })
        );

        let mut values = ops_log_values();
        values[0] = FieldValue::Unsigned(1);
        assert_eq!(
            encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &values),
            Err(EncodeError::KindMismatch { field: "LeftTherm1" })
        );

        let mut values = ops_log_values();
        values[13] = FieldValue::Unsigned(70_000);
        assert_eq!(
            encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &values),
            Err(EncodeError::OutOfRange { field: "DischargeCurrent", value: 70_000 })
        );
    }

    #[test]
    fn command_encoding_is_identity() {
        assert_eq!(encode_command(&[0x80]), vec![0x80]);
        assert_eq!(encode_command(&[]), Vec::<u8>::new());
        assert_eq!(to_hex(&[0x80, 0x01, 0xff]), "80 01 ff");
    }
}
