//! Fixed-layout record schemas.
//!
//! A schema is an ordered list of fields. Offsets are implicit: the first
//! field starts right after the tag byte and each field starts where the
//! previous one ends.

/// Numeric encoding of a single field. Multi-byte values are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// IEEE-754 single precision.
    F32,
    U32,
    U16,
    U8,
}

impl FieldKind {
    /// Width of the field on the wire, in bytes.
    pub const fn width(self) -> usize {
        match self {
            FieldKind::F32 | FieldKind::U32 => 4,
            FieldKind::U16 => 2,
            FieldKind::U8 => 1,
        }
    }
}

/// One named field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered field layout of a schema-bearing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    fields: &'static [FieldSpec],
}

impl RecordSchema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    /// Fields in wire order.
    pub const fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Minimum frame length: one tag byte plus every field width.
    pub const fn min_len(&self) -> usize {
        let mut len = 1;
        let mut i = 0;
        while i < self.fields.len() {
            len += self.fields[i].kind.width();
            i += 1;
        }
        len
    }

    /// Byte offset of the named field within the frame (tag byte included).
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 1;
        for field in self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset += field.kind.width();
        }
        None
    }
}

const OPS_LOG_FIELDS: [FieldSpec; 14] = [
    FieldSpec::new("LeftTherm1", FieldKind::F32),
    FieldSpec::new("LeftTherm2", FieldKind::F32),
    FieldSpec::new("LeftSinkTemp", FieldKind::F32),
    FieldSpec::new("LeftPeltCurrent", FieldKind::F32),
    FieldSpec::new("RightTherm1", FieldKind::F32),
    FieldSpec::new("RightTherm2", FieldKind::F32),
    FieldSpec::new("RightSinkTemp", FieldKind::F32),
    FieldSpec::new("RightPeltCurrent", FieldKind::F32),
    FieldSpec::new("BattVolt", FieldKind::U32),
    FieldSpec::new("AmbTemperature", FieldKind::F32),
    FieldSpec::new("AmbHumidity", FieldKind::F32),
    FieldSpec::new("LeftPeltVolt", FieldKind::U16),
    FieldSpec::new("RightPeltVolt", FieldKind::U16),
    FieldSpec::new("DischargeCurrent", FieldKind::U16),
];

/// Layout of the OpsLog telemetry record.
pub const OPS_LOG_SCHEMA: RecordSchema = RecordSchema::new(&OPS_LOG_FIELDS);

/// Length of a complete OpsLog frame.
pub const OPS_LOG_LEN: usize = OPS_LOG_SCHEMA.min_len();
