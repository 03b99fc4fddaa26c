use rocc_link::core::{
    decode, encode_command, encode_frame, DispatchOutcome, Dispatcher, FieldValue, MessageTag,
    Payload, OPS_LOG_LEN, OPS_LOG_SCHEMA,
};

/// OpsLog test vector: every float field 1.0, BattVolt 3700 mV, both peltier
/// voltages 2 and a discharge current of 3, written byte by byte.
fn ops_log_vector() -> Vec<u8> {
    let mut frame = vec![0xA0];
    for _ in 0..8 {
        frame.extend_from_slice(&1.0f32.to_le_bytes());
    }
    frame.extend_from_slice(&3_700u32.to_le_bytes());
    for _ in 0..2 {
        frame.extend_from_slice(&1.0f32.to_le_bytes());
    }
    frame.extend_from_slice(&2u16.to_le_bytes());
    frame.extend_from_slice(&2u16.to_le_bytes());
    frame.extend_from_slice(&3u16.to_le_bytes());
    frame
}

#[test]
fn test_ops_log_vector_decodes() {
    let frame = ops_log_vector();
    assert_eq!(frame.len(), OPS_LOG_LEN);

    let outcome = Dispatcher::standard().handle(&frame);
    let DispatchOutcome::Decoded {
        tag: MessageTag::OpsLog,
        payload: Payload::Record(record),
    } = outcome
    else {
        panic!("expected an OpsLog record, got {:?}", outcome);
    };

    assert_eq!(record.get("LeftTherm1"), Some(FieldValue::Float(1.0)));
    assert_eq!(record.get("RightPeltCurrent"), Some(FieldValue::Float(1.0)));
    assert_eq!(record.get("BattVolt"), Some(FieldValue::Unsigned(3_700)));
    assert_eq!(record.get("AmbHumidity"), Some(FieldValue::Float(1.0)));
    assert_eq!(record.get("LeftPeltVolt"), Some(FieldValue::Unsigned(2)));
    assert_eq!(record.get("RightPeltVolt"), Some(FieldValue::Unsigned(2)));
    assert_eq!(record.get("DischargeCurrent"), Some(FieldValue::Unsigned(3)));
}

#[test]
fn test_encoder_matches_hand_built_vector() {
    let mut values = vec![FieldValue::Float(1.0); 8];
    values.push(FieldValue::Unsigned(3_700));
    values.extend([FieldValue::Float(1.0); 2]);
    values.extend([2, 2, 3].map(FieldValue::Unsigned));
    let encoded = encode_frame(MessageTag::OpsLog, &OPS_LOG_SCHEMA, &values).unwrap();
    assert_eq!(encoded, ops_log_vector());
}

#[test]
fn test_fields_keep_schema_order() {
    let record = decode(MessageTag::OpsLog, &ops_log_vector(), &OPS_LOG_SCHEMA);
    let names: Vec<&str> = record.fields().iter().map(|(name, _)| *name).collect();
    let expected: Vec<&str> = OPS_LOG_SCHEMA.fields().iter().map(|f| f.name).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_each_field_read_at_its_offset() {
    // Poison every byte, then place a distinct value at each field offset.
    let mut frame = vec![0xEE; OPS_LOG_LEN];
    frame[0] = 0xA0;
    let therm = OPS_LOG_SCHEMA.offset_of("RightTherm2").unwrap();
    frame[therm..therm + 4].copy_from_slice(&(-12.5f32).to_le_bytes());
    let batt = OPS_LOG_SCHEMA.offset_of("BattVolt").unwrap();
    frame[batt..batt + 4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
    let discharge = OPS_LOG_SCHEMA.offset_of("DischargeCurrent").unwrap();
    frame[discharge..discharge + 2].copy_from_slice(&0xFFFFu16.to_le_bytes());

    let record = decode(MessageTag::OpsLog, &frame, &OPS_LOG_SCHEMA);
    assert_eq!(record.get("RightTherm2"), Some(FieldValue::Float(-12.5)));
    assert_eq!(record.get("BattVolt"), Some(FieldValue::Unsigned(0xDEAD_BEEF)));
    // Unsigned, no sign extension.
    assert_eq!(record.get("DischargeCurrent"), Some(FieldValue::Unsigned(65_535)));
    assert_eq!(record.get("RightPeltVolt"), Some(FieldValue::Unsigned(0xEEEE)));
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut frame = ops_log_vector();
    let exact = Dispatcher::standard().handle(&frame);
    frame.extend_from_slice(&[0x01; 16]);
    assert_eq!(Dispatcher::standard().handle(&frame), exact);
}

#[test]
fn test_status_bytes() {
    let dispatcher = Dispatcher::standard();
    assert_eq!(
        dispatcher.handle(&[0xA2, 7]),
        DispatchOutcome::Decoded {
            tag: MessageTag::StateChange,
            payload: Payload::Status(7)
        }
    );
    assert_eq!(
        dispatcher.handle(&[0xA4, 2, 99]),
        DispatchOutcome::Decoded {
            tag: MessageTag::AccelEvent,
            payload: Payload::Status(2)
        }
    );
}

#[test]
fn test_command_encoding() {
    assert_eq!(encode_command(&[0x80]), vec![0x80]);
    assert_eq!(rocc_link::Command::enable_telemetry().encode(), vec![0x80]);
}
