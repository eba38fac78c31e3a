use codec::{
    BitError, OidReason, PerError, Session, SessionConfig, SizeConstraint, Status, Violation,
    MAX_ERROR_FRAMES, MAX_ERROR_PARAMS,
};

#[test]
fn truncated_input_reports_end_of_buffer() {
    let data = [0x80];
    let mut dec = Session::decoder(&data, SessionConfig::default());
    let err = dec.decode_unconstrained_integer().unwrap_err();
    assert!(matches!(
        err,
        PerError::Bitstream(BitError::EndOfBuffer { .. })
    ));
    assert_eq!(dec.status(), Status::EndOfBuffer);

    let report = dec.error_text();
    assert!(report.starts_with("ASN.1 ERROR: Status -2\n"));
    assert!(report.contains("Stack trace:"));
    assert!(!dec.errors().frames().is_empty());
    assert!(dec.errors().frames().len() <= MAX_ERROR_FRAMES);
}

#[test]
fn constraint_violation_message_takes_params() {
    let mut enc = Session::encoder(SessionConfig::default()).unwrap();
    let err = enc.encode_constrained_integer(9, 0, 7).unwrap_err();
    assert_eq!(
        err,
        PerError::ConstraintViolation(Violation::Value {
            value: 9,
            lower: 0,
            upper: 7
        })
    );
    assert!(enc.add_error_param("rasAddress"));
    assert!(enc.add_error_param("9"));
    assert_eq!(
        enc.errors().message(),
        "Value constraint violation: field rasAddress, value 9"
    );
    assert_eq!(enc.status().code(), -23);
}

#[test]
fn missing_params_render_as_question_marks() {
    let mut enc = Session::encoder(SessionConfig::default()).unwrap();
    enc.set_size_constraint(SizeConstraint::fixed(3));
    assert!(enc.encode_octet_string(b"ab").is_err());
    assert!(enc.add_error_param("callIdentifier"));
    assert_eq!(
        enc.errors().message(),
        "Value constraint violation: field callIdentifier, value ?"
    );
}

#[test]
fn params_are_capped() {
    let mut session = Session::new(SessionConfig::default());
    for i in 0..MAX_ERROR_PARAMS {
        assert!(session.add_error_param(format!("p{i}")));
    }
    assert!(!session.add_error_param("extra"));
    assert_eq!(session.errors().params().len(), MAX_ERROR_PARAMS);
}

#[test]
fn first_status_wins() {
    let data = [0xC7];
    let mut dec = Session::decoder(&data, SessionConfig::default());
    assert!(matches!(
        dec.decode_length(),
        Err(PerError::InvalidLength { .. })
    ));
    assert!(dec.decode_bits(16).is_err());
    assert_eq!(dec.status(), Status::InvalidLength);

    assert_eq!(dec.errors_mut().take_status(), Status::InvalidLength);
    assert_eq!(dec.status(), Status::Ok);
}

#[test]
fn range_error_for_inverted_bounds() {
    let mut enc = Session::encoder(SessionConfig::default()).unwrap();
    assert!(matches!(
        enc.encode_constrained_integer(0, 5, 1),
        Err(PerError::RangeError { lower: 5, upper: 1 })
    ));
    assert_eq!(enc.status(), Status::RangeError);
}

#[test]
fn static_buffer_overflow() {
    let mut storage = [0u8; 3];
    let mut enc = Session::new(SessionConfig::default());
    enc.attach_encode_buffer(&mut storage);
    assert!(enc.encode_octet_string(b"abcd").is_err());
    assert_eq!(enc.status(), Status::BufferOverflow);
}

#[test]
fn dynamic_buffer_stops_at_message_limit() {
    let config = SessionConfig::default().with_max_message_bytes(2_048);
    let mut enc = Session::encoder(config).unwrap();
    let payload = vec![0xAA; 4_096];
    assert!(matches!(
        enc.encode_octet_string(&payload),
        Err(PerError::Bitstream(BitError::OutOfMemory { .. }))
    ));
    assert_eq!(enc.status(), Status::OutOfMemory);
}

#[test]
fn bad_object_identifier_is_rejected_before_encoding() {
    let err = codec::ObjectIdentifier::new([4, 1]).unwrap_err();
    assert_eq!(err, PerError::InvalidObjectId(OidReason::FirstArc { arc: 4 }));
    assert_eq!(err.status(), Status::InvalidObjectId);
}

#[test]
fn sub_session_leaves_parent_untouched() {
    let data = [0x02, 0xAB, 0xCD, 0x01];
    let mut session = Session::decoder(&data, SessionConfig::default());
    {
        let mut sub = session.sub_session();
        assert_eq!(&*sub.decode_octet_string().unwrap(), &[0xAB, 0xCD]);
        assert_eq!(sub.encoded_bit_count(), 24);
    }
    assert_eq!(session.encoded_bit_count(), 0);
    assert_eq!(session.component_length(8).unwrap(), 2);
    assert_eq!(session.encoded_bit_count(), 0);
    assert_eq!(&*session.decode_octet_string().unwrap(), &[0xAB, 0xCD]);
    assert!(session.decode_bit().is_ok());
}

#[test]
fn preserved_buffer_outlives_session() {
    let config = SessionConfig::default().with_preserve_buffer(true);
    let mut enc = Session::encoder(config).unwrap();
    enc.encode_octet_string(b"keep").unwrap();
    let bytes = enc.destroy().unwrap();
    assert_eq!(&bytes[..], &[0x04, b'k', b'e', b'e', b'p']);
}

#[test]
fn fragmented_bit_string_roundtrip() {
    let bits = 70_000usize;
    let data: Vec<u8> = (0..bits.div_ceil(8)).map(|i| (i % 256) as u8).collect();
    let mut enc = Session::encoder(SessionConfig::default()).unwrap();
    enc.encode_bit_string(bits, &data).unwrap();
    let bytes = enc.encoded().to_vec();
    // 64K bits, then a two-octet length for the remaining 4464.
    assert_eq!(bytes[0], 0xC4);
    assert_eq!(&bytes[1 + 8_192..1 + 8_194], &[0x91, 0x70]);

    let mut dec = Session::decoder(&bytes, SessionConfig::default());
    let decoded = dec.decode_bit_string().unwrap();
    assert_eq!(decoded.bit_len(), bits);
    assert_eq!(decoded.as_bytes(), data.as_slice());
}
