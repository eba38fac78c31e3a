use codec::{
    CharSet, DList, ObjectIdentifier, Session, SessionConfig, SizeConstraint, Status,
    WideCharSet,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// A registration-request-like message touching every field kind.
struct Request {
    sequence: u16,
    priority: i64,
    protocol: ObjectIdentifier,
    alias: String,
    display: String,
    digits: String,
    endpoint: [u8; 4],
    token: Vec<u8>,
    flags: (usize, Vec<u8>),
    nonstandard: Vec<u8>,
    extensions: DList<Option<Vec<u8>>>,
}

fn sample() -> Request {
    let mut extensions = DList::new();
    extensions.append(Some(vec![0x01]));
    extensions.append(None);
    extensions.append(Some(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    Request {
        sequence: 4_321,
        priority: -12,
        protocol: "0.0.8.2250.0.4".parse().unwrap(),
        alias: "gk-west".to_string(),
        display: "Zürich €".to_string(),
        digits: "5551234".to_string(),
        endpoint: [192, 168, 1, 20],
        token: (0..300u32).map(|i| (i * 7) as u8).collect(),
        flags: (10, vec![0b1100_1010, 0b0100_0000]),
        nonstandard: Vec::new(),
        extensions,
    }
}

fn encode(session: &mut Session<'_>, request: &Request) {
    session.encode_bit(true).unwrap();
    session
        .encode_constrained_unsigned(u64::from(request.sequence), 1, 65_535)
        .unwrap();
    session.encode_constrained_integer(request.priority, -128, 127).unwrap();
    session.encode_object_identifier(&request.protocol).unwrap();

    session.set_size_constraint(SizeConstraint::range(1, 128));
    session
        .encode_constrained_string(&request.alias, &CharSet::ia5())
        .unwrap();
    session.set_size_constraint(SizeConstraint::range(1, 256));
    session.encode_bmp_string(&request.display, None).unwrap();
    let dial = CharSet::ia5().with_alphabet(b"0123456789#*,");
    session.set_size_constraint(SizeConstraint::range(1, 128));
    session.encode_constrained_string(&request.digits, &dial).unwrap();

    session.set_size_constraint(SizeConstraint::fixed(4));
    session.encode_octet_string(&request.endpoint).unwrap();
    session.encode_octet_string(&request.token).unwrap();
    session
        .encode_bit_string(request.flags.0, &request.flags.1)
        .unwrap();
    session.encode_open_type(&request.nonstandard).unwrap();

    session
        .encode_small_whole_number(request.extensions.len() as u64 - 1)
        .unwrap();
    session
        .encode_open_type_ext_bits(&request.extensions)
        .unwrap();
    session.encode_open_type_ext(&request.extensions).unwrap();
}

#[test]
fn request_roundtrip() {
    init_tracing();
    let request = sample();

    let mut enc = Session::encoder(SessionConfig::for_testing()).unwrap();
    encode(&mut enc, &request);
    assert_eq!(enc.status(), Status::Ok);
    let bytes = enc.destroy().unwrap();

    let mut dec = Session::decoder(&bytes, SessionConfig::for_testing());
    assert!(dec.decode_bit().unwrap());
    assert_eq!(
        dec.decode_constrained_unsigned(1, 65_535).unwrap(),
        u64::from(request.sequence)
    );
    assert_eq!(dec.decode_constrained_integer(-128, 127).unwrap(), request.priority);
    assert_eq!(dec.decode_object_identifier().unwrap(), request.protocol);

    dec.set_size_constraint(SizeConstraint::range(1, 128));
    assert_eq!(
        dec.decode_constrained_string(&CharSet::ia5()).unwrap(),
        request.alias
    );
    dec.set_size_constraint(SizeConstraint::range(1, 256));
    assert_eq!(dec.decode_bmp_string(None).unwrap(), request.display);
    let dial = CharSet::ia5().with_alphabet(b"0123456789#*,");
    dec.set_size_constraint(SizeConstraint::range(1, 128));
    assert_eq!(dec.decode_constrained_string(&dial).unwrap(), request.digits);

    dec.set_size_constraint(SizeConstraint::fixed(4));
    assert_eq!(&*dec.decode_octet_string().unwrap(), &request.endpoint);
    let token = dec.decode_octet_string().unwrap();
    assert!(token.is_borrowed());
    assert_eq!(&*token, request.token.as_slice());
    let flags = dec.decode_bit_string().unwrap();
    assert_eq!(flags.bit_len(), request.flags.0);
    assert_eq!(flags.as_bytes(), request.flags.1.as_slice());
    assert_eq!(&*dec.decode_open_type().unwrap(), &[0x00]);

    let count = dec.decode_small_whole_number().unwrap() as usize + 1;
    let present = dec.decode_open_type_ext_bits(count).unwrap();
    let extensions = dec.decode_open_type_ext(&present).unwrap();
    let decoded: Vec<Option<Vec<u8>>> = extensions
        .iter()
        .map(|value| value.as_ref().map(|octets| octets.to_vec()))
        .collect();
    let expected: Vec<Option<Vec<u8>>> = request.extensions.iter().cloned().collect();
    assert_eq!(decoded, expected);

    assert!(dec.bits_remaining() < 8);
    assert_eq!(dec.status(), Status::Ok);
}

#[test]
fn static_buffer_matches_dynamic_output() {
    let request = sample();
    let mut dynamic = Session::encoder(SessionConfig::default()).unwrap();
    encode(&mut dynamic, &request);
    let expected = dynamic.encoded().to_vec();

    let mut storage = vec![0u8; expected.len()];
    {
        let mut fixed = Session::new(SessionConfig::default());
        fixed.attach_encode_buffer(&mut storage);
        encode(&mut fixed, &request);
        assert_eq!(fixed.message_len(), expected.len());
    }
    assert_eq!(storage, expected);
}

#[test]
fn copying_decoder_matches_fast_copy() {
    let request = sample();
    let mut enc = Session::encoder(SessionConfig::default()).unwrap();
    enc.set_size_constraint(SizeConstraint::fixed(4));
    enc.encode_octet_string(&request.endpoint).unwrap();
    enc.encode_octet_string(&request.token).unwrap();
    let bytes = enc.encoded().to_vec();

    let config = SessionConfig::default().with_fast_copy(false);
    let mut dec = Session::decoder(&bytes, config);
    dec.set_size_constraint(SizeConstraint::fixed(4));
    let endpoint = dec.decode_octet_string().unwrap();
    let token = dec.decode_octet_string().unwrap();
    assert!(!endpoint.is_borrowed());
    assert!(!token.is_borrowed());
    assert_eq!(&*token, request.token.as_slice());
    assert_eq!(
        dec.type_arena().stats().allocated_bytes,
        request.endpoint.len() + request.token.len()
    );
}

#[test]
fn wide_strings_with_permitted_alphabet() {
    init_tracing();
    let permitted = WideCharSet::with_range(0x30, 0x39).unwrap();
    let mut enc = Session::encoder(SessionConfig::for_testing()).unwrap();
    enc.encode_universal_string("2024", Some(&permitted)).unwrap();
    let bytes = enc.encoded().to_vec();

    let mut dec = Session::decoder(&bytes, SessionConfig::for_testing());
    assert_eq!(dec.decode_universal_string(Some(&permitted)).unwrap(), "2024");
}

#[test]
fn utf8_string_roundtrip() {
    let mut enc = Session::encoder(SessionConfig::default()).unwrap();
    enc.encode_var_width_string("h.323 ✓").unwrap();
    let bytes = enc.encoded().to_vec();
    assert_eq!(usize::from(bytes[0]), "h.323 ✓".len());

    let mut dec = Session::decoder(&bytes, SessionConfig::default());
    assert_eq!(dec.decode_var_width_string().unwrap(), "h.323 ✓");
}
