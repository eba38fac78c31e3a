use codec::{CharSet, ObjectIdentifier, Session, SessionConfig, SizeConstraint};
use proptest::prelude::*;

fn encoder() -> Session<'static> {
    Session::encoder(SessionConfig::default()).unwrap()
}

fn oid_strategy() -> impl Strategy<Value = Vec<u32>> {
    (0u32..=2, 0u32..40, prop::collection::vec(any::<u32>(), 0..12)).prop_map(
        |(first, second, rest)| {
            let mut arcs = vec![first, second];
            arcs.extend(rest);
            arcs
        },
    )
}

proptest! {
    #[test]
    fn prop_constrained_integer_roundtrip(
        lower in -100_000i64..100_000,
        span in 0i64..10_000_000,
        pick in any::<u64>(),
    ) {
        let upper = lower + span;
        let value = lower + (pick % (span as u64 + 1)) as i64;
        let mut enc = encoder();
        enc.encode_constrained_integer(value, lower, upper).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_constrained_integer(lower, upper).unwrap(), value);
        prop_assert!(dec.bits_remaining() < 8);
    }

    #[test]
    fn prop_full_range_integer_roundtrip(value in any::<i64>()) {
        let mut enc = encoder();
        enc.encode_constrained_integer(value, i64::MIN, i64::MAX).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_constrained_integer(i64::MIN, i64::MAX).unwrap(), value);
    }

    #[test]
    fn prop_unconstrained_integer_roundtrip(value in any::<i64>()) {
        let mut enc = encoder();
        enc.encode_unconstrained_integer(value).unwrap();
        let bytes = enc.encoded().to_vec();
        prop_assert!(bytes.len() >= 2 && bytes.len() <= 9);
        prop_assert_eq!(usize::from(bytes[0]), bytes.len() - 1);

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_unconstrained_integer().unwrap(), value);
    }

    #[test]
    fn prop_semi_constrained_roundtrip(lower in any::<i32>(), offset in 0u32..u32::MAX) {
        let lower = i64::from(lower);
        let value = lower + i64::from(offset);
        let mut enc = encoder();
        enc.encode_semi_constrained_integer(value, lower).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_semi_constrained_integer(lower).unwrap(), value);
    }

    #[test]
    fn prop_semi_constrained_unsigned_roundtrip(value in any::<u64>()) {
        let mut enc = encoder();
        enc.encode_semi_constrained_unsigned(value, 0).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_semi_constrained_unsigned(0).unwrap(), value);
    }

    #[test]
    fn prop_small_whole_number_roundtrip(value in any::<u64>(), lead in any::<bool>()) {
        let mut enc = encoder();
        enc.encode_bit(lead).unwrap();
        enc.encode_small_whole_number(value).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_bit().unwrap(), lead);
        prop_assert_eq!(dec.decode_small_whole_number().unwrap(), value);
    }

    #[test]
    fn prop_octet_string_roundtrip(
        lead in 0u8..8,
        data in prop::collection::vec(any::<u8>(), 0..600),
        fast_copy in any::<bool>(),
    ) {
        let mut enc = encoder();
        enc.encode_bits(0, lead).unwrap();
        enc.set_size_constraint(SizeConstraint::range(0, 1024));
        enc.encode_octet_string(&data).unwrap();
        let bytes = enc.encoded().to_vec();

        let config = SessionConfig::default().with_fast_copy(fast_copy);
        let mut dec = Session::decoder(&bytes, config);
        dec.decode_bits(lead).unwrap();
        dec.set_size_constraint(SizeConstraint::range(0, 1024));
        prop_assert_eq!(&*dec.decode_octet_string().unwrap(), data.as_slice());
    }

    #[test]
    fn prop_printable_string_roundtrip(value in "[A-Za-z0-9 '()+,./:=?-]{0,40}") {
        let charset = CharSet::printable();
        let mut enc = encoder();
        enc.encode_bit(true).unwrap();
        enc.set_size_constraint(SizeConstraint::range(0, 64));
        enc.encode_constrained_string(&value, &charset).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert!(dec.decode_bit().unwrap());
        dec.set_size_constraint(SizeConstraint::range(0, 64));
        prop_assert_eq!(dec.decode_constrained_string(&charset).unwrap(), value);
    }

    #[test]
    fn prop_numeric_string_roundtrip(value in "[0-9 ]{0,30}") {
        let charset = CharSet::numeric();
        let mut enc = encoder();
        enc.encode_constrained_string(&value, &charset).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_constrained_string(&charset).unwrap(), value);
    }

    #[test]
    fn prop_utf8_string_roundtrip(value in "\\PC{0,24}") {
        let mut enc = encoder();
        enc.encode_var_width_string(&value).unwrap();
        let bytes = enc.encoded().to_vec();

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_var_width_string().unwrap(), value);
    }

    #[test]
    fn prop_object_identifier_roundtrip(arcs in oid_strategy()) {
        let oid = ObjectIdentifier::new(arcs).unwrap();
        let mut enc = encoder();
        enc.encode_object_identifier(&oid).unwrap();
        let bytes = enc.encoded().to_vec();
        prop_assert_eq!(usize::from(bytes[0]), oid.contents().len());

        let mut dec = Session::decoder(&bytes, SessionConfig::default());
        prop_assert_eq!(dec.decode_object_identifier().unwrap(), oid);
    }

    #[test]
    fn prop_garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut dec = Session::decoder(&data, SessionConfig::default());
        let _ = dec.decode_object_identifier();
        let mut dec = Session::decoder(&data, SessionConfig::default());
        let _ = dec.decode_octet_string();
        let mut dec = Session::decoder(&data, SessionConfig::default());
        let _ = dec.decode_bmp_string(None);
        let mut dec = Session::decoder(&data, SessionConfig::default());
        let _ = dec.decode_unconstrained_integer();
        let mut dec = Session::decoder(&data, SessionConfig::default());
        let _ = dec.decode_small_whole_number();
    }
}
