#![no_main]

use codec::{CharSet, Session, SessionConfig, SizeConstraint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    let config = SessionConfig::for_testing()
        .with_trace(false)
        .with_fast_copy(selector & 0x80 != 0);
    let mut session = Session::decoder(input, config);
    if selector & 0x40 != 0 {
        session.set_size_constraint(SizeConstraint::extensible(0, 255));
    }

    // Decode until the first error, then check the status was recorded.
    for _ in 0..64 {
        let result = match selector % 9 {
            0 => session.decode_constrained_integer(-1000, 70_000).map(drop),
            1 => session.decode_unconstrained_integer().map(drop),
            2 => session.decode_small_whole_number().map(drop),
            3 => session.decode_octet_string().map(drop),
            4 => session.decode_bit_string().map(drop),
            5 => session.decode_constrained_string(&CharSet::printable()).map(drop),
            6 => session.decode_bmp_string(None).map(drop),
            7 => session.decode_object_identifier().map(drop),
            _ => session.decode_open_type().map(drop),
        };
        if result.is_err() {
            assert!(session.status().is_error());
            break;
        }
        if session.bits_remaining() == 0 {
            break;
        }
    }
});
