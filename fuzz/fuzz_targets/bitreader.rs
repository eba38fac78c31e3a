#![no_main]

use bitstream::BitBuffer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitBuffer::from_slice(data);
    let mut idx = 0usize;

    // Input bytes drive a bounded sequence of operations.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 5;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                let bits = (data[idx - 1] % 64).saturating_add(1);
                let _ = reader.read_bits(bits);
            }
            2 => reader.align(),
            3 => {
                let bits = usize::from(data[idx - 1]);
                let mut out = [0u8; 32];
                let _ = reader.read_octets(&mut out, bits);
            }
            _ => {
                let mark = reader.mark();
                let _ = reader.skip_bits(usize::from(data[idx - 1]));
                let _ = reader.restore(mark);
            }
        }
    }
});
