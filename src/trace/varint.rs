//! Unsigned LEB128 varint packing for span identifiers.
//!
//! A span id's 8 bytes hold the varint of its integer value, zero padded.
//! Both directions of the header codec go through this module so the byte
//! layout written on encode is the one read on decode.

/// Number of bytes available for a packed varint.
pub const WIDTH: usize = 8;

/// Largest integer that fits in [`WIDTH`] varint bytes (7 bits per byte).
pub const MAX_VALUE: u64 = (1 << (7 * WIDTH)) - 1;

/// Pack `value` into a zero padded buffer.
///
/// Returns `None` when the value needs more than [`WIDTH`] bytes.
pub fn put_uvarint(mut value: u64) -> Option<[u8; WIDTH]> {
    if value > MAX_VALUE {
        return None;
    }

    let mut buf = [0u8; WIDTH];
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    Some(buf)
}

/// Read a varint from the start of `buf`.
///
/// Trailing bytes after the terminating byte are ignored. Returns `None` if
/// no byte in `buf` terminates the varint.
pub fn uvarint(buf: &[u8]) -> Option<u64> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().take(WIDTH).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            return Some(value);
        }
    }
    None
}
