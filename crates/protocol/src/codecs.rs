//! EO protocol binary codecs with exact reference-server compatibility
//!
//! Endless Online encodes integers in a base-253 positional scheme, least
//! significant digit first. Each digit is stored as `digit + 1`, and a digit
//! position beyond the magnitude of the value is emitted as the sentinel byte
//! 254 rather than a literal zero. The byte values 0 and 255 therefore never
//! appear in an encoded number; 255 is reserved as the field-break sentinel
//! for strings.

use bytes::{BufMut, BytesMut};

/// Largest value representable in one encoded byte, plus one.
pub const CHAR_MAX: u32 = 253;

/// Largest value representable in two encoded bytes, plus one (253^2).
pub const SHORT_MAX: u32 = CHAR_MAX * CHAR_MAX;

/// Largest value representable in three encoded bytes, plus one (253^3).
pub const THREE_MAX: u32 = CHAR_MAX * CHAR_MAX * CHAR_MAX;

/// Field-break sentinel terminating break-strings.
pub const BREAK_BYTE: u8 = 0xFF;

/// Digit position absent/zero marker inside encoded numbers.
const ABSENT: u8 = 254;

/// Largest value encodable in `size` bytes (253^size - 1).
///
/// 253^4 - 1 = 4,097,152,080 still fits in a `u32`.
#[inline]
pub fn max_value(size: usize) -> u32 {
    match size {
        1 => CHAR_MAX - 1,
        2 => SHORT_MAX - 1,
        3 => THREE_MAX - 1,
        _ => 4_097_152_080,
    }
}

/// Encode a number into its fixed-width EO representation
///
/// # Format
/// - Digit 0 (least significant): `value % 253 + 1`, always present
/// - Digits 1..3: `quotient + 1` when the value reaches that magnitude,
///   otherwise the 254 sentinel
///
/// Values exceeding `253^size - 1` are clamped to the maximum encodable
/// value for the requested width.
pub fn encode_number(value: u32, size: usize) -> Vec<u8> {
    debug_assert!((1..=4).contains(&size), "EO numbers are 1-4 bytes");

    let mut out = vec![ABSENT; size];
    let mut value = value.min(max_value(size));

    if value >= THREE_MAX && size >= 4 {
        out[3] = (value / THREE_MAX) as u8 + 1;
        value %= THREE_MAX;
    }
    if value >= SHORT_MAX && size >= 3 {
        out[2] = (value / SHORT_MAX) as u8 + 1;
        value %= SHORT_MAX;
    }
    if value >= CHAR_MAX && size >= 2 {
        out[1] = (value / CHAR_MAX) as u8 + 1;
        value %= CHAR_MAX;
    }
    out[0] = value as u8 + 1;

    out
}

/// Decode a 1-4 byte EO number
///
/// Sentinel bytes contribute zero; any other byte contributes
/// `(byte - 1) * 253^position`. Extra bytes past the fourth are ignored.
pub fn decode_number(bytes: &[u8]) -> u32 {
    let mut result: u32 = 0;
    let mut magnitude: u32 = 1;

    for &b in bytes.iter().take(4) {
        let digit = if b == ABSENT { 0 } else { (b as u32).saturating_sub(1) };
        result = result.wrapping_add(digit.wrapping_mul(magnitude));
        magnitude = magnitude.wrapping_mul(CHAR_MAX);
    }

    result
}

/// Encode a single-byte char field
///
/// Char fields do NOT use the 1-byte form of [`encode_number`]: the stored
/// value is `value + 1`, except 0 which stays 0. Values above 253 are
/// clamped so the stored byte never collides with [`BREAK_BYTE`].
#[inline]
pub fn encode_char(value: u8) -> u8 {
    if value == 0 {
        0
    } else {
        value.min(253).wrapping_add(1)
    }
}

/// Decode a single-byte char field (inverse of [`encode_char`])
#[inline]
pub fn decode_char(byte: u8) -> u8 {
    if byte == 0 {
        0
    } else {
        byte - 1
    }
}

/// Write a char field (1 byte, offset convention)
#[inline]
pub fn write_char(buf: &mut BytesMut, value: u8) {
    buf.put_u8(encode_char(value));
}

/// Write a short field (2-byte encoded number)
#[inline]
pub fn write_short(buf: &mut BytesMut, value: u32) {
    buf.put_slice(&encode_number(value, 2));
}

/// Write a three field (3-byte encoded number)
#[inline]
pub fn write_three(buf: &mut BytesMut, value: u32) {
    buf.put_slice(&encode_number(value, 3));
}

/// Write an int field (4-byte encoded number)
#[inline]
pub fn write_int(buf: &mut BytesMut, value: u32) {
    buf.put_slice(&encode_number(value, 4));
}
