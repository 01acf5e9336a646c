//! Q16.16 operand encoding and Q.8 result decoding.
//!
//! The two directions use different scales. The host sends an unsigned
//! Q16.16 word, while the peripheral answers with a 24-bit value carrying
//! 8 fractional bits. The integer square root of a Q16.16 word is exactly
//! such a value, so `decode(encode(x))` is not an identity and must not be
//! treated as one.

use crate::CodecError;

/// Multiplier applied to an operand before it goes on the wire (2^16).
pub const ENCODE_SCALE: f64 = 65536.0;

/// Divisor applied to the raw 24-bit result (2^8).
pub const DECODE_SCALE: f64 = 256.0;

/// Largest operand whose scaled form still fits in 32 bits.
pub const MAX_OPERAND: f64 = u32::MAX as f64 / ENCODE_SCALE;

/// Encode a non-negative decimal as big-endian unsigned Q16.16.
///
/// Negative, non-finite and oversized values are rejected instead of being
/// wrapped or saturated. Callers are still expected to filter negative input
/// before it gets here.
pub fn encode(value: f64) -> Result<[u8; 4], CodecError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CodecError::OutOfRange(value));
    }
    let scaled = (value * ENCODE_SCALE).round();
    if scaled > u32::MAX as f64 {
        return Err(CodecError::OutOfRange(value));
    }
    Ok((scaled as u32).to_be_bytes())
}

/// Decode the three result bytes of a read response.
///
/// The command echo must already be stripped. Every input maps to a value.
pub fn decode(bytes: [u8; 3]) -> f64 {
    let raw = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
    raw as f64 / DECODE_SCALE
}
