//! Fixed-point codec and wire framing for the square-root peripheral.

pub mod fixed;
pub mod frame;

pub use fixed::{decode, encode, DECODE_SCALE, ENCODE_SCALE, MAX_OPERAND};
pub use frame::{DeviceResponse, Selector, WireFrame, FRAME_LEN};

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("operand {0} cannot be represented as unsigned Q16.16")]
    OutOfRange(f64),
    #[error("device response too short: expected at least {expected} bytes, got {got}")]
    ShortResponse { expected: usize, got: usize },
}
