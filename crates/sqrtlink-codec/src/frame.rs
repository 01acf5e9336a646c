use serde::{Deserialize, Serialize};

use crate::CodecError;

/// Every transaction on the bus is exactly this many bytes.
pub const FRAME_LEN: usize = 5;

/// Command/address byte leading every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// Write the operand register (address 0x400).
    WriteOperand,
    /// Read the result register (address 0x404).
    ReadResult,
}

impl Selector {
    pub fn as_byte(&self) -> u8 {
        match self {
            Selector::WriteOperand => 0x80,
            Selector::ReadResult => 0x01,
        }
    }

    pub fn register_address(&self) -> u16 {
        match self {
            Selector::WriteOperand => 0x400,
            Selector::ReadResult => 0x404,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x80 => Some(Selector::WriteOperand),
            0x01 => Some(Selector::ReadResult),
            _ => None,
        }
    }
}

/// One outgoing bus transaction: selector followed by four big-endian payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFrame {
    selector: Selector,
    payload: [u8; 4],
}

impl WireFrame {
    pub fn write(operand: [u8; 4]) -> Self {
        Self {
            selector: Selector::WriteOperand,
            payload: operand,
        }
    }

    pub fn read_request() -> Self {
        Self {
            selector: Selector::ReadResult,
            payload: [0; 4],
        }
    }

    pub fn selector(&self) -> Selector {
        self.selector
    }

    pub fn as_bytes(&self) -> [u8; FRAME_LEN] {
        let [b3, b2, b1, b0] = self.payload;
        [self.selector.as_byte(), b3, b2, b1, b0]
    }
}

/// Bytes clocked back by the peripheral during a transfer.
///
/// Byte 0 is the command echo. Bytes 1..=3 carry the result. A fifth byte,
/// when present, is received but not part of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResponse {
    bytes: Vec<u8>,
}

impl DeviceResponse {
    const MIN_LEN: usize = 4;

    pub fn new(bytes: Vec<u8>) -> Result<Self, CodecError> {
        if bytes.len() < Self::MIN_LEN {
            return Err(CodecError::ShortResponse {
                expected: Self::MIN_LEN,
                got: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    pub fn echo(&self) -> u8 {
        self.bytes[0]
    }

    pub fn result_bytes(&self) -> [u8; 3] {
        [self.bytes[1], self.bytes[2], self.bytes[3]]
    }

    pub fn ignored_byte(&self) -> Option<u8> {
        self.bytes.get(4).copied()
    }

    pub fn decode(&self) -> f64 {
        crate::fixed::decode(self.result_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    #[test]
    fn write_frame_layout() {
        let frame = WireFrame::write(encode(4.0).unwrap());
        assert_eq!(frame.as_bytes(), [0x80, 0x00, 0x04, 0x00, 0x00]);
        assert_eq!(frame.selector(), Selector::WriteOperand);
        assert_eq!(frame.selector().register_address(), 0x400);
    }

    #[test]
    fn write_frame_keeps_selector_for_any_operand() {
        for v in [0.0, 0.25, 1.0, 2.0, 1234.5678, crate::MAX_OPERAND] {
            let bytes = WireFrame::write(encode(v).unwrap()).as_bytes();
            assert_eq!(bytes.len(), FRAME_LEN);
            assert_eq!(bytes[0], 0x80);
        }
    }

    #[test]
    fn read_request_layout() {
        let frame = WireFrame::read_request();
        assert_eq!(frame.as_bytes(), [0x01, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(frame.selector().register_address(), 0x404);
    }

    #[test]
    fn selector_byte_lookup() {
        assert_eq!(Selector::from_byte(0x80), Some(Selector::WriteOperand));
        assert_eq!(Selector::from_byte(0x01), Some(Selector::ReadResult));
        assert_eq!(Selector::from_byte(0x42), None);
    }

    #[test]
    fn response_skips_echo_and_trailing_byte() {
        let resp = DeviceResponse::new(vec![0xAA, 0x00, 0x02, 0x00, 0xFF]).unwrap();
        assert_eq!(resp.echo(), 0xAA);
        assert_eq!(resp.result_bytes(), [0x00, 0x02, 0x00]);
        assert_eq!(resp.ignored_byte(), Some(0xFF));
        assert_eq!(resp.decode(), 2.0);
    }

    #[test]
    fn trailing_byte_does_not_change_result() {
        let a = DeviceResponse::new(vec![0x01, 0x00, 0x01, 0x00, 0x00]).unwrap();
        let b = DeviceResponse::new(vec![0x01, 0x00, 0x01, 0x00, 0x7F]).unwrap();
        assert_eq!(a.decode(), b.decode());
    }

    #[test]
    fn short_response_is_rejected() {
        let err = DeviceResponse::new(vec![0x01, 0x00]).unwrap_err();
        assert_eq!(err, CodecError::ShortResponse { expected: 4, got: 2 });
    }

    #[test]
    fn frame_serializes_to_json() {
        let json = serde_json::to_string(&WireFrame::read_request()).unwrap();
        assert_eq!(json, r#"{"selector":"ReadResult","payload":[0,0,0,0]}"#);
    }
}
