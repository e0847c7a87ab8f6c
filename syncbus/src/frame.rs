//! Frame encoding and decoding.
//!
//! Frame format:
//! - SERVER ID (4 bytes): little-endian u32, target or origin server
//! - SLOT ID (1 byte): application-defined slot identifier
//! - FUNCTION (1 byte): [`Function`] code
//! - PAYLOAD (0..=MAX_PAYLOAD_SIZE bytes): raw slot contents
//! - CHECKSUM (2 bytes): CRC16/Modbus over everything before it, LO then HI

use core::cell::Cell;

use crate::crc::{append_checksum, verify_checksum, CHECKSUM_SIZE};
use crate::error::{Error, Result};
use crate::slot;

/// Offset of the server identifier
pub const FRAME_SERVER_ID: usize = 0;
/// Offset of the slot identifier
pub const FRAME_SLOT_ID: usize = 4;
/// Offset of the function code
pub const FRAME_FUNCTION: usize = 5;
/// Offset of the first payload byte
pub const FRAME_DATA: usize = 6;

/// Header size (SERVER ID + SLOT ID + FUNCTION)
pub const HEADER_SIZE: usize = 6;

/// Smallest well-formed frame: header plus checksum, no payload
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Capacity of every transmit buffer; no frame may be larger
///
/// Fixed at 64 bytes for every client and server in a build. Peers with a
/// larger frame size can still talk to this crate as long as no slot
/// exceeds [`MAX_PAYLOAD_SIZE`].
pub const MAX_FRAME_SIZE: usize = 64;

/// Largest slot that still fits in a single frame
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - HEADER_SIZE - CHECKSUM_SIZE;

/// Function codes carried in the FUNCTION byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Function {
    /// Ask a server for a slot's current value (no payload)
    GetReq,
    /// Overwrite a slot on the server (payload = new value)
    SetReq,
    /// Server's answer to GetReq (payload = current value)
    GetResp,
    /// Server's acknowledgement of SetReq (no payload)
    SetResp,
}

// Wire format values
const FUNC_GET_REQ: u8 = 0x00;
const FUNC_SET_REQ: u8 = 0x01;
const FUNC_GET_RESP: u8 = 0x02;
const FUNC_SET_RESP: u8 = 0x03;

impl Function {
    /// Parse a function from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            FUNC_GET_REQ => Some(Function::GetReq),
            FUNC_SET_REQ => Some(Function::SetReq),
            FUNC_GET_RESP => Some(Function::GetResp),
            FUNC_SET_RESP => Some(Function::SetResp),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Function::GetReq => FUNC_GET_REQ,
            Function::SetReq => FUNC_SET_REQ,
            Function::GetResp => FUNC_GET_RESP,
            Function::SetResp => FUNC_SET_RESP,
        }
    }
}

/// Write `value` little-endian into `dst[..4]`
pub fn write_le32(dst: &mut [u8], value: u32) {
    dst[..4].copy_from_slice(&value.to_le_bytes());
}

/// Read a little-endian u32 from `src[..4]`
pub fn read_le32(src: &[u8]) -> u32 {
    u32::from_le_bytes([src[0], src[1], src[2], src[3]])
}

/// Total wire size of a frame carrying `payload_len` bytes
pub const fn frame_len(payload_len: usize) -> usize {
    HEADER_SIZE + payload_len + CHECKSUM_SIZE
}

/// Returns true if a payload of `payload_len` bytes fits in one frame
pub const fn fits(payload_len: usize) -> bool {
    frame_len(payload_len) <= MAX_FRAME_SIZE
}

/// Write the 6-byte header into `buf[..HEADER_SIZE]`
pub fn encode_header(buf: &mut [u8], server_id: u32, slot_id: u8, function: Function) {
    write_le32(&mut buf[FRAME_SERVER_ID..], server_id);
    buf[FRAME_SLOT_ID] = slot_id;
    buf[FRAME_FUNCTION] = function.to_byte();
}

/// Encode a complete frame into `buf`
///
/// The payload is read from the slot region as it is at call time. Returns
/// the number of bytes written, header and checksum included, or
/// [`Error::Overflow`] if the frame would not fit in `buf`.
pub fn encode_frame(
    buf: &mut [u8],
    server_id: u32,
    slot_id: u8,
    function: Function,
    payload: &[Cell<u8>],
) -> Result<usize> {
    let body_len = HEADER_SIZE + payload.len();
    if body_len + CHECKSUM_SIZE > buf.len() {
        return Err(Error::Overflow);
    }

    encode_header(buf, server_id, slot_id, function);
    slot::read_into(payload, &mut buf[FRAME_DATA..body_len]);
    Ok(append_checksum(buf, body_len))
}

/// A decoded view over a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Server the frame is addressed to (request) or came from (response)
    pub server_id: u32,
    /// Slot the frame refers to
    pub slot_id: u8,
    /// Raw function byte; see [`Frame::function`]
    pub code: u8,
    /// Payload bytes between header and checksum
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Validate length and checksum, then split `bytes` into its fields
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < MIN_FRAME_SIZE {
            return Err(Error::Fault);
        }
        if !verify_checksum(bytes) {
            return Err(Error::Checksum);
        }

        Ok(Self {
            server_id: read_le32(&bytes[FRAME_SERVER_ID..]),
            slot_id: bytes[FRAME_SLOT_ID],
            code: bytes[FRAME_FUNCTION],
            payload: &bytes[FRAME_DATA..bytes.len() - CHECKSUM_SIZE],
        })
    }

    /// The function code, if it is one this protocol defines
    pub fn function(&self) -> Option<Function> {
        Function::from_byte(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_roundtrip() {
        let functions = [
            Function::GetReq,
            Function::SetReq,
            Function::GetResp,
            Function::SetResp,
        ];

        for function in functions {
            let byte = function.to_byte();
            assert_eq!(Function::from_byte(byte), Some(function));
        }
    }

    #[test]
    fn test_unknown_function() {
        assert!(Function::from_byte(0x04).is_none());
        assert!(Function::from_byte(0xFF).is_none());
    }

    #[test]
    fn test_le32() {
        let mut buf = [0u8; 4];
        write_le32(&mut buf, 0x12345678);
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(read_le32(&buf), 0x12345678);
    }

    #[test]
    fn test_header_layout() {
        let mut buf = [0u8; HEADER_SIZE];
        encode_header(&mut buf, 0x12345678, 2, Function::SetResp);
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12, 0x02, 0x03]);
    }

    #[test]
    fn test_payload_limits() {
        assert_eq!(MAX_FRAME_SIZE, 64);
        assert_eq!(MAX_PAYLOAD_SIZE, 56);
        assert!(fits(MAX_PAYLOAD_SIZE));
        assert!(!fits(MAX_PAYLOAD_SIZE + 1));
        assert_eq!(frame_len(0), MIN_FRAME_SIZE);
    }

    #[test]
    fn test_encode_header_only() {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(&mut buf, 0xA1B2C3D4, 7, Function::GetReq, &[]).unwrap();

        assert_eq!(len, MIN_FRAME_SIZE);
        assert_eq!(&buf[..HEADER_SIZE], &[0xD4, 0xC3, 0xB2, 0xA1, 7, 0]);
        assert!(verify_checksum(&buf[..len]));
    }

    #[test]
    fn test_encode_with_payload() {
        let data = [Cell::new(0xDE), Cell::new(0xAD), Cell::new(0xBE)];
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(&mut buf, 1, 9, Function::GetResp, &data).unwrap();

        assert_eq!(len, frame_len(3));
        assert_eq!(&buf[FRAME_DATA..FRAME_DATA + 3], &[0xDE, 0xAD, 0xBE]);

        let frame = Frame::parse(&buf[..len]).unwrap();
        assert_eq!(frame.server_id, 1);
        assert_eq!(frame.slot_id, 9);
        assert_eq!(frame.function(), Some(Function::GetResp));
        assert_eq!(frame.payload, &[0xDE, 0xAD, 0xBE]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let data = [0u8; 4].map(Cell::new);
        let mut buf = [0u8; frame_len(4) - 1];
        let result = encode_frame(&mut buf, 1, 1, Function::SetReq, &data);
        assert_eq!(result, Err(Error::Overflow));
    }

    #[test]
    fn test_parse_too_short() {
        assert_eq!(Frame::parse(&[0u8; MIN_FRAME_SIZE - 1]), Err(Error::Fault));
        assert_eq!(Frame::parse(&[]), Err(Error::Fault));
    }

    #[test]
    fn test_parse_invalid_checksum() {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(&mut buf, 5, 5, Function::GetReq, &[]).unwrap();
        // Corrupt the checksum
        buf[len - 1] ^= 0xFF;
        assert_eq!(Frame::parse(&buf[..len]), Err(Error::Checksum));
    }

    #[test]
    fn test_parse_keeps_unknown_function() {
        let mut buf = [0x01, 0x00, 0x00, 0x00, 0x03, 0x7F, 0, 0];
        let len = append_checksum(&mut buf, HEADER_SIZE);
        let frame = Frame::parse(&buf[..len]).unwrap();

        assert_eq!(frame.code, 0x7F);
        assert!(frame.function().is_none());
        assert!(frame.payload.is_empty());
    }
}
