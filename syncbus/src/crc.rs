//! CRC16/Modbus checksum
//!
//! Reflected polynomial 0xA001, initial register 0xFFFF, no final XOR.
//! The checksum trails every frame, low byte first.

/// Size of the trailing checksum in bytes
pub const CHECKSUM_SIZE: usize = 2;

const POLY: u16 = 0xA001;

/// Compute the CRC16/Modbus of `data`
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Append the checksum of `buf[..len]` at `buf[len..len + 2]`
///
/// Returns the new length (`len + 2`). The caller guarantees that
/// `len + 2 <= buf.len()`; no capacity check is done here.
pub fn append_checksum(buf: &mut [u8], len: usize) -> usize {
    let [lo, hi] = crc16(&buf[..len]).to_le_bytes();
    buf[len] = lo;
    buf[len + 1] = hi;
    len + CHECKSUM_SIZE
}

/// Check the trailing two bytes of `frame` against the checksum of the rest
///
/// Frames shorter than the checksum itself never verify.
pub fn verify_checksum(frame: &[u8]) -> bool {
    if frame.len() < CHECKSUM_SIZE {
        return false;
    }

    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_SIZE);
    crc16(body).to_le_bytes() == [trailer[0], trailer[1]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_crc16_empty_is_initial_register() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn test_append_modbus_read_request() {
        // Read 10 holding registers from unit 1
        let mut buf = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0, 0];
        let len = append_checksum(&mut buf, 6);

        assert_eq!(len, 8);
        assert_eq!(&buf[6..], &[0xC5, 0xCD]);
        assert!(verify_checksum(&buf));
    }

    #[test]
    fn test_verify_rejects_corrupt_trailer() {
        let mut buf = [0xAB, 0xCD, 0xEF, 0, 0];
        append_checksum(&mut buf, 3);
        buf[4] ^= 0x01;
        assert!(!verify_checksum(&buf));
    }

    #[test]
    fn test_verify_short_input() {
        assert!(!verify_checksum(&[]));
        assert!(!verify_checksum(&[0xFF]));
    }

    #[test]
    fn test_verify_bare_checksum_of_nothing() {
        // An empty body checksums to the initial register
        assert!(verify_checksum(&[0xFF, 0xFF]));
    }
}
