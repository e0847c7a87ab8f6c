//! Protocol errors

use core::fmt;

/// Errors returned by codec, client and server operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A slot table or the frame buffer would exceed its capacity
    Overflow,
    /// Trailing CRC16 does not match the frame contents
    Checksum,
    /// Malformed frame, empty slot buffer, or payload length that does not
    /// match the registered slot size
    Fault,
    /// The scratch transmit buffer is already in use further up the call
    /// stack (a send callback re-entered a sending operation)
    Busy,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Overflow => f.write_str("capacity exceeded"),
            Error::Checksum => f.write_str("checksum mismatch"),
            Error::Fault => f.write_str("malformed frame or slot"),
            Error::Busy => f.write_str("transmit buffer busy"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;
