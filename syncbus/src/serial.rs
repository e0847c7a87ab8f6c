//! Blocking serial sink
//!
//! Writes each frame to any [`embedded_io::Write`] port (a HAL UART, a
//! USB-CDC class, a host serial port wrapper) and flushes it before the
//! send call returns.

use core::cell::{Cell, RefCell};

use embedded_io::Write;

use crate::transport::FrameSink;

/// [`FrameSink`] over a blocking byte writer
///
/// Write errors cannot travel back through the sink, so they are counted
/// instead; see [`SerialSink::failures`].
pub struct SerialSink<W> {
    port: RefCell<W>,
    failures: Cell<usize>,
}

impl<W: Write> SerialSink<W> {
    /// Wrap a writer
    pub fn new(port: W) -> Self {
        Self {
            port: RefCell::new(port),
            failures: Cell::new(0),
        }
    }

    /// Frames that could not be written completely
    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.port.into_inner()
    }

    fn fail(&self) {
        self.failures.set(self.failures.get() + 1);
    }
}

impl<W: Write> FrameSink for SerialSink<W> {
    fn send(&self, frame: &[u8]) {
        // A sink re-entered from its own write cannot touch the port
        let Ok(mut port) = self.port.try_borrow_mut() else {
            self.fail();
            return;
        };

        if port.write_all(frame).is_err() || port.flush().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("serial: failed to write {} byte frame", frame.len());
            self.fail();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::verify_checksum;
    use crate::frame::MIN_FRAME_SIZE;
    use crate::slot::SlotCell;
    use crate::Client;
    use embedded_io::{ErrorKind, ErrorType};

    #[derive(Default)]
    struct Wire {
        bytes: Vec<u8>,
        flushes: usize,
        broken: bool,
    }

    impl ErrorType for Wire {
        type Error = ErrorKind;
    }

    impl Write for Wire {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_frame_written_and_flushed() {
        let sink = SerialSink::new(Wire::default());
        sink.send(&[1, 2, 3]);

        let wire = sink.into_inner();
        assert_eq!(wire.bytes, [1, 2, 3]);
        assert_eq!(wire.flushes, 1);
    }

    #[test]
    fn test_write_errors_counted() {
        let sink = SerialSink::new(Wire {
            broken: true,
            ..Wire::default()
        });
        sink.send(&[0; 8]);
        sink.send(&[0; 8]);
        assert_eq!(sink.failures(), 2);
    }

    #[test]
    fn test_client_over_serial() {
        let slot = SlotCell::new([0x10u8, 0x20]);
        let mut client: Client<_, _, 1> = Client::new(SerialSink::new(Wire::default()));
        client.register(slot.cells(), 0x01020304, 6).unwrap();

        client.request_get(0x01020304, 0).unwrap();
        client.request_set(0x01020304, 0).unwrap();

        // Two frames back to back on the wire
        let sink = client.into_sink();
        assert_eq!(sink.failures(), 0);
        let wire = sink.into_inner();
        let (get, set) = wire.bytes.split_at(MIN_FRAME_SIZE);
        assert!(verify_checksum(get));
        assert!(verify_checksum(set));
        assert_eq!(&set[6..8], &[0x10, 0x20]);
    }
}
