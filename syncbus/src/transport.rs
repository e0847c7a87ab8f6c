//! Transport boundary
//!
//! The protocol core never touches I/O. It hands finished frames to a
//! [`FrameSink`] and reports slot updates to a [`ChangeObserver`]; the
//! transport feeds received frames back through [`FrameReceiver`].
//!
//! All three are called synchronously. A sink may deliver straight into the
//! peer, which may answer straight back into the sender:
//!
//! ```text
//! client.request_get ─► sink ─► server.receive ─► sink ─► client.receive
//! ```

use core::cell::{Cell, OnceCell, RefCell};

use crate::error::{Error, Result};
use crate::frame::{self, Function, MAX_FRAME_SIZE};

/// Destination for outgoing frames
///
/// `frame` is complete and checksummed. It points into the sender's scratch
/// buffer and is only valid for the duration of the call.
pub trait FrameSink {
    /// Hand one frame to the transport
    fn send(&self, frame: &[u8]);
}

impl<F: Fn(&[u8])> FrameSink for F {
    fn send(&self, frame: &[u8]) {
        self(frame)
    }
}

/// Sink that drops every frame
///
/// Used by a server that applies SetReq frames but never answers.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoSink;

impl FrameSink for NoSink {
    fn send(&self, _frame: &[u8]) {}
}

/// Notified after an incoming frame overwrote a local slot
pub trait ChangeObserver {
    /// `slot_id` has new contents
    fn changed(&self, slot_id: u8);
}

impl<F: Fn(u8)> ChangeObserver for F {
    fn changed(&self, slot_id: u8) {
        self(slot_id)
    }
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoObserver;

impl ChangeObserver for NoObserver {
    fn changed(&self, _slot_id: u8) {}
}

/// Anything that decodes and applies received frames
///
/// Implemented by [`Client`](crate::Client) and [`Server`](crate::Server).
pub trait FrameReceiver {
    /// Decode and apply one frame
    fn receive(&self, frame: &[u8]) -> Result<()>;
}

/// Synchronous loopback sink
///
/// Forwards every frame into a receiver attached after construction, so
/// that a client and a server can be wired back to back even though each
/// needs the other's sink at construction time.
#[derive(Default)]
pub struct Link<'a> {
    peer: OnceCell<&'a dyn FrameReceiver>,
    forwarded: Cell<usize>,
    last_error: Cell<Option<Error>>,
}

impl<'a> Link<'a> {
    /// Create an unconnected link
    pub fn new() -> Self {
        Self {
            peer: OnceCell::new(),
            forwarded: Cell::new(0),
            last_error: Cell::new(None),
        }
    }

    /// Attach the receiving end
    ///
    /// Returns false if the link was already connected; the first peer stays.
    pub fn connect(&self, peer: &'a dyn FrameReceiver) -> bool {
        self.peer.set(peer).is_ok()
    }

    /// Returns true once a peer is attached
    pub fn is_connected(&self) -> bool {
        self.peer.get().is_some()
    }

    /// Deliver a frame to the peer
    ///
    /// Frames sent before a peer is attached are dropped. The peer's error,
    /// if any, is kept for [`Link::last_error`].
    pub fn forward(&self, frame: &[u8]) {
        let Some(peer) = self.peer.get() else {
            #[cfg(feature = "defmt")]
            defmt::warn!("link: dropping {} byte frame, no peer", frame.len());
            return;
        };

        self.forwarded.set(self.forwarded.get() + 1);
        if let Err(e) = peer.receive(frame) {
            #[cfg(feature = "defmt")]
            defmt::warn!("link: peer rejected frame: {:?}", e);
            self.last_error.set(Some(e));
        }
    }

    /// Number of frames delivered to the peer so far
    pub fn forwarded(&self) -> usize {
        self.forwarded.get()
    }

    /// Most recent error reported by the peer, cleared on read
    pub fn last_error(&self) -> Option<Error> {
        self.last_error.take()
    }
}

impl<'l> FrameSink for &'l Link<'l> {
    fn send(&self, frame: &[u8]) {
        self.forward(frame)
    }
}

/// Scratch transmit buffer, one per client or server
///
/// Every outgoing frame is built here and lent to the sink. It stays
/// borrowed for the whole send, so a sink that re-enters a sending
/// operation of the same instance gets [`Error::Busy`].
#[derive(Debug)]
pub(crate) struct TxBuffer {
    buf: RefCell<[u8; MAX_FRAME_SIZE]>,
}

impl TxBuffer {
    pub(crate) const fn new() -> Self {
        Self {
            buf: RefCell::new([0u8; MAX_FRAME_SIZE]),
        }
    }

    /// Returns true while a frame built here is still with the sink
    pub(crate) fn is_busy(&self) -> bool {
        self.buf.try_borrow_mut().is_err()
    }

    /// Build a frame and hand it to `sink`
    pub(crate) fn send<S: FrameSink>(
        &self,
        sink: &S,
        server_id: u32,
        slot_id: u8,
        function: Function,
        payload: &[Cell<u8>],
    ) -> Result<()> {
        let mut buf = self.buf.try_borrow_mut().map_err(|_| Error::Busy)?;
        let len = frame::encode_frame(&mut buf[..], server_id, slot_id, function, payload)?;
        sink.send(&buf[..len]);
        Ok(())
    }
}
