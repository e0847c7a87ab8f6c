//! Server side: owns the authoritative copy of each slot
//!
//! A server answers GetReq frames with the current slot contents and applies
//! SetReq frames to its local regions. Frames carrying another server's id
//! are ignored, so several servers can share one bus.

use core::cell::Cell;

use heapless::Vec;

use crate::error::{Error, Result};
use crate::frame::{Frame, Function};
use crate::slot;
use crate::transport::{ChangeObserver, FrameReceiver, FrameSink, NoObserver, NoSink, TxBuffer};

/// One served slot
#[derive(Debug, Clone, Copy)]
pub struct ServerSlot<'a> {
    /// Authoritative slot contents
    pub region: &'a [Cell<u8>],
    /// Slot identifier
    pub slot_id: u8,
}

impl ServerSlot<'_> {
    /// Slot size in bytes
    pub fn size(&self) -> usize {
        self.region.len()
    }
}

/// Protocol server with room for `N` slots
pub struct Server<'a, S, O, const N: usize> {
    id: u32,
    slots: Vec<ServerSlot<'a>, N>,
    sink: S,
    observer: O,
    tx: TxBuffer,
}

impl<'a, const N: usize> Server<'a, NoSink, NoObserver, N> {
    /// Create a server that applies SetReq frames but never transmits
    pub fn new(id: u32) -> Self {
        Self::with_observer(id, NoSink, NoObserver)
    }
}

impl<'a, S: FrameSink, const N: usize> Server<'a, S, NoObserver, N> {
    /// Create a server that answers through `sink`
    pub fn with_sink(id: u32, sink: S) -> Self {
        Self::with_observer(id, sink, NoObserver)
    }
}

impl<'a, S: FrameSink, O: ChangeObserver, const N: usize> Server<'a, S, O, N> {
    /// Create a server that also notifies `observer` after each applied SetReq
    pub fn with_observer(id: u32, sink: S, observer: O) -> Self {
        Self {
            id,
            slots: Vec::new(),
            sink,
            observer,
            tx: TxBuffer::new(),
        }
    }

    /// This server's identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Change this server's identifier
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Serve `region` as slot `slot_id`
    ///
    /// Same rules as [`Client::register`](crate::Client::register): empty
    /// regions fault, a full table or an oversized region overflows.
    pub fn register_slot(&mut self, region: &'a [Cell<u8>], slot_id: u8) -> Result<usize> {
        slot::check_region(region)?;

        let index = self.slots.len();
        self.slots
            .push(ServerSlot { region, slot_id })
            .map_err(|_| Error::Overflow)?;
        Ok(index)
    }

    /// Decode a frame from the transport and act on it
    ///
    /// GetReq is answered with a GetResp carrying the slot contents. SetReq
    /// overwrites the slot and, with the `set-ack` feature, is answered with
    /// an empty SetResp. Frames for another server or an unknown slot are
    /// accepted without effect.
    ///
    /// A SetReq delivered while this server is still handing a frame to its
    /// sink cannot be acknowledged; with `set-ack` it fails with
    /// [`Error::Busy`] and the slot keeps its old contents.
    pub fn handle_incoming(&self, bytes: &[u8]) -> Result<()> {
        let frame = Frame::parse(bytes)?;

        if frame.server_id != self.id {
            #[cfg(feature = "defmt")]
            defmt::trace!("server {=u32:#x}: frame for {=u32:#x}", self.id, frame.server_id);
            return Ok(());
        }

        match frame.function() {
            Some(Function::GetReq) => self.answer_get(&frame),
            Some(Function::SetReq) => self.apply_set(&frame),
            _ => {
                #[cfg(feature = "defmt")]
                defmt::debug!("server: ignoring function {=u8:#x}", frame.code);
                Ok(())
            }
        }
    }

    /// Served slots in registration order
    pub fn slots(&self) -> &[ServerSlot<'a>] {
        &self.slots
    }

    /// Number of registered slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is registered yet
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Consume the server and give back its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn find(&self, slot_id: u8) -> Option<&ServerSlot<'a>> {
        let found = self.slots.iter().find(|s| s.slot_id == slot_id);
        #[cfg(feature = "defmt")]
        if found.is_none() {
            defmt::debug!("server {=u32:#x}: unknown slot {}", self.id, slot_id);
        }
        found
    }

    fn answer_get(&self, frame: &Frame<'_>) -> Result<()> {
        let Some(slot) = self.find(frame.slot_id) else {
            return Ok(());
        };

        self.tx
            .send(&self.sink, self.id, slot.slot_id, Function::GetResp, slot.region)
    }

    fn apply_set(&self, frame: &Frame<'_>) -> Result<()> {
        let Some(slot) = self.find(frame.slot_id) else {
            return Ok(());
        };

        if frame.payload.len() != slot.size() {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "server: slot {} expects {} bytes, got {}",
                slot.slot_id,
                slot.size(),
                frame.payload.len()
            );
            return Err(Error::Fault);
        }

        // The ack needs the scratch buffer; refuse before touching the slot
        if cfg!(feature = "set-ack") && self.tx.is_busy() {
            #[cfg(feature = "defmt")]
            defmt::warn!("server: cannot ack slot {} while sending", slot.slot_id);
            return Err(Error::Busy);
        }

        slot::write_from(slot.region, frame.payload);
        self.observer.changed(slot.slot_id);

        if cfg!(feature = "set-ack") {
            self.tx
                .send(&self.sink, self.id, slot.slot_id, Function::SetResp, &[])?;
        }
        Ok(())
    }
}

impl<S: FrameSink, O: ChangeObserver, const N: usize> FrameReceiver for Server<'_, S, O, N> {
    fn receive(&self, frame: &[u8]) -> Result<()> {
        self.handle_incoming(frame)
    }
}
