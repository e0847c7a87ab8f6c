//! Client side: mirrors slots owned by one or more servers
//!
//! The client keeps a fixed-capacity table of bindings, each tying a local
//! byte region to a `(server id, slot id)` pair. [`Client::request_get`]
//! asks the server for the current value, [`Client::request_set`] pushes
//! the local value. GetResp frames arriving through
//! [`Client::handle_incoming`] overwrite the matching local region.

use core::cell::Cell;

use heapless::Vec;

use crate::error::{Error, Result};
use crate::frame::{Frame, Function};
use crate::slot;
use crate::transport::{ChangeObserver, FrameReceiver, FrameSink, NoObserver, TxBuffer};

/// One mirrored slot
#[derive(Debug, Clone, Copy)]
pub struct ClientSlot<'a> {
    /// Local copy of the slot contents
    pub region: &'a [Cell<u8>],
    /// Server the slot was registered against
    pub server_id: u32,
    /// Slot identifier on that server
    pub slot_id: u8,
}

impl ClientSlot<'_> {
    /// Slot size in bytes
    pub fn size(&self) -> usize {
        self.region.len()
    }
}

/// Protocol client with room for `N` slot bindings
///
/// Requests and incoming frames only need `&self`, so the sink may deliver
/// the server's answer back into [`Client::handle_incoming`] before the
/// request call returns.
pub struct Client<'a, S, O, const N: usize> {
    slots: Vec<ClientSlot<'a>, N>,
    sink: S,
    observer: O,
    tx: TxBuffer,
}

impl<'a, S: FrameSink, const N: usize> Client<'a, S, NoObserver, N> {
    /// Create a client that sends through `sink` and reports no changes
    pub fn new(sink: S) -> Self {
        Self::with_observer(sink, NoObserver)
    }
}

impl<'a, S: FrameSink, O: ChangeObserver, const N: usize> Client<'a, S, O, N> {
    /// Create a client that notifies `observer` after each applied GetResp
    ///
    /// With a synchronous transport the observer runs while the GetReq that
    /// caused it is still being sent. Calling [`Client::request_get`] or
    /// [`Client::request_set`] on this client from inside the observer then
    /// fails with [`Error::Busy`]; record the change and push it after
    /// `request_get` has returned.
    pub fn with_observer(sink: S, observer: O) -> Self {
        Self {
            slots: Vec::new(),
            sink,
            observer,
            tx: TxBuffer::new(),
        }
    }

    /// Bind `region` to slot `slot_id` of server `server_id`
    ///
    /// Returns the binding index used by [`Client::request_get`] and
    /// [`Client::request_set`]. Indices follow registration order.
    ///
    /// Fails with [`Error::Fault`] for an empty region and with
    /// [`Error::Overflow`] when the table is full or the region is too large
    /// for a single frame.
    pub fn register(&mut self, region: &'a [Cell<u8>], server_id: u32, slot_id: u8) -> Result<usize> {
        slot::check_region(region)?;

        let index = self.slots.len();
        self.slots
            .push(ClientSlot {
                region,
                server_id,
                slot_id,
            })
            .map_err(|_| Error::Overflow)?;
        Ok(index)
    }

    /// Ask `server_id` for the current value of binding `index`
    ///
    /// The frame is addressed to `server_id` rather than the id the binding
    /// was registered with, so one slot layout can be read from several
    /// servers. The reply is only applied if it comes back from the
    /// registered server.
    pub fn request_get(&self, server_id: u32, index: usize) -> Result<()> {
        let binding = self.binding(index)?;
        self.tx
            .send(&self.sink, server_id, binding.slot_id, Function::GetReq, &[])
    }

    /// Push the local value of binding `index` to `server_id`
    pub fn request_set(&self, server_id: u32, index: usize) -> Result<()> {
        let binding = self.binding(index)?;
        self.tx.send(
            &self.sink,
            server_id,
            binding.slot_id,
            Function::SetReq,
            binding.region,
        )
    }

    /// Decode a frame from the transport and apply it
    ///
    /// GetResp frames overwrite the first binding registered for the same
    /// server and slot. SetResp is a bare acknowledgement. Frames for
    /// unknown slots, and request frames, are accepted and ignored.
    pub fn handle_incoming(&self, bytes: &[u8]) -> Result<()> {
        let frame = Frame::parse(bytes)?;

        match frame.function() {
            Some(Function::GetResp) => self.apply(&frame),
            Some(Function::SetResp) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("client: SET ack {=u32:#x}/{}", frame.server_id, frame.slot_id);
                Ok(())
            }
            _ => {
                #[cfg(feature = "defmt")]
                defmt::debug!("client: ignoring function {=u8:#x}", frame.code);
                Ok(())
            }
        }
    }

    /// Bindings in registration order
    pub fn slots(&self) -> &[ClientSlot<'a>] {
        &self.slots
    }

    /// Number of registered bindings
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is registered yet
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of bindings
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Consume the client and give back its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn binding(&self, index: usize) -> Result<&ClientSlot<'a>> {
        let binding = self.slots.get(index).ok_or(Error::Overflow)?;
        if binding.region.is_empty() {
            return Err(Error::Fault);
        }
        Ok(binding)
    }

    fn apply(&self, frame: &Frame<'_>) -> Result<()> {
        let Some(binding) = self
            .slots
            .iter()
            .find(|s| s.server_id == frame.server_id && s.slot_id == frame.slot_id)
        else {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "client: no binding for {=u32:#x}/{}",
                frame.server_id,
                frame.slot_id
            );
            return Ok(());
        };

        if frame.payload.len() != binding.size() {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "client: slot {} expects {} bytes, got {}",
                frame.slot_id,
                binding.size(),
                frame.payload.len()
            );
            return Err(Error::Fault);
        }

        slot::write_from(binding.region, frame.payload);
        self.observer.changed(frame.slot_id);
        Ok(())
    }
}

impl<S: FrameSink, O: ChangeObserver, const N: usize> FrameReceiver for Client<'_, S, O, N> {
    fn receive(&self, frame: &[u8]) -> Result<()> {
        self.handle_incoming(frame)
    }
}
